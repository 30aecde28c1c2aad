mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    // Parse CLI, set up logging, and dispatch.
    if let Err(err) = Cli::run_from_args().await {
        eprintln!("headfetch error: {:#}", err);
        std::process::exit(1);
    }
}
