//! `headfetch probe` – show what the metadata probe sees.

use anyhow::{Context, Result};
use headfetch_core::transport::{CurlTransport, Transport};

pub async fn run_probe(url: &str) -> Result<()> {
    let probe = CurlTransport::default()
        .probe(url)
        .await
        .with_context(|| format!("probe {}", url))?;

    println!("HTTP {}", probe.status);
    for (name, value) in probe.headers() {
        println!("{}: {}", name, value);
    }
    if probe.has_content_length() {
        println!("Content-Length advertised: fetch would be skipped");
    } else {
        println!("no Content-Length: body would be downloaded");
    }
    Ok(())
}
