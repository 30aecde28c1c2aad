//! Fetch the head content of a remote resource with N concurrent tasks,
//! persist each artifact, and report a SHA-256 digest per file.

pub mod config;
pub mod logging;

pub mod artifact;
pub mod coordinator;
pub mod digest;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod report;
pub mod transport;
pub mod workdir;
pub mod writer;

pub use error::{FetchError, FetchResult};
