//! Error taxonomy for the fetch-and-digest pipeline.
//!
//! Transport and persistence failures are distinct variants so callers can
//! tell a network problem from a disk problem without inspecting messages.

use std::io;
use std::path::PathBuf;

/// Errors surfaced by the core. Nothing here is retried; every variant
/// propagates to the outermost caller.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network failure during the HEAD probe or the GET retrieval.
    #[error("transport failure for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },

    /// Destination file could not be created or written.
    #[error("error creating or writing to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Working directory could not be created; raised before any task launches.
    #[error("failed to create working directory {}: {source}", path.display())]
    DirectorySetup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory listing or file read failed while hashing.
    #[error("failed to digest {}: {source}", path.display())]
    Digest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Working directory could not be removed after the run.
    #[error("failed to remove working directory {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("task count must be at least 1")]
    InvalidTaskCount,

    #[error("source URL must not be empty")]
    InvalidUrl,

    /// A fetch task or blocking transfer panicked.
    #[error("task join: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl FetchError {
    pub(crate) fn transport(url: &str, source: curl::Error) -> Self {
        FetchError::Transport {
            url: url.to_string(),
            source,
        }
    }

    /// True for network-level failures (probe or retrieval).
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }

    /// True for failures to create or write a downloaded artifact.
    pub fn is_persistence(&self) -> bool {
        matches!(self, FetchError::Persistence { .. })
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
