//! Per-resource fetch: probe, then conditionally retrieve and persist.

use std::path::{Path, PathBuf};

use crate::artifact::artifact_file_name;
use crate::error::FetchResult;
use crate::transport::Transport;
use crate::writer::write_body;

/// What a single fetch ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Probe advertised `Content-Length`; nothing was retrieved or written.
    Skipped,
    /// Body persisted to `path`.
    Written { path: PathBuf, bytes: u64 },
}

impl FetchOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, FetchOutcome::Skipped)
    }
}

/// Fetches the head content of `url` into `output_dir`.
///
/// A HEAD probe runs first. If its response carries `Content-Length` the
/// resource is treated as already described by its headers and the fetch is a
/// no-op. Otherwise the body is retrieved with GET and streamed to
/// `<last url segment>_<fragment>`. Transport errors propagate unmodified.
pub async fn fetch_head_content<T>(
    transport: &T,
    url: &str,
    output_dir: &Path,
    fragment: &str,
) -> FetchResult<FetchOutcome>
where
    T: Transport + ?Sized,
{
    let probe = transport.probe(url).await?;
    if !probe.is_success() {
        tracing::warn!("HEAD {} returned HTTP {}", url, probe.status);
    }
    if probe.has_content_length() {
        tracing::debug!(
            "skipping {} (fragment {}): Content-Length {:?} advertised",
            url,
            fragment,
            probe.header("content-length")
        );
        return Ok(FetchOutcome::Skipped);
    }

    let file_name = artifact_file_name(url, fragment);
    let mut body = transport.retrieve(url).await?;
    let bytes = write_body(&mut body, output_dir, &file_name).await?;
    Ok(FetchOutcome::Written {
        path: output_dir.join(file_name),
        bytes,
    })
}
