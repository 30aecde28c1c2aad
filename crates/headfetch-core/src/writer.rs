//! Streams a response body to disk chunk by chunk.

use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{FetchError, FetchResult};
use crate::transport::BodyStream;

/// Writes every chunk of `body`, in order, to `output_dir/file_name`,
/// truncating any existing file. Returns the number of bytes written.
///
/// Create/write/flush failures become [`FetchError::Persistence`]. A transport
/// error yielded by the stream is returned as-is; the partial file stays on disk.
/// The file is flushed and closed before this returns.
pub async fn write_body(
    body: &mut BodyStream,
    output_dir: &Path,
    file_name: &str,
) -> FetchResult<u64> {
    let path = output_dir.join(file_name);
    let mut file = File::create(&path)
        .await
        .map_err(|e| persistence(&path, e))?;

    let mut written = 0u64;
    let mut interrupted = None;
    while let Some(chunk) = body.next_chunk().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                interrupted = Some(e);
                break;
            }
        };
        file.write_all(&chunk)
            .await
            .map_err(|e| persistence(&path, e))?;
        written += chunk.len() as u64;
    }

    // Flush even when interrupted so the partial file is settled before we return.
    file.flush().await.map_err(|e| persistence(&path, e))?;
    drop(file);

    if let Some(e) = interrupted {
        tracing::warn!("body for {} interrupted after {} bytes", path.display(), written);
        return Err(e);
    }

    tracing::debug!("wrote {} bytes to {}", written, path.display());
    Ok(written)
}

fn persistence(path: &Path, source: std::io::Error) -> FetchError {
    FetchError::Persistence {
        path: PathBuf::from(path),
        source,
    }
}
