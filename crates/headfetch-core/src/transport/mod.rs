//! HTTP capability used by the fetcher.
//!
//! The fetcher only needs two operations: a metadata probe (HEAD) and a body
//! retrieval (GET) delivered as an ordered stream of byte chunks. Keeping the
//! seam this narrow lets tests swap in a scripted transport.

mod http;
mod parse;

pub use http::CurlTransport;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{FetchError, FetchResult};

/// Default body chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default number of chunks buffered between a blocking transfer and its reader.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Minimal HTTP surface: probe headers, retrieve a body stream.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a HEAD request and return the final response's status and headers.
    async fn probe(&self, url: &str) -> FetchResult<ProbeResult>;

    /// Issue a GET request. Returns once the response has started; body chunks
    /// arrive through the stream in order.
    async fn retrieve(&self, url: &str) -> FetchResult<BodyStream>;
}

/// Response metadata from a HEAD probe.
#[derive(Debug, Clone, Default)]
pub struct ProbeResult {
    pub status: u32,
    headers: Vec<(String, String)>,
}

impl ProbeResult {
    pub fn new(status: u32, headers: Vec<(String, String)>) -> Self {
        Self { status, headers }
    }

    /// First value for `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// True if the response advertised `Content-Length`, whatever its value.
    pub fn has_content_length(&self) -> bool {
        self.header("content-length").is_some()
    }

    /// Parsed `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")?.parse().ok()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sending half of a body stream.
pub type BodySender = mpsc::Sender<FetchResult<Vec<u8>>>;

/// Ordered byte chunks of a response body. A transport failure mid-body is
/// delivered as an `Err` item, after which the stream ends. If the producing
/// worker panicked, that is reported as a final `TaskJoin` item.
#[derive(Debug)]
pub struct BodyStream {
    rx: mpsc::Receiver<FetchResult<Vec<u8>>>,
    worker: Option<JoinHandle<()>>,
}

impl BodyStream {
    /// Bounded channel pair; `capacity` chunks may be in flight at once.
    pub fn channel(capacity: usize) -> (BodySender, BodyStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, BodyStream { rx, worker: None })
    }

    /// Stream that yields the given items then ends.
    pub fn from_chunks(chunks: Vec<FetchResult<Vec<u8>>>) -> Self {
        let (tx, stream) = Self::channel(chunks.len());
        for chunk in chunks {
            if tx.try_send(chunk).is_err() {
                break;
            }
        }
        stream
    }

    /// Ties the stream to the task feeding its sender; the body only counts
    /// as complete once that task has exited cleanly.
    pub(crate) fn with_worker(mut self, worker: JoinHandle<()>) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Next chunk, or `None` once the body is complete.
    pub async fn next_chunk(&mut self) -> Option<FetchResult<Vec<u8>>> {
        if let Some(chunk) = self.rx.recv().await {
            return Some(chunk);
        }
        // Sender dropped: either the transfer finished or its worker panicked.
        match self.worker.take()?.await {
            Ok(()) => None,
            Err(e) => Some(Err(FetchError::TaskJoin(e))),
        }
    }
}
