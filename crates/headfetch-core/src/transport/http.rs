//! libcurl-backed transport.
//!
//! Each request runs a blocking `curl::easy::Easy` transfer on tokio's
//! blocking pool. Body bytes are split into `chunk_size` pieces and handed to
//! the async reader through a bounded channel, so memory use stays bounded by
//! `chunk_size * channel_capacity` regardless of body size.

use async_trait::async_trait;
use curl::easy::Easy;
use std::str;
use tokio::sync::oneshot;

use super::parse::{is_status_line, parse_header_lines};
use super::{BodySender, BodyStream, ProbeResult, Transport};
use super::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_CHUNK_SIZE};
use crate::error::{FetchError, FetchResult};

/// Transport using libcurl easy handles. Follows redirects; no timeouts are
/// set beyond libcurl's defaults.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    chunk_size: usize,
    channel_capacity: usize,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl CurlTransport {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

#[async_trait]
impl Transport for CurlTransport {
    async fn probe(&self, url: &str) -> FetchResult<ProbeResult> {
        let url = url.to_string();
        tokio::task::spawn_blocking(move || head_blocking(&url)).await?
    }

    async fn retrieve(&self, url: &str) -> FetchResult<BodyStream> {
        let (tx, body) = BodyStream::channel(self.channel_capacity);
        let (ready_tx, ready_rx) = oneshot::channel();
        let url = url.to_string();
        let chunk_size = self.chunk_size;
        let worker =
            tokio::task::spawn_blocking(move || get_blocking(&url, chunk_size, &tx, ready_tx));

        // Connection-level failures surface here, before the caller opens a file.
        match ready_rx.await {
            Ok(Ok(())) => Ok(body.with_worker(worker)),
            Ok(Err(e)) => Err(e),
            // Ready sender dropped unused: the worker died before the response began.
            Err(_) => match worker.await {
                Ok(()) => Ok(body),
                Err(e) => Err(FetchError::TaskJoin(e)),
            },
        }
    }
}

fn head_blocking(url: &str) -> FetchResult<ProbeResult> {
    let mut lines: Vec<String> = Vec::new();
    let mut easy = Easy::new();
    perform_head(&mut easy, url, &mut lines).map_err(|e| FetchError::transport(url, e))?;
    let status = easy
        .response_code()
        .map_err(|e| FetchError::transport(url, e))?;
    tracing::debug!("HEAD {} -> {} ({} header lines)", url, status, lines.len());
    Ok(ProbeResult::new(status, parse_header_lines(&lines)))
}

fn perform_head(easy: &mut Easy, url: &str, lines: &mut Vec<String>) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.nobody(true)?; // HEAD request
    easy.follow_location(true)?;

    let mut transfer = easy.transfer();
    transfer.header_function(|data| {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            // Only the final response of a redirect chain counts.
            if is_status_line(line) {
                lines.clear();
            }
            lines.push(line.to_string());
        }
        true
    })?;
    transfer.perform()
}

fn get_blocking(
    url: &str,
    chunk_size: usize,
    tx: &BodySender,
    ready: oneshot::Sender<FetchResult<()>>,
) {
    let mut ready = Some(ready);
    let mut easy = Easy::new();

    match perform_get(&mut easy, url, chunk_size, tx, &mut ready) {
        Ok(()) => {
            if let Some(ready) = ready.take() {
                let _ = ready.send(Ok(()));
            }
            match easy.response_code() {
                Ok(code) if !(200..300).contains(&code) => {
                    tracing::warn!("GET {} returned HTTP {}; body kept as received", url, code);
                }
                Ok(code) => tracing::debug!("GET {} -> {}", url, code),
                Err(e) => tracing::warn!("GET {}: no response code: {}", url, e),
            }
        }
        Err(e) => {
            let err = FetchError::transport(url, e);
            match ready.take() {
                Some(ready) => {
                    let _ = ready.send(Err(err));
                }
                // Reader already has the stream; a closed receiver means it gave up.
                None => {
                    let _ = tx.blocking_send(Err(err));
                }
            }
        }
    }
}

fn perform_get(
    easy: &mut Easy,
    url: &str,
    chunk_size: usize,
    tx: &BodySender,
    ready: &mut Option<oneshot::Sender<FetchResult<()>>>,
) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;

    let mut transfer = easy.transfer();
    transfer.write_function(|data| {
        if let Some(ready) = ready.take() {
            let _ = ready.send(Ok(()));
        }
        for piece in data.chunks(chunk_size) {
            if tx.blocking_send(Ok(piece.to_vec())).is_err() {
                return Ok(0); // reader dropped: abort transfer
            }
        }
        Ok(data.len())
    })?;
    transfer.perform()
}
