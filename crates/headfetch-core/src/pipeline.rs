//! One complete run: prepare the working directory, fetch concurrently,
//! digest what landed on disk, report, clean up.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::HeadfetchConfig;
use crate::coordinator::{self, TaskReport};
use crate::digest::{self, DigestRecord};
use crate::error::FetchResult;
use crate::report::{self, DigestSink};
use crate::transport::{CurlTransport, Transport};
use crate::workdir::WorkDir;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub tasks: Vec<TaskReport>,
    pub records: Vec<DigestRecord>,
}

impl RunSummary {
    pub fn skipped(&self) -> usize {
        self.tasks.iter().filter(|t| t.outcome.is_skipped()).count()
    }

    pub fn written(&self) -> usize {
        self.tasks.len() - self.skipped()
    }
}

/// libcurl transport configured from `cfg`.
pub fn curl_transport(cfg: &HeadfetchConfig) -> CurlTransport {
    let transport = CurlTransport::new(cfg.chunk_size);
    match cfg.channel_capacity {
        Some(n) => transport.with_channel_capacity(n),
        None => transport,
    }
}

/// Runs the whole pipeline for `cfg`.
///
/// The working directory is removed only after every digest has been
/// emitted. On failure it is kept unless `cfg.cleanup` is
/// [`CleanupPolicy::Always`](crate::workdir::CleanupPolicy::Always).
pub async fn run<T, S>(
    transport: Arc<T>,
    cfg: &HeadfetchConfig,
    sink: &mut S,
) -> FetchResult<RunSummary>
where
    T: Transport + ?Sized + 'static,
    S: DigestSink + ?Sized,
{
    let url = cfg.url.clone();
    let task_count = cfg.task_count;
    run_with(cfg, sink, move |work_dir| async move {
        coordinator::fetch_all(transport, &url, &work_dir, task_count).await
    })
    .await
}

/// Pipeline around an arbitrary fetch stage, given the working directory.
async fn run_with<S, F, Fut>(
    cfg: &HeadfetchConfig,
    sink: &mut S,
    fetch: F,
) -> FetchResult<RunSummary>
where
    S: DigestSink + ?Sized,
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = FetchResult<Vec<TaskReport>>>,
{
    let work_dir = WorkDir::create(&cfg.work_dir, cfg.cleanup)?;

    let tasks = fetch(work_dir.path().to_path_buf()).await?;
    let skipped = tasks.iter().filter(|t| t.outcome.is_skipped()).count();
    tracing::debug!("fetch batch done: {} written, {} skipped", tasks.len() - skipped, skipped);

    let dir = work_dir.path().to_path_buf();
    let order = cfg.digest_order;
    let records =
        tokio::task::spawn_blocking(move || digest::folder_digests(&dir, order)).await??;

    report::emit_all(&records, sink);
    work_dir.remove()?;

    Ok(RunSummary { tasks, records })
}
