//! Launch N fetch tasks against one URL and join on all of them.
//!
//! Every task runs to completion or failure; siblings are never cancelled and
//! partial writes are never rolled back. When tasks fail, the error of the
//! lowest-indexed failing task is returned after all tasks have finished.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::artifact::artifact_file_name;
use crate::error::{FetchError, FetchResult};
use crate::fetcher::{fetch_head_content, FetchOutcome};
use crate::transport::Transport;

/// One concurrent fetch slot. Lives for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    /// 1-based ordinal among the launched tasks.
    pub index: usize,
    pub url: String,
    pub output_dir: PathBuf,
    /// Name fragment derived from the index; makes artifact names distinct.
    pub fragment: String,
}

impl FetchTask {
    pub fn new(index: usize, url: &str, output_dir: &Path) -> Self {
        Self {
            index,
            url: url.to_string(),
            output_dir: output_dir.to_path_buf(),
            fragment: index.to_string(),
        }
    }

    /// Name of the artifact this task writes if it is not skipped.
    pub fn file_name(&self) -> String {
        artifact_file_name(&self.url, &self.fragment)
    }
}

/// Terminal state of a task that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub index: usize,
    pub outcome: FetchOutcome,
}

/// Tasks `1..=count` for `url`, all writing into `output_dir`.
pub fn plan_tasks(url: &str, output_dir: &Path, count: usize) -> Vec<FetchTask> {
    (1..=count)
        .map(|index| FetchTask::new(index, url, output_dir))
        .collect()
}

/// Runs `task_count` fetches of `url` concurrently into `work_dir` and waits
/// for every one of them. Reports are ordered by task index.
pub async fn fetch_all<T>(
    transport: Arc<T>,
    url: &str,
    work_dir: &Path,
    task_count: usize,
) -> FetchResult<Vec<TaskReport>>
where
    T: Transport + ?Sized + 'static,
{
    if url.trim().is_empty() {
        return Err(FetchError::InvalidUrl);
    }
    if task_count == 0 {
        return Err(FetchError::InvalidTaskCount);
    }

    tracing::debug!("launching {} fetch tasks for {}", task_count, url);
    run_tasks(plan_tasks(url, work_dir, task_count), move |task| {
        let transport = Arc::clone(&transport);
        async move {
            fetch_head_content(&*transport, &task.url, &task.output_dir, &task.fragment).await
        }
    })
    .await
}

/// Spawns `fetch(task)` for every task on one `JoinSet` and joins on all of
/// them. Reports are ordered by task index; on failure the lowest-indexed
/// error is returned once every task has finished.
pub(crate) async fn run_tasks<F, Fut>(
    tasks: Vec<FetchTask>,
    fetch: F,
) -> FetchResult<Vec<TaskReport>>
where
    F: Fn(FetchTask) -> Fut,
    Fut: Future<Output = FetchResult<FetchOutcome>> + Send + 'static,
{
    let mut join_set = JoinSet::new();
    for task in tasks {
        let index = task.index;
        tracing::debug!(
            "fetch task {} -> {}",
            index,
            task.output_dir.join(task.file_name()).display()
        );
        let fut = fetch(task);
        join_set.spawn(async move { (index, fut.await) });
    }

    let mut reports = Vec::with_capacity(join_set.len());
    let mut failures = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, Ok(outcome))) => {
                tracing::debug!("fetch task {} finished: {:?}", index, outcome);
                reports.push(TaskReport { index, outcome });
            }
            Ok((index, Err(e))) => {
                tracing::error!("fetch task {} failed: {}", index, e);
                failures.push((index, e));
            }
            Err(e) => {
                tracing::error!("fetch task join: {}", e);
                failures.push((usize::MAX, FetchError::TaskJoin(e)));
            }
        }
    }

    if let Some(err) = lowest_index_failure(failures) {
        return Err(err);
    }
    reports.sort_by_key(|r| r.index);
    Ok(reports)
}

fn lowest_index_failure(failures: Vec<(usize, FetchError)>) -> Option<FetchError> {
    failures
        .into_iter()
        .min_by_key(|(index, _)| *index)
        .map(|(_, err)| err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::fake::{fetch_failing_task, FakeTransport};
    use crate::transport::{BodyStream, ProbeResult};
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::sync::Barrier;

    const URL: &str = "https://example.test/repo";

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn plan_is_one_based() {
        let tasks = plan_tasks(URL, Path::new("./tmp"), 3);
        let fragments: Vec<_> = tasks.iter().map(|t| t.fragment.as_str()).collect();
        assert_eq!(fragments, ["1", "2", "3"]);
        assert_eq!(tasks[2].file_name(), "repo_3");
    }

    #[tokio::test]
    async fn three_tasks_write_three_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::serving(vec![b"head".to_vec()]));

        let reports = fetch_all(Arc::clone(&transport), URL, dir.path(), 3)
            .await
            .unwrap();

        assert_eq!(reports.iter().map(|r| r.index).collect::<Vec<_>>(), [1, 2, 3]);
        assert!(reports.iter().all(|r| !r.outcome.is_skipped()));
        assert_eq!(names_in(dir.path()), ["repo_1", "repo_2", "repo_3"]);
        assert_eq!(transport.probes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn advertised_length_skips_every_task() {
        let dir = tempfile::tempdir().unwrap();
        let transport =
            Arc::new(FakeTransport::serving(vec![b"head".to_vec()]).with_content_length("4"));

        let reports = fetch_all(transport, URL, dir.path(), 3).await.unwrap();

        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.outcome.is_skipped()));
        assert!(names_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn one_failed_retrieval_fails_batch_but_siblings_finish() {
        let dir = tempfile::tempdir().unwrap();
        let transport =
            Arc::new(FakeTransport::serving(vec![b"head".to_vec()]).failing_retrieve(2));

        let err = fetch_all(Arc::clone(&transport), URL, dir.path(), 3)
            .await
            .unwrap_err();

        assert!(err.is_transport(), "unexpected error: {err}");
        assert_eq!(transport.retrieves.load(Ordering::SeqCst), 3);
        assert_eq!(names_in(dir.path()).len(), 2);
    }

    #[tokio::test]
    async fn task_two_failure_leaves_tasks_one_and_three_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let tasks = plan_tasks(URL, dir.path(), 3);

        let err = run_tasks(tasks, fetch_failing_task(2, b"head".to_vec()))
            .await
            .unwrap_err();

        assert!(err.is_transport(), "unexpected error: {err}");
        assert_eq!(names_in(dir.path()), ["repo_1", "repo_3"]);
        assert_eq!(std::fs::read(dir.path().join("repo_1")).unwrap(), b"head");
        assert_eq!(std::fs::read(dir.path().join("repo_3")).unwrap(), b"head");
    }

    /// HEAD blocks until every task has reached it.
    struct BarrierTransport(Barrier);

    #[async_trait]
    impl Transport for BarrierTransport {
        async fn probe(&self, _url: &str) -> FetchResult<ProbeResult> {
            self.0.wait().await;
            Ok(ProbeResult::new(200, Vec::new()))
        }

        async fn retrieve(&self, _url: &str) -> FetchResult<BodyStream> {
            Ok(BodyStream::from_chunks(vec![Ok(b"head".to_vec())]))
        }
    }

    #[tokio::test]
    async fn tasks_run_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(BarrierTransport(Barrier::new(3)));

        // Run one at a time and the first probe waits forever.
        let reports = tokio::time::timeout(
            Duration::from_secs(5),
            fetch_all(transport, URL, dir.path(), 3),
        )
        .await
        .expect("fetch tasks did not overlap")
        .unwrap();

        assert_eq!(reports.len(), 3);
        assert_eq!(names_in(dir.path()), ["repo_1", "repo_2", "repo_3"]);
    }

    #[tokio::test]
    async fn zero_tasks_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::serving(Vec::new()));
        let err = fetch_all(transport, URL, dir.path(), 0).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidTaskCount));
    }

    #[tokio::test]
    async fn empty_url_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::serving(Vec::new()));
        let err = fetch_all(transport, "  ", dir.path(), 3).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl));
    }

    #[test]
    fn lowest_index_error_wins() {
        let failures = vec![
            (3, FetchError::InvalidUrl),
            (2, FetchError::transport(URL, curl::Error::new(7))),
            (usize::MAX, FetchError::InvalidTaskCount),
        ];
        let err = lowest_index_failure(failures).unwrap();
        assert!(err.is_transport());
        assert!(lowest_index_failure(Vec::new()).is_none());
    }
}
