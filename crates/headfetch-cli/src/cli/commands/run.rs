//! `headfetch run` – the full fetch, digest and cleanup pipeline.

use anyhow::{Context, Result};
use headfetch_core::config::HeadfetchConfig;
use headfetch_core::digest::DigestOrder;
use headfetch_core::pipeline;
use headfetch_core::report::TracingSink;
use headfetch_core::workdir::CleanupPolicy;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub url: Option<String>,
    pub work_dir: Option<PathBuf>,
    pub tasks: Option<usize>,
    pub chunk_size: Option<usize>,
    pub sorted: bool,
    pub always_cleanup: bool,
}

impl RunOverrides {
    pub fn apply(self, cfg: &mut HeadfetchConfig) {
        if let Some(url) = self.url {
            cfg.url = url;
        }
        if let Some(dir) = self.work_dir {
            cfg.work_dir = dir;
        }
        if let Some(n) = self.tasks {
            cfg.task_count = n;
        }
        if let Some(n) = self.chunk_size {
            cfg.chunk_size = n;
        }
        if self.sorted {
            cfg.digest_order = DigestOrder::Sorted;
        }
        if self.always_cleanup {
            cfg.cleanup = CleanupPolicy::Always;
        }
    }
}

pub async fn run_pipeline(cfg: &HeadfetchConfig) -> Result<()> {
    cfg.validate().context("invalid configuration")?;
    tracing::info!(
        "fetching {} with {} task(s) into {}",
        cfg.url,
        cfg.task_count,
        cfg.work_dir.display()
    );

    let transport = Arc::new(pipeline::curl_transport(cfg));
    let mut sink = TracingSink;
    let summary = pipeline::run(transport, cfg, &mut sink)
        .await
        .with_context(|| format!("run for {}", cfg.url))?;

    tracing::info!(
        "done: {} written, {} skipped, {} digest(s)",
        summary.written(),
        summary.skipped(),
        summary.records.len()
    );
    Ok(())
}
