use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::digest::DigestOrder;
use crate::transport::DEFAULT_CHUNK_SIZE;
use crate::workdir::CleanupPolicy;

/// Repository whose head content is fetched when nothing else is configured.
pub const DEFAULT_URL: &str = "https://gitea.radium.group/radium/project-configuration";

/// Global configuration loaded from `~/.config/headfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadfetchConfig {
    /// Resource every task fetches.
    pub url: String,
    /// Directory artifacts are written to; created before and removed after a run.
    pub work_dir: PathBuf,
    /// Number of concurrent fetch tasks (indices start at 1).
    pub task_count: usize,
    /// Body chunk size in bytes.
    pub chunk_size: usize,
    /// "listing" (directory order) or "sorted".
    pub digest_order: DigestOrder,
    /// "on_success" (keep artifacts when a run fails) or "always".
    pub cleanup: CleanupPolicy,
    /// Chunks buffered between a transfer thread and the file writer. None = library default.
    pub channel_capacity: Option<usize>,
}

impl Default for HeadfetchConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            work_dir: PathBuf::from("tmp"),
            task_count: 3,
            chunk_size: DEFAULT_CHUNK_SIZE,
            digest_order: DigestOrder::Listing,
            cleanup: CleanupPolicy::OnSuccess,
            channel_capacity: None,
        }
    }
}

impl HeadfetchConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            anyhow::bail!("url must not be empty");
        }
        if self.task_count == 0 {
            anyhow::bail!("task_count must be at least 1");
        }
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be at least 1");
        }
        if self.channel_capacity == Some(0) {
            anyhow::bail!("channel_capacity must be at least 1 when set");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("headfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HeadfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HeadfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load configuration from an explicit file. Missing keys take defaults.
pub fn load_from(path: &Path) -> Result<HeadfetchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: HeadfetchConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
