//! `headfetch digest` – SHA-256 records for a directory or a file.

use anyhow::{Context, Result};
use headfetch_core::digest::{self, DigestOrder, DigestRecord};
use std::path::{Path, PathBuf};

pub async fn run_digest(path: &Path, sorted: bool) -> Result<()> {
    let order = if sorted {
        DigestOrder::Sorted
    } else {
        DigestOrder::Listing
    };
    let path: PathBuf = path.to_path_buf();
    let records = tokio::task::spawn_blocking(move || collect(&path, order))
        .await
        .context("digest task join")??;
    for record in records {
        println!("{}", record);
    }
    Ok(())
}

fn collect(path: &Path, order: DigestOrder) -> Result<Vec<DigestRecord>> {
    if path.is_dir() {
        return Ok(digest::folder_digests(path, order)?);
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(vec![DigestRecord {
        file_name,
        hex_digest: digest::sha256_path(path)?,
    }])
}
