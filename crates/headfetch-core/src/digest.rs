//! SHA-256 digests of downloaded artifacts.
//!
//! Runs after every fetch task has finished, never inline with the download
//! path. Files are read in fixed-size blocks so memory use stays bounded.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{FetchError, FetchResult};

const BUF_SIZE: usize = 64 * 1024;

/// Order in which directory records are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestOrder {
    /// Whatever order the platform's directory listing yields.
    #[default]
    Listing,
    /// Lexicographic by file name.
    Sorted,
}

/// A file name paired with its lowercase hex SHA-256.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestRecord {
    pub file_name: String,
    pub hex_digest: String,
}

impl fmt::Display for DigestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_name, self.hex_digest)
    }
}

/// Compute SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> FetchResult<String> {
    let err = |source| FetchError::Digest {
        path: path.to_path_buf(),
        source,
    };
    let mut f = File::open(path).map_err(err)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f.read(&mut buf).map_err(err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// One record per regular file directly inside `dir`.
///
/// Symlinks are followed: a link to a regular file is hashed, a link to a
/// directory is skipped like any other non-file entry.
pub fn folder_digests(dir: &Path, order: DigestOrder) -> FetchResult<Vec<DigestRecord>> {
    let listing_err = |source| FetchError::Digest {
        path: dir.to_path_buf(),
        source,
    };

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).map_err(listing_err)? {
        let entry = entry.map_err(listing_err)?;
        let path = entry.path();
        // A dangling symlink has no metadata; it is not a regular file.
        let is_file = fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        files.push((entry.file_name().to_string_lossy().into_owned(), path));
    }

    if order == DigestOrder::Sorted {
        files.sort_by(|a, b| a.0.cmp(&b.0));
    }

    files
        .into_iter()
        .map(|(file_name, path)| -> FetchResult<DigestRecord> {
            Ok(DigestRecord {
                hex_digest: sha256_path(&path)?,
                file_name,
            })
        })
        .collect()
}
