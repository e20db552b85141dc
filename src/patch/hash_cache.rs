//! Persistent map from absolute file path to the SHA-256 of its last known content.
//!
//! The baseline is recorded at scan time and refreshed by the applier after every
//! successful write. Every [`FileHashCache::set`] is flushed to disk before it
//! returns, so a subsequent validation never reads a baseline that was not durable.
//!
//! # Cache Strategy
//! - **JSON serialization**: human-readable cache file for debugging
//! - **Atomic replace**: written to a temp file, synced, then renamed into place
//! - **Workspace isolation**: one cache per workspace root (see [`workspace_state_directory`])

use crate::core::dirs::workspace_state_directory;
use crate::core::error::{PatchWardenError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

const CACHE_VERSION: u32 = 1;

/// Lowercase hex SHA-256 digest of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct HashCacheDocument {
    version: u32,
    last_updated: DateTime<Utc>,
    file_hashes: BTreeMap<PathBuf, String>,
}

#[derive(Debug)]
pub struct FileHashCache {
    backing_file: Option<PathBuf>,
    document: HashCacheDocument,
}

impl FileHashCache {
    /// Cache that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            backing_file: None,
            document: HashCacheDocument {
                version: CACHE_VERSION,
                last_updated: Utc::now(),
                file_hashes: BTreeMap::new(),
            },
        }
    }

    /// Open the cache stored at `path`, starting empty when the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            log::debug!("No hash cache at {}, starting empty", path.display());
            return Ok(Self {
                backing_file: Some(path),
                ..Self::in_memory()
            });
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| PatchWardenError::cache_read_failed(&path, e))?;
        let document: HashCacheDocument = serde_json::from_str(&content)
            .map_err(|e| PatchWardenError::cache_parse_failed(&path, e))?;

        log::debug!(
            "Loaded {} file hashes from {}",
            document.file_hashes.len(),
            path.display()
        );

        Ok(Self {
            backing_file: Some(path),
            document,
        })
    }

    /// Open the cache belonging to `workspace_root`
    pub fn open_for_workspace(workspace_root: &Path) -> Result<Self> {
        Self::open(workspace_state_directory(workspace_root)?.join("hashes.json"))
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.document.file_hashes.get(path).map(String::as_str)
    }

    pub fn set(&mut self, path: impl Into<PathBuf>, digest: impl Into<String>) -> Result<()> {
        self.document.file_hashes.insert(path.into(), digest.into());
        self.document.last_updated = Utc::now();
        self.persist()
    }

    /// Hash `content` and record it as the baseline for `path`
    pub fn record_content(&mut self, path: impl Into<PathBuf>, content: &[u8]) -> Result<String> {
        let digest = sha256_hex(content);
        self.set(path, digest.clone())?;
        Ok(digest)
    }

    pub fn all_entries(&self) -> &BTreeMap<PathBuf, String> {
        &self.document.file_hashes
    }

    pub fn len(&self) -> usize {
        self.document.file_hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.file_hashes.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.backing_file else {
            return Ok(());
        };

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                log::error!("Failed to create cache directory '{}': {}", dir.display(), e);
                PatchWardenError::cache_directory_creation_failed(dir, e)
            })?;
        }

        let json = serde_json::to_string_pretty(&self.document).map_err(|e| {
            log::error!("Failed to serialize hash cache: {e}");
            PatchWardenError::cache_serialization_failed(e)
        })?;

        let tmp_path = path.with_extension("json.tmp");
        let write_tmp = || -> std::io::Result<()> {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            std::fs::rename(&tmp_path, path)
        };

        write_tmp().map_err(|e| {
            log::error!("Failed to write hash cache '{}': {}", path.display(), e);
            PatchWardenError::cache_write_failed(path, e)
        })?;

        log::debug!(
            "Persisted {} file hashes to {}",
            self.document.file_hashes.len(),
            path.display()
        );
        Ok(())
    }
}
