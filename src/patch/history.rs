use crate::core::dirs::workspace_state_directory;
use crate::core::error::{PatchWardenError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

/// One apply attempt, successful or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchHistoryEntry {
    pub file_path: String,
    pub rule_id: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Bounded, persisted log of apply attempts; the oldest entries fall off first
#[derive(Debug)]
pub struct PatchHistory {
    backing_file: Option<PathBuf>,
    capacity: usize,
    entries: VecDeque<PatchHistoryEntry>,
}

impl PatchHistory {
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            backing_file: None,
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> Result<Self> {
        let path = path.into();
        let mut history = Self {
            backing_file: Some(path.clone()),
            ..Self::in_memory(capacity)
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| PatchWardenError::cache_read_failed(&path, e))?;
            let mut entries: VecDeque<PatchHistoryEntry> = serde_json::from_str(&content)
                .map_err(|e| PatchWardenError::cache_parse_failed(&path, e))?;
            while entries.len() > history.capacity {
                entries.pop_front();
            }
            history.entries = entries;
        }

        Ok(history)
    }

    pub fn open_for_workspace(workspace_root: &Path, capacity: usize) -> Result<Self> {
        Self::open(
            workspace_state_directory(workspace_root)?.join("history.json"),
            capacity,
        )
    }

    pub fn record(&mut self, entry: PatchHistoryEntry) -> Result<()> {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.persist()
    }

    /// Oldest first
    pub fn entries(&self) -> impl Iterator<Item = &PatchHistoryEntry> {
        self.entries.iter()
    }

    /// Newest first, at most `limit`
    pub fn recent(&self, limit: usize) -> Vec<&PatchHistoryEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.backing_file else {
            return Ok(());
        };

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| PatchWardenError::cache_directory_creation_failed(dir, e))?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(PatchWardenError::cache_serialization_failed)?;
        std::fs::write(path, json).map_err(|e| {
            log::error!("Failed to write patch history '{}': {}", path.display(), e);
            PatchWardenError::cache_write_failed(path, e)
        })
    }
}
