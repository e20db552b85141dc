//! Bounded LIFO log of applied patches.
//!
//! Each entry snapshots a file's full content taken just before a patch was
//! written. Once more than `capacity` newer patches have been applied the oldest
//! entry is evicted and that patch can no longer be reverted.
//!
//! `push` and `pop` go through one mutex, so they are atomic with respect to each
//! other. Every failed undo puts the popped entry back, except when the file no
//! longer exists: there is nothing left to restore, so that entry is dropped.

use crate::core::editor::TextEditor;
use crate::core::error::{PatchWardenError, Result};
use crate::core::fs::FileSystem;
use crate::core::prompt::Confirm;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_CAPACITY: usize = 50;
pub const ROLLBACK_ANYWAY: &str = "Rollback Anyway";
pub const CANCEL: &str = "Cancel";

/// Characters of the inserted text that must still be found for an undo to be clean
const PROBE_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackEntry {
    pub file_path: PathBuf,
    pub original_content: String,
    pub patched_code: String,
    pub timestamp: DateTime<Utc>,
    pub rule_id: String,
}

impl RollbackEntry {
    /// Whether the text this entry inserted is still present in `current`
    pub fn patch_still_present(&self, current: &str) -> bool {
        let probe: String = self.patched_code.trim().chars().take(PROBE_CHARS).collect();
        current.contains(&probe)
    }
}

#[derive(Debug)]
pub struct UndoResult {
    pub success: bool,
    pub entry: Option<RollbackEntry>,
    pub error: Option<PatchWardenError>,
}

impl UndoResult {
    fn restored(entry: RollbackEntry) -> Self {
        Self {
            success: true,
            entry: Some(entry),
            error: None,
        }
    }

    fn failed(entry: Option<RollbackEntry>, error: PatchWardenError) -> Self {
        Self {
            success: false,
            entry,
            error: Some(error),
        }
    }
}

pub struct RollbackStack {
    capacity: usize,
    entries: Mutex<VecDeque<RollbackEntry>>,
    fs: Arc<dyn FileSystem>,
    editor: Arc<dyn TextEditor>,
    confirm: Arc<dyn Confirm>,
}

impl RollbackStack {
    pub fn new(
        capacity: usize,
        fs: Arc<dyn FileSystem>,
        editor: Arc<dyn TextEditor>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            fs,
            editor,
            confirm,
        }
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<RollbackEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Push on top; returns the evicted bottom entry when over capacity
    pub fn push(&self, entry: RollbackEntry) -> Option<RollbackEntry> {
        let mut entries = self.entries();
        entries.push_back(entry);
        if entries.len() > self.capacity {
            let evicted = entries.pop_front();
            if let Some(old) = &evicted {
                log::debug!(
                    "Rollback stack full, evicted patch for rule {} on {}",
                    old.rule_id,
                    old.file_path.display()
                );
            }
            return evicted;
        }
        None
    }

    pub fn pop(&self) -> Option<RollbackEntry> {
        self.entries().pop_back()
    }

    pub fn peek(&self) -> Option<RollbackEntry> {
        self.entries().back().cloned()
    }

    pub fn size(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Revert the most recently applied patch.
    ///
    /// If the inserted text can no longer be found in the file the user is asked
    /// whether to roll back anyway; declining leaves the stack unchanged.
    pub fn undo_last(&self) -> UndoResult {
        let Some(entry) = self.pop() else {
            return UndoResult::failed(None, PatchWardenError::NothingToUndo);
        };

        if !self.fs.exists(&entry.file_path) {
            log::warn!(
                "Dropping rollback entry for {}: file no longer exists",
                entry.file_path.display()
            );
            let error = PatchWardenError::file_not_found(&entry.file_path);
            return UndoResult::failed(Some(entry), error);
        }

        let current = match self.fs.read_text(&entry.file_path) {
            Ok(current) => current,
            Err(e) => return self.restore_on_failure(entry, e),
        };

        if !entry.patch_still_present(&current) {
            let answer = self.confirm.ask(
                "File has been modified since patch was applied. Rollback may cause conflicts.",
                &[ROLLBACK_ANYWAY, CANCEL],
            );
            if answer.as_deref() != Some(ROLLBACK_ANYWAY) {
                log::info!(
                    "Rollback of rule {} on {} cancelled",
                    entry.rule_id,
                    entry.file_path.display()
                );
                return self.restore_on_failure(entry, PatchWardenError::UndoCancelled);
            }
        }

        if let Err(e) = self.write_original(&entry) {
            return self.restore_on_failure(entry, e);
        }

        log::info!(
            "Rolled back patch for rule {} on {}",
            entry.rule_id,
            entry.file_path.display()
        );
        UndoResult::restored(entry)
    }

    /// Restore `entry` without the staleness prompt. Used when an apply fails
    /// after the document may already have changed.
    pub fn auto_restore(&self, entry: &RollbackEntry) -> bool {
        match self.write_original(entry) {
            Ok(()) => true,
            Err(e) => {
                log::error!(
                    "Automatic restore of {} failed: {e}",
                    entry.file_path.display()
                );
                false
            }
        }
    }

    fn write_original(&self, entry: &RollbackEntry) -> Result<()> {
        if !self
            .editor
            .replace_contents(&entry.file_path, &entry.original_content)?
        {
            return Err(PatchWardenError::edit_rejected(&entry.file_path));
        }
        self.editor.save(&entry.file_path)
    }

    fn restore_on_failure(&self, entry: RollbackEntry, error: PatchWardenError) -> UndoResult {
        self.push(entry.clone());
        UndoResult::failed(Some(entry), error)
    }
}
