//! The single write path from a proposed patch into the source tree.
//!
//! The order of steps is fixed:
//!
//! 1. Schema validation, rejected payloads cause no side effects
//! 2. Policy validation against the current hash cache, likewise side-effect free
//! 3. Read the target's current content
//! 4. Push a [`RollbackEntry`] before anything is mutated
//! 5. Apply the line-range replacement through the editing surface
//! 6. If the editor declines, pop the entry again: nothing changed, nothing to restore
//! 7. Save the document; if that fails, auto-restore the snapshot
//! 8. Rehash the saved file and record it as the new baseline
//!
//! Callers must serialize applications; `apply_patch` takes `&mut self` for that reason.

use crate::core::config::PolicyLimits;
use crate::core::editor::{LineEdit, TextEditor};
use crate::core::error::{PatchWardenError, Result};
use crate::core::fs::FileSystem;
use crate::patch::hash_cache::FileHashCache;
use crate::patch::history::{PatchHistory, PatchHistoryEntry};
use crate::patch::policy::{resolve_target, PolicyValidator, ValidationResult};
use crate::patch::rollback::{RollbackEntry, RollbackStack, UndoResult};
use crate::patch::schema::{parse_patch, Patch};
use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub struct ApplyResult {
    pub success: bool,
    pub file_path: String,
    pub rule_id: String,
    pub error: Option<PatchWardenError>,
    pub validation: Option<ValidationResult>,
}

impl ApplyResult {
    fn applied(file_path: String, rule_id: String, validation: ValidationResult) -> Self {
        Self {
            success: true,
            file_path,
            rule_id,
            error: None,
            validation: Some(validation),
        }
    }

    fn failed(
        file_path: String,
        rule_id: String,
        error: PatchWardenError,
        validation: Option<ValidationResult>,
    ) -> Self {
        Self {
            success: false,
            file_path,
            rule_id,
            error: Some(error),
            validation,
        }
    }

    /// Warnings raised by the policy gates, present even on success
    pub fn warnings(&self) -> &[String] {
        self.validation
            .as_ref()
            .map(|v| v.warnings.as_slice())
            .unwrap_or_default()
    }
}

pub struct PatchApplier {
    workspace_root: PathBuf,
    validator: PolicyValidator,
    fs: Arc<dyn FileSystem>,
    editor: Arc<dyn TextEditor>,
    rollback: Arc<RollbackStack>,
    cache: FileHashCache,
    history: Option<PatchHistory>,
}

impl PatchApplier {
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        limits: PolicyLimits,
        fs: Arc<dyn FileSystem>,
        editor: Arc<dyn TextEditor>,
        rollback: Arc<RollbackStack>,
        cache: FileHashCache,
    ) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            validator: PolicyValidator::new(limits, fs.clone()),
            fs,
            editor,
            rollback,
            cache,
            history: None,
        }
    }

    pub fn with_history(mut self, history: PatchHistory) -> Self {
        self.history = Some(history);
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn hash_cache(&self) -> &FileHashCache {
        &self.cache
    }

    pub fn hash_cache_mut(&mut self) -> &mut FileHashCache {
        &mut self.cache
    }

    pub fn rollback(&self) -> &Arc<RollbackStack> {
        &self.rollback
    }

    pub fn history(&self) -> Option<&PatchHistory> {
        self.history.as_ref()
    }

    /// Pre-flight policy check without applying anything
    pub fn validate(&self, patch: &Patch) -> ValidationResult {
        self.validator
            .validate(patch, &self.workspace_root, &self.cache)
    }

    pub fn apply_patch(&mut self, raw: &Value) -> ApplyResult {
        let patch = match parse_patch(raw) {
            Ok(patch) => patch,
            Err(e) => {
                log::warn!("Rejected malformed patch payload: {e}");
                return ApplyResult::failed(String::new(), String::new(), e, None);
            }
        };

        let result = self.apply_parsed(&patch);
        self.record_history(&result);
        result
    }

    /// Apply every payload in order, one at a time
    pub fn apply_all(&mut self, raws: &[Value]) -> Vec<ApplyResult> {
        raws.iter().map(|raw| self.apply_patch(raw)).collect()
    }

    /// Undo the most recent patch and re-record the restored file as the baseline
    pub fn undo_last(&mut self) -> UndoResult {
        let result = self.rollback.undo_last();

        if let Some(entry) = result.entry.as_ref().filter(|_| result.success) {
            if let Err(e) = self.refresh_baseline(&entry.file_path) {
                log::warn!(
                    "Rolled back {} but could not refresh its hash: {e}",
                    entry.file_path.display()
                );
            }
        }

        result
    }

    fn apply_parsed(&mut self, patch: &Patch) -> ApplyResult {
        let rule_id = patch.rule_id.clone();

        let validation = self.validate(patch);
        if !validation.valid {
            let error = if validation.is_stale() {
                let path = resolve_target(&patch.file_path, &self.workspace_root)
                    .unwrap_or_else(|_| PathBuf::from(&patch.file_path));
                PatchWardenError::stale_file(path)
            } else {
                PatchWardenError::policy_violation(validation.errors.clone())
            };
            log::warn!("Patch {rule_id} for {} rejected: {error}", patch.file_path);
            return ApplyResult::failed(patch.file_path.clone(), rule_id, error, Some(validation));
        }

        for warning in &validation.warnings {
            log::warn!("Patch {rule_id}: {warning}");
        }

        let resolved = match resolve_target(&patch.file_path, &self.workspace_root) {
            Ok(path) => path,
            Err(rejection) => {
                let error = PatchWardenError::policy_violation(vec![rejection.to_string()]);
                return ApplyResult::failed(patch.file_path.clone(), rule_id, error, Some(validation));
            }
        };
        let file_path = resolved.to_string_lossy().into_owned();

        let original_content = match self.fs.read_text(&resolved) {
            Ok(content) => content,
            Err(e) => return ApplyResult::failed(file_path, rule_id, e, Some(validation)),
        };

        self.rollback.push(RollbackEntry {
            file_path: resolved.clone(),
            original_content,
            patched_code: patch.new_code.clone(),
            timestamp: Utc::now(),
            rule_id: rule_id.clone(),
        });

        // Line numbers are in range: the line-range gate has passed.
        let edit = LineEdit {
            line_start: patch.line_start as usize,
            line_end: patch.line_end as usize,
            text: format!("{}\n", patch.new_code),
        };

        let edit_error = match self.editor.apply_line_edit(&resolved, &edit) {
            Ok(true) => None,
            Ok(false) => Some(PatchWardenError::edit_rejected(&resolved)),
            Err(e) => Some(e),
        };
        if let Some(error) = edit_error {
            self.rollback.pop();
            log::warn!("Edit for patch {rule_id} on {file_path} not applied: {error}");
            return ApplyResult::failed(file_path, rule_id, error, Some(validation));
        }

        if let Err(e) = self.editor.save(&resolved) {
            log::error!("Saving {file_path} failed, restoring snapshot: {e}");
            if let Some(entry) = self.rollback.pop() {
                if !self.rollback.auto_restore(&entry) {
                    self.rollback.push(entry);
                }
            }
            return ApplyResult::failed(file_path, rule_id, e, Some(validation));
        }

        if let Err(e) = self.refresh_baseline(&resolved) {
            log::warn!("Applied patch to {file_path} but could not record its new hash: {e}");
        }

        log::info!(
            "Applied patch {rule_id} to {file_path} (lines {}-{})",
            patch.line_start,
            patch.line_end
        );
        ApplyResult::applied(file_path, rule_id, validation)
    }

    fn refresh_baseline(&mut self, path: &Path) -> Result<()> {
        let bytes = self.fs.read_all(path)?;
        self.cache.record_content(path, &bytes)?;
        Ok(())
    }

    fn record_history(&mut self, result: &ApplyResult) {
        let Some(history) = self.history.as_mut() else {
            return;
        };

        let entry = PatchHistoryEntry {
            file_path: result.file_path.clone(),
            rule_id: result.rule_id.clone(),
            timestamp: Utc::now(),
            success: result.success,
            error: result.error.as_ref().map(|e| e.to_string()),
        };
        if let Err(e) = history.record(entry) {
            log::warn!("Could not record patch history: {e}");
        }
    }
}
