//! Centralized initialization for commands that operate on a workspace.
//!
//! This module provides [`WorkspaceInit`] which handles the setup every command
//! shares: resolving the workspace root, loading configuration, opening the
//! workspace's hash cache and patch history, and reading payload files.
//!
//! # Initialization Steps
//! 1. **Workspace resolution**: make the root absolute (no symlink resolution) and check it exists
//! 2. **Configuration**: load or create `config.json`
//! 3. **State**: open the persisted hash cache and history for this workspace
//! 4. **Wiring**: build the rollback stack and applier around the local file system

use crate::core::{
    config::WardenConfig,
    editor::{BufferedEditor, TextEditor},
    error::{PatchWardenError, Result},
    fs::{FileSystem, LocalFs},
    prompt::Confirm,
};
use crate::patch::{load_payloads, FileHashCache, PatchApplier, PatchHistory, RollbackStack};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a command needs to work on one workspace
pub struct WorkspaceContext {
    pub root: PathBuf,
    pub config: WardenConfig,
    pub fs: Arc<dyn FileSystem>,
}

pub struct WorkspaceInit;

impl WorkspaceInit {
    /// Resolve the workspace (current directory when `None`) and load configuration
    pub fn initialize(workspace: Option<PathBuf>) -> Result<WorkspaceContext> {
        let requested = match workspace {
            Some(path) => path,
            None => std::env::current_dir()?,
        };
        let root = std::path::absolute(&requested)?;

        if !root.is_dir() {
            return Err(PatchWardenError::WorkspaceNotFound { path: root });
        }

        log::debug!("Using workspace root {}", root.display());
        let config = WardenConfig::load_or_create()?;

        Ok(WorkspaceContext {
            root,
            config,
            fs: Arc::new(LocalFs),
        })
    }
}

impl WorkspaceContext {
    pub fn open_hash_cache(&self) -> Result<FileHashCache> {
        FileHashCache::open_for_workspace(&self.root)
    }

    pub fn open_history(&self) -> Result<PatchHistory> {
        PatchHistory::open_for_workspace(&self.root, self.config.history_capacity)
    }

    /// Build an applier whose undo prompts go through `confirm`
    pub fn build_applier(&self, confirm: Arc<dyn Confirm>) -> Result<PatchApplier> {
        let editor: Arc<dyn TextEditor> = Arc::new(BufferedEditor::new(self.fs.clone()));
        let rollback = Arc::new(RollbackStack::new(
            self.config.rollback_capacity,
            self.fs.clone(),
            editor.clone(),
            confirm,
        ));

        let applier = PatchApplier::new(
            &self.root,
            self.config.policy.clone(),
            self.fs.clone(),
            editor,
            rollback,
            self.open_hash_cache()?,
        )
        .with_history(self.open_history()?);

        Ok(applier)
    }
}

/// Read a payload document from disk and flatten it into raw patch values
pub fn read_payload_file(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path).map_err(|e| PatchWardenError::from_io(path, e))?;
    let document: Value = serde_json::from_str(&content)
        .map_err(|e| PatchWardenError::malformed(format!("{}: {e}", path.display())))?;
    let payloads = load_payloads(&document)?;

    log::debug!(
        "Loaded {} patch payload(s) from {}",
        payloads.len(),
        path.display()
    );
    Ok(payloads)
}

/// Shorten long paths to their last two components for display
pub fn shorten_path(path: &str) -> String {
    let parts: Vec<&str> = path.split(['/', '\\']).filter(|p| !p.is_empty()).collect();
    if parts.len() <= 3 {
        return path.to_string();
    }
    format!("…/{}", parts[parts.len() - 2..].join("/"))
}
