//! Domain-specific error types and error handling utilities.
//!
//! This module defines [`PatchWardenError`] which covers every failure mode of the
//! patch pipeline. It uses `thiserror` for ergonomic error definitions and includes
//! specialized constructors for common failure scenarios.
//!
//! # Public API
//! - [`PatchWardenError`]: Main error enum covering all failure modes
//! - [`Result<T>`]: Type alias for `std::result::Result<T, PatchWardenError>`
//!
//! # Error Categories
//! - **Malformed input**: payloads that do not have the shape of a patch
//! - **Policy violations**: one or more gates rejected the patch
//! - **Stale state**: the target file drifted from its recorded baseline
//! - **I/O failures**: missing files, permissions, encoding, persistence
//! - **Edit rejection**: the editing surface declined the change
//! - **Undo**: empty stack or a cancelled confirmation

use std::path::PathBuf;
use thiserror::Error;

/// Domain-specific error types for patch-warden
#[derive(Error, Debug)]
pub enum PatchWardenError {
    // Input errors
    #[error("Malformed patch payload: {reason}")]
    MalformedPayload { reason: String },

    // Policy errors
    #[error("Patch rejected: {}", errors.join("; "))]
    PolicyViolation { errors: Vec<String> },

    #[error("File modified since last scan: {path}. Rescan and retry.")]
    StaleFile { path: PathBuf },

    // File operation errors
    #[error("File does not exist: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid UTF-8 in file content: {path}")]
    InvalidUtf8 { path: PathBuf },

    // Editing surface errors
    #[error("Edit was not applied to {path}; no changes were made")]
    EditRejected { path: PathBuf },

    // Command errors
    #[error("Workspace directory does not exist: {path}")]
    WorkspaceNotFound { path: PathBuf },

    #[error("{failed} of {total} patches failed")]
    BatchFailed { failed: usize, total: usize },

    // Rollback errors
    #[error("No patches to undo")]
    NothingToUndo,

    #[error("User cancelled rollback")]
    UndoCancelled,

    // Cache and config persistence errors
    #[error("Failed to create directory '{path}': {source}")]
    CacheDirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize cache data: {source}")]
    CacheSerializationFailed { source: serde_json::Error },

    #[error("Failed to write cache file '{path}': {source}")]
    CacheWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read cache file '{path}': {source}")]
    CacheReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse cache file '{path}': {source}")]
    CacheParseFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    // JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using PatchWardenError
pub type Result<T> = std::result::Result<T, PatchWardenError>;

impl PatchWardenError {
    /// Create a malformed payload error with the reason it was rejected
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }

    /// Create a policy violation carrying every gate failure
    pub fn policy_violation(errors: Vec<String>) -> Self {
        Self::PolicyViolation { errors }
    }

    /// Create a stale file error
    pub fn stale_file(path: impl Into<PathBuf>) -> Self {
        Self::StaleFile { path: path.into() }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create an edit rejected error
    pub fn edit_rejected(path: impl Into<PathBuf>) -> Self {
        Self::EditRejected { path: path.into() }
    }

    /// Create a batch failed error
    pub fn batch_failed(failed: usize, total: usize) -> Self {
        Self::BatchFailed { failed, total }
    }

    /// Map an I/O error against `path` onto the file-system error vocabulary
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound { path: path.into() },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: path.into() },
            std::io::ErrorKind::InvalidData => Self::InvalidUtf8 { path: path.into() },
            _ => Self::Io(source),
        }
    }

    /// Create a directory creation failed error
    pub fn cache_directory_creation_failed(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::CacheDirectoryCreationFailed {
            path: path.into(),
            source,
        }
    }

    /// Create a cache serialization failed error
    pub fn cache_serialization_failed(source: serde_json::Error) -> Self {
        Self::CacheSerializationFailed { source }
    }

    /// Create a cache write failed error
    pub fn cache_write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheWriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Create a cache read failed error
    pub fn cache_read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheReadFailed {
            path: path.into(),
            source,
        }
    }

    /// Create a cache parse failed error
    pub fn cache_parse_failed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::CacheParseFailed {
            path: path.into(),
            source,
        }
    }

    /// Whether a rescan of the file would be the remedy
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleFile { .. })
    }
}
