//! Patch Warden - the safety gate between an automated patch generator and a live source tree.
//!
//! Every proposed edit is parsed, checked against a fixed safety policy, snapshotted
//! and only then written. Applied patches can be reverted newest first, even after
//! further edits, with a confirmation when the file has drifted.
//!
//! # Public API
//! - [`patch`]: schema validation, policy gates, hash cache, rollback stack and applier
//! - [`core`]: file-system, editor and prompt surfaces, errors, configuration, output
//! - [`commands`]: the `patch-warden` CLI commands

pub mod commands;
pub mod core;
pub mod patch;

// Re-export the public API for external users
pub use core::{
    // External surfaces
    BufferedEditor,
    Confirm,
    FileSystem,
    FixedAnswer,
    LineEdit,
    LocalFs,
    // Error handling
    PatchWardenError,
    // Configuration
    PolicyLimits,
    Result,
    StdinConfirm,
    TextEditor,
    WardenConfig,
};

pub use patch::{
    // Patch records
    load_payloads,
    parse_patch,
    validate_patch,
    validate_patch_schema,
    // Application and rollback
    ApplyResult,
    FileHashCache,
    Gate,
    Patch,
    PatchApplier,
    PatchHistory,
    PolicyValidator,
    RollbackEntry,
    RollbackStack,
    UndoResult,
    ValidationResult,
};
