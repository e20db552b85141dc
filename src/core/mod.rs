//! Core infrastructure for the patch-warden tool.
//!
//! This module provides the surfaces the patch core talks to (file system,
//! text editor, confirmation prompt) along with error handling, configuration,
//! storage locations and terminal output.

pub mod command_init;
pub mod config;
pub mod dirs;
pub mod editor;
pub mod error;
pub mod fs;
pub mod output;
pub mod prompt;

// === Error handling ===
pub use error::{PatchWardenError, Result};

// === Configuration ===
pub use config::{PolicyLimits, WardenConfig};

// === External surfaces ===
pub use editor::{splice_lines, BufferedEditor, LineEdit, TextEditor};
pub use fs::{FileSystem, LocalFs};
pub use prompt::{Confirm, FixedAnswer, StdinConfirm};

// === Command initialization ===
pub use command_init::{read_payload_file, shorten_path, WorkspaceContext, WorkspaceInit};

// === Output formatting ===
pub use output::{
    print_error, print_failure, print_info, print_section_header, print_success, print_warning,
};
