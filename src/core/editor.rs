//! Text-editing surface used to change live documents.
//!
//! Edits land in an open document first and only reach the disk on
//! [`TextEditor::save`], the same split an editor makes between a dirty buffer
//! and the file behind it.
//!
//! # Public API
//! - [`LineEdit`]: an inclusive, 1-indexed line-range replacement
//! - [`splice_lines`]: pure line-range replacement over a string
//! - [`TextEditor`]: the editing surface trait
//! - [`BufferedEditor`]: in-memory document buffers written through a [`FileSystem`]

use crate::core::error::Result;
use crate::core::fs::FileSystem;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    pub line_start: usize,
    pub line_end: usize,
    pub text: String,
}

pub trait TextEditor: Send + Sync {
    /// Replace `[line_start, line_end]` in the open document. `Ok(false)` means the
    /// editor declined and the document is untouched.
    fn apply_line_edit(&self, path: &Path, edit: &LineEdit) -> Result<bool>;

    /// Replace the whole document
    fn replace_contents(&self, path: &Path, content: &str) -> Result<bool>;

    /// Persist the open document to disk
    fn save(&self, path: &Path) -> Result<()>;
}

/// Byte offset where the 0-indexed `line` begins, clamped to the end of `content`.
fn line_offset(content: &str, line: usize) -> usize {
    if line == 0 {
        return 0;
    }
    content
        .match_indices('\n')
        .nth(line - 1)
        .map(|(idx, _)| idx + 1)
        .unwrap_or(content.len())
}

/// Replace the text from the start of `line_start` up to the start of the line
/// after `line_end` (both 1-indexed, inclusive) with `text`.
///
/// A range past the end of the document is clamped to its end, so
/// `line_start == total_lines + 1` appends.
pub fn splice_lines(content: &str, line_start: usize, line_end: usize, text: &str) -> String {
    let start = line_offset(content, line_start.saturating_sub(1));
    let end = line_offset(content, line_end).max(start);

    let mut out = String::with_capacity(content.len() - (end - start) + text.len());
    out.push_str(&content[..start]);
    out.push_str(text);
    out.push_str(&content[end..]);
    out
}

/// Number of lines as an editor counts them: a trailing newline opens an empty last line.
pub fn line_count(content: &str) -> usize {
    content.split('\n').count()
}

/// [`TextEditor`] keeping open documents in memory until they are saved
pub struct BufferedEditor {
    fs: Arc<dyn FileSystem>,
    documents: Mutex<HashMap<PathBuf, String>>,
}

impl BufferedEditor {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            documents: Mutex::new(HashMap::new()),
        }
    }

    fn open_document(&self, path: &Path) -> Result<String> {
        let documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        match documents.get(path) {
            Some(content) => Ok(content.clone()),
            None => self.fs.read_text(path),
        }
    }

    fn store_document(&self, path: &Path, content: String) {
        let mut documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        documents.insert(path.to_path_buf(), content);
    }

    /// Whether `path` has unsaved changes
    pub fn is_dirty(&self, path: &Path) -> bool {
        let documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        documents.contains_key(path)
    }
}

impl TextEditor for BufferedEditor {
    fn apply_line_edit(&self, path: &Path, edit: &LineEdit) -> Result<bool> {
        let content = self.open_document(path)?;

        if edit.line_start == 0
            || edit.line_end < edit.line_start
            || edit.line_start > line_count(&content) + 1
        {
            log::debug!(
                "Declining edit {}-{} on {}",
                edit.line_start,
                edit.line_end,
                path.display()
            );
            return Ok(false);
        }

        let patched = splice_lines(&content, edit.line_start, edit.line_end, &edit.text);
        self.store_document(path, patched);
        Ok(true)
    }

    fn replace_contents(&self, path: &Path, content: &str) -> Result<bool> {
        if !self.fs.exists(path) && !self.is_dirty(path) {
            return Ok(false);
        }
        self.store_document(path, content.to_string());
        Ok(true)
    }

    /// The buffer is discarded whether or not the write succeeds, so a failed
    /// save never leaves edits that later reads would see instead of the disk.
    fn save(&self, path: &Path) -> Result<()> {
        let pending = {
            let mut documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
            documents.remove(path)
        };

        if let Some(content) = pending {
            if let Err(e) = self.fs.write_all(path, content.as_bytes()) {
                log::debug!("Discarding unsaved buffer for {}: {e}", path.display());
                return Err(e);
            }
            log::debug!("Saved {}", path.display());
        }

        Ok(())
    }
}
