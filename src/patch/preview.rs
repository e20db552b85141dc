//! Dry-run rendering of what a set of patches would do to each file.
//!
//! Patches are grouped per file and spliced bottom-up, highest `line_start`
//! first, so earlier replacements do not shift the lines later ones target.
//! Nothing is written.

use crate::core::editor::{line_count, splice_lines};
use crate::core::fs::FileSystem;
use crate::patch::policy::resolve_target;
use crate::patch::schema::Patch;
use colored::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePreview {
    pub path: PathBuf,
    pub original: String,
    pub patched: String,
    pub applied: usize,
    pub skipped: usize,
}

pub fn preview_patches(
    patches: &[Patch],
    workspace_root: &Path,
    fs: &dyn FileSystem,
) -> Vec<FilePreview> {
    let mut by_file: BTreeMap<PathBuf, Vec<&Patch>> = BTreeMap::new();
    for patch in patches {
        match resolve_target(&patch.file_path, workspace_root) {
            Ok(path) => by_file.entry(path).or_default().push(patch),
            Err(e) => log::debug!("Not previewing {}: {e}", patch.file_path),
        }
    }

    let mut previews = Vec::with_capacity(by_file.len());
    for (path, mut file_patches) in by_file {
        let original = match fs.read_text(&path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Cannot preview {}: {e}", path.display());
                continue;
            }
        };

        file_patches.sort_by(|a, b| b.line_start.cmp(&a.line_start));

        let mut patched = original.clone();
        let (mut applied, mut skipped) = (0, 0);
        for patch in file_patches {
            let in_range = patch.line_start >= 1
                && patch.line_end >= patch.line_start
                && patch.line_start as usize <= line_count(&patched);
            if !in_range {
                skipped += 1;
                continue;
            }
            patched = splice_lines(
                &patched,
                patch.line_start as usize,
                patch.line_end as usize,
                &format!("{}\n", patch.new_code),
            );
            applied += 1;
        }

        previews.push(FilePreview {
            path,
            original,
            patched,
            applied,
            skipped,
        });
    }

    previews
}

/// Single-hunk line diff between two texts. Empty when they are identical.
pub fn render_line_diff(original: &str, patched: &str) -> String {
    let old: Vec<&str> = original.lines().collect();
    let new: Vec<&str> = patched.lines().collect();

    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let removed = &old[prefix..old.len() - suffix];
    let added = &new[prefix..new.len() - suffix];
    if removed.is_empty() && added.is_empty() {
        return String::new();
    }

    let mut out = format!(
        "@@ -{},{} +{},{} @@\n",
        prefix + 1,
        removed.len(),
        prefix + 1,
        added.len()
    );
    for line in removed {
        out.push_str(&format!("{}\n", format!("-{line}").red()));
    }
    for line in added {
        out.push_str(&format!("{}\n", format!("+{line}").green()));
    }
    out
}
