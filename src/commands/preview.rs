use crate::core::{
    command_init::{read_payload_file, WorkspaceInit},
    error::Result,
    output::{print_failure, print_info, print_section_header},
};
use crate::patch::{parse_patch, preview_patches, render_line_diff};
use std::path::PathBuf;

/// Print the diff each file would receive, without writing anything
pub fn execute_preview(workspace: Option<PathBuf>, payload: PathBuf) -> Result<()> {
    let context = WorkspaceInit::initialize(workspace)?;

    let mut patches = Vec::new();
    for (n, raw) in read_payload_file(&payload)?.iter().enumerate() {
        match parse_patch(raw) {
            Ok(patch) => patches.push(patch),
            Err(e) => print_failure(&format!("[{}] skipped: {e}", n + 1)),
        }
    }

    let previews = preview_patches(&patches, &context.root, context.fs.as_ref());
    if previews.is_empty() {
        print_info("Nothing to preview");
        return Ok(());
    }

    for preview in previews {
        let relative = preview
            .path
            .strip_prefix(&context.root)
            .unwrap_or(&preview.path)
            .display()
            .to_string();
        print_section_header(&format!("{relative} ({} patch(es))", preview.applied));
        print!("{}", render_line_diff(&preview.original, &preview.patched));
        if preview.skipped > 0 {
            print_failure(&format!("{} out-of-range patch(es) skipped", preview.skipped));
        }
    }

    Ok(())
}
