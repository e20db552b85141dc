use crate::core::{
    command_init::WorkspaceInit,
    error::{PatchWardenError, Result},
    output::{print_failure, print_success},
};
use crate::patch::resolve_target;
use std::path::PathBuf;

/// Record the current SHA-256 of each file as its scan-time baseline
pub fn execute_baseline(workspace: Option<PathBuf>, files: Vec<PathBuf>) -> Result<()> {
    let context = WorkspaceInit::initialize(workspace)?;
    let mut cache = context.open_hash_cache()?;

    let mut failed = 0;
    for file in &files {
        let display = file.to_string_lossy();
        let resolved = match resolve_target(&display, &context.root) {
            Ok(path) => path,
            Err(e) => {
                failed += 1;
                print_failure(&format!("{display}: {e}"));
                continue;
            }
        };

        let recorded = context
            .fs
            .read_all(&resolved)
            .and_then(|bytes| cache.record_content(&resolved, &bytes));
        match recorded {
            Ok(digest) => print_success(&format!("{display} {}", &digest[..12])),
            Err(e) => {
                failed += 1;
                print_failure(&format!("{display}: {e}"));
            }
        }
    }

    log::debug!("Hash cache now holds {} entries", cache.len());

    if failed > 0 {
        return Err(PatchWardenError::batch_failed(failed, files.len()));
    }
    Ok(())
}
