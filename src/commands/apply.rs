use crate::core::{
    command_init::{read_payload_file, shorten_path, WorkspaceInit},
    error::{PatchWardenError, Result},
    output::{print_failure, print_info, print_section_header, print_success, print_warning},
    prompt::{Confirm, StdinConfirm},
};
use crate::patch::{ApplyResult, PatchApplier};
use std::path::PathBuf;
use std::sync::Arc;

const KEEP: &str = "Keep";
const UNDO: &str = "Undo";

/// Apply every patch in `payload` in order. With `review`, walk back through the
/// applied patches newest first and offer to undo each one.
pub fn execute_apply(workspace: Option<PathBuf>, payload: PathBuf, review: bool) -> Result<()> {
    let context = WorkspaceInit::initialize(workspace)?;
    let payloads = read_payload_file(&payload)?;
    let confirm: Arc<dyn Confirm> = Arc::new(StdinConfirm);
    let mut applier = context.build_applier(confirm.clone())?;

    print_section_header(&format!("Applying {} patch(es)", payloads.len()));

    let results = applier.apply_all(&payloads);
    for result in &results {
        print_result(result);
    }

    let failed = results.iter().filter(|r| !r.success).count();
    let applied = results.len() - failed;

    if review && !applier.rollback().is_empty() {
        review_applied(&mut applier, confirm.as_ref());
    }

    if failed > 0 {
        return Err(PatchWardenError::batch_failed(failed, results.len()));
    }
    print_success(&format!(
        "{applied} patch{} applied",
        if applied == 1 { "" } else { "es" }
    ));
    Ok(())
}

fn print_result(result: &ApplyResult) {
    let file = if result.file_path.is_empty() {
        "<payload>".to_string()
    } else {
        shorten_path(&result.file_path)
    };

    match &result.error {
        None => print_success(&format!("{file} patched ({})", result.rule_id)),
        Some(error) => print_failure(&format!("{file} failed: {error}")),
    }
    for warning in result.warnings() {
        print_warning(warning);
    }
}

fn review_applied(applier: &mut PatchApplier, confirm: &dyn Confirm) {
    while let Some(entry) = applier.rollback().peek() {
        let question = format!(
            "Keep patch {} on {}?",
            entry.rule_id,
            shorten_path(&entry.file_path.to_string_lossy())
        );
        if confirm.ask(&question, &[KEEP, UNDO]).as_deref() != Some(UNDO) {
            break;
        }

        let undo = applier.undo_last();
        match undo.error {
            None => print_success(&format!("Rolled back {}", entry.rule_id)),
            Some(error) => {
                print_failure(&format!("Rollback of {} failed: {error}", entry.rule_id));
                break;
            }
        }
    }

    let remaining = applier.rollback().size();
    if remaining > 0 {
        print_info(&format!("{remaining} patch(es) kept"));
    }
}
