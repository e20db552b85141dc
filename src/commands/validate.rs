use crate::core::{
    command_init::{read_payload_file, shorten_path, WorkspaceInit},
    error::{PatchWardenError, Result},
    output::{print_failure, print_section_header, print_success, print_warning},
};
use crate::patch::{parse_patch, PolicyValidator};
use std::path::PathBuf;

/// Pre-flight check: run schema and policy validation without touching any file
pub fn execute_validate(workspace: Option<PathBuf>, payload: PathBuf) -> Result<()> {
    let context = WorkspaceInit::initialize(workspace)?;
    let payloads = read_payload_file(&payload)?;
    let cache = context.open_hash_cache()?;
    let validator = PolicyValidator::new(context.config.policy.clone(), context.fs.clone());

    print_section_header(&format!("Validating {} patch(es)", payloads.len()));

    let mut rejected = 0;
    for (n, raw) in payloads.iter().enumerate() {
        let patch = match parse_patch(raw) {
            Ok(patch) => patch,
            Err(e) => {
                rejected += 1;
                print_failure(&format!("[{}] {e}", n + 1));
                continue;
            }
        };

        let result = validator.validate(&patch, &context.root, &cache);
        let label = format!(
            "[{}] {} {}:{}-{}",
            n + 1,
            patch.rule_id,
            shorten_path(&patch.file_path),
            patch.line_start,
            patch.line_end
        );

        if result.valid {
            print_success(&format!("{label} passes"));
        } else {
            rejected += 1;
            print_failure(&format!("{label} rejected"));
            for error in &result.errors {
                println!("    {error}");
            }
        }
        for warning in &result.warnings {
            print_warning(warning);
        }
    }

    if rejected > 0 {
        return Err(PatchWardenError::batch_failed(rejected, payloads.len()));
    }
    print_success(&format!("All {} patch(es) pass", payloads.len()));
    Ok(())
}
