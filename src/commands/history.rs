use crate::core::{
    command_init::{shorten_path, WorkspaceInit},
    error::Result,
    output::{print_info, print_section_header},
};
use colored::*;
use std::path::PathBuf;

pub fn execute_history(workspace: Option<PathBuf>, limit: usize) -> Result<()> {
    let context = WorkspaceInit::initialize(workspace)?;
    let history = context.open_history()?;

    if history.is_empty() {
        print_info("No patches applied yet");
        return Ok(());
    }

    print_section_header("Patch history");

    for (i, entry) in history.recent(limit).into_iter().enumerate() {
        let marker = if entry.success {
            "✓".green()
        } else {
            "✕".red()
        };
        println!(
            "  {} {} {} {} {}",
            format!("[{}]", i + 1).bright_black(),
            marker,
            entry.timestamp.format("%Y-%m-%d %H:%M").to_string().bright_black(),
            entry.rule_id.blue(),
            shorten_path(&entry.file_path)
        );
        if let Some(error) = &entry.error {
            println!("      {}", error.bright_black());
        }
    }

    Ok(())
}
