use clap::{Parser, Subcommand};
use patch_warden::commands::*;
use patch_warden::core::print_error;
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "patch-warden")]
#[command(about = "Validate, apply and roll back automatically generated source patches")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Workspace root the patches must stay inside (defaults to the current directory)
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check patches against the safety policy without applying them
    Validate {
        /// JSON file with a patch, an array of patches or a scan report
        payload: PathBuf,
    },
    /// Apply patches one after another
    Apply {
        /// JSON file with a patch, an array of patches or a scan report
        payload: PathBuf,
        /// Afterwards, offer to undo applied patches newest first
        #[arg(long)]
        review: bool,
    },
    /// Show the diff patches would produce
    Preview {
        /// JSON file with a patch, an array of patches or a scan report
        payload: PathBuf,
    },
    /// Record the current content hash of files as their scan baseline
    Baseline {
        /// Files, relative to the workspace root or absolute
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show recent apply attempts
    History {
        /// Number of entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    // Configure logging based on --debug flag
    if cli.debug {
        env::set_var("RUST_LOG", "debug");
    } else if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let workspace = cli.workspace;
    let result = match cli.command {
        Commands::Validate { payload } => execute_validate(workspace, payload),
        Commands::Apply { payload, review } => execute_apply(workspace, payload, review),
        Commands::Preview { payload } => execute_preview(workspace, payload),
        Commands::Baseline { files } => execute_baseline(workspace, files),
        Commands::History { limit } => execute_history(workspace, limit),
    };

    if let Err(e) = result {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
