use crate::core::error::Result;
use std::path::{Path, PathBuf};

pub fn get_config_directory() -> Result<PathBuf> {
    let base = match std::env::consts::OS {
        "linux" | "freebsd" | "netbsd" | "openbsd" => std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::home_dir().unwrap_or_default().join(".config")),
        "macos" => dirs::home_dir()
            .unwrap_or_default()
            .join("Library/Application Support"),
        _ => dirs::config_dir().unwrap_or_default(),
    };

    Ok(base.join("patch-warden"))
}

pub fn get_cache_directory() -> Result<PathBuf> {
    let base = match std::env::consts::OS {
        "linux" | "freebsd" | "netbsd" | "openbsd" => std::env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::home_dir().unwrap_or_default().join(".cache")),
        "macos" => dirs::home_dir().unwrap_or_default().join("Library/Caches"),
        _ => dirs::cache_dir().unwrap_or_else(|| PathBuf::from("/tmp")),
    };

    Ok(base.join("patch-warden"))
}

/// Per-workspace state directory, keyed by the md5 of the workspace root
pub fn workspace_state_directory(workspace_root: &Path) -> Result<PathBuf> {
    let root_hash = format!(
        "{:x}",
        md5::compute(workspace_root.to_string_lossy().as_bytes())
    );

    log::debug!("workspace_state_directory: root = {workspace_root:?}, hash = {root_hash}");

    Ok(get_cache_directory()?.join(root_hash))
}
