//! Temporary workspace setup utilities
//!
//! Each [`TestWorkspace`] owns a source tree plus separate config and cache
//! directories, so tests never read or write the developer's real state.

#![allow(dead_code)]

use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use assert_cmd::Command;
use tempfile::TempDir;

/// The TempDir must be kept alive for the duration of the test to prevent cleanup.
pub struct TestWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub config_home: PathBuf,
    pub cache_home: PathBuf,
}

impl TestWorkspace {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A `patch-warden` command pointed at this workspace and its private state
    pub fn command(&self) -> anyhow::Result<Command> {
        let mut cmd = Command::cargo_bin("patch-warden")?;
        cmd.arg("--workspace")
            .arg(&self.root)
            .env("XDG_CONFIG_HOME", &self.config_home)
            .env("XDG_CACHE_HOME", &self.cache_home)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        Ok(cmd)
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn read(&self, name: &str) -> anyhow::Result<String> {
        Ok(fs::read_to_string(self.path_of(name))?)
    }
}

pub fn setup_workspace() -> anyhow::Result<TestWorkspace> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path().join("project");
    let config_home = temp_dir.path().join("config");
    let cache_home = temp_dir.path().join("cache");
    fs::create_dir_all(&root)?;

    Ok(TestWorkspace {
        temp_dir,
        root,
        config_home,
        cache_home,
    })
}

/// Creates a file with the given content, making parent directories as needed
pub fn create_file(root: &Path, name: &str, content: &str) -> anyhow::Result<PathBuf> {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    Ok(path)
}

/// Writes a payload document outside the workspace tree
pub fn write_payload(workspace: &TestWorkspace, payload: &serde_json::Value) -> anyhow::Result<PathBuf> {
    let path = workspace.temp_dir.path().join("payload.json");
    fs::write(&path, serde_json::to_string_pretty(payload)?)?;
    Ok(path)
}
