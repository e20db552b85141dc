use crate::core::dirs::get_config_directory;
use crate::core::error::{PatchWardenError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Safety policy consulted by the policy validator. Loaded configuration can
/// only tighten it, see [`PolicyLimits::clamped`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PolicyLimits {
    /// Ceiling on the byte length of `new_code`
    pub max_patch_bytes: usize,
    /// Largest share of a file's lines a single patch may replace
    pub max_affected_ratio: f64,
    /// Import count change above which a warning is raised
    pub max_import_delta: usize,
    /// Whitespace-only replacements are blocked above this many lines
    pub max_empty_replacement_lines: i64,
}

impl Default for PolicyLimits {
    fn default() -> Self {
        Self {
            max_patch_bytes: 10 * 1024,
            max_affected_ratio: 0.5,
            max_import_delta: 5,
            max_empty_replacement_lines: 5,
        }
    }
}

impl PolicyLimits {
    /// Tighten-only view of these limits: values may be stricter than the
    /// defaults but never looser.
    pub fn clamped(self) -> Self {
        let ceiling = Self::default();
        let affected_ratio = if self.max_affected_ratio.is_nan() {
            ceiling.max_affected_ratio
        } else {
            self.max_affected_ratio.clamp(0.0, ceiling.max_affected_ratio)
        };

        Self {
            max_patch_bytes: self.max_patch_bytes.min(ceiling.max_patch_bytes),
            max_affected_ratio: affected_ratio,
            max_import_delta: self.max_import_delta.min(ceiling.max_import_delta),
            max_empty_replacement_lines: self
                .max_empty_replacement_lines
                .clamp(0, ceiling.max_empty_replacement_lines),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WardenConfig {
    pub policy: PolicyLimits,
    pub rollback_capacity: usize,
    pub history_capacity: usize,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            policy: PolicyLimits::default(),
            rollback_capacity: 50,
            history_capacity: 200,
        }
    }
}

impl WardenConfig {
    pub fn load_or_create() -> Result<Self> {
        let config_file = get_config_directory()?.join("config.json");

        if config_file.exists() {
            Self::load_from(&config_file)
        } else {
            let config = Self::default();
            config.save_to(&config_file)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PatchWardenError::cache_read_failed(path, e))?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| PatchWardenError::cache_parse_failed(path, e))?;

        let clamped = config.policy.clone().clamped();
        if clamped != config.policy {
            log::warn!(
                "Policy limits in {} are looser than the built-in ceilings, using the ceilings",
                path.display()
            );
            config.policy = clamped;
        }

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| PatchWardenError::cache_directory_creation_failed(dir, e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| PatchWardenError::cache_write_failed(path, e))?;

        Ok(())
    }
}
