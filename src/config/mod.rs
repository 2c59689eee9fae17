//! Project configuration (`podbuild.toml`).
//!
//! The configuration is loaded once at the start of a run into an immutable
//! [`PodbuildConfig`] value and threaded explicitly into the partitioner,
//! the closure builder and the reconcilers. Nothing reads it as ambient
//! state.
//!
//! A missing file yields the defaults, so a project with no special needs
//! requires no configuration at all.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_FILE, DEFAULT_BUILD_DIR, PODBUILD_DIR};

/// Immutable per-project configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PodbuildConfig {
    /// Directory the external build runs in, relative to the project root.
    #[serde(default = "default_build_path")]
    pub build_path: PathBuf,

    /// Acknowledgement titles to exclude from the license side-manifest.
    #[serde(default)]
    pub skip_licenses: Vec<String>,

    /// Subspec names that must build alone because their artifact path
    /// differs from their root pod's.
    #[serde(default)]
    pub subspecs_to_split: Vec<String>,

    /// Build settings applied to every pod in a descriptor.
    #[serde(default)]
    pub build_settings: BTreeMap<String, String>,

    /// Per-pod build-setting overrides, applied after the defaults.
    #[serde(default)]
    pub build_settings_overrides: BTreeMap<String, BTreeMap<String, String>>,

    /// Command invoking the external build tool inside `build_path`.
    /// Defaults to `pod install`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_command: Option<String>,

    /// Command re-running the external resolver, used by `--update-sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_command: Option<String>,

    /// Project-wide Swift version override. When unset, the version
    /// reported by the resolver's targets is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift_version: Option<String>,
}

fn default_build_path() -> PathBuf {
    Path::new(PODBUILD_DIR).join(DEFAULT_BUILD_DIR)
}

impl Default for PodbuildConfig {
    fn default() -> Self {
        Self {
            build_path: default_build_path(),
            skip_licenses: Vec::new(),
            subspecs_to_split: Vec::new(),
            build_settings: BTreeMap::new(),
            build_settings_overrides: BTreeMap::new(),
            build_command: None,
            resolve_command: None,
            swift_version: None,
        }
    }
}

impl PodbuildConfig {
    /// Load the configuration from `<project_root>/podbuild.toml`.
    ///
    /// Returns the defaults when the file doesn't exist.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read configuration: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?;
        Ok(config)
    }

    /// Build directory resolved against the project root.
    pub fn build_dir(&self, project_root: &Path) -> PathBuf {
        if self.build_path.is_absolute() {
            self.build_path.clone()
        } else {
            project_root.join(&self.build_path)
        }
    }
}
