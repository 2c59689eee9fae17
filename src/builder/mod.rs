//! Descriptor emission and the external build seam.
//!
//! The planner hands each closed build group to a [`DescriptorRenderer`]
//! which materializes the textual build descriptor (an autogenerated
//! Podfile), and to a [`BuildExecutor`] which runs the external build tool
//! against it. The executor is opaque: podbuild treats any failure as fatal
//! for the whole run and never parses the tool's output beyond the
//! acknowledgements list the build emits.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::PodbuildConfig;
use crate::constants::{DEFAULT_BUILD_COMMAND, DESCRIPTOR_FILE};
use crate::core::PodbuildError;
use crate::license::LicenseEntry;
use crate::pod::{BuildVariant, DependencyItem};
use crate::resolver::BuildGroup;
use crate::source::ResolvedGraph;
use crate::utils::fs::{ensure_dir, safe_write};

/// Renders a build group into the descriptor text the external build tool
/// consumes.
pub trait DescriptorRenderer {
    fn render(
        &self,
        group: &BuildGroup,
        graph: &ResolvedGraph,
        config: &PodbuildConfig,
    ) -> Result<String>;
}

/// Runs the external build for one group, returning the acknowledgements
/// list (`[header, *entries, footer]`) the build emitted.
pub trait BuildExecutor {
    fn build(&self, descriptor: &str, variant: BuildVariant) -> Result<Vec<LicenseEntry>>;
}

/// Default [`DescriptorRenderer`] emitting a Podfile-style descriptor:
/// sources, platform, the group's single build variant, per-pod build
/// settings and the ordered pod list with dependency information.
pub struct PodfileRenderer;

impl PodfileRenderer {
    fn build_settings_for(
        item: &DependencyItem,
        swift_version: Option<&str>,
        config: &PodbuildConfig,
    ) -> BTreeMap<String, String> {
        let mut settings = config.build_settings.clone();

        let overrides = config
            .build_settings_overrides
            .get(&item.name.to_string());

        let swift = overrides
            .and_then(|o| o.get("SWIFT_VERSION").cloned())
            .or_else(|| item.swift_version.clone())
            .or_else(|| swift_version.map(str::to_string));
        if let Some(swift) = swift {
            settings.insert("SWIFT_VERSION".to_string(), swift);
        }

        if item.static_framework {
            // module debugging breaks static framework builds
            settings.insert("CLANG_ENABLE_MODULE_DEBUGGING".to_string(), "NO".to_string());
        }

        if let Some(overrides) = overrides {
            for (key, value) in overrides {
                settings.insert(key.clone(), value.clone());
            }
        }
        settings
    }
}

impl DescriptorRenderer for PodfileRenderer {
    fn render(
        &self,
        group: &BuildGroup,
        graph: &ResolvedGraph,
        config: &PodbuildConfig,
    ) -> Result<String> {
        let mut variants: Vec<String> = group
            .items
            .iter()
            .map(|item| item.variant.to_string())
            .collect();
        variants.sort();
        variants.dedup();
        if variants.len() != 1 {
            return Err(PodbuildError::MixedVariantGroup { variants }.into());
        }

        let swift_version = match &config.swift_version {
            Some(version) => Some(version.clone()),
            None => graph.project_swift_version()?,
        };

        let mut lines = Vec::new();
        lines.push("# Autogenerated by podbuild, do not edit".to_string());
        for source in &graph.sources {
            lines.push(format!("source '{source}'"));
        }
        lines.push(format!(
            "platform :{}, '{}'",
            graph.platform.name, graph.platform.deployment_target
        ));
        lines.push(format!("build_configuration '{}'", group.variant));
        lines.push(String::new());

        for item in &group.items {
            let settings = Self::build_settings_for(item, swift_version.as_deref(), config);
            let rendered: Vec<String> = settings
                .iter()
                .map(|(key, value)| format!("'{key}' => '{value}'"))
                .collect();
            lines.push(format!(
                "build_settings '{}', {{ {} }}",
                item.root(),
                rendered.join(", ")
            ));
        }
        lines.push(String::new());

        for item in &group.items {
            let entry = match &item.version {
                Some(version) => format!("pod '{}', '={}'", item.name, version),
                None => format!("pod '{}'", item.name),
            };
            lines.push(entry);

            // dependencies on the pod's own root stay implicit
            let dependencies: Vec<String> = item
                .dependencies
                .iter()
                .filter(|dep| dep.root() != item.root())
                .map(ToString::to_string)
                .collect();
            if !dependencies.is_empty() {
                lines.push(format!("#   requires {}", dependencies.join(", ")));
            }
        }

        lines.push(String::new());
        Ok(lines.join("\n"))
    }
}

/// [`BuildExecutor`] writing the descriptor into the build directory and
/// running the configured command there (default `pod install`).
pub struct ProcessBuildExecutor {
    build_dir: PathBuf,
    command: String,
}

impl ProcessBuildExecutor {
    pub fn new(project_root: &Path, config: &PodbuildConfig) -> Self {
        Self {
            build_dir: config.build_dir(project_root),
            command: config
                .build_command
                .clone()
                .unwrap_or_else(|| DEFAULT_BUILD_COMMAND.to_string()),
        }
    }

    /// Locate the acknowledgements list the build emitted, if any. More
    /// than one file is treated as corruption.
    fn collect_acknowledgements(&self) -> Result<Vec<LicenseEntry>> {
        let mut found: Vec<PathBuf> = WalkDir::new(&self.build_dir)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry.file_name() == crate::constants::ACKNOWLEDGEMENTS_FILE
            })
            .map(|entry| entry.into_path())
            .collect();

        match found.len() {
            0 => Ok(Vec::new()),
            1 => {
                let path = found.remove(0);
                debug!(path = %path.display(), "collecting acknowledgements");
                let content = std::fs::read_to_string(&path)?;
                Ok(serde_json::from_str(&content)?)
            }
            n => Err(PodbuildError::MalformedSideManifest {
                reason: format!("found {n} acknowledgement files under the build directory"),
            }
            .into()),
        }
    }
}

impl BuildExecutor for ProcessBuildExecutor {
    fn build(&self, descriptor: &str, variant: BuildVariant) -> Result<Vec<LicenseEntry>> {
        ensure_dir(&self.build_dir)?;
        safe_write(&self.build_dir.join(DESCRIPTOR_FILE), descriptor)?;

        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| PodbuildError::ConfigError {
            file: crate::constants::CONFIG_FILE.to_string(),
            reason: "build_command is empty".to_string(),
        })?;
        let program = which::which(program).map_err(|_| PodbuildError::ExternalBuildFailure {
            variant: variant.to_string(),
            reason: format!("build tool '{program}' not found in PATH"),
        })?;

        info!(variant = %variant, command = %self.command, "running external build");
        let output = Command::new(&program)
            .args(parts)
            .current_dir(&self.build_dir)
            .output()
            .map_err(PodbuildError::IoError)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PodbuildError::ExternalBuildFailure {
                variant: variant.to_string(),
                reason: format!(
                    "{} exited with {}: {}",
                    program.display(),
                    output.status,
                    stderr.trim()
                ),
            }
            .into());
        }

        self.collect_acknowledgements()
    }
}
