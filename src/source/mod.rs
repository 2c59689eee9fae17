//! Resolved dependency graph intake.
//!
//! podbuild never resolves version constraints or fetches pods itself; the
//! external resolver hands in a fully-resolved graph snapshot. This module
//! defines that snapshot ([`ResolvedGraph`]), the [`GraphSource`] seam the
//! planner consumes it through, and the file-backed implementation reading
//! `.podbuild/resolved-graph.json`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::constants::{PODBUILD_DIR, RESOLVED_GRAPH_FILE};
use crate::core::PodbuildError;
use crate::pod::{DependencyItem, PodName};

/// Deployment platform reported by the resolver. Multiple platforms per
/// project are not supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
    pub deployment_target: String,
}

impl Default for Platform {
    fn default() -> Self {
        Self {
            name: "ios".to_string(),
            deployment_target: "13.0".to_string(),
        }
    }
}

/// Snapshot of the externally-resolved dependency graph.
///
/// The planner only reads: item identities and dependency names, declared
/// sources, the target platform, per-target Swift versions and per-target
/// spec membership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedGraph {
    /// Exactly one item per pod name.
    #[serde(default)]
    pub items: Vec<DependencyItem>,
    /// Spec repository URLs the resolver used.
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub platform: Platform,
    /// Swift version declared by each target.
    #[serde(default)]
    pub swift_version_by_target: BTreeMap<String, String>,
    /// Targets present in the resolver result.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Pod membership of each target definition.
    #[serde(default)]
    pub pods_by_target: BTreeMap<String, Vec<PodName>>,
}

impl ResolvedGraph {
    /// All non-prebuilt items, the set every planning decision runs over.
    pub fn buildable_items(&self) -> Vec<DependencyItem> {
        self.items.iter().filter(|item| !item.prebuilt).cloned().collect()
    }

    /// The single Swift version shared by all targets, if any declares one.
    ///
    /// Targets disagreeing on the version is an error; the descriptor can
    /// only carry one.
    pub fn project_swift_version(&self) -> Result<Option<String>, PodbuildError> {
        let mut versions: Vec<String> = self
            .swift_version_by_target
            .values()
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        versions.sort();

        match versions.len() {
            0 => Ok(None),
            1 => Ok(Some(versions.remove(0))),
            _ => Err(PodbuildError::SwiftVersionMismatch { versions }),
        }
    }

    fn check_unique_names(&self) -> Result<(), PodbuildError> {
        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(&item.name) {
                return Err(PodbuildError::DuplicateGraphItem {
                    name: item.name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Seam between the planner and the external resolver.
pub trait GraphSource {
    /// Produce the resolved graph for `project_root`, optionally forcing
    /// the resolver to refresh its sources first.
    fn resolve(&self, project_root: &Path, refresh_sources: bool) -> Result<ResolvedGraph>;
}

/// [`GraphSource`] reading the snapshot the external resolver wrote to
/// `.podbuild/resolved-graph.json`, optionally re-running the resolver
/// command first.
pub struct FileGraphSource {
    resolve_command: Option<String>,
}

impl FileGraphSource {
    pub fn new(resolve_command: Option<String>) -> Self {
        Self { resolve_command }
    }
}

impl GraphSource for FileGraphSource {
    fn resolve(&self, project_root: &Path, refresh_sources: bool) -> Result<ResolvedGraph> {
        if refresh_sources {
            if let Some(command) = &self.resolve_command {
                info!("refreshing resolver sources: {command}");
                let status = Command::new("sh")
                    .arg("-c")
                    .arg(command)
                    .current_dir(project_root)
                    .status()
                    .map_err(PodbuildError::IoError)?;
                if !status.success() {
                    return Err(PodbuildError::GraphParseError {
                        path: project_root.display().to_string(),
                        reason: format!("resolver command exited with {status}"),
                    }
                    .into());
                }
            }
        }

        let path = project_root.join(PODBUILD_DIR).join(RESOLVED_GRAPH_FILE);
        if !path.exists() {
            return Err(PodbuildError::GraphNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(&path).map_err(PodbuildError::IoError)?;
        let graph: ResolvedGraph =
            serde_json::from_str(&content).map_err(|e| PodbuildError::GraphParseError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        graph.check_unique_names()?;

        debug!(
            items = graph.items.len(),
            targets = graph.targets.len(),
            "loaded resolved graph"
        );
        Ok(graph)
    }
}
