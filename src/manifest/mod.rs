//! Restorable manifest reconciliation and the prebuilt index.
//!
//! `podbuild.restore` records the last fully-known-good set of non-prebuilt
//! pods actually present in the host project, one entry per pod grouped
//! under the resolver's target sections. After a partial rebuild the
//! reconciler merges the freshly built pods into it while restoring every
//! untouched root family's previous entry verbatim, so packages the user
//! did not ask to rebuild never silently drift to whatever the live graph
//! currently reports.
//!
//! Both files are read once at the start of a run and written once, after
//! every build group succeeded, with an atomic replace.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::pod::{BuildVariant, DependencyItem, PodName};
use crate::source::ResolvedGraph;
use crate::utils::fs::safe_write;

/// One persisted declaration of a pod's pinned configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoreEntry {
    pub name: PodName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub variant: BuildVariant,
    #[serde(default, rename = "static")]
    pub static_framework: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift_version: Option<String>,
}

impl From<&DependencyItem> for RestoreEntry {
    fn from(item: &DependencyItem) -> Self {
        Self {
            name: item.name.clone(),
            version: item.version.clone(),
            variant: item.variant,
            static_framework: item.static_framework,
            swift_version: item.swift_version.clone(),
        }
    }
}

/// Persisted snapshot of the last known complete set of non-prebuilt pods,
/// grouped by target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestorableManifest {
    #[serde(default)]
    pub targets: BTreeMap<String, Vec<RestoreEntry>>,
}

impl RestorableManifest {
    /// Load the manifest, returning `None` when it doesn't exist yet
    /// (first run).
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read restorable manifest: {}", path.display()))?;
        let manifest = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?;
        Ok(Some(manifest))
    }

    /// Persist the manifest atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .with_context(|| format!("Cannot serialize restorable manifest for {}", path.display()))?;
        safe_write(path, &content)
    }

    /// Look up a pod's entry across all target sections.
    pub fn entry(&self, name: &PodName) -> Option<&RestoreEntry> {
        self.targets
            .values()
            .flat_map(|entries| entries.iter())
            .find(|entry| &entry.name == name)
    }
}

/// Merge this run's build results into the previously persisted manifest.
///
/// Per snapshot item: an exact-name match against the updated pods takes
/// the fresh item; an entirely untouched root family with a previous entry
/// of the same name restores that entry verbatim, even if the live snapshot
/// would compute something different; everything else (a partially touched
/// family) takes the fresh snapshot. Entries are grouped under the
/// resolver's target sections, skipping sections whose target has no
/// resolver result target ending with its name.
pub fn reconcile(
    updated: &[DependencyItem],
    snapshot: &[DependencyItem],
    previous: Option<&RestorableManifest>,
    graph: &ResolvedGraph,
) -> RestorableManifest {
    let resolved: Vec<RestoreEntry> = snapshot
        .iter()
        .map(|item| {
            if let Some(updated_item) = updated.iter().find(|u| u.name == item.name) {
                return RestoreEntry::from(updated_item);
            }

            let family_untouched = !updated.iter().any(|u| u.root() == item.root());
            if family_untouched {
                if let Some(restored) = previous.and_then(|p| p.entry(&item.name)) {
                    return restored.clone();
                }
            }

            RestoreEntry::from(item)
        })
        .collect();

    let mut targets = BTreeMap::new();
    for (target, pod_names) in &graph.pods_by_target {
        let present = graph.targets.iter().any(|t| t.ends_with(target.as_str()));
        if !present {
            debug!(target, "skipping target absent from the resolver result");
            continue;
        }

        let entries: Vec<RestoreEntry> = pod_names
            .iter()
            .filter_map(|name| resolved.iter().find(|entry| &entry.name == name))
            .cloned()
            .collect();
        targets.insert(target.clone(), entries);
    }

    RestorableManifest { targets }
}

/// Record of the pods now available prebuilt, written to
/// `.podbuild/prebuilt.toml` after a successful run unless the update is
/// skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrebuiltIndex {
    #[serde(default)]
    pub pods: Vec<RestoreEntry>,
}

impl PrebuiltIndex {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a DependencyItem>) -> Self {
        Self {
            pods: items.into_iter().map(RestoreEntry::from).collect(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .with_context(|| format!("Cannot serialize prebuilt index for {}", path.display()))?;
        safe_write(path, &content)
    }
}
