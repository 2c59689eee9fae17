//! Selection partitioning.
//!
//! Splits a validated selection into disjoint build groups. Subspecs
//! configured as "must build alone" produce one singleton group each
//! because their artifact path differs from their root pod's; everything
//! else groups by build variant. Processing order is fixed: split
//! subspecs, then debug, then release.

use tracing::debug;

use crate::config::PodbuildConfig;
use crate::pod::{self, BuildVariant, DependencyItem};

use super::BuildGroup;

/// Partition the validated selection into build groups.
///
/// `selected` is the validator's output; `buildable` is the full
/// non-prebuilt set, consulted to close subspec siblings together.
pub fn partition(
    mut selected: Vec<DependencyItem>,
    buildable: &[DependencyItem],
    config: &PodbuildConfig,
) -> Vec<BuildGroup> {
    // close subspec families: a subspec sibling of a selected subspec joins
    // the selection so the family is never split across groups inconsistently
    let selected_subspec_roots: Vec<String> = selected
        .iter()
        .filter(|item| item.is_subspec())
        .map(|item| item.root().to_string())
        .collect();
    let siblings: Vec<DependencyItem> = buildable
        .iter()
        .filter(|item| {
            item.is_subspec()
                && selected_subspec_roots.iter().any(|root| root == item.root())
                && !selected.iter().any(|s| s.name == item.name)
        })
        .cloned()
        .collect();
    if !siblings.is_empty() {
        debug!(count = siblings.len(), "pulling in subspec siblings");
        selected.extend(siblings);
    }

    // a selected pod that another selected pod depends on is folded into
    // that pod's closure; its presence and variant are owned by the dependent
    let dependency_names = pod::dependency_names(&selected);
    selected.retain(|item| !dependency_names.contains(&item.name));

    let mut split_subspecs = Vec::new();
    let mut remaining = Vec::new();
    for item in selected {
        if item.is_subspec() && config.subspecs_to_split.contains(&item.name.to_string()) {
            split_subspecs.push(item);
        } else {
            remaining.push(item);
        }
    }

    let (debug_items, release_items): (Vec<DependencyItem>, Vec<DependencyItem>) = remaining
        .into_iter()
        .partition(|item| item.variant == BuildVariant::Debug);

    let mut groups: Vec<BuildGroup> = split_subspecs
        .into_iter()
        .map(|item| BuildGroup {
            variant: item.variant,
            items: vec![item],
        })
        .collect();
    if !debug_items.is_empty() {
        groups.push(BuildGroup {
            variant: BuildVariant::Debug,
            items: debug_items,
        });
    }
    if !release_items.is_empty() {
        groups.push(BuildGroup {
            variant: BuildVariant::Release,
            items: release_items,
        });
    }
    groups
}
