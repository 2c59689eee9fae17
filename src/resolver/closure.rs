//! Dependency closure expansion.
//!
//! Expands one build group to a fixed point with every non-prebuilt pod it
//! transitively depends on, excluding common specs of the member pulling
//! them in. Pulled-in pods inherit the group's build variant and are
//! prepended so dependencies always precede dependents, the ordering the
//! descriptor generation downstream requires.
//!
//! Items stay immutable: variant reassignments are recorded in a separate
//! [`VariantOverrides`] map and applied when the group is materialized, so
//! a pod taking part in several candidate closures is never mutated in
//! place.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::pod::{self, BuildVariant, DependencyItem, PodName};

use super::BuildGroup;

/// Variant reassignments accumulated while expanding a group.
#[derive(Debug, Default)]
pub struct VariantOverrides(HashMap<PodName, BuildVariant>);

impl VariantOverrides {
    fn set(&mut self, name: PodName, variant: BuildVariant) {
        self.0.insert(name, variant);
    }

    fn get(&self, name: &PodName) -> Option<BuildVariant> {
        self.0.get(name).copied()
    }
}

/// Expand `group` with its full dependency closure over `buildable`.
///
/// Idempotent: expanding an already-closed group changes nothing.
pub fn expand(group: BuildGroup, buildable: &[DependencyItem]) -> BuildGroup {
    let variant = group.variant;
    let mut ordered: VecDeque<PodName> = group.names().into();
    let mut members: HashSet<PodName> = ordered.iter().cloned().collect();
    let mut overrides = VariantOverrides::default();

    let mut queue: VecDeque<PodName> = ordered.iter().cloned().collect();
    while let Some(name) = queue.pop_front() {
        let Some(item) = pod::find_item(buildable, &name) else {
            continue;
        };
        for dependency in &item.dependencies {
            if members.contains(dependency) || item.has_common_spec(dependency) {
                continue;
            }
            // prebuilt or externally-satisfied dependencies have no
            // buildable item and stay out of the group
            if pod::find_item(buildable, dependency).is_none() {
                continue;
            }
            members.insert(dependency.clone());
            ordered.push_front(dependency.clone());
            overrides.set(dependency.clone(), variant);
            queue.push_back(dependency.clone());
        }
    }

    // materialize: members already carried by the group keep their variant
    // (it may itself be an earlier override), fresh pulls apply theirs
    let items = ordered
        .iter()
        .filter_map(|name| {
            pod::find_item(&group.items, name).or_else(|| pod::find_item(buildable, name))
        })
        .map(|item| match overrides.get(&item.name) {
            Some(variant) => item.with_variant(variant),
            None => item.clone(),
        })
        .collect();

    BuildGroup { variant, items }
}
