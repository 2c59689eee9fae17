//! Build plan resolution.
//!
//! Turns a validated build request into per-variant build groups with
//! complete dependency closures:
//!
//! 1. [`validation`] rejects ill-formed or unsafe requests against several
//!    graph invariants before anything is mutated,
//! 2. [`partition`] splits the selection into disjoint groups by build
//!    variant and the "must build alone" subspec rule,
//! 3. [`closure`] expands each group with everything it transitively
//!    depends on that isn't being rebuilt elsewhere, inheriting the
//!    group's variant.
//!
//! The whole pass is deterministic, synchronous and side-effect free.

pub mod closure;
pub mod partition;
pub mod validation;


use tracing::debug;

use crate::config::PodbuildConfig;
use crate::core::PodbuildError;
use crate::pod::{BuildVariant, DependencyItem, PodName};

/// An ordered sequence of pods destined for one build invocation.
///
/// All members share one build variant; dependencies precede dependents,
/// as required by the descriptor generation that consumes the group.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildGroup {
    pub variant: BuildVariant,
    pub items: Vec<DependencyItem>,
}

impl BuildGroup {
    pub fn names(&self) -> Vec<PodName> {
        self.items.iter().map(|item| item.name.clone()).collect()
    }
}

/// The complete plan for one run.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Closed build groups in processing order: split subspecs, then
    /// debug, then release.
    pub groups: Vec<BuildGroup>,
    /// The pods the user's request selected, before closure expansion.
    /// This is the "updated" set the manifest reconciler keys on.
    pub updated: Vec<DependencyItem>,
}

impl BuildPlan {
    /// Every pod any group will build, deduplicated by name in group order.
    pub fn built_items(&self) -> Vec<DependencyItem> {
        let mut seen = std::collections::HashSet::new();
        self.groups
            .iter()
            .flat_map(|group| group.items.iter())
            .filter(|item| seen.insert(item.name.clone()))
            .cloned()
            .collect()
    }
}

/// Resolve a validated request into a [`BuildPlan`].
///
/// `requested` holds root names only (subspec paths have already been
/// rejected by the caller going through [`validation::validate_selection`],
/// which this re-runs as its first step); `buildable` is the full
/// non-prebuilt item set.
pub fn plan(
    requested: &[String],
    buildable: &[DependencyItem],
    config: &PodbuildConfig,
) -> Result<BuildPlan, PodbuildError> {
    let selected = validation::validate_selection(requested, buildable)?;
    debug!(pods = selected.len(), "selection validated");

    let groups = partition::partition(selected, buildable, config);
    let updated: Vec<DependencyItem> = groups
        .iter()
        .flat_map(|group| group.items.iter().cloned())
        .collect();

    let groups = groups
        .into_iter()
        .map(|group| closure::expand(group, buildable))
        .collect::<Vec<_>>();
    debug!(groups = groups.len(), "build plan ready");

    Ok(BuildPlan { groups, updated })
}
