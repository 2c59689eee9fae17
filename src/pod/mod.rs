//! Pod data model and graph queries.
//!
//! This module defines the vocabulary the whole planner speaks:
//! [`PodName`] (structured `Root/Subspec` identity), [`BuildVariant`], and
//! [`DependencyItem`], the immutable record for one resolvable pod in the
//! dependency graph handed in by the external resolver.
//!
//! Hierarchical pod identity is kept structured rather than string-encoded:
//! every "is subspec of" or "shares root with" question is a field
//! comparison, never a string split at the call site.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Structured pod identity: a root spec name plus an optional subspec name.
///
/// Parsed from the `Root` or `Root/Subspec` form used everywhere in the
/// ecosystem and re-rendered in the same form when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PodName {
    root: String,
    subspec: Option<String>,
}

impl PodName {
    /// Parse a pod name from its `Root` or `Root/Subspec` textual form.
    pub fn parse(name: &str) -> Self {
        match name.split_once('/') {
            Some((root, subspec)) => Self {
                root: root.to_string(),
                subspec: Some(subspec.to_string()),
            },
            None => Self {
                root: name.to_string(),
                subspec: None,
            },
        }
    }

    /// The root spec name, ignoring any subspec qualifier.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The subspec qualifier, if any.
    pub fn subspec(&self) -> Option<&str> {
        self.subspec.as_deref()
    }

    /// Whether this name addresses a subspec rather than a root spec.
    pub fn is_subspec(&self) -> bool {
        self.subspec.is_some()
    }

    /// Whether two names belong to the same root spec.
    pub fn shares_root(&self, other: &PodName) -> bool {
        self.root == other.root
    }
}

impl fmt::Display for PodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subspec {
            Some(subspec) => write!(f, "{}/{}", self.root, subspec),
            None => write!(f, "{}", self.root),
        }
    }
}

impl From<String> for PodName {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<&str> for PodName {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<PodName> for String {
    fn from(name: PodName) -> Self {
        name.to_string()
    }
}

/// Build configuration a group of pods is compiled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildVariant {
    Debug,
    #[default]
    Release,
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Release => write!(f, "release"),
        }
    }
}

/// One resolvable pod in the externally-resolved dependency graph.
///
/// Items are constructed once per planning run from the resolver snapshot
/// and never mutated; when a closure pass needs to reassign a pulled-in
/// dependency's variant it records the override separately and applies it
/// while materializing the group (see `resolver::closure`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyItem {
    /// Pod identity, possibly a subspec (`Root/Subspec`).
    pub name: PodName,
    /// Version pin reported by the external resolver, carried through
    /// untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Build configuration this item is declared to build under.
    #[serde(default)]
    pub variant: BuildVariant,
    /// Whether the item is already available prebuilt and therefore
    /// excluded from buildable consideration.
    #[serde(default)]
    pub prebuilt: bool,
    /// Whether the pod builds as a static framework. Opaque to the planner
    /// beyond a build-setting override in the descriptor.
    #[serde(default, rename = "static")]
    pub static_framework: bool,
    /// Names of the pods this item directly requires, as resolved by the
    /// external resolver.
    #[serde(default)]
    pub dependencies: Vec<PodName>,
    /// Swift version override for this pod, if the resolver reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift_version: Option<String>,
}

impl DependencyItem {
    /// The item's root spec name.
    pub fn root(&self) -> &str {
        self.name.root()
    }

    /// Whether the item is a subspec of some root pod.
    pub fn is_subspec(&self) -> bool {
        self.name.is_subspec()
    }

    /// Whether `other` is a common spec of this item: a sibling subspec of
    /// the same root, the root itself, or a subspec of this item's own root.
    ///
    /// Both relationships collapse to root equality on structured names.
    /// Common specs are exempt from every "conflicting shared dependency"
    /// decision because they are part of the same build unit.
    pub fn has_common_spec(&self, other: &PodName) -> bool {
        self.name.shares_root(other)
    }

    /// Whether this item directly depends on `name`.
    pub fn depends_on(&self, name: &PodName) -> bool {
        self.dependencies.contains(name)
    }

    /// Copy of this item with its build variant replaced.
    pub fn with_variant(&self, variant: BuildVariant) -> Self {
        Self {
            variant,
            ..self.clone()
        }
    }
}

/// Deduplicated root names of a set of items, preserving first-seen order.
pub fn root_names(items: &[DependencyItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(DependencyItem::root)
        .filter(|root| seen.insert(root.to_string()))
        .map(str::to_string)
        .collect()
}

/// Union of the direct dependency names of a set of items.
pub fn dependency_names(items: &[DependencyItem]) -> HashSet<PodName> {
    items
        .iter()
        .flat_map(|item| item.dependencies.iter().cloned())
        .collect()
}

/// Find an item by exact name.
pub fn find_item<'a>(items: &'a [DependencyItem], name: &PodName) -> Option<&'a DependencyItem> {
    items.iter().find(|item| &item.name == name)
}
