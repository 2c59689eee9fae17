//! Selection validation.
//!
//! Five checks run in a fixed order before any mutation happens; each one
//! assumes the invariants established by the previous one (common-dependency
//! detection, for instance, assumes no subspec-path requests remain). Every
//! failure is fatal and aborts the whole run.
//!
//! The first four checks concern the user's request. The fifth audits the
//! entire buildable graph for misaligned build variants, independent of the
//! selection, and can therefore fail for pods the user never named.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

use crate::core::PodbuildError;
use crate::pod::{self, DependencyItem, PodName};

/// Validate a build request against the buildable item set.
///
/// `requested` holds the user's pod names; `buildable` is the full
/// non-prebuilt collection. Returns the selected items (every buildable
/// item whose root name was requested) on success.
pub fn validate_selection(
    requested: &[String],
    buildable: &[DependencyItem],
) -> Result<Vec<DependencyItem>, PodbuildError> {
    check_no_subspec_requests(requested)?;
    check_pods_exist(requested, buildable)?;

    let selected: Vec<DependencyItem> = buildable
        .iter()
        .filter(|item| requested.iter().any(|name| name == item.root()))
        .cloned()
        .collect();
    let others: Vec<&DependencyItem> = buildable
        .iter()
        .filter(|item| !selected.iter().any(|s| s.name == item.name))
        .collect();

    check_not_building_dependency(&selected, &others)?;
    check_no_common_dependencies(&selected, &others, requested)?;
    check_variant_alignment(buildable)?;

    Ok(selected)
}

/// Requests must name root pods, never subspec paths.
fn check_no_subspec_requests(requested: &[String]) -> Result<(), PodbuildError> {
    for name in requested {
        let parsed = PodName::parse(name);
        if parsed.is_subspec() {
            let mut roots = Vec::new();
            for other in requested {
                let root = PodName::parse(other).root().to_string();
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
            return Err(PodbuildError::SubspecRequested {
                name: name.clone(),
                roots,
            });
        }
    }
    Ok(())
}

/// Every requested name must match some buildable item's root name.
fn check_pods_exist(
    requested: &[String],
    buildable: &[DependencyItem],
) -> Result<(), PodbuildError> {
    let known = pod::root_names(buildable);
    for name in requested {
        if !known.iter().any(|root| root == name) {
            let closest = known
                .iter()
                .map(|root| (root, strsim::jaro_winkler(name, root)))
                .filter(|(_, score)| *score > 0.8)
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(root, _)| root.clone());
            return Err(PodbuildError::UnknownPod {
                name: name.clone(),
                known,
                closest,
            });
        }
    }
    Ok(())
}

/// A pod that is only reachable as another buildable pod's dependency
/// cannot be rebuilt directly; its build is owned by whoever depends on it.
fn check_not_building_dependency(
    selected: &[DependencyItem],
    others: &[&DependencyItem],
) -> Result<(), PodbuildError> {
    let reachable: HashSet<&PodName> = others
        .iter()
        .flat_map(|item| item.dependencies.iter())
        .collect();

    for item in selected {
        if reachable.contains(&item.name) {
            let parent = others
                .iter()
                .find(|other| other.depends_on(&item.name))
                .expect("reachable implies a parent exists");
            return Err(PodbuildError::DependencyRequested {
                name: item.name.to_string(),
                parent: parent.name.to_string(),
            });
        }
    }
    Ok(())
}

/// Building a pod that shares a dependency with an untouched buildable pod
/// would silently diverge the shared dependency's build variant, so the
/// pair must be rebuilt together.
///
/// Two exemptions: the other pod is itself a direct dependency of the
/// selected pod (it gets folded into the selected pod's closure anyway),
/// and the shared name is a subspec or common spec of the other pod.
fn check_no_common_dependencies(
    selected: &[DependencyItem],
    others: &[&DependencyItem],
    requested: &[String],
) -> Result<(), PodbuildError> {
    for item in selected {
        for dependency in &item.dependencies {
            for other in others {
                if item.depends_on(&other.name) {
                    continue;
                }
                if other.depends_on(dependency)
                    && !other.has_common_spec(dependency)
                {
                    return Err(PodbuildError::CommonDependency {
                        pod: item.name.to_string(),
                        dependency: dependency.to_string(),
                        other: other.name.to_string(),
                        selection: requested.to_vec(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Pods sharing a non-common-spec dependency must declare the same build
/// variant, audited over the whole buildable set.
///
/// The dependency edges are modeled as a directed graph so each shared
/// dependency's dependents can be read off its incoming edges.
fn check_variant_alignment(buildable: &[DependencyItem]) -> Result<(), PodbuildError> {
    let mut graph: DiGraph<PodName, ()> = DiGraph::new();
    let mut nodes: HashMap<PodName, NodeIndex> = HashMap::new();

    let mut ensure_node = |graph: &mut DiGraph<PodName, ()>, name: &PodName| -> NodeIndex {
        if let Some(&index) = nodes.get(name) {
            index
        } else {
            let index = graph.add_node(name.clone());
            nodes.insert(name.clone(), index);
            index
        }
    };

    for item in buildable {
        let from = ensure_node(&mut graph, &item.name);
        for dependency in &item.dependencies {
            if item.has_common_spec(dependency) {
                continue;
            }
            let to = ensure_node(&mut graph, dependency);
            if !graph.contains_edge(from, to) {
                graph.add_edge(from, to, ());
            }
        }
    }

    let position: HashMap<&PodName, usize> = buildable
        .iter()
        .enumerate()
        .map(|(index, item)| (&item.name, index))
        .collect();

    for node in graph.node_indices() {
        let mut dependents: Vec<&DependencyItem> = graph
            .neighbors_directed(node, Direction::Incoming)
            .filter_map(|index| pod::find_item(buildable, &graph[index]))
            .collect();
        if dependents.len() < 2 {
            continue;
        }
        dependents.sort_by_key(|item| position[&item.name]);

        let anchor = dependents[0];
        let mut misaligned: Vec<String> = dependents[1..]
            .iter()
            .filter(|item| item.variant != anchor.variant)
            .map(|item| item.name.to_string())
            .collect();
        if !misaligned.is_empty() {
            misaligned.sort();
            misaligned.dedup();
            return Err(PodbuildError::MisalignedVariants {
                pod: anchor.name.to_string(),
                variant: anchor.variant.to_string(),
                misaligned,
            });
        }
    }
    Ok(())
}
