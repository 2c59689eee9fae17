//! podbuild - prebuilt dependency planner
//!
//! podbuild plans and reconciles prebuilding a subset of a project's
//! CocoaPods-style dependency pods into prebuilt artifacts while leaving
//! the rest of the dependency set untouched. It does not resolve version
//! constraints or fetch pods: the external resolver hands in a
//! fully-resolved dependency graph and podbuild operates purely on it.
//!
//! # Architecture Overview
//!
//! A run is a deterministic, side-effect-free planning pass followed by a
//! manifest-mutation pass:
//!
//! 1. The **selection validator** rejects ill-formed or unsafe requests
//!    (subspec paths, unknown pods, pods only reachable as dependencies,
//!    conflicting shared dependencies, misaligned build variants).
//! 2. The **partitioner** splits the selection into disjoint build groups
//!    by build variant and the "must build alone" subspec rule.
//! 3. The **closure builder** expands each group with everything it
//!    transitively depends on that isn't rebuilt elsewhere, inheriting the
//!    group's variant.
//! 4. Each group is rendered into a build descriptor and handed to the
//!    external build tool.
//! 5. After every group succeeded, the **restorable manifest** and the
//!    **acknowledgements side-manifest** are reconciled and written
//!    atomically, preserving entries for pods the run didn't touch.
//!
//! # Core Modules
//!
//! - [`pod`] - pod identity, build variants and the dependency item model
//! - [`resolver`] - validation, partitioning and closure expansion
//! - [`manifest`] - restorable manifest reconciliation and the prebuilt index
//! - [`license`] - acknowledgements side-manifest reconciliation
//! - [`source`] - resolved-graph intake from the external resolver
//! - [`builder`] - descriptor emission and the external build seam
//! - [`cli`] - the `podbuild build` command
//! - [`config`] - `podbuild.toml` project configuration
//! - [`core`] - error taxonomy and user-facing error reporting

pub mod builder;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod license;
pub mod manifest;
pub mod pod;
pub mod resolver;
pub mod source;
pub mod utils;
