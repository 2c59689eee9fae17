//! Well-known file and directory names used throughout podbuild.
//!
//! Defining them centrally keeps the on-disk layout discoverable and
//! prevents the names from drifting between the planner, the reconcilers
//! and the tests.

/// Project configuration file, looked up in the project root.
pub const CONFIG_FILE: &str = "podbuild.toml";

/// Directory holding podbuild's working files, relative to the project root.
pub const PODBUILD_DIR: &str = ".podbuild";

/// Resolved dependency graph snapshot emitted by the external resolver,
/// relative to [`PODBUILD_DIR`].
pub const RESOLVED_GRAPH_FILE: &str = "resolved-graph.json";

/// Restorable manifest recording the last fully-known-good set of
/// non-prebuilt pods, relative to the project root.
pub const RESTORE_MANIFEST_FILE: &str = "podbuild.restore";

/// Persisted acknowledgements side-manifest, relative to the project root.
pub const ACKNOWLEDGEMENTS_FILE: &str = "acknowledgements.json";

/// Markdown rendering of the acknowledgements, written next to
/// [`ACKNOWLEDGEMENTS_FILE`].
pub const ACKNOWLEDGEMENTS_MARKDOWN_FILE: &str = "acknowledgements.md";

/// Prebuilt index recording which pods are available prebuilt, relative
/// to [`PODBUILD_DIR`].
pub const PREBUILT_INDEX_FILE: &str = "prebuilt.toml";

/// Name of the build descriptor written into the build directory for the
/// external build tool.
pub const DESCRIPTOR_FILE: &str = "Podfile";

/// Default directory the external build runs in, relative to
/// [`PODBUILD_DIR`].
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Default command invoking the external build tool inside the build
/// directory.
pub const DEFAULT_BUILD_COMMAND: &str = "pod install";
