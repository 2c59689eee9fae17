//! Error handling for podbuild.
//!
//! The error system has two layers:
//! - [`PodbuildError`] - strongly-typed failures for every abort condition
//!   in the planning and reconciliation pipeline
//! - [`ErrorContext`] - a display wrapper adding an actionable suggestion
//!   and optional details for CLI users
//!
//! Every planning failure is fatal and synchronous: validation errors abort
//! before any external build or manifest mutation, and a failed external
//! build discards all planning artifacts so nothing is written. Use
//! [`user_friendly_error`] at the CLI boundary to turn any error into a
//! colored message with the corrective command for its failure kind.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// All failure modes of a podbuild run.
///
/// The selection errors (`SubspecRequested`, `UnknownPod`,
/// `DependencyRequested`) are user input errors; the conflict errors
/// (`CommonDependency`, `MisalignedVariants`) are structural problems in the
/// whole dependency graph, not just the current selection, and can therefore
/// fire even for pods the user did not name.
#[derive(Error, Debug)]
pub enum PodbuildError {
    /// A build request named a subspec path; users must name the root pod.
    #[error("cannot build subspec '{name}', refer to the root spec name instead")]
    SubspecRequested {
        name: String,
        /// Deduplicated root-name equivalents of the full request.
        roots: Vec<String>,
    },

    /// A requested name matches no buildable pod's root name.
    #[error("pod '{name}' was not found among the buildable pods")]
    UnknownPod {
        name: String,
        known: Vec<String>,
        closest: Option<String>,
    },

    /// A requested pod is only reachable as another buildable pod's
    /// dependency and cannot be rebuilt directly.
    #[error("cannot build '{name}' because it is a dependency of '{parent}'")]
    DependencyRequested { name: String, parent: String },

    /// A requested pod shares a dependency with an untouched buildable pod;
    /// building only the requested pod would silently diverge the shared
    /// dependency's build variant.
    #[error("cannot build '{pod}' because it has common dependencies ({dependency}) with '{other}'")]
    CommonDependency {
        pod: String,
        dependency: String,
        other: String,
        /// The names currently selected, used to phrase the corrective command.
        selection: Vec<String>,
    },

    /// Pods sharing a non-common-spec dependency declare different build
    /// variants. Audited across the full buildable set.
    #[error("dependencies of '{pod}' don't have the same build variant ({variant}) as dependencies of: {}", misaligned.join(", "))]
    MisalignedVariants {
        pod: String,
        variant: String,
        misaligned: Vec<String>,
    },

    /// The acknowledgements side-manifest violated a structural invariant,
    /// indicating upstream data corruption. Never auto-repaired.
    #[error("malformed acknowledgements data: {reason}")]
    MalformedSideManifest { reason: String },

    /// The external build tool failed for one group. The whole run aborts
    /// and no manifest is written.
    #[error("external build failed for the {variant} group: {reason}")]
    ExternalBuildFailure { variant: String, reason: String },

    /// The resolver snapshot contains two items with the same name.
    #[error("resolved graph contains duplicate pod '{name}'")]
    DuplicateGraphItem { name: String },

    /// No resolved-graph snapshot was found where the external resolver
    /// should have written one.
    #[error("resolved dependency graph not found at {path}")]
    GraphNotFound { path: String },

    /// The resolved-graph snapshot could not be parsed.
    #[error("invalid resolved graph at {path}: {reason}")]
    GraphParseError { path: String, reason: String },

    /// Targets disagree on the project Swift version; exactly one is
    /// expected.
    #[error("found different Swift versions across targets, expecting one, got {versions:?}")]
    SwiftVersionMismatch { versions: Vec<String> },

    /// A build group unexpectedly mixes build variants.
    #[error("found different build variants within one group: {variants:?}")]
    MixedVariantGroup { variants: Vec<String> },

    /// Configuration file problems.
    #[error("configuration error in {file}: {reason}")]
    ConfigError { file: String, reason: String },

    /// IO error from [`std::io::Error`].
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error from [`toml::de::Error`].
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error from [`toml::ser::Error`].
    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// JSON error from [`serde_json::Error`].
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// User-facing wrapper pairing an error with a suggestion and details.
pub struct ErrorContext {
    pub error: anyhow::Error,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{} {}", "error:".red().bold(), self.error);
        if let Some(details) = &self.details {
            eprintln!("\n{details}");
        }
        if let Some(suggestion) = &self.suggestion {
            eprintln!("\n{} {}", "suggestion:".yellow().bold(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\n{details}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nsuggestion: {suggestion}")?;
        }
        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with a per-kind suggestion.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let (suggestion, details) = match error.downcast_ref::<PodbuildError>() {
        Some(PodbuildError::SubspecRequested { roots, .. }) => (
            Some(format!("run `podbuild build {}` instead", roots.join(" "))),
            None,
        ),
        Some(PodbuildError::UnknownPod { known, closest, .. }) => (
            closest
                .as_ref()
                .map(|closest| format!("did you mean '{closest}'?")),
            Some(format!("Buildable pods:\n{}", known.join("\n"))),
        ),
        Some(PodbuildError::DependencyRequested { parent, .. }) => (
            Some(format!("run `podbuild build {parent}` instead")),
            None,
        ),
        Some(PodbuildError::CommonDependency {
            selection, other, ..
        }) => (
            Some(format!(
                "run `podbuild build {} {}` instead",
                selection.join(" "),
                other
            )),
            None,
        ),
        Some(PodbuildError::MisalignedVariants { pod, misaligned, .. }) => (
            Some(format!(
                "align the declared build variants of {} and {}",
                pod,
                misaligned.join(", ")
            )),
            None,
        ),
        Some(PodbuildError::GraphNotFound { .. }) => (
            Some("run the external resolver first, or pass --update-sources".to_string()),
            None,
        ),
        Some(PodbuildError::ExternalBuildFailure { .. }) => (
            Some("re-run with --verbose for the full build output".to_string()),
            None,
        ),
        _ => (None, None),
    };

    let mut ctx = ErrorContext::new(error);
    if let Some(suggestion) = suggestion {
        ctx = ctx.with_suggestion(suggestion);
    }
    if let Some(details) = details {
        ctx = ctx.with_details(details);
    }
    ctx
}
