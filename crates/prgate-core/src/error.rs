//! Error types for prgate-core.
//!
//! Two families live here and they never mix:
//! - [`ConfigurationError`] is produced while a rule set is being built and
//!   halts startup.
//! - [`CollaboratorError`] / [`EvalError`] are produced while a single check
//!   is evaluated and are contained at that check's boundary.

use thiserror::Error;

/// A rule set could not be constructed.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A `FileChanged` pattern is not a valid regular expression.
    #[error("invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Two manual checks share a description.
    #[error("manual check description must be unique (duplicate: {description})")]
    DuplicateManualCheck { description: String },

    /// A manual check routes review to nobody.
    #[error("manual check '{description}' must name at least one team")]
    EmptyTeams { description: String },

    /// A check was declared without a description.
    #[error("check description must not be empty")]
    EmptyDescription,

    /// A manifest or environment value could not be read.
    #[error("invalid configuration: {0}")]
    Manifest(String),
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(err: serde_json::Error) -> Self {
        ConfigurationError::Manifest(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigurationError {
    fn from(err: toml::de::Error) -> Self {
        ConfigurationError::Manifest(err.to_string())
    }
}

impl From<std::io::Error> for ConfigurationError {
    fn from(err: std::io::Error) -> Self {
        ConfigurationError::Manifest(err.to_string())
    }
}

/// A call into the code-review collaborator failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {cause}")]
pub struct CollaboratorError {
    /// Capability that was invoked, e.g. `changed_files`.
    pub operation: String,
    /// Transport-level cause as reported by the collaborator.
    pub cause: String,
}

impl CollaboratorError {
    pub fn new(operation: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            cause: cause.into(),
        }
    }
}

/// Why a leaf could not produce a definite answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// The run was cancelled before a side effect could be initiated.
    #[error("evaluation cancelled before acting")]
    Cancelled,
}

/// Result type for leaf and predicate evaluation.
pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// Result type for capability calls.
pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;
