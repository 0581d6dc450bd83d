//! Specification-specific error types
//!
//! Only construction-time failures live here. Per-path outcomes (a template
//! that cannot be resolved, a tag that does not match) are deliberately not
//! errors; those surface as `None` or absent map entries so that indexing a
//! large tree is never aborted by one bad path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    /// A tag definition carries a regex that does not compile
    #[error("Invalid pattern for tag '{name}': {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// A path template is structurally broken (unbalanced optional brackets,
    /// or an optional segment without exactly one tag token)
    #[error("Malformed template '{template}': {detail}")]
    Template { template: String, detail: String },

    /// I/O error when reading a definition file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error in a definition file
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SpecError {
    pub(crate) fn pattern(name: &str, source: regex::Error) -> Self {
        Self::Pattern {
            name: name.to_string(),
            source,
        }
    }

    pub(crate) fn template(template: &str, detail: impl Into<String>) -> Self {
        Self::Template {
            template: template.to_string(),
            detail: detail.into(),
        }
    }
}

/// Type alias for cleaner function signatures
pub type Result<T> = std::result::Result<T, SpecError>;
