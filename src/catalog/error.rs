//! Catalog-specific error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// An entity constructor was invoked without all identity-defining fields
    #[error("Incomplete identity: {0} must not be empty")]
    IncompleteIdentity(String),

    /// A file path falls outside the owning layout's root
    #[error("File '{path}' outside layout scope of '{root}'")]
    OutsideRoot { path: String, root: String },

    /// The operation needs a layout attachment the file does not have
    #[error("File '{0}' not attached to a layout")]
    Unattached(String),

    /// The path is not a member of the catalog
    #[error("File '{0}' not in catalog")]
    UnknownFile(String),

    /// A skip pattern supplied to the tree walk does not compile
    #[error("Invalid skip pattern: {0}")]
    SkipPattern(#[from] regex::Error),

    /// I/O error during directory traversal
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for cleaner function signatures
pub type Result<T> = std::result::Result<T, CatalogError>;
