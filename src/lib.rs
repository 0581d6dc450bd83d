//! Curatr - a specification-driven file catalog with tag-based queries
//!
//! This library catalogs files in hierarchical research-data trees. A
//! [`Specification`] describes how tags are encoded in paths (ordered tag
//! patterns plus ordered path templates); a [`Layout`] applies one
//! specification to the files under a root, and an inverted
//! [`TagIndex`] answers multi-attribute AND queries against the result.
//! The same specification also rebuilds canonical paths from tag sets,
//! which is what path validation and reorganization planning are made of.
//!
//! Concurrency model: a layout is mutated by one logical writer at a time.
//! The identity cache and the tag index are plain single-threaded state
//! owned per layout; wrap a layout in your own synchronization if you need
//! to share it.

use thiserror::Error;

pub mod catalog;
pub mod index;
pub mod rules;
pub mod spec;
pub mod walk;

#[cfg(test)]
pub mod testing;

pub use catalog::{CatalogError, File, FileRecord, Layout, Tag};
pub use index::TagIndex;
pub use rules::{OrganizePlanner, RuleError, TagRule};
pub use spec::{SpecDefinition, SpecError, Specification, TagDef};
pub use walk::IndexOptions;

/// Error enum, contains all failure states of the crate
#[derive(Debug, Error)]
pub enum CuratrError {
    /// Specification construction or loading error
    #[error("Specification error: {0}")]
    Spec(#[from] spec::SpecError),
    /// Catalog model error
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),
    /// Reorganization rule error
    #[error("Rule error: {0}")]
    Rule(#[from] rules::RuleError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
