//! On-disk definition format for specifications
//!
//! A specification is authored as a TOML document with an ordered list of
//! tag tables and an ordered list of path templates:
//!
//! ```toml
//! name = "bids"
//! path_patterns = [
//!     "sub-{subject}[/ses-{session}]/sub-{subject}[_ses-{session}]_{suffix}{extension}",
//! ]
//!
//! [[tags]]
//! name = "subject"
//! pattern = 'sub-(\w+)'
//!
//! [[tags]]
//! name = "session"
//! pattern = 'ses-(\w+)'
//! ```
//!
//! The core only requires the in-memory ordered lists; this module is the
//! adapter that produces them from a file. When a definition carries no
//! `name`, the file stem is used, so `bids.toml` yields a specification
//! named `bids`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::Result;
use super::{Specification, TagDef};

/// One tag table of a definition document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagEntry {
    pub name: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub valid_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Deserialized specification definition, not yet compiled
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SpecDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagEntry>,
    #[serde(default)]
    pub path_patterns: Vec<String>,
}

impl SpecDefinition {
    /// Parse a definition from TOML text.
    ///
    /// # Errors
    /// Returns `SpecError::Toml` if the document does not deserialize.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a definition file.
    ///
    /// # Errors
    /// Returns `SpecError::Io` if the file cannot be read and
    /// `SpecError::Toml` if it does not deserialize.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut definition = Self::from_toml(&content)?;
        if definition.name.is_none() {
            definition.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        Ok(definition)
    }

    /// Compile the definition into a ready-to-use [`Specification`].
    ///
    /// # Errors
    /// Returns `SpecError::Pattern` for a tag regex that does not compile
    /// and `SpecError::Template` for a structurally broken template.
    pub fn into_specification(self) -> Result<Specification> {
        let name = self.name.unwrap_or_default();
        let mut defs = Vec::with_capacity(self.tags.len());
        for entry in self.tags {
            let mut def = TagDef::new(&entry.name, &entry.pattern)?;
            if !entry.valid_values.is_empty() {
                def = def.with_valid_values(entry.valid_values);
            }
            if let Some(default) = entry.default {
                def = def.with_default(default);
            }
            defs.push(def);
        }
        Specification::new(name, defs, self.path_patterns)
    }
}

impl Specification {
    /// Load and compile a specification from a TOML definition file.
    ///
    /// # Errors
    /// Propagates read, parse and compilation errors from
    /// [`SpecDefinition::load`] and [`SpecDefinition::into_specification`].
    pub fn from_file(path: &Path) -> Result<Self> {
        SpecDefinition::load(path)?.into_specification()
    }
}
