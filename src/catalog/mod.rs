//! Catalog model: layouts, files, and the tags that mark them.
//!
//! A [`Layout`] applies one [`Specification`] to the files under a root
//! directory. Files and tags are created through an [`IdentityCache`]
//! scoped to the layout, so every distinct `(name, value)` pair exists as
//! exactly one shared [`Tag`] instance and every path as one [`File`]
//! entry. The layout keeps an inverted [`TagIndex`](crate::index::TagIndex)
//! in sync with its members; queries are answered from that index without
//! touching the filesystem.
//!
//! The cache and index are owned per layout, i.e. per indexing session.
//! Nothing here is shared process-wide and nothing is synchronized: one
//! logical writer mutates a layout at a time (see the crate docs).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

pub mod error;
pub mod identity;

pub use error::{CatalogError, Result};
pub use identity::{Identity, IdentityCache};

use crate::index::TagIndex;
use crate::spec::Specification;

/// Immutable `(name, value)` pair marking a file
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub struct Tag {
    name: String,
    value: String,
}

impl Tag {
    /// Create a tag from its identity pair.
    ///
    /// # Errors
    /// Returns [`CatalogError::IncompleteIdentity`] when either field is
    /// empty; an identity must be fully specified before caching.
    pub fn new(name: &str, value: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(CatalogError::IncompleteIdentity("tag name".into()));
        }
        if value.is_empty() {
            return Err(CatalogError::IncompleteIdentity("tag value".into()));
        }
        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Identity for Tag {
    type Key = (String, String);

    fn identity(&self) -> Self::Key {
        (self.name.clone(), self.value.clone())
    }
}

/// Catalog entry for one path under a layout root
#[derive(Debug, Clone)]
pub struct File {
    path: String,
    root: Option<String>,
    tags: HashMap<String, Rc<Tag>>,
}

impl File {
    /// Create an unattached file entry.
    ///
    /// # Errors
    /// Returns [`CatalogError::IncompleteIdentity`] for an empty path.
    pub fn new(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(CatalogError::IncompleteIdentity("file path".into()));
        }
        Ok(Self {
            path: path.to_string(),
            root: None,
            tags: HashMap::new(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The owning layout's root, when attached
    #[must_use]
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    #[must_use]
    pub fn attached(&self) -> bool {
        self.root.is_some()
    }

    /// Path relative to the owning layout's root.
    ///
    /// # Errors
    /// Returns [`CatalogError::Unattached`] when the file has no layout.
    pub fn rel_path(&self) -> Result<String> {
        let root = self
            .root
            .as_deref()
            .ok_or_else(|| CatalogError::Unattached(self.path.clone()))?;
        Ok(rel_path_under(&self.path, root))
    }

    /// Value for one tag name
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(|t| t.value())
    }

    /// Iterate the file's tag pairs in no particular order
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(name, tag)| (name.as_str(), tag.value()))
    }

    /// Owned `name -> value` snapshot of the tag map
    #[must_use]
    pub fn tag_map(&self) -> HashMap<String, String> {
        self.tags
            .iter()
            .map(|(name, tag)| (name.clone(), tag.value().to_string()))
            .collect()
    }

    /// Shared [`Tag`] instance for one name
    #[must_use]
    pub fn shared_tag(&self, name: &str) -> Option<Rc<Tag>> {
        self.tags.get(name).map(Rc::clone)
    }

    /// Plain value object for the persistence boundary
    #[must_use]
    pub fn record(&self) -> FileRecord {
        FileRecord {
            path: self.path.clone(),
            root: self.root.clone(),
            tags: self.tag_map(),
        }
    }

    /// One value per name; re-tagging replaces the previous instance.
    fn set_tag(&mut self, tag: Rc<Tag>) {
        self.tags.insert(tag.name().to_string(), tag);
    }
}

impl Identity for File {
    type Key = String;

    fn identity(&self) -> Self::Key {
        self.path.clone()
    }
}

/// Serializable snapshot of a file and its tags for storage layers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub root: Option<String>,
    pub tags: HashMap<String, String>,
}

/// Structured collection of files under one root, governed by a specification
#[derive(Debug)]
pub struct Layout {
    root: String,
    specification: Specification,
    files: HashMap<String, File>,
    tag_cache: IdentityCache<Tag>,
    index: TagIndex,
}

impl Layout {
    /// Create an empty layout for `root` governed by `specification`.
    ///
    /// # Errors
    /// Returns [`CatalogError::IncompleteIdentity`] for an empty root.
    pub fn new(root: &str, specification: Specification) -> Result<Self> {
        if root.is_empty() {
            return Err(CatalogError::IncompleteIdentity("layout root".into()));
        }
        Ok(Self {
            root: root.to_string(),
            specification,
            files: HashMap::new(),
            tag_cache: IdentityCache::new(),
            index: TagIndex::new(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn specification(&self) -> &Specification {
        &self.specification
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&File> {
        self.files.get(path)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Member files sorted by path
    #[must_use]
    pub fn files(&self) -> Vec<&File> {
        let mut files: Vec<&File> = self.files.values().collect();
        files.sort_by_key(|f| f.path());
        files
    }

    /// Add a path to the layout, extracting its tags from the path relative
    /// to the root.
    ///
    /// Re-adding a known path re-extracts and replaces its tags (last write
    /// wins per tag name).
    ///
    /// # Errors
    /// Returns [`CatalogError::OutsideRoot`] when the path does not fall
    /// under the layout root and [`CatalogError::IncompleteIdentity`] when
    /// it is empty.
    pub fn add_file(&mut self, path: &str) -> Result<&File> {
        if !Path::new(path).starts_with(&self.root) {
            return Err(CatalogError::OutsideRoot {
                path: path.to_string(),
                root: self.root.clone(),
            });
        }

        let mut file = File::new(path)?;
        file.root = Some(self.root.clone());

        let extracted = self.specification.extract_tags(&file.rel_path()?);
        debug!(path, tags = extracted.len(), "adding file to layout");
        for (name, value) in &extracted {
            let key = (name.clone(), value.clone());
            let tag = self
                .tag_cache
                .get_or_create(&key, || Tag::new(name, value))?;
            file.set_tag(tag);
        }

        self.index.add_file(path, &file.tag_map());
        self.files.insert(path.to_string(), file);
        Ok(&self.files[path])
    }

    /// Remove a path and its postings; true when it was a member
    pub fn remove_file(&mut self, path: &str) -> bool {
        self.index.remove_file(path);
        self.files.remove(path).is_some()
    }

    /// Mark a member file with an extra tag (metadata, caller-computed
    /// values). Overwrites any previous value for that name.
    ///
    /// # Errors
    /// Returns [`CatalogError::UnknownFile`] for a non-member path and
    /// [`CatalogError::IncompleteIdentity`] for empty tag fields.
    pub fn annotate(&mut self, path: &str, name: &str, value: &str) -> Result<()> {
        let key = (name.to_string(), value.to_string());
        let tag = self
            .tag_cache
            .get_or_create(&key, || Tag::new(name, value))?;
        let file = self
            .files
            .get_mut(path)
            .ok_or_else(|| CatalogError::UnknownFile(path.to_string()))?;
        file.set_tag(tag);
        self.index.add_file(path, &file.tag_map());
        Ok(())
    }

    /// Merge the flat part of a JSON object into a member file's tags.
    ///
    /// Nested objects and arrays are discarded; strings, numbers and
    /// booleans become tag values. The caller reads the sidecar; this only
    /// accepts its parsed form.
    ///
    /// # Errors
    /// Returns [`CatalogError::UnknownFile`] for a non-member path.
    pub fn annotate_metadata(&mut self, path: &str, metadata: &serde_json::Value) -> Result<()> {
        if !self.files.contains_key(path) {
            return Err(CatalogError::UnknownFile(path.to_string()));
        }
        if let serde_json::Value::Object(map) = metadata {
            for (name, value) in map {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                self.annotate(path, name, &value)?;
            }
        }
        Ok(())
    }

    /// Drop all members, their postings and the identity cache, keeping the
    /// root and specification for re-population.
    pub fn reset(&mut self) {
        self.files.clear();
        self.tag_cache.clear();
        self.index = TagIndex::new();
    }

    /// Member files satisfying every `(name, value)` predicate, sorted by
    /// path. An empty predicate list returns all members. Two predicates
    /// with the same name and different values always yield an empty result
    /// since a file holds one value per tag name.
    #[must_use]
    pub fn query(&self, predicates: &[(&str, &str)]) -> Vec<&File> {
        let mut matches: Vec<&File> = self
            .index
            .query(predicates)
            .into_iter()
            .filter_map(|path| self.files.get(&path))
            .collect();
        matches.sort_by_key(|f| f.path());
        matches
    }

    /// Paths of the matching members, sorted
    #[must_use]
    pub fn query_paths(&self, predicates: &[(&str, &str)]) -> Vec<String> {
        self.query(predicates)
            .into_iter()
            .map(|f| f.path().to_string())
            .collect()
    }

    /// Root-relative paths of the matching members, sorted
    #[must_use]
    pub fn query_rel_paths(&self, predicates: &[(&str, &str)]) -> Vec<String> {
        self.query(predicates)
            .into_iter()
            .map(|f| rel_path_under(f.path(), &self.root))
            .collect()
    }

    /// Distinct values of `name` among members satisfying `predicates`,
    /// sorted — the facet query behind "what sessions exist for sub-01?"
    #[must_use]
    pub fn tag_values(&self, name: &str, predicates: &[(&str, &str)]) -> Vec<String> {
        self.index.tag_values(name, predicates)
    }

    #[cfg(test)]
    pub(crate) fn tag_cache(&self) -> &IdentityCache<Tag> {
        &self.tag_cache
    }
}

/// Strip `root` (and the separator following it) off the front of `path`
fn rel_path_under(path: &str, root: &str) -> String {
    Path::new(path)
        .strip_prefix(root)
        .map_or_else(|_| path.to_string(), |rel| rel.to_string_lossy().into_owned())
}
