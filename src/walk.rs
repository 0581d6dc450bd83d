//! Directory traversal that feeds a layout's catalog.
//!
//! The walk is the thin adapter between a real filesystem tree and the
//! pure catalog core: it streams entries under the layout root, applies
//! skip patterns, and gates membership on specification validity. One bad
//! path never aborts a run; per-file failures are logged and skipped.

use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, Layout, Result};

/// Tuning for one indexing run
#[derive(Debug, Clone)]
pub struct IndexOptions {
    valid_only: bool,
    reset: bool,
    skip: Vec<String>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            valid_only: true,
            reset: false,
            skip: Vec::new(),
        }
    }
}

impl IndexOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit every file regardless of specification validity when false.
    /// Defaults to true: only canonical paths enter the catalog.
    #[must_use]
    pub const fn valid_only(mut self, v: bool) -> Self {
        self.valid_only = v;
        self
    }

    /// Clear the layout's members before walking
    #[must_use]
    pub const fn reset(mut self, v: bool) -> Self {
        self.reset = v;
        self
    }

    /// Skip entries whose root-relative path matches any of these regexes
    #[must_use]
    pub fn skip<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip = patterns.into_iter().map(Into::into).collect();
        self
    }
}

impl Layout {
    /// Walk the layout root and add every admissible entry.
    ///
    /// Returns the number of files added.
    ///
    /// # Errors
    /// Returns [`CatalogError::SkipPattern`] for a skip regex that does not
    /// compile and [`CatalogError::Io`] when a directory cannot be listed.
    pub fn index_tree(&mut self, options: &IndexOptions) -> Result<usize> {
        let root = self.root().to_string();
        self.index_subtree(&root, options)
    }

    /// Walk one directory inside the layout root.
    ///
    /// # Errors
    /// As [`Layout::index_tree`], plus [`CatalogError::OutsideRoot`] when
    /// `dir` does not belong to this layout.
    pub fn index_subtree(&mut self, dir: &str, options: &IndexOptions) -> Result<usize> {
        if !Path::new(dir).starts_with(self.root()) {
            return Err(CatalogError::OutsideRoot {
                path: dir.to_string(),
                root: self.root().to_string(),
            });
        }

        let skip = options
            .skip
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if options.reset {
            self.reset();
        }

        let mut added = 0;
        walk(self, Path::new(dir), &skip, options.valid_only, &mut added)?;
        info!(root = self.root(), added, "indexing run finished");
        Ok(added)
    }
}

fn walk(
    layout: &mut Layout,
    dir: &Path,
    skip: &[Regex],
    valid_only: bool,
    added: &mut usize,
) -> Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    // Directory listing order is platform-defined; sort for a stable walk.
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let Some(path_str) = path.to_str() else {
            warn!(path = %path.display(), "skipping non-UTF-8 path");
            continue;
        };
        let rel = rel_of(path_str, layout.root());

        if skip.iter().any(|re| re.is_match(&rel)) {
            debug!(path = %rel, "entry matches skip pattern");
            continue;
        }

        if entry.file_type()?.is_dir() {
            if valid_only && layout.specification().validate_path(&rel) {
                // A directory that is itself canonical is catalogued as a
                // unit and not descended into.
                admit(layout, path_str, added);
            } else {
                walk(layout, &path, skip, valid_only, added)?;
            }
        } else if !valid_only || layout.specification().validate_path(&rel) {
            admit(layout, path_str, added);
        } else {
            debug!(path = %rel, "path failed validation");
        }
    }
    Ok(())
}

fn admit(layout: &mut Layout, path: &str, added: &mut usize) {
    match layout.add_file(path) {
        Ok(_) => *added += 1,
        Err(e) => warn!(path, error = %e, "could not add file"),
    }
}

fn rel_of(path: &str, root: &str) -> String {
    Path::new(path)
        .strip_prefix(root)
        .map_or_else(|_| path.to_string(), |rel| rel.to_string_lossy().into_owned())
}
