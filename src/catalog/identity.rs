//! Single-instance-per-key caching for catalog entities.
//!
//! Every entity type declares its identity through the [`Identity`] trait;
//! the cache hands out shared `Rc` instances so that two lookups of the same
//! logical entity always return the same allocation. The cache is an
//! explicit value owned by its layout (one per indexing session), not a
//! process-wide singleton, and it never evicts — eviction would silently
//! break the one-instance-per-key guarantee.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use super::error::Result;

/// Identity contract for cached entity types.
///
/// The key must be derivable from the constructed value so the cache can
/// register what a constructor produced.
pub trait Identity {
    type Key: Eq + Hash + Clone + std::fmt::Debug;

    fn identity(&self) -> Self::Key;
}

/// Cache guaranteeing at most one shared instance per identity key
#[derive(Debug)]
pub struct IdentityCache<T: Identity> {
    entries: HashMap<T::Key, Rc<T>>,
}

impl<T: Identity> IdentityCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Return the instance registered for `key`, constructing it on first
    /// use. A value whose identity is already cached is never rebuilt; the
    /// constructor simply does not run.
    ///
    /// # Errors
    /// Propagates the constructor's error, typically
    /// [`CatalogError::IncompleteIdentity`](super::CatalogError::IncompleteIdentity)
    /// when an identity-defining field is missing.
    pub fn get_or_create<F>(&mut self, key: &T::Key, ctor: F) -> Result<Rc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(existing) = self.entries.get(key) {
            return Ok(Rc::clone(existing));
        }
        let value = Rc::new(ctor()?);
        self.entries.insert(value.identity(), Rc::clone(&value));
        Ok(value)
    }

    /// Look up a cached instance without constructing
    #[must_use]
    pub fn get(&self, key: &T::Key) -> Option<Rc<T>> {
        self.entries.get(key).map(Rc::clone)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Identity> Default for IdentityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
