//! Shared, mutable key→value dictionaries.
//!
//! A [`Dictionary`] is a handle: cloning it produces a second handle to the
//! *same* map, and a mutation through either handle is visible through both.
//! The aggregate merger relies on this to keep nested dictionaries identical
//! to the ones the sources exported.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::hash::{FxHashMap, fx_hash_map};
use crate::types::Resource;

/// A shared handle to a string-keyed map of [`Resource`] values.
///
/// Reads clone values out of the map so no lock guard ever escapes. Cloning a
/// [`Resource::Dict`] value only clones its handle, so these reads stay cheap
/// for nested structures.
///
/// # Examples
///
/// ```
/// use dl_core::{Dictionary, Resource};
///
/// let settings = Dictionary::new();
/// let alias = settings.clone();
///
/// alias.insert("port", Resource::from(8080));
/// assert_eq!(settings.get("port"), Some(Resource::from(8080)));
/// assert!(settings.ptr_eq(&alias));
/// ```
#[derive(Clone, Default)]
pub struct Dictionary {
    inner: Arc<RwLock<FxHashMap<String, Resource>>>,
}

impl Dictionary {
    /// Creates a new, empty dictionary.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing map in a fresh handle.
    #[must_use]
    pub fn from_map(map: FxHashMap<String, Resource>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Returns a clone of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Resource> {
        self.inner.read_recursive().get(key).cloned()
    }

    /// Returns the string stored under `key`, if that value is a string scalar.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.inner
            .read_recursive()
            .get(key)
            .and_then(Resource::as_str)
            .map(ToOwned::to_owned)
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert(&self, key: impl Into<String>, value: Resource) -> Option<Resource> {
        self.inner.write().insert(key.into(), value)
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&self, key: &str) -> Option<Resource> {
        self.inner.write().remove(key)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read_recursive().contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read_recursive().len()
    }

    /// Returns `true` if the dictionary has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read_recursive().is_empty()
    }

    /// Returns the keys, in no particular order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.read_recursive().keys().cloned().collect()
    }

    /// Returns a point-in-time copy of every entry.
    ///
    /// Nested dictionaries in the copy are still handles to the live maps.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Resource)> {
        self.inner
            .read_recursive()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Returns `true` if both handles point at the same underlying map.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Converts the dictionary into a JSON object with sorted keys.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .inner
            .read_recursive()
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl FromIterator<(String, Resource)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (String, Resource)>>(iter: I) -> Self {
        let mut map = fx_hash_map();
        map.extend(iter);
        Self::from_map(map)
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let left = self.inner.read_recursive();
        let right = other.inner.read_recursive();
        left.len() == right.len()
            && left
                .iter()
                .all(|(key, value)| right.get(key).is_some_and(|other| value == other))
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.inner.read_recursive().iter())
            .finish()
    }
}
