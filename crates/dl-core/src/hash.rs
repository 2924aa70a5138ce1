//! Fast hash map and hash set type aliases.
//!
//! Dictionaries built by a scan are keyed by short strings (file stems,
//! relative paths), which is exactly the workload the Fx hash is tuned for.
//! Denial-of-service resistance is not a concern: keys come from the local
//! filesystem, never from the network.
//!
//! # Examples
//!
//! ```
//! use dl_core::{FxHashMap, fx_hash_map};
//!
//! let mut map: FxHashMap<String, i32> = fx_hash_map();
//! map.insert("config".to_owned(), 1);
//! assert_eq!(map.get("config"), Some(&1));
//! ```

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// Creates a new empty [`FxHashMap`].
#[inline]
#[must_use]
pub fn fx_hash_map<K, V>() -> FxHashMap<K, V> {
    FxHashMap::default()
}

/// Creates a new [`FxHashMap`] with room for at least `capacity` entries.
///
/// # Examples
///
/// ```
/// use dl_core::fx_hash_map_with_capacity;
///
/// let map: dl_core::FxHashMap<String, i32> = fx_hash_map_with_capacity(16);
/// assert!(map.capacity() >= 16);
/// ```
#[inline]
#[must_use]
pub fn fx_hash_map_with_capacity<K, V>(capacity: usize) -> FxHashMap<K, V> {
    FxHashMap::with_capacity_and_hasher(capacity, rustc_hash::FxBuildHasher)
}

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<T> = rustc_hash::FxHashSet<T>;

/// Creates a new empty [`FxHashSet`].
#[inline]
#[must_use]
pub fn fx_hash_set<T>() -> FxHashSet<T> {
    FxHashSet::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fx_hash_map_operations() {
        let mut map: FxHashMap<&str, i32> = fx_hash_map();
        map.insert("one", 1);
        map.insert("two", 2);
        assert_eq!(map.get("one"), Some(&1));
        assert_eq!(map.get("three"), None);
    }

    #[test]
    fn test_fx_hash_set_operations() {
        let mut set: FxHashSet<String> = fx_hash_set();
        assert!(set.insert("user".to_owned()));
        assert!(!set.insert("user".to_owned()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_fx_hash_map_with_capacity() {
        let map: FxHashMap<String, i32> = fx_hash_map_with_capacity(100);
        assert!(map.capacity() >= 100);
    }
}
