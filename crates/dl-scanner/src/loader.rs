//! Resource loaders.
//!
//! The walker never reads file contents itself: it hands every matched file to
//! a [`ResourceLoader`]. This module defines that seam and ships three
//! implementations:
//!
//! - [`FileLoader`]: parses `.json` files and reads anything else as text
//! - [`CachingLoader`]: memoizes another loader, keyed by canonical path
//! - [`FnLoader`]: adapts a closure
//!
//! # Examples
//!
//! ```
//! use dl_core::Resource;
//! use dl_scanner::{CachingLoader, FnLoader, ResourceLoader};
//! use camino::Utf8Path;
//!
//! let loader = CachingLoader::new(FnLoader::new(|path: &Utf8Path| {
//!     Ok(Resource::from(path.file_name().unwrap_or_default()))
//! }));
//!
//! let first = loader.load(Utf8Path::new("a.txt"))?;
//! assert_eq!(first, Resource::from("a.txt"));
//! assert_eq!(loader.len(), 1);
//! # Ok::<(), dl_scanner::LoadError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use dl_core::{FxHashMap, Resource, fx_hash_map};
use parking_lot::RwLock;
use tracing::trace;

use crate::error::LoadError;

/// Materializes one matched file as a [`Resource`].
///
/// Implementations must be [`Send`] and [`Sync`] so a scanner can move onto a
/// blocking task.
pub trait ResourceLoader: Send + Sync {
    /// Loads the file at `path`.
    fn load(&self, path: &Utf8Path) -> Result<Resource, LoadError>;

    /// Drops any cached content for `path` so the next [`load`](Self::load)
    /// reads it again. Called before each load when `force_reload` is set.
    fn invalidate(&self, _path: &Utf8Path) {}
}

impl<L: ResourceLoader + ?Sized> ResourceLoader for &L {
    fn load(&self, path: &Utf8Path) -> Result<Resource, LoadError> {
        (**self).load(path)
    }

    fn invalidate(&self, path: &Utf8Path) {
        (**self).invalidate(path);
    }
}

impl<L: ResourceLoader + ?Sized> ResourceLoader for Arc<L> {
    fn load(&self, path: &Utf8Path) -> Result<Resource, LoadError> {
        (**self).load(path)
    }

    fn invalidate(&self, path: &Utf8Path) {
        (**self).invalidate(path);
    }
}

/// Loads files from disk.
///
/// `.json` files are parsed into dictionaries, sequences, and scalars; every
/// other file becomes a string scalar with its UTF-8 contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl FileLoader {
    /// Creates a new file loader.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ResourceLoader for FileLoader {
    fn load(&self, path: &Utf8Path) -> Result<Resource, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::read(path, source))?;

        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            let value: serde_json::Value =
                serde_json::from_str(&text).map_err(|source| LoadError::parse(path, source))?;
            return Ok(Resource::from_json(value));
        }

        Ok(Resource::from(text))
    }
}

/// Memoizes another loader's results.
///
/// Entries are keyed by canonical path so `a/../b.json` and `b.json` share one
/// slot. Cached dictionaries are shared handles: every load of a cached file
/// returns the same [`Dictionary`](dl_core::Dictionary).
pub struct CachingLoader<L> {
    inner: L,
    cache: RwLock<FxHashMap<Utf8PathBuf, Resource>>,
}

impl<L: ResourceLoader> CachingLoader<L> {
    /// Wraps `inner` with an empty cache.
    #[must_use]
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: RwLock::new(fx_hash_map()),
        }
    }

    /// Returns the wrapped loader.
    #[inline]
    #[must_use]
    pub const fn inner(&self) -> &L {
        &self.inner
    }

    /// Returns the number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    fn cache_key(path: &Utf8Path) -> Utf8PathBuf {
        path.canonicalize_utf8().unwrap_or_else(|_| path.to_owned())
    }
}

impl<L: ResourceLoader> ResourceLoader for CachingLoader<L> {
    fn load(&self, path: &Utf8Path) -> Result<Resource, LoadError> {
        let key = Self::cache_key(path);
        if let Some(hit) = self.cache.read().get(&key) {
            trace!(path = %key, "Loader cache hit");
            return Ok(hit.clone());
        }

        let resource = self.inner.load(path)?;
        self.cache.write().insert(key, resource.clone());
        Ok(resource)
    }

    fn invalidate(&self, path: &Utf8Path) {
        let key = Self::cache_key(path);
        if self.cache.write().remove(&key).is_some() {
            trace!(path = %key, "Evicted loader cache entry");
        }
        self.inner.invalidate(path);
    }
}

impl<L: fmt::Debug> fmt::Debug for CachingLoader<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingLoader")
            .field("inner", &self.inner)
            .field("cached", &self.cache.read().len())
            .finish()
    }
}

/// Adapts a closure into a [`ResourceLoader`].
#[derive(Clone)]
pub struct FnLoader<F>(F);

impl<F> FnLoader<F>
where
    F: Fn(&Utf8Path) -> Result<Resource, LoadError> + Send + Sync,
{
    /// Wraps `load`.
    pub const fn new(load: F) -> Self {
        Self(load)
    }
}

impl<F> ResourceLoader for FnLoader<F>
where
    F: Fn(&Utf8Path) -> Result<Resource, LoadError> + Send + Sync,
{
    fn load(&self, path: &Utf8Path) -> Result<Resource, LoadError> {
        (self.0)(path)
    }
}

impl<F> fmt::Debug for FnLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnLoader")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path).unwrap()
    }

    /// Counts how often the wrapped loader actually runs.
    #[derive(Debug, Default)]
    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl ResourceLoader for CountingLoader {
        fn load(&self, _path: &Utf8Path) -> Result<Resource, LoadError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Resource::from(i64::try_from(n).unwrap()))
        }
    }

    fn load_via<L: ResourceLoader>(loader: L, path: &str) -> Result<Resource, LoadError> {
        loader.load(Utf8Path::new(path))
    }

    #[test]
    fn test_file_loader_parses_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = utf8(dir.path().join("db.json"));
        std::fs::write(&path, r#"{"adapter": "disk", "pool": [1, 2]}"#).unwrap();

        let resource = FileLoader::new().load(&path).unwrap();
        assert!(resource.is_dict());
        assert_eq!(resource.to_json(), json!({"adapter": "disk", "pool": [1, 2]}));
    }

    #[test]
    fn test_file_loader_reads_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = utf8(dir.path().join("notes.txt"));
        std::fs::write(&path, "hello").unwrap();

        assert_eq!(FileLoader::new().load(&path).unwrap(), Resource::from("hello"));
    }

    #[test]
    fn test_file_loader_reports_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = utf8(dir.path().join("broken.json"));
        std::fs::write(&path, "{ not json").unwrap();

        let err = FileLoader::new().load(&path).err();
        assert!(matches!(err, Some(LoadError::Parse { .. })));
    }

    #[test]
    fn test_file_loader_reports_missing_file() {
        let err = FileLoader::new().load(Utf8Path::new("/nonexistent/a.json")).err();
        assert!(matches!(err, Some(LoadError::Read { .. })));
    }

    #[test]
    fn test_caching_loader_reuses_results() {
        let loader = CachingLoader::new(CountingLoader::default());
        let path = Utf8Path::new("some/file.json");

        assert_eq!(loader.load(path).unwrap(), Resource::from(0));
        assert_eq!(loader.load(path).unwrap(), Resource::from(0));
        assert_eq!(loader.inner().loads.load(Ordering::SeqCst), 1);
        assert_eq!(loader.len(), 1);
    }

    #[test]
    fn test_caching_loader_invalidate_forces_reload() {
        let loader = CachingLoader::new(CountingLoader::default());
        let path = Utf8Path::new("some/file.json");

        loader.load(path).unwrap();
        loader.invalidate(path);
        assert!(loader.is_empty());
        assert_eq!(loader.load(path).unwrap(), Resource::from(1));
    }

    #[test]
    fn test_caching_loader_shares_dictionary_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = utf8(dir.path().join("a.json"));
        std::fs::write(&path, r#"{"x": 1}"#).unwrap();

        let loader = CachingLoader::new(FileLoader::new());
        let first = loader.load(&path).unwrap();
        let second = loader.load(&path).unwrap();
        let (Some(first), Some(second)) = (first.as_dict(), second.as_dict()) else {
            panic!("expected dictionaries");
        };
        assert!(first.ptr_eq(second));

        loader.clear();
        assert!(loader.is_empty());
    }

    #[test]
    fn test_fn_loader_and_delegating_impls() {
        let loader = FnLoader::new(|path: &Utf8Path| {
            if path.as_str().ends_with(".bad") {
                Err(LoadError::failed(path, "rejected"))
            } else {
                Ok(Resource::from(path.as_str()))
            }
        });

        assert_eq!(load_via(&loader, "ok").unwrap(), Resource::from("ok"));
        let shared = Arc::new(loader);
        assert!(load_via(shared, "x.bad").is_err());
    }

    #[test]
    fn test_default_invalidate_leaves_loader_untouched() {
        let loader = CountingLoader::default();
        loader.invalidate(Utf8Path::new("a"));
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
        assert_eq!(load_via(&loader, "a").unwrap(), Resource::from(0));
    }
}
