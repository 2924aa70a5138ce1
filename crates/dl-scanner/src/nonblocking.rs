//! Async wrappers that run a scan on tokio's blocking pool.
//!
//! Scanning is blocking filesystem work, so these functions move the whole
//! synchronous scan onto [`spawn_blocking`] and await it. They must be
//! called from within a tokio runtime.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dl_core::ScanOptions;
//! use dl_scanner::{FileLoader, nonblocking};
//!
//! # async fn run() -> Result<(), dl_scanner::ScanError> {
//! let options = ScanOptions::new("config").with_name_filter(r"(.+)\.json$");
//! let config = nonblocking::build(options, Arc::new(FileLoader::new())).await?;
//! println!("{} config files", config.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use dl_core::{Dictionary, ScanOptions};
use tokio::task::spawn_blocking;

use crate::DirectoryScanner;
use crate::error::ScanError;
use crate::loader::ResourceLoader;
use crate::walker::ScanTree;

/// Builds the dictionary on the blocking pool.
///
/// # Errors
///
/// Returns [`ScanError::Task`] if the blocking task panicked, or any error
/// the synchronous [`DirectoryScanner::build`] returns.
pub async fn build<L>(options: ScanOptions, loader: Arc<L>) -> Result<Dictionary, ScanError>
where
    L: ResourceLoader + ?Sized + 'static,
{
    spawn_blocking(move || DirectoryScanner::new(options, loader)?.build()).await?
}

/// Walks the tree on the blocking pool and returns the raw result.
///
/// # Errors
///
/// Returns [`ScanError::Task`] if the blocking task panicked, or any error
/// the synchronous [`DirectoryScanner::walk`] returns.
pub async fn walk<L>(options: ScanOptions, loader: Arc<L>) -> Result<ScanTree, ScanError>
where
    L: ResourceLoader + ?Sized + 'static,
{
    spawn_blocking(move || DirectoryScanner::new(options, loader)?.walk()).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    use camino::{Utf8Path, Utf8PathBuf};
    use dl_core::Resource;
    use serde_json::json;

    use crate::error::{ErrorKind, LoadError};
    use crate::loader::{FileLoader, FnLoader};

    fn fixture(files: &[(&str, &str)]) -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        for (relative, contents) in files {
            std::fs::write(root.join(relative), contents).unwrap();
        }
        (dir, root)
    }

    #[tokio::test]
    async fn test_build_on_blocking_pool() {
        let (_dir, root) = fixture(&[("a.json", r#"{"x": 1}"#)]);
        let mut options = ScanOptions::new(root).with_name_filter(r"(.+)\.json$");
        options.resolve_identity = false;

        let dict = build(options, Arc::new(FileLoader::new())).await.unwrap();
        assert_eq!(dict.to_json(), json!({ "a": { "x": 1 } }));
    }

    #[tokio::test]
    async fn test_walk_accepts_trait_objects() {
        let (_dir, root) = fixture(&[("a", "")]);
        let loader: Arc<dyn ResourceLoader> =
            Arc::new(FnLoader::new(|_: &Utf8Path| Ok(Resource::from(7))));

        let tree = walk(ScanOptions::new(root), loader).await.unwrap();
        assert_eq!(tree.to_json(), json!({ "a": 7 }));
    }

    #[tokio::test]
    async fn test_errors_cross_the_task_boundary() {
        let err = build(ScanOptions::new("/nonexistent/dirload-async"), Arc::new(FileLoader::new()))
            .await
            .err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::DirectoryNotFound));
    }

    #[tokio::test]
    async fn test_panicking_loader_maps_to_task_error() {
        let (_dir, root) = fixture(&[("boom", "")]);
        let loader = Arc::new(FnLoader::new(|path: &Utf8Path| -> Result<Resource, LoadError> {
            panic!("loader exploded on {path}")
        }));

        let err = walk(ScanOptions::new(root), loader).await.err();
        assert!(matches!(err, Some(ScanError::Task(_))));
    }
}
