//! Recursive directory scanner that loads matched files into a keyed dictionary.
//!
//! This crate walks a directory tree, selects files and subdirectories with
//! configurable rules, loads every selected file through a
//! [`ResourceLoader`], and assembles the results into a single nested or
//! flattened [`Dictionary`].
//!
//! # Overview
//!
//! The main entry point is [`DirectoryScanner`], which combines:
//!
//! - [`ScanRules`]: compiled name, path, and directory filters
//! - [`TreeWalker`]: depth-limited traversal built on `ignore`'s `WalkBuilder`
//! - [`DictionaryBuilder`]: identity resolution and collision detection
//! - [`merge`]: aggregate mode, deep-merging every resource into one dictionary
//! - [`ScanStats`]: atomic counters logged at the end of each scan
//!
//! The [`presets`] module offers the common configurations as one-call
//! functions, and [`nonblocking`] runs a scan on tokio's blocking pool.
//!
//! # Example
//!
//! ```no_run
//! use dl_core::ScanOptions;
//! use dl_scanner::{DirectoryScanner, FileLoader};
//!
//! let options = ScanOptions::new("api/controllers")
//!     .with_name_filter(r"(.+)Controller\.json$")
//!     .with_exclude_dirs(r"^\.(git|svn)$");
//!
//! let scanner = DirectoryScanner::new(options, FileLoader::new())?;
//! let controllers = scanner.build()?;
//!
//! for name in controllers.keys() {
//!     println!("Loaded controller: {name}");
//! }
//! # Ok::<(), dl_scanner::ScanError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! DirectoryScanner (main entry point)
//!     │
//!     ├── ScanRules (compiled once per scan)
//!     │
//!     ├── TreeWalker ──► ResourceLoader
//!     │       │
//!     │       └── WalkBuilder (ignore crate, one level at a time)
//!     │
//!     ├── ScanTree ──► DictionaryBuilder (normal mode)
//!     │           └──► merge::aggregate  (aggregate mode)
//!     │
//!     └── ScanStats (atomic counters)
//! ```
//!
//! # Concurrency
//!
//! A scan is a single, synchronous, depth-first traversal; all intermediate
//! state lives on the call stack. Results are `Send + Sync` and can cross
//! threads freely.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod dictionary;
mod error;
mod filter;
mod loader;
pub mod merge;
pub mod nonblocking;
pub mod presets;
mod stats;
mod walker;

pub use dictionary::{DictionaryBuilder, GLOBAL_NAME_FIELD, IDENTITY_FIELD, Identity};
pub use error::{ErrorKind, LoadError, ScanError};
pub use filter::{DirectoryFilter, DirectoryNames, PredicateFilter, ScanRules};
pub use loader::{CachingLoader, FileLoader, FnLoader, ResourceLoader};
pub use merge::merge_into;
pub use stats::{ScanStats, StatsSnapshot};
pub use walker::{DIRECTORY_MARKER, ScanEntry, ScanTree, TreeWalker};

use dl_core::{Dictionary, ScanOptions};
use tracing::info;

/// Scans one directory tree with validated options.
///
/// Construction validates the options and compiles every pattern, so a
/// scanner that exists can only fail on filesystem or loader conditions.
///
/// # Examples
///
/// ```
/// use dl_core::ScanOptions;
/// use dl_scanner::{DirectoryScanner, ErrorKind, FileLoader};
///
/// let mut options = ScanOptions::new("config");
/// options.keep_path_on_flatten = true;
///
/// let err = DirectoryScanner::new(options, FileLoader::new()).err();
/// assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::InvalidConfiguration));
/// ```
#[derive(Debug)]
pub struct DirectoryScanner<L = FileLoader> {
    options: ScanOptions,
    rules: ScanRules,
    loader: L,
    stats: ScanStats,
}

impl<L: ResourceLoader> DirectoryScanner<L> {
    /// Creates a scanner.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the options are contradictory or a
    /// pattern does not compile. The filesystem is not touched.
    pub fn new(options: ScanOptions, loader: L) -> Result<Self, ScanError> {
        options.validate()?;
        let rules = ScanRules::compile(&options)?;
        Ok(Self {
            options,
            rules,
            loader,
            stats: ScanStats::new(),
        })
    }

    /// Replaces the directory-name exclusion rule with a custom filter.
    #[must_use]
    pub fn with_directory_filter(mut self, filter: impl DirectoryFilter + 'static) -> Self {
        self.rules = self.rules.with_directory_filter(filter);
        self
    }

    /// Walks the tree and returns the raw, filename-keyed result.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`ScanError`] met during traversal.
    pub fn walk(&self) -> Result<ScanTree, ScanError> {
        self.stats.reset();
        info!(
            root = %self.options.root_path,
            max_depth = ?self.options.max_depth,
            flatten = self.options.flatten,
            skip_load = self.options.skip_load,
            "Starting scan"
        );

        let tree = TreeWalker::new(&self.options, &self.rules, &self.loader, &self.stats).walk()?;

        let stats = self.stats.snapshot();
        info!(
            directories = stats.directories,
            matched = stats.matched,
            loaded = stats.loaded,
            load_failures = stats.load_failures,
            excluded = stats.excluded,
            "Scan complete"
        );
        Ok(tree)
    }

    /// Walks the tree and assembles the final dictionary.
    ///
    /// In aggregate mode every resource is deep-merged into one dictionary;
    /// otherwise resources are keyed by identity.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`ScanError`] met during traversal or assembly.
    pub fn build(&self) -> Result<Dictionary, ScanError> {
        let tree = self.walk()?;
        if self.options.aggregate {
            merge::aggregate(tree)
        } else {
            DictionaryBuilder::new(&self.options, &self.rules).build(tree)
        }
    }

    /// Returns the counters of the most recent scan.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the validated options.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Returns the compiled rules.
    #[inline]
    #[must_use]
    pub const fn rules(&self) -> &ScanRules {
        &self.rules
    }

    /// Returns the loader.
    #[inline]
    #[must_use]
    pub const fn loader(&self) -> &L {
        &self.loader
    }
}
