//! One-call entry points for the common scan configurations.
//!
//! Each preset takes caller options, forces the flags that define it, fills in
//! defaults the caller left unset, and runs a [`DirectoryScanner`].
//!
//! | Preset           | Forces                                            | Returns      |
//! |------------------|---------------------------------------------------|--------------|
//! | [`include_all`]  | nothing                                           | raw tree     |
//! | [`required`]     | nothing                                           | dictionary   |
//! | [`optional`]     | `optional_if_missing`                             | dictionary   |
//! | [`exists`]       | `optional_if_missing`, `skip_load`                | dictionary   |
//! | [`aggregate`]    | `aggregate`, `optional_if_missing`                | merged dict  |
//! | [`scan_listing`] | flatten with paths, `optional_if_missing`, `skip_load` | path → `true` |
//!
//! Every preset except [`include_all`] excludes `.git` and `.svn` directories
//! unless `exclude_dirs` is already set.

use dl_core::{Dictionary, ScanOptions};

use crate::DirectoryScanner;
use crate::error::ScanError;
use crate::loader::{FileLoader, ResourceLoader};
use crate::walker::ScanTree;

/// Directory names excluded when the caller does not say otherwise.
pub const DEFAULT_EXCLUDE_DIRS: &str = r"^\.(git|svn)$";

/// Depth limit [`scan_listing`] applies when none is set.
pub const LISTING_MAX_DEPTH: usize = 10;

/// Filename filter [`scan_listing`] applies when none is set.
pub const LISTING_NAME_FILTER: &str = "(.+)$";

/// Walks with exactly the given options and returns the raw tree.
///
/// # Errors
///
/// Returns the first fatal [`ScanError`] met.
pub fn include_all<L: ResourceLoader>(options: ScanOptions, loader: L) -> Result<ScanTree, ScanError> {
    DirectoryScanner::new(options, loader)?.walk()
}

/// Builds a dictionary, failing if the root cannot be scanned.
///
/// # Errors
///
/// Returns the first fatal [`ScanError`] met.
pub fn required<L: ResourceLoader>(mut options: ScanOptions, loader: L) -> Result<Dictionary, ScanError> {
    default_exclude_dirs(&mut options);
    DirectoryScanner::new(options, loader)?.build()
}

/// Builds a dictionary; a missing root yields an empty one.
///
/// # Errors
///
/// Returns the first fatal [`ScanError`] met.
pub fn optional<L: ResourceLoader>(mut options: ScanOptions, loader: L) -> Result<Dictionary, ScanError> {
    options.optional_if_missing = true;
    required(options, loader)
}

/// Builds a dictionary of `true` markers for every matched file, loading
/// nothing.
///
/// # Examples
///
/// ```
/// use dl_core::ScanOptions;
/// use dl_scanner::presets;
///
/// let found = presets::exists(ScanOptions::new("/nonexistent/dirload"))?;
/// assert!(found.is_empty());
/// # Ok::<(), dl_scanner::ScanError>(())
/// ```
///
/// # Errors
///
/// Returns the first fatal [`ScanError`] met.
pub fn exists(mut options: ScanOptions) -> Result<Dictionary, ScanError> {
    options.skip_load = true;
    optional(options, FileLoader::new())
}

/// Deep-merges every matched resource into one dictionary; a missing root
/// yields an empty one.
///
/// # Errors
///
/// Returns [`ScanError::InvalidAggregateSource`] if a resource is not a
/// dictionary, or the first other fatal [`ScanError`] met.
pub fn aggregate<L: ResourceLoader>(mut options: ScanOptions, loader: L) -> Result<Dictionary, ScanError> {
    options.aggregate = true;
    options.optional_if_missing = true;
    required(options, loader)
}

/// Lists matched files as a flat map from relative path to `true`.
///
/// # Errors
///
/// Returns the first fatal [`ScanError`] met.
pub fn scan_listing(mut options: ScanOptions) -> Result<Dictionary, ScanError> {
    options.flatten = true;
    options.keep_path_on_flatten = true;
    options.optional_if_missing = true;
    options.skip_load = true;
    default_exclude_dirs(&mut options);
    if options.max_depth.is_none() {
        options.max_depth = Some(LISTING_MAX_DEPTH);
    }
    if options.name_filter.is_none() {
        options.name_filter = Some(LISTING_NAME_FILTER.to_owned());
    }

    Ok(include_all(options, FileLoader::new())?.to_dictionary())
}

fn default_exclude_dirs(options: &mut ScanOptions) {
    if options.exclude_dirs.is_none() {
        options.exclude_dirs = Some(DEFAULT_EXCLUDE_DIRS.to_owned());
    }
}
