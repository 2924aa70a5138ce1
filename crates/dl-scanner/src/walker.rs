//! Recursive directory traversal.
//!
//! This module provides [`TreeWalker`], which visits one directory level at a
//! time with the `ignore` crate's [`WalkBuilder`], applies [`ScanRules`] to
//! every entry, hands matched files to a [`ResourceLoader`], and recurses into
//! subdirectories until the depth limit. The result is a [`ScanTree`]: the raw
//! filename-keyed structure before identity resolution or aggregation.
//!
//! # Traversal order
//!
//! Each directory is checked for existence *before* the depth limit is
//! applied, and listed only after it. A `max_depth` of `0` therefore still
//! fails on a missing root but never reads the root's children.
//!
//! Entries within a directory are visited sorted by file name, so results and
//! collision errors are reproducible across platforms.

use std::io;
use std::path::{Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};
use dl_core::{Dictionary, FxHashMap, Resource, ScanOptions, fx_hash_map, fx_hash_map_with_capacity};
use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::error::{LoadError, ScanError};
use crate::filter::ScanRules;
use crate::loader::ResourceLoader;
use crate::stats::ScanStats;

/// The marker key added to directory dictionaries when `mark_directories` is set.
pub const DIRECTORY_MARKER: &str = "isDirectory";

/// One value of a [`ScanTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEntry {
    /// A file the loader materialized.
    Loaded(Resource),
    /// A file that matched but was not loaded (`skip_load`).
    Present,
    /// A subdirectory that was traversed.
    Directory(ScanTree),
    /// A subdirectory the depth limit kept the walker out of.
    Unvisited,
}

impl ScanEntry {
    /// Returns the shape name used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Loaded(resource) => resource.kind(),
            Self::Present => "boolean",
            Self::Directory(_) => "dictionary",
            Self::Unvisited => "unvisited directory",
        }
    }
}

/// The raw result of walking one directory, keyed by filename-derived keys.
///
/// Keys keep the order in which the walker inserted them.
#[derive(Debug, Clone, Default)]
pub struct ScanTree {
    entries: Vec<(String, ScanEntry)>,
    index: FxHashMap<String, usize>,
    marked: bool,
}

impl ScanTree {
    /// Creates an empty tree. `marked` trees gain the [`DIRECTORY_MARKER`]
    /// key when converted.
    #[must_use]
    pub fn new(marked: bool) -> Self {
        Self {
            entries: Vec::new(),
            index: fx_hash_map(),
            marked,
        }
    }

    /// Creates an empty tree with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(marked: bool, capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: fx_hash_map_with_capacity(capacity),
            marked,
        }
    }

    /// Inserts an entry, returning the one it replaced. A replaced key keeps
    /// its original position.
    pub fn insert(&mut self, key: impl Into<String>, entry: ScanEntry) -> Option<ScanEntry> {
        let key = key.into();
        if let Some(&slot) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[slot].1, entry));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, entry));
        None
    }

    /// Returns the entry stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ScanEntry> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if this tree is tagged as a directory.
    #[inline]
    #[must_use]
    pub const fn is_marked(&self) -> bool {
        self.marked
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScanEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Consumes the tree, yielding entries in insertion order.
    #[must_use]
    pub fn into_entries(self) -> Vec<(String, ScanEntry)> {
        self.entries
    }

    /// Converts the tree into a fresh dictionary.
    ///
    /// [`ScanEntry::Present`] becomes `true`, unvisited directories and
    /// [`Resource::Absent`] values are dropped, and marked trees gain
    /// `"isDirectory": true`.
    #[must_use]
    pub fn to_dictionary(&self) -> Dictionary {
        let dict = Dictionary::new();
        for (key, entry) in self.iter() {
            let value = match entry {
                ScanEntry::Loaded(Resource::Absent) | ScanEntry::Unvisited => continue,
                ScanEntry::Loaded(resource) => resource.clone(),
                ScanEntry::Present => Resource::present(),
                ScanEntry::Directory(tree) => tree.to_resource(),
            };
            dict.insert(key, value);
        }
        if self.marked {
            dict.insert(DIRECTORY_MARKER, Resource::from(true));
        }
        dict
    }

    /// Converts the tree into a [`Resource::Dict`].
    #[inline]
    #[must_use]
    pub fn to_resource(&self) -> Resource {
        Resource::Dict(self.to_dictionary())
    }

    /// Renders the tree as JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.to_dictionary().to_json()
    }
}

impl PartialEq for ScanTree {
    fn eq(&self, other: &Self) -> bool {
        self.marked == other.marked
            && self.len() == other.len()
            && self
                .iter()
                .all(|(key, entry)| other.get(key).is_some_and(|theirs| entry == theirs))
    }
}

/// One immediate child of a listed directory.
#[derive(Debug)]
struct Listed {
    name: String,
    path: Utf8PathBuf,
    kind: ListedKind,
}

#[derive(Debug)]
enum ListedKind {
    File,
    Directory,
    /// The entry was named by the listing but could not be inspected, e.g. a
    /// dangling link when links are followed.
    Unreadable(ignore::Error),
}

/// A directory on the current descent path, by canonical path. Only tracked
/// when links are followed.
#[derive(Debug)]
struct Ancestor<'p> {
    path: PathBuf,
    parent: Option<&'p Ancestor<'p>>,
}

impl Ancestor<'_> {
    /// Returns the ancestor `path` resolves to, if any.
    fn find(&self, path: &Path) -> Option<&Path> {
        let mut current = Some(self);
        while let Some(ancestor) = current {
            if ancestor.path == path {
                return Some(&ancestor.path);
            }
            current = ancestor.parent;
        }
        None
    }
}

/// Walks a directory tree with compiled rules.
///
/// A walker borrows everything it needs; one instance serves exactly one
/// top-level call.
pub struct TreeWalker<'a, L: ?Sized> {
    options: &'a ScanOptions,
    rules: &'a ScanRules,
    loader: &'a L,
    stats: &'a ScanStats,
}

impl<'a, L: ResourceLoader + ?Sized> TreeWalker<'a, L> {
    /// Creates a walker over already validated options.
    pub const fn new(
        options: &'a ScanOptions,
        rules: &'a ScanRules,
        loader: &'a L,
        stats: &'a ScanStats,
    ) -> Self {
        Self {
            options,
            rules,
            loader,
            stats,
        }
    }

    /// Walks from the configured root.
    ///
    /// A root the depth limit keeps the walker out of yields an empty tree.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`ScanError`] met; no partial tree is
    /// produced.
    pub fn walk(&self) -> Result<ScanTree, ScanError> {
        let root = self.options.root_path.as_path();
        let ancestor = self.ancestor(root, None);
        Ok(self
            .walk_dir(root, "", 0, ancestor.as_ref())?
            .unwrap_or_else(|| ScanTree::new(false)))
    }

    /// Walks one directory. Returns `None` when `depth` is at the limit.
    fn walk_dir(
        &self,
        dir: &Utf8Path,
        relative: &str,
        depth: usize,
        ancestors: Option<&Ancestor<'_>>,
    ) -> Result<Option<ScanTree>, ScanError> {
        let marked = self.options.mark_directories && depth > 0;

        if let Err(source) = check_directory(dir) {
            return self.missing_directory(dir, marked, ignore::Error::Io(source));
        }

        if self.options.max_depth.is_some_and(|max| depth >= max) {
            debug!(path = %dir, depth, "Depth limit reached");
            return Ok(None);
        }

        let listed = match self.list_dir(dir) {
            Ok(listed) => listed,
            Err(ListError::Listing(source)) => return self.missing_directory(dir, marked, source),
            Err(ListError::Scan(err)) => return Err(err),
        };
        self.stats.increment_directories();
        debug!(path = %dir, depth, entries = listed.len(), "Scanning directory");

        let mut tree = ScanTree::with_capacity(marked, listed.len());
        for entry in listed {
            let child_relative = if relative.is_empty() {
                entry.name.clone()
            } else {
                format!("{relative}/{}", entry.name)
            };

            if self.rules.is_path_excluded(&child_relative) {
                self.stats.increment_excluded();
                continue;
            }

            if matches!(entry.kind, ListedKind::Directory) {
                self.visit_dir(&mut tree, &entry, &child_relative, depth, ancestors)?;
            } else {
                self.visit_file(&mut tree, &entry, &child_relative)?;
            }
        }

        Ok(Some(tree))
    }

    fn visit_dir(
        &self,
        tree: &mut ScanTree,
        entry: &Listed,
        relative: &str,
        depth: usize,
        ancestors: Option<&Ancestor<'_>>,
    ) -> Result<(), ScanError> {
        if self.rules.is_dir_excluded(&entry.name, relative) {
            self.stats.increment_excluded();
            return Ok(());
        }

        let ancestor = self.ancestor(&entry.path, ancestors);
        let looped = ancestor
            .as_ref()
            .zip(ancestors)
            .and_then(|(this, chain)| chain.find(&this.path));
        if let Some(looped) = looped {
            debug!(
                path = %entry.path,
                ancestor = %looped.display(),
                "Directory loops back to an ancestor"
            );
            let looped = Listed {
                name: entry.name.clone(),
                path: entry.path.clone(),
                kind: ListedKind::Unreadable(ignore::Error::Loop {
                    ancestor: looped.to_owned(),
                    child: entry.path.clone().into_std_path_buf(),
                }),
            };
            return self.visit_file(tree, &looped, relative);
        }

        let chain = ancestor.as_ref().or(ancestors);
        let subtree = self.walk_dir(&entry.path, relative, depth + 1, chain)?;

        if !self.options.flatten {
            let value = subtree.map_or(ScanEntry::Unvisited, ScanEntry::Directory);
            return self.insert(tree, entry.name.clone(), value, false);
        }

        let Some(subtree) = subtree else {
            return Ok(());
        };
        let keep_path = self.options.keep_path_on_flatten;
        for (key, value) in subtree.into_entries() {
            if keep_path {
                self.insert(tree, format!("{}/{key}", entry.name), value, false)?;
            } else {
                self.insert(tree, key, value, true)?;
            }
        }
        Ok(())
    }

    fn visit_file(
        &self,
        tree: &mut ScanTree,
        entry: &Listed,
        relative: &str,
    ) -> Result<(), ScanError> {
        let Some(key) = self.rules.match_file(&entry.name, relative) else {
            return Ok(());
        };
        self.stats.increment_matched();

        if let ListedKind::Unreadable(source) = &entry.kind {
            let source = LoadError::failed(entry.path.clone(), source.to_string());
            return self.load_failed(entry, source);
        }

        if self.options.skip_load {
            return self.insert(tree, key, ScanEntry::Present, false);
        }

        if self.options.force_reload {
            self.loader.invalidate(&entry.path);
        }

        match self.loader.load(&entry.path) {
            Ok(resource) => {
                self.stats.increment_loaded();
                debug!(path = %entry.path, key = %key, kind = resource.kind(), "Loaded resource");
                self.insert(tree, key, ScanEntry::Loaded(resource), false)
            }
            Err(source) => self.load_failed(entry, source),
        }
    }

    fn load_failed(&self, entry: &Listed, source: LoadError) -> Result<(), ScanError> {
        if self.options.ignore_load_failures {
            self.stats.increment_load_failures();
            warn!(path = %entry.path, error = %source, "Ignoring resource that failed to load");
            return Ok(());
        }
        Err(ScanError::load(entry.path.clone(), source))
    }

    /// Inserts into one level. `strict` collisions fail even when duplicates
    /// are allowed.
    fn insert(
        &self,
        tree: &mut ScanTree,
        key: String,
        entry: ScanEntry,
        strict: bool,
    ) -> Result<(), ScanError> {
        if tree.contains_key(&key) && (strict || !self.options.allow_duplicate_keys) {
            return Err(ScanError::DuplicateKey { key });
        }
        tree.insert(key, entry);
        Ok(())
    }

    /// Resolves `dir` for loop detection. `None` when links are not followed
    /// or `dir` cannot be resolved; listing reports the latter.
    fn ancestor<'p>(
        &self,
        dir: &Utf8Path,
        parent: Option<&'p Ancestor<'p>>,
    ) -> Option<Ancestor<'p>> {
        if !self.options.follow_links {
            return None;
        }
        let path = std::fs::canonicalize(dir).ok()?;
        Some(Ancestor { path, parent })
    }

    fn missing_directory(
        &self,
        dir: &Utf8Path,
        marked: bool,
        source: ignore::Error,
    ) -> Result<Option<ScanTree>, ScanError> {
        if self.options.optional_if_missing {
            warn!(path = %dir, error = %source, "Skipping directory that could not be scanned");
            return Ok(Some(ScanTree::new(marked)));
        }
        Err(ScanError::directory(dir, source))
    }

    /// Lists the immediate children of `dir`, sorted by name.
    fn list_dir(&self, dir: &Utf8Path) -> Result<Vec<Listed>, ListError> {
        let follow_links = self.options.follow_links;
        let walker = WalkBuilder::new(dir)
            .standard_filters(false)
            .max_depth(Some(1))
            .follow_links(follow_links)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut listed = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    listed.push(unreadable_entry(err)?);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let path = Utf8Path::from_path(entry.path())
                .ok_or_else(|| ListError::Scan(ScanError::NonUtf8Path(entry.path().to_owned())))?;
            let Some(name) = path.file_name() else {
                continue;
            };

            let file_type = entry.file_type();
            let kind = if file_type.is_some_and(|ft| ft.is_dir()) {
                ListedKind::Directory
            } else {
                ListedKind::File
            };
            if !follow_links && file_type.is_some_and(|ft| ft.is_symlink()) && path.is_dir() {
                debug!(path = %path, "Not following directory symlink");
                continue;
            }

            listed.push(Listed {
                name: name.to_owned(),
                path: path.to_owned(),
                kind,
            });
        }
        Ok(listed)
    }
}

/// Why a listing failed: a listing problem the caller may tolerate, or a
/// hard scan error.
enum ListError {
    Listing(ignore::Error),
    Scan(ScanError),
}

/// Turns an error on one child of the listed directory into an unreadable
/// entry. Errors about the directory itself stay listing errors.
fn unreadable_entry(err: ignore::Error) -> Result<Listed, ListError> {
    let location = match error_location(&err) {
        (Some(depth), Some(path)) if depth > 0 => Some(path.to_owned()),
        _ => None,
    };
    let Some(path) = location else {
        return Err(ListError::Listing(err));
    };
    let path = Utf8PathBuf::from_path_buf(path)
        .map_err(|path| ListError::Scan(ScanError::NonUtf8Path(path)))?;
    let Some(name) = path.file_name().map(str::to_owned) else {
        return Err(ListError::Listing(err));
    };
    Ok(Listed {
        name,
        path,
        kind: ListedKind::Unreadable(err),
    })
}

/// Digs the walk depth and entry path out of a wrapped `ignore` error.
fn error_location(err: &ignore::Error) -> (Option<usize>, Option<&Path>) {
    match err {
        ignore::Error::WithDepth { depth, err } => (Some(*depth), error_location(err).1),
        ignore::Error::WithPath { path, err } => (error_location(err).0, Some(path.as_path())),
        ignore::Error::WithLineNumber { err, .. } => error_location(err),
        ignore::Error::Loop { child, .. } => (None, Some(child.as_path())),
        _ => (None, None),
    }
}

fn check_directory(dir: &Utf8Path) -> io::Result<()> {
    let metadata = std::fs::metadata(dir)?;
    if metadata.is_dir() {
        Ok(())
    } else {
        Err(io::Error::new(io::ErrorKind::NotADirectory, "not a directory"))
    }
}
