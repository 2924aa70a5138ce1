//! Inclusion and exclusion rules for directory entries.
//!
//! This module decides, for a candidate entry, whether the walker should
//! descend into it (directories) or pick it up (files), and which key a picked
//! file implies. Nothing here touches file contents, so every rule can be
//! exercised with synthetic names and paths.
//!
//! # Design
//!
//! [`ScanRules`] is compiled once from [`ScanOptions`] and then shared by
//! reference for the whole walk. Directory-name exclusion goes through the
//! [`DirectoryFilter`] trait so callers can swap the configured pattern for a
//! name list or an arbitrary predicate.
//!
//! # Examples
//!
//! ```
//! use dl_core::ScanOptions;
//! use dl_scanner::ScanRules;
//!
//! let options = ScanOptions::new("api")
//!     .with_name_filter(r"(.+)Controller\.json$")
//!     .with_exclude_dirs(r"^\.(git|svn)$");
//! let rules = ScanRules::compile(&options)?;
//!
//! assert_eq!(rules.match_file("UserController.json", "UserController.json").as_deref(), Some("User"));
//! assert_eq!(rules.match_file("README.md", "README.md"), None);
//! assert!(rules.is_dir_excluded(".git", ".git"));
//! # Ok::<(), dl_core::ConfigError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use dl_core::{ConfigError, ScanOptions, compile_pattern};
use regex::Regex;
use smallvec::SmallVec;

/// Decides whether a directory (by bare name) is skipped.
///
/// Filters must be [`Send`] and [`Sync`] so a compiled rule set can be moved
/// onto a blocking task.
pub trait DirectoryFilter: Send + Sync {
    /// Returns `true` if the directory named `name` must not be entered.
    fn is_excluded(&self, name: &str) -> bool;
}

impl DirectoryFilter for Regex {
    #[inline]
    fn is_excluded(&self, name: &str) -> bool {
        self.is_match(name)
    }
}

/// Excludes directories whose name equals one of a fixed list.
///
/// # Examples
///
/// ```
/// use dl_scanner::{DirectoryFilter, DirectoryNames};
///
/// let filter = DirectoryNames::new(&["node_modules", ".git"]);
/// assert!(filter.is_excluded("node_modules"));
/// assert!(!filter.is_excluded("src"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DirectoryNames {
    names: SmallVec<[String; 8]>,
}

impl DirectoryNames {
    /// Creates a filter from directory names (not paths).
    #[must_use]
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|name| (*name).to_owned()).collect(),
        }
    }
}

impl DirectoryFilter for DirectoryNames {
    fn is_excluded(&self, name: &str) -> bool {
        self.names.iter().any(|candidate| candidate == name)
    }
}

/// Adapts a closure into a [`DirectoryFilter`].
#[derive(Clone)]
pub struct PredicateFilter<F>(F);

impl<F> PredicateFilter<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    /// Wraps `predicate`; it returns `true` for directories to skip.
    pub const fn new(predicate: F) -> Self {
        Self(predicate)
    }
}

impl<F> DirectoryFilter for PredicateFilter<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_excluded(&self, name: &str) -> bool {
        (self.0)(name)
    }
}

/// Compiled filter rules for one scan.
#[derive(Clone)]
pub struct ScanRules {
    name_filter: Option<Regex>,
    path_filter: Option<Regex>,
    path_key_group: usize,
    exclude_dirs: Option<Arc<dyn DirectoryFilter>>,
    exclude_paths: SmallVec<[Regex; 4]>,
    identity_rewrite: Option<Regex>,
}

impl ScanRules {
    /// Compiles every pattern option.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] naming the first option whose
    /// pattern does not compile.
    pub fn compile(options: &ScanOptions) -> Result<Self, ConfigError> {
        let compile = |option: &'static str, pattern: Option<&String>| {
            pattern
                .map(|pattern| compile_pattern(option, pattern))
                .transpose()
        };

        let exclude_dirs = compile("exclude_dirs", options.exclude_dirs.as_ref())?
            .map(|regex| Arc::new(regex) as Arc<dyn DirectoryFilter>);
        let exclude_paths = options
            .exclude_paths
            .iter()
            .map(|pattern| compile_pattern("exclude_paths", pattern))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            name_filter: compile("name_filter", options.name_filter.as_ref())?,
            path_filter: compile("path_filter", options.path_filter.as_ref())?,
            path_key_group: options.path_key_group,
            exclude_dirs,
            exclude_paths,
            identity_rewrite: compile("identity_rewrite", options.identity_rewrite.as_ref())?,
        })
    }

    /// Replaces the directory-name exclusion rule.
    #[must_use]
    pub fn with_directory_filter(mut self, filter: impl DirectoryFilter + 'static) -> Self {
        self.exclude_dirs = Some(Arc::new(filter));
        self
    }

    /// Returns `true` if `relative` matches any path exclusion pattern.
    ///
    /// Applies to files and directories alike.
    #[must_use]
    pub fn is_path_excluded(&self, relative: &str) -> bool {
        self.exclude_paths.iter().any(|regex| regex.is_match(relative))
    }

    /// Returns `true` if a directory must be neither entered nor represented.
    #[must_use]
    pub fn is_dir_excluded(&self, name: &str, relative: &str) -> bool {
        self.exclude_dirs
            .as_ref()
            .is_some_and(|filter| filter.is_excluded(name))
            || self.is_path_excluded(relative)
    }

    /// Returns the key a file implies, or `None` if the file is excluded.
    ///
    /// `name` is the bare filename and `relative` its `/`-separated path from
    /// the scan root.
    #[must_use]
    pub fn match_file(&self, name: &str, relative: &str) -> Option<String> {
        let mut key = match &self.name_filter {
            Some(regex) => {
                let captures = regex.captures(name)?;
                captures
                    .get(1)
                    .map_or(name, |group| group.as_str())
                    .to_owned()
            }
            None => name.to_owned(),
        };

        if let Some(regex) = &self.path_filter {
            let rooted = format!("/{}", relative.trim_start_matches('/'));
            let captures = regex.captures(&rooted)?;
            if let Some(group) = captures.get(self.path_key_group) {
                group.as_str().clone_into(&mut key);
            }
        }

        Some(key)
    }

    /// Applies the identity rewrite rule, if any, to a filename-derived identity.
    #[must_use]
    pub fn rewrite_identity(&self, identity: &str, replacement: &str) -> String {
        match &self.identity_rewrite {
            Some(regex) => regex.replace_all(identity, replacement).into_owned(),
            None => identity.to_owned(),
        }
    }
}

impl fmt::Debug for ScanRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanRules")
            .field("name_filter", &self.name_filter)
            .field("path_filter", &self.path_filter)
            .field("path_key_group", &self.path_key_group)
            .field("exclude_dirs", &self.exclude_dirs.is_some())
            .field("exclude_paths", &self.exclude_paths)
            .field("identity_rewrite", &self.identity_rewrite)
            .finish()
    }
}
