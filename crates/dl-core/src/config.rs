//! Scan options.
//!
//! [`ScanOptions`] describes a single scan: where to start, which entries to
//! pick up, how to key them, and which failures to tolerate. It is built once
//! per call (programmatically or from a JSON file), validated, and then only
//! read.
//!
//! Patterns are kept as strings here so the options stay serializable; the
//! scanner compiles them with [`compile_pattern`] before touching the
//! filesystem.

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Options for one directory scan.
///
/// # Examples
///
/// ```
/// use dl_core::ScanOptions;
///
/// let options = ScanOptions::new("config")
///     .with_name_filter(r"(.+)\.json$")
///     .with_max_depth(2);
/// assert!(options.validate().is_ok());
/// assert!(options.resolve_identity);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Directory the scan starts from.
    pub root_path: Utf8PathBuf,

    /// Regex matched against bare filenames. The first capture group, when it
    /// participates, supplies the key; otherwise the whole filename does.
    pub name_filter: Option<String>,

    /// Regex matched against the `/`-prefixed path relative to the root.
    pub path_filter: Option<String>,

    /// Capture group of [`path_filter`](Self::path_filter) that overrides the key.
    pub path_key_group: usize,

    /// Regex matched against bare directory names; matches are never entered.
    pub exclude_dirs: Option<String>,

    /// Regexes matched against relative paths; matches are skipped entirely.
    pub exclude_paths: Vec<String>,

    /// Directories this many levels below the root are not traversed.
    /// `None` means unlimited.
    pub max_depth: Option<usize>,

    /// A missing root (or subdirectory) yields an empty result.
    pub optional_if_missing: bool,

    /// A file that fails to load is skipped instead of failing the scan.
    pub ignore_load_failures: bool,

    /// Matched files are recorded as `true` instead of being loaded.
    pub skip_load: bool,

    /// Fold subdirectory entries into their parent level.
    pub flatten: bool,

    /// When flattening, prefix keys with their relative directory path.
    pub keep_path_on_flatten: bool,

    /// Tag directory results with an `isDirectory` marker.
    pub mark_directories: bool,

    /// Tolerate key collisions (last write wins).
    pub allow_duplicate_keys: bool,

    /// Deep-merge every resource into one dictionary.
    pub aggregate: bool,

    /// Key resources by their global name instead of their identity.
    #[serde(alias = "use_declared_identity_for_key")]
    pub use_global_name_for_key: bool,

    /// Resolve and annotate resource identities.
    pub resolve_identity: bool,

    /// Regex whose matches are rewritten in filename-derived identities.
    pub identity_rewrite: Option<String>,

    /// Replacement text for [`identity_rewrite`](Self::identity_rewrite).
    pub identity_replacement: String,

    /// Ask the loader to drop cached content before each load.
    pub force_reload: bool,

    /// Follow symbolic links while listing directories.
    pub follow_links: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            root_path: Utf8PathBuf::new(),
            name_filter: None,
            path_filter: None,
            path_key_group: 1,
            exclude_dirs: None,
            exclude_paths: Vec::new(),
            max_depth: None,
            optional_if_missing: false,
            ignore_load_failures: false,
            skip_load: false,
            flatten: false,
            keep_path_on_flatten: false,
            mark_directories: false,
            allow_duplicate_keys: false,
            aggregate: false,
            use_global_name_for_key: false,
            resolve_identity: true,
            identity_rewrite: None,
            identity_replacement: String::new(),
            force_reload: true,
            follow_links: false,
        }
    }
}

impl ScanOptions {
    /// Creates options for scanning `root` with every other field defaulted.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root_path: root.into(),
            ..Self::default()
        }
    }

    /// Loads options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sets the filename filter.
    #[must_use]
    pub fn with_name_filter(mut self, pattern: impl Into<String>) -> Self {
        self.name_filter = Some(pattern.into());
        self
    }

    /// Sets the relative-path filter.
    #[must_use]
    pub fn with_path_filter(mut self, pattern: impl Into<String>) -> Self {
        self.path_filter = Some(pattern.into());
        self
    }

    /// Sets the directory-name exclusion pattern.
    #[must_use]
    pub fn with_exclude_dirs(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_dirs = Some(pattern.into());
        self
    }

    /// Adds a relative-path exclusion pattern.
    #[must_use]
    pub fn with_exclude_path(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_paths.push(pattern.into());
        self
    }

    /// Limits traversal depth.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the identity rewrite rule.
    #[must_use]
    pub fn with_identity_rewrite(
        mut self,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.identity_rewrite = Some(pattern.into());
        self.identity_replacement = replacement.into();
        self
    }

    /// Checks option combinations that can be rejected without compiling
    /// patterns or reading the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_path.as_str().is_empty() {
            return Err(ConfigError::MissingOption("root_path"));
        }
        if self.keep_path_on_flatten && !self.flatten {
            return Err(ConfigError::invalid(
                "keep_path_on_flatten",
                "requires `flatten` to be enabled",
            ));
        }
        if self.aggregate && self.flatten {
            return Err(ConfigError::invalid(
                "aggregate",
                "cannot be combined with `flatten`",
            ));
        }
        Ok(())
    }
}

/// Compiles a pattern option, attributing failures to `option`.
///
/// # Examples
///
/// ```
/// use dl_core::compile_pattern;
///
/// assert!(compile_pattern("name_filter", r"(.+)\.json$").is_ok());
/// assert!(compile_pattern("name_filter", "(").is_err());
/// ```
pub fn compile_pattern(option: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern { option, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_options_defaults() {
        let options = ScanOptions::default();
        assert!(options.root_path.as_str().is_empty());
        assert_eq!(options.path_key_group, 1);
        assert!(options.resolve_identity);
        assert!(options.force_reload);
        assert!(!options.flatten);
        assert!(options.max_depth.is_none());
    }

    #[test]
    fn test_validate_requires_root() {
        let err = ScanOptions::default().validate().err();
        assert!(matches!(err, Some(ConfigError::MissingOption("root_path"))));
    }

    #[test]
    fn test_validate_keep_path_requires_flatten() {
        let mut options = ScanOptions::new("api");
        options.keep_path_on_flatten = true;
        assert!(options.validate().is_err());

        options.flatten = true;
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_aggregate_with_flatten() {
        let mut options = ScanOptions::new("config");
        options.aggregate = true;
        options.flatten = true;
        let err = options.validate().err();
        assert_eq!(err.and_then(|e| e.option()), Some("aggregate"));
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let json = r#"{"root_path": "api/controllers", "name_filter": "(.+)Controller\\.json$"}"#;
        let options: ScanOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.root_path, "api/controllers");
        assert_eq!(options.name_filter.as_deref(), Some(r"(.+)Controller\.json$"));
        assert!(options.resolve_identity);
        assert_eq!(options.path_key_group, 1);
    }

    #[test]
    fn test_deserialize_declared_identity_alias() {
        let json = r#"{"root_path": "models", "use_declared_identity_for_key": true}"#;
        let options: ScanOptions = serde_json::from_str(json).unwrap();
        assert!(options.use_global_name_for_key);
    }

    #[test]
    fn test_deserialize_rejects_negative_depth() {
        let json = r#"{"root_path": "models", "max_depth": -1}"#;
        assert!(serde_json::from_str::<ScanOptions>(json).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("options.json")).unwrap();
        std::fs::write(&path, r#"{"root_path": "config", "aggregate": true}"#).unwrap();

        let options = ScanOptions::from_json_file(&path).unwrap();
        assert!(options.aggregate);
        assert_eq!(options.root_path, "config");
    }

    #[test]
    fn test_from_json_file_missing() {
        let result = ScanOptions::from_json_file(Utf8Path::new("/nonexistent/options.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_compile_pattern_reports_option() {
        let err = compile_pattern("exclude_dirs", "[").err();
        assert_eq!(err.and_then(|e| e.option()), Some("exclude_dirs"));
    }
}
