//! Error types for the dl-scanner crate.
//!
//! This module provides [`LoadError`] for failures inside a
//! [`ResourceLoader`](crate::ResourceLoader) and [`ScanError`] for every
//! condition that can end a scan.

use camino::{Utf8Path, Utf8PathBuf};
use dl_core::ConfigError;

/// A loader failed to materialize one file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file that could not be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its contents could not be parsed.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// The file that could not be parsed.
        path: Utf8PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A custom loader rejected the file.
    #[error("failed to load {path}: {reason}")]
    Failed {
        /// The file that was rejected.
        path: Utf8PathBuf,
        /// Why the loader rejected it.
        reason: String,
    },
}

impl LoadError {
    /// Creates a new [`LoadError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`LoadError::Parse`] error.
    #[inline]
    pub fn parse(path: impl Into<Utf8PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`LoadError::Failed`] error.
    #[inline]
    pub fn failed(path: impl Into<Utf8PathBuf>, reason: impl Into<String>) -> Self {
        Self::Failed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the file the failure concerns.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Failed { path, .. } => path,
        }
    }
}

/// Machine-checkable classification of a [`ScanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Options were missing, malformed, or contradictory.
    InvalidConfiguration,
    /// A directory could not be listed.
    DirectoryNotFound,
    /// A matched file could not be loaded.
    ResourceLoadFailed,
    /// Two entries resolved to the same dictionary key.
    DuplicateKey,
    /// An aggregate-mode resource was not a dictionary.
    InvalidAggregateSource,
    /// A failure outside the scan's own rules (non-UTF-8 paths, task panics).
    Internal,
}

/// Errors that end a scan.
///
/// A scan either returns a complete dictionary or exactly one of these,
/// describing the first fatal condition it met.
///
/// # Error Recovery Strategy
///
/// - [`ScanError::DirectoryNotFound`]: tolerated when `optional_if_missing` is set
/// - [`ScanError::ResourceLoadFailed`]: tolerated when `ignore_load_failures` is set
/// - Everything else: always fatal
///
/// # Examples
///
/// ```
/// use dl_scanner::{ErrorKind, ScanError};
///
/// let err = ScanError::DuplicateKey { key: "user".to_owned() };
/// assert_eq!(err.kind(), ErrorKind::DuplicateKey);
/// assert_eq!(err.key(), Some("user"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The options failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A directory could not be listed.
    #[error("could not scan directory {path}: {source}")]
    DirectoryNotFound {
        /// The directory that could not be listed.
        path: Utf8PathBuf,
        /// The underlying listing error.
        #[source]
        source: ignore::Error,
    },

    /// A matched file could not be loaded.
    #[error("attempted to load {path}, but an error occurred: {source}")]
    ResourceLoadFailed {
        /// The file the scan attempted to load.
        path: Utf8PathBuf,
        /// The loader's failure.
        #[source]
        source: LoadError,
    },

    /// Two entries resolved to the same key.
    #[error("duplicate key detected: two entries resolved to `{key}` (case-insensitive)")]
    DuplicateKey {
        /// The colliding key.
        key: String,
    },

    /// An aggregate-mode resource was not a plain dictionary.
    #[error("aggregated resources must be dictionaries, but `{key}` is a {kind}")]
    InvalidAggregateSource {
        /// The key of the offending resource.
        key: String,
        /// The shape the resource actually had.
        kind: &'static str,
    },

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// The blocking task running the scan panicked or was cancelled.
    #[error("scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ScanError {
    /// Creates a new [`ScanError::Config`] error for an invalid option.
    #[inline]
    pub fn config(option: &'static str, reason: impl Into<String>) -> Self {
        Self::Config(ConfigError::invalid(option, reason))
    }

    /// Creates a new [`ScanError::DirectoryNotFound`] error.
    #[inline]
    pub fn directory(path: impl Into<Utf8PathBuf>, source: ignore::Error) -> Self {
        Self::DirectoryNotFound {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::ResourceLoadFailed`] error.
    #[inline]
    pub fn load(path: impl Into<Utf8PathBuf>, source: LoadError) -> Self {
        Self::ResourceLoadFailed {
            path: path.into(),
            source,
        }
    }

    /// Returns the machine-checkable kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::InvalidConfiguration,
            Self::DirectoryNotFound { .. } => ErrorKind::DirectoryNotFound,
            Self::ResourceLoadFailed { .. } => ErrorKind::ResourceLoadFailed,
            Self::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Self::InvalidAggregateSource { .. } => ErrorKind::InvalidAggregateSource,
            Self::NonUtf8Path(_) | Self::Task(_) => ErrorKind::Internal,
        }
    }

    /// Returns `true` if an option exists that would have tolerated this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DirectoryNotFound { .. } | Self::ResourceLoadFailed { .. }
        )
    }

    /// Returns the filesystem path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::DirectoryNotFound { path, .. } | Self::ResourceLoadFailed { path, .. } => {
                Some(path.as_path())
            }
            Self::Config(_)
            | Self::DuplicateKey { .. }
            | Self::InvalidAggregateSource { .. }
            | Self::NonUtf8Path(_)
            | Self::Task(_) => None,
        }
    }

    /// Returns the dictionary key associated with this error, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::DuplicateKey { key } | Self::InvalidAggregateSource { key, .. } => {
                Some(key.as_str())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_directory_not_found() {
        let source = ignore::Error::Io(io::Error::new(io::ErrorKind::NotFound, "not found"));
        let err = ScanError::directory("api/controllers", source);
        assert_eq!(err.kind(), ErrorKind::DirectoryNotFound);
        assert!(err.is_recoverable());
        assert_eq!(err.path().map(Utf8Path::as_str), Some("api/controllers"));
        assert!(err.to_string().contains("api/controllers"));
    }

    #[test]
    fn test_resource_load_failed_keeps_cause() {
        let cause = LoadError::failed("config/broken.json", "unexpected token");
        let err = ScanError::load("config/broken.json", cause);
        assert_eq!(err.kind(), ErrorKind::ResourceLoadFailed);
        assert!(err.to_string().contains("config/broken.json"));

        let source = err.source().map(ToString::to_string);
        assert!(source.is_some_and(|msg| msg.contains("unexpected token")));
    }

    #[test]
    fn test_duplicate_key() {
        let err = ScanError::DuplicateKey {
            key: "foo".to_owned(),
        };
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert!(!err.is_recoverable());
        assert!(err.path().is_none());
        assert_eq!(err.key(), Some("foo"));
    }

    #[test]
    fn test_invalid_aggregate_source_display() {
        let err = ScanError::InvalidAggregateSource {
            key: "routes".to_owned(),
            kind: "sequence",
        };
        assert_eq!(err.kind(), ErrorKind::InvalidAggregateSource);
        assert_eq!(
            err.to_string(),
            "aggregated resources must be dictionaries, but `routes` is a sequence"
        );
    }

    #[test]
    fn test_config_error_kind() {
        let err = ScanError::config("aggregate", "cannot be combined with `flatten`");
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert!(err.to_string().starts_with("invalid configuration:"));
    }

    #[test]
    fn test_load_error_path() {
        let err = LoadError::read("a.json", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.path(), Utf8Path::new("a.json"));
    }
}
