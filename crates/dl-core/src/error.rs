//! Error types for the dl-core crate.
//!
//! This module provides [`ConfigError`], raised while validating
//! [`ScanOptions`](crate::ScanOptions) before any filesystem access happens.

use camino::Utf8PathBuf;

/// Errors that can occur during option loading and validation.
///
/// # Examples
///
/// ```
/// use dl_core::ConfigError;
///
/// let error = ConfigError::MissingOption("root_path");
/// assert!(error.to_string().contains("root_path"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required option was not supplied.
    #[error("missing required option '{0}'")]
    MissingOption(&'static str),

    /// An option has a value that cannot be used.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: &'static str,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// A pattern option is not a valid regular expression.
    #[error("invalid pattern for '{option}': {source}")]
    InvalidPattern {
        /// The name of the option holding the pattern.
        option: &'static str,
        /// The underlying regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// An options file could not be read.
    #[error("failed to read options file {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An options file is not valid JSON for [`ScanOptions`](crate::ScanOptions).
    #[error("failed to parse options: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid(option: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            reason: reason.into(),
        }
    }

    /// Returns the name of the offending option, if the error concerns one.
    #[must_use]
    pub const fn option(&self) -> Option<&'static str> {
        match self {
            Self::MissingOption(option)
            | Self::InvalidOption { option, .. }
            | Self::InvalidPattern { option, .. } => Some(*option),
            Self::Io { .. } | Self::Parse(_) => None,
        }
    }
}
