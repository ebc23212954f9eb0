//! Error types shared across the grouper crates.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while turning a name into a typed identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// The date segment is not a real `yyyyMMdd` calendar date.
    #[error("{value} is not a proper date string in the format 'yyyyMMdd'")]
    InvalidDateFormat { value: String },
}

impl ClassifyError {
    /// Create an invalid date error for the given raw value.
    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDateFormat {
            value: value.into(),
        }
    }
}

/// Configuration problems detected before any file is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Start of the date window lies after its end.
    #[error("starting date {start} must be on or before ending date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// A required root does not exist and creation is disallowed.
    #[error("{role} root {path} does not exist (enable create_targets to create it)")]
    MissingRoot { role: &'static str, path: PathBuf },

    /// A root exists but is not a directory.
    #[error("{role} root {path} is not a directory")]
    NotADirectory { role: &'static str, path: PathBuf },

    /// A root could not be created.
    #[error("failed to create {role} root {path}: {source}")]
    CreateFailed {
        role: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A settings file could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A settings file could not be parsed.
    #[error("failed to parse settings file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The builder rejected the supplied values.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Errors that stop a source walk before it starts.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Error reading a directory entry.
    ReadError,
    /// A file name is not valid UTF-8 and was classified lossily.
    NonUtf8Name,
}

/// Non-fatal warning encountered during a walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning for a name that had to be decoded lossily.
    pub fn non_utf8_name(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Non UTF-8 file name: {}", path.display()),
            path,
            kind: WarningKind::NonUtf8Name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));
    }

    #[test]
    fn test_invalid_date_message() {
        let err = ClassifyError::invalid_date("20181399");
        assert_eq!(
            err.to_string(),
            "20181399 is not a proper date string in the format 'yyyyMMdd'"
        );
    }
}
