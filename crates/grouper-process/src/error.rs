//! Run errors.

use std::path::{Path, PathBuf};

use serde::Serialize;
use strum::Display;
use thiserror::Error;

use grouper_core::{ConfigError, GrouperConfig, ScanError};
use grouper_hash::HashError;
use grouper_ops::{ProcessingEvent, ProcessingObserver, TransferError};

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Storage stopped answering; nothing more can be decided safely.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// Setting up the review tree failed.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// A per-item failure while `fail_fast` is set.
    #[error("aborting on first failure: {0}")]
    Item(ItemFailure),
}

/// What went wrong with a single file or unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// A name that matches the grammar carries an impossible date.
    InvalidFileName,
    /// A unit directory name carries an impossible date.
    UnitDate,
    /// A unit has no usable directory around it.
    UnitLayout,
    /// A unit disappeared before it could be promoted.
    UnitVanished,
    /// Moving, copying or deleting failed.
    Transfer,
}

/// A failure that was recorded and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} {}: {message}", .path.display())]
pub struct ItemFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl ItemFailure {
    pub fn new(path: impl Into<PathBuf>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn transfer(path: &Path, error: &TransferError) -> Self {
        Self::new(path, FailureKind::Transfer, error.to_string())
    }
}

/// Report `failure`, then either keep it or abort when the run is fail-fast.
pub(crate) fn record_failure(
    config: &GrouperConfig,
    observer: &dyn ProcessingObserver,
    failures: &mut Vec<ItemFailure>,
    failure: ItemFailure,
) -> Result<(), ProcessError> {
    observer.on_event(&ProcessingEvent::Failed {
        path: failure.path.clone(),
        message: failure.to_string(),
    });
    if config.fail_fast {
        return Err(ProcessError::Item(failure));
    }
    failures.push(failure);
    Ok(())
}
