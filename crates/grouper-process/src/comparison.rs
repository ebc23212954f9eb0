//! Source-to-target content comparison.

use std::path::{Path, PathBuf};

use serde::Serialize;

use grouper_core::naming::is_occupied;
use grouper_hash::{ContentHasher, HashError};

/// How a source file relates to a candidate target. Computed per decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub source: PathBuf,
    pub target: Option<PathBuf>,
    pub target_exists: bool,
    pub same_content: bool,
}

impl ComparisonResult {
    /// Compare `source` with `target`.
    ///
    /// Only a regular file can hold the same content; anything else occupying
    /// the target counts as different. Hashing is skipped when the target is
    /// free.
    pub fn compare(
        hasher: &dyn ContentHasher,
        source: &Path,
        target: Option<&Path>,
    ) -> Result<Self, HashError> {
        let Some(target) = target else {
            return Ok(Self {
                source: source.to_path_buf(),
                target: None,
                target_exists: false,
                same_content: false,
            });
        };

        let target_exists = is_occupied(target);
        let same_content = target_exists && target.is_file() && hasher.same_content(source, target)?;

        Ok(Self {
            source: source.to_path_buf(),
            target: Some(target.to_path_buf()),
            target_exists,
            same_content,
        })
    }

    /// Target exists with other content.
    pub fn differs(&self) -> bool {
        self.target_exists && !self.same_content
    }
}
