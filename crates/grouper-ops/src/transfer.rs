//! Moving and copying files and directories.

use std::fs::{self, File};
use std::path::Path;

use tracing::{debug, info};

use grouper_core::{GrouperConfig, TransferMode};
use grouper_core::naming::is_occupied;

use crate::TransferError;

/// Filesystem primitives used by the grouping passes.
///
/// `transfer` never overwrites: callers pick a free destination first.
pub trait TransferExecutor {
    /// Whether transfers move or copy.
    fn mode(&self) -> TransferMode;

    /// Move or copy `source` (file or directory) to the full path `destination`.
    ///
    /// Returns the number of bytes transferred.
    fn transfer(&self, source: &Path, destination: &Path) -> Result<u64, TransferError>;

    /// Create `path` and its parents. Existing directories are left alone.
    fn create_dir_all(&self, path: &Path) -> Result<(), TransferError>;

    /// Delete a source file.
    fn remove_file(&self, path: &Path) -> Result<(), TransferError>;

    /// Delete a source directory and everything below it.
    fn remove_dir_all(&self, path: &Path) -> Result<(), TransferError>;
}

/// [`TransferExecutor`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTransfer {
    mode: TransferMode,
    verbose: bool,
}

impl FsTransfer {
    /// Create an executor.
    pub fn new(mode: TransferMode, verbose: bool) -> Self {
        Self { mode, verbose }
    }

    /// Executor matching the run configuration.
    pub fn from_config(config: &GrouperConfig) -> Self {
        Self::new(config.transfer_mode, config.verbose)
    }

    fn announce(&self, source: &Path, destination: &Path) {
        let verb = if self.mode.is_move() { "moving" } else { "copying" };
        if self.verbose {
            info!("{verb} {} to {}", source.display(), destination.display());
        } else {
            debug!("{verb} {} to {}", source.display(), destination.display());
        }
    }
}

impl TransferExecutor for FsTransfer {
    fn mode(&self) -> TransferMode {
        self.mode
    }

    fn transfer(&self, source: &Path, destination: &Path) -> Result<u64, TransferError> {
        if !is_occupied(source) {
            return Err(TransferError::SourceMissing {
                path: source.to_path_buf(),
            });
        }
        if is_occupied(destination) {
            return Err(TransferError::DestinationExists {
                path: destination.to_path_buf(),
            });
        }

        self.announce(source, destination);
        match self.mode {
            TransferMode::Move => move_item(source, destination),
            TransferMode::Copy => copy_item(source, destination),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), TransferError> {
        if path.is_dir() {
            return Ok(());
        }
        if self.verbose {
            info!("creating directory {}", path.display());
        }
        fs::create_dir_all(path).map_err(|source| TransferError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
    }

    fn remove_file(&self, path: &Path) -> Result<(), TransferError> {
        if self.verbose {
            info!("deleting {}", path.display());
        }
        fs::remove_file(path).map_err(|source| TransferError::Remove {
            path: path.to_path_buf(),
            source,
        })
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), TransferError> {
        if self.verbose {
            info!("deleting directory {}", path.display());
        }
        fs::remove_dir_all(path).map_err(|source| TransferError::Remove {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Rename `source` to `dest`, copying and deleting when the rename fails.
fn move_item(source: &Path, dest: &Path) -> Result<u64, TransferError> {
    let size = tree_size(source);
    match fs::rename(source, dest) {
        Ok(()) => return Ok(size),
        Err(e) => debug!(
            "rename {} -> {} failed ({e}), copying instead",
            source.display(),
            dest.display()
        ),
    }

    let copied = copy_item(source, dest)?;
    let removed = if source.is_dir() {
        fs::remove_dir_all(source)
    } else {
        fs::remove_file(source)
    };
    removed.map_err(|e| TransferError::Remove {
        path: source.to_path_buf(),
        source: e,
    })?;
    Ok(copied)
}

/// Copy a single item (file or directory).
fn copy_item(source: &Path, dest: &Path) -> Result<u64, TransferError> {
    if source.is_dir() {
        copy_dir_recursive(source, dest)
    } else {
        copy_file(source, dest)
    }
}

/// Copy a single file, keeping its modification time.
fn copy_file(source: &Path, dest: &Path) -> Result<u64, TransferError> {
    let copy_error = |e| TransferError::Copy {
        from: source.to_path_buf(),
        to: dest.to_path_buf(),
        source: e,
    };

    let size = fs::copy(source, dest).map_err(copy_error)?;

    let modified = fs::metadata(source).and_then(|m| m.modified()).map_err(copy_error)?;
    File::options()
        .write(true)
        .open(dest)
        .and_then(|file| file.set_modified(modified))
        .map_err(copy_error)?;

    Ok(size)
}

/// Recursively copy a directory.
fn copy_dir_recursive(source: &Path, dest: &Path) -> Result<u64, TransferError> {
    fs::create_dir_all(dest).map_err(|e| TransferError::CreateDir {
        path: dest.to_path_buf(),
        source: e,
    })?;

    let mut total_bytes = 0u64;

    let read_error = |e| TransferError::ReadDir {
        path: source.to_path_buf(),
        source: e,
    };
    for entry in fs::read_dir(source).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if path.is_dir() {
            total_bytes += copy_dir_recursive(&path, &dest_path)?;
        } else {
            total_bytes += copy_file(&path, &dest_path)?;
        }
    }

    Ok(total_bytes)
}

/// Bytes under `path`. Links are counted as themselves, unreadable entries as 0.
fn tree_size(path: &Path) -> u64 {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::read_dir(path)
            .map(|entries| entries.flatten().map(|entry| tree_size(&entry.path())).sum())
            .unwrap_or(0),
        Ok(meta) => meta.len(),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn test_copy_keeps_modification_time() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.pdf");
        fs::write(&source, "abc").unwrap();
        let old = SystemTime::UNIX_EPOCH + Duration::from_secs(1_500_000_000);
        File::options().write(true).open(&source).unwrap().set_modified(old).unwrap();

        let dest = temp.path().join("b.pdf");
        assert_eq!(copy_file(&source, &dest).unwrap(), 3);
        assert_eq!(fs::metadata(&dest).unwrap().modified().unwrap(), old);
    }

    #[test]
    fn test_dir_size() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("unit/content")).unwrap();
        fs::write(temp.path().join("unit/a.pdf"), "1234").unwrap();
        fs::write(temp.path().join("unit/content/mets.xml"), "12").unwrap();

        assert_eq!(tree_size(&temp.path().join("unit")), 6);
    }

    #[test]
    fn test_move_falls_back_to_copy_when_rename_fails() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("unit");
        let dest = temp.path().join("target");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.pdf"), "1234").unwrap();
        // A non-empty directory cannot be renamed over.
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("keep.txt"), "k").unwrap();

        assert_eq!(move_item(&source, &dest).unwrap(), 4);
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(dest.join("a.pdf")).unwrap(), "1234");
        assert!(dest.join("keep.txt").exists());
    }

    #[test]
    fn test_move_of_missing_source_reports_copy_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.pdf");

        let err = move_item(&missing, &temp.path().join("b.pdf")).unwrap_err();
        assert!(matches!(err, TransferError::Copy { .. }));
    }
}
