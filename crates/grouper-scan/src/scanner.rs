//! JWalk-based source walker.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use jwalk::{Parallelism, WalkDir};
use serde::Serialize;
use tracing::{debug, info};

use grouper_core::{ClassifiedFile, ClassifyError, ScanError, ScanWarning, WarningKind, classify};

/// Which file names a walk keeps. Comparisons ignore ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameFilter {
    /// Every regular file.
    All,
    /// Files whose whole name matches.
    Named(String),
    /// Files whose name ends with the suffix.
    Suffixed(String),
}

impl NameFilter {
    /// Whether `name` passes the filter.
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(wanted) => name.eq_ignore_ascii_case(wanted),
            Self::Suffixed(suffix) => name
                .to_ascii_lowercase()
                .ends_with(&suffix.to_ascii_lowercase()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::All => "all files".to_string(),
            Self::Named(name) => format!("case-insensitive name='{name}'"),
            Self::Suffixed(suffix) => format!("case-insensitive suffix='{suffix}'"),
        }
    }
}

/// A file whose name matched the grammar but could not be turned into an identity.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedFile {
    /// Path of the file.
    pub path: PathBuf,
    /// Why classification failed.
    pub reason: String,
    #[serde(skip)]
    pub error: ClassifyError,
}

/// Result of walking a source root.
#[derive(Debug, Clone)]
pub struct SourceListing {
    /// Canonical root that was walked.
    pub root: PathBuf,
    /// Classified files in ascending path order.
    pub files: Vec<ClassifiedFile>,
    /// Files whose names could not be classified.
    pub rejected: Vec<RejectedFile>,
    /// Entries that could not be read.
    pub warnings: Vec<ScanWarning>,
    /// Wall time of the walk.
    pub scan_duration: Duration,
}

impl SourceListing {
    /// Number of files found, classified or not.
    pub fn total_found(&self) -> usize {
        self.files.len() + self.rejected.len()
    }
}

/// Walks a source tree and classifies every regular file it meets.
///
/// The walk is serial and includes hidden entries; symbolic links are not
/// followed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceScanner;

impl SourceScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self
    }

    /// Every file under `root`.
    pub fn all_files(&self, root: &Path) -> Result<SourceListing, ScanError> {
        self.scan(root, &NameFilter::All)
    }

    /// Files under `root` named `name`, ignoring case.
    pub fn named_files(&self, root: &Path, name: &str) -> Result<SourceListing, ScanError> {
        self.scan(root, &NameFilter::Named(name.to_string()))
    }

    /// Files under `root` whose name ends with `suffix`, ignoring case.
    pub fn suffixed_files(&self, root: &Path, suffix: &str) -> Result<SourceListing, ScanError> {
        self.scan(root, &NameFilter::Suffixed(suffix.to_string()))
    }

    /// Walk `root`, keeping the files that pass `filter`.
    pub fn scan(&self, root: &Path, filter: &NameFilter) -> Result<SourceListing, ScanError> {
        let start = Instant::now();
        let root_path = root.canonicalize().map_err(|e| ScanError::io(root, e))?;

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        info!(
            "finding {} on path={}",
            filter.describe(),
            root_path.display()
        );

        let walker = WalkDir::new(&root_path)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true);

        let mut files = Vec::new();
        let mut rejected = Vec::new();
        let mut warnings = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    warnings.push(ScanWarning::new(path, err.to_string(), WarningKind::ReadError));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let raw_name = entry.file_name();
            let name = match raw_name.to_str() {
                Some(name) => name.to_string(),
                None => {
                    warnings.push(ScanWarning::non_utf8_name(&path));
                    raw_name.to_string_lossy().into_owned()
                }
            };

            if !filter.accepts(&name) {
                continue;
            }

            match classify(&name) {
                Ok(kind) => files.push(ClassifiedFile::new(path, kind)),
                Err(error) => {
                    debug!("rejected {}: {error}", path.display());
                    rejected.push(RejectedFile {
                        path,
                        reason: error.to_string(),
                        error,
                    });
                }
            }
        }

        files.sort();
        rejected.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));

        info!(
            "{} files found with {} on path={}",
            files.len() + rejected.len(),
            filter.describe(),
            root_path.display()
        );

        Ok(SourceListing {
            root: root_path,
            files,
            rejected,
            warnings,
            scan_duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_filter() {
        assert!(NameFilter::All.accepts("anything"));
        assert!(NameFilter::Named("done".into()).accepts("DONE"));
        assert!(!NameFilter::Named("done".into()).accepts("done.txt"));
        assert!(NameFilter::Suffixed(".pdf".into()).accepts("A.Pdf"));
        assert!(!NameFilter::Suffixed(".pdf".into()).accepts("A.pdf.bak"));
    }
}
