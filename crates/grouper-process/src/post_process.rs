//! Post-process pass: promote finished units into the post-processed tree.
//!
//! A unit is a directory holding a `done` sentinel. Its name is
//! `<title>_<yyyyMMdd>` and its parent directory names the category, so
//! `in/newspapers/TITLE_20190101/done` is promoted to
//! `post/newspapers/TITLE/2019/20190101/`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Datelike;
use tracing::{debug, info, warn};

use grouper_core::layout::{UNKNOWN_DATE, UNKNOWN_YEAR, unit_target_path};
use grouper_core::naming::{is_occupied, non_duplicate_directory};
use grouper_core::{ClassifyError, DONE_FILE_NAME, FileKind, GrouperConfig, parse_date_string};
use grouper_ops::{ProcessingEvent, ProcessingObserver, TransferExecutor};
use grouper_scan::{SourceListing, SourceScanner};

use crate::error::record_failure;
use crate::{FailureKind, ItemFailure, PostProcessReport, ProcessError, PromotedUnit};

const PHASE: &str = "post-process";
const UNIT_NAME_SEPARATOR: char = '_';

/// Title, date and year encoded in a unit directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitKey {
    pub title_code: String,
    pub date: String,
    pub year: String,
}

impl UnitKey {
    /// Split `<title>_<yyyyMMdd>[_...]`. A name without `_` is kept whole
    /// with an unknown date and year.
    pub fn from_unit_name(name: &str) -> Result<Self, ClassifyError> {
        let mut parts = name.split(UNIT_NAME_SEPARATOR);
        match (parts.next(), parts.next()) {
            (Some(title), Some(date)) => {
                let parsed = parse_date_string(date)?;
                Ok(Self {
                    title_code: title.to_string(),
                    date: date.to_string(),
                    year: parsed.year().to_string(),
                })
            }
            _ => Ok(Self {
                title_code: name.to_string(),
                date: UNKNOWN_DATE.to_string(),
                year: UNKNOWN_YEAR.to_string(),
            }),
        }
    }
}

/// Promotes every unit marked with a sentinel under the source root.
pub struct IngestionStateResolver<'a> {
    config: &'a GrouperConfig,
    transfer: &'a dyn TransferExecutor,
    observer: &'a dyn ProcessingObserver,
}

impl<'a> IngestionStateResolver<'a> {
    pub fn new(
        config: &'a GrouperConfig,
        transfer: &'a dyn TransferExecutor,
        observer: &'a dyn ProcessingObserver,
    ) -> Self {
        Self {
            config,
            transfer,
            observer,
        }
    }

    /// Check the roots, find every sentinel and promote its unit.
    pub fn run(&self) -> Result<PostProcessReport, ProcessError> {
        self.config.prepare_roots()?;
        info!(
            "post-processing {} into {}",
            self.config.source_root.display(),
            self.config.post_process_root.display()
        );
        let listing = SourceScanner::new().named_files(&self.config.source_root, DONE_FILE_NAME)?;
        self.process_listing(&listing)
    }

    /// Promote the units of already found sentinels, in listing order.
    pub fn process_listing(&self, listing: &SourceListing) -> Result<PostProcessReport, ProcessError> {
        let start = Instant::now();
        let mut report = PostProcessReport {
            source_root: listing.root.clone(),
            sentinels_found: listing.total_found(),
            ..PostProcessReport::default()
        };

        let total = listing.files.len();
        for (index, sentinel) in listing.files.iter().enumerate() {
            if matches!(sentinel.kind(), FileKind::DoneSentinel) {
                match self.promote(sentinel.path(), &mut report) {
                    Ok(unit) => report.promoted.push(unit),
                    Err(failure) => {
                        record_failure(self.config, self.observer, &mut report.failures, failure)?
                    }
                }
            } else {
                warn!(
                    "{} is not named exactly '{DONE_FILE_NAME}', unit not promoted",
                    sentinel.path().display()
                );
                report.skipped_sentinels.push(sentinel.path().to_path_buf());
            }

            let completed = index + 1;
            if self.config.status_interval_units > 0 && completed % self.config.status_interval_units == 0 {
                self.observer.on_event(&ProcessingEvent::Status {
                    phase: PHASE,
                    completed,
                    total,
                });
            }
        }

        report.elapsed = start.elapsed();
        info!(
            "{PHASE}: {} units promoted, {} renamed, {} failures",
            report.promoted.len(),
            report.units_renamed(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Where the unit holding `sentinel` would be promoted, before numbering.
    pub fn target_for(&self, sentinel: &Path) -> Result<PathBuf, ItemFailure> {
        let unit = sentinel.parent().ok_or_else(|| {
            ItemFailure::new(sentinel, FailureKind::UnitLayout, "sentinel has no parent directory")
        })?;
        let unit_name = file_name_of(unit).ok_or_else(|| {
            ItemFailure::new(unit, FailureKind::UnitLayout, "unit directory has no name")
        })?;
        let category = unit.parent().and_then(file_name_of).ok_or_else(|| {
            ItemFailure::new(unit, FailureKind::UnitLayout, "unit has no category directory")
        })?;

        let key = UnitKey::from_unit_name(&unit_name)
            .map_err(|e| ItemFailure::new(unit, FailureKind::UnitDate, e.to_string()))?;

        Ok(unit_target_path(
            &self.config.post_process_root,
            &category,
            &key.title_code,
            &key.year,
            &key.date,
        ))
    }

    fn promote(&self, sentinel: &Path, report: &mut PostProcessReport) -> Result<PromotedUnit, ItemFailure> {
        let requested = self.target_for(sentinel)?;
        // target_for already proved the parent exists
        let unit = sentinel.parent().unwrap_or(sentinel);

        if !sentinel.is_file() || !unit.is_dir() {
            return Err(ItemFailure::new(
                unit,
                FailureKind::UnitVanished,
                "unit no longer exists",
            ));
        }

        let renamed = is_occupied(&requested);
        let target = if renamed {
            let numbered = non_duplicate_directory(&requested);
            info!(
                "{} already exists, promoting {} to {}",
                requested.display(),
                unit.display(),
                numbered.display()
            );
            self.observer.on_event(&ProcessingEvent::UnitRenamed {
                requested: requested.clone(),
                actual: numbered.clone(),
            });
            numbered
        } else {
            requested
        };

        let transfer_failure = |e| ItemFailure::transfer(unit, &e);
        self.transfer.create_dir_all(&target).map_err(transfer_failure)?;

        let entries = self.unit_entries(unit)?;
        for entry in &entries {
            let Some(name) = entry.file_name() else { continue };
            let bytes = self
                .transfer
                .transfer(entry, &target.join(name))
                .map_err(transfer_failure)?;
            report.bytes_transferred += bytes;
        }
        debug!("{} entries of {} promoted", entries.len(), unit.display());
        self.observer.on_event(&ProcessingEvent::UnitTransferred {
            unit: unit.to_path_buf(),
            destination: target.clone(),
        });

        if self.transfer.mode().is_move() {
            self.transfer.remove_dir_all(unit).map_err(transfer_failure)?;
            report.units_deleted += 1;
            self.observer.on_event(&ProcessingEvent::SourceDirectoryDeleted {
                path: unit.to_path_buf(),
            });
        }

        Ok(PromotedUnit {
            unit: unit.to_path_buf(),
            target,
            renamed,
            entries: entries.len(),
        })
    }

    /// Immediate children of `unit` in name order. Names starting with `.`
    /// are left out unless hidden entries are included.
    fn unit_entries(&self, unit: &Path) -> Result<Vec<PathBuf>, ItemFailure> {
        let read_failure = |e: std::io::Error| {
            ItemFailure::new(unit, FailureKind::Transfer, format!("cannot list unit: {e}"))
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(unit).map_err(read_failure)? {
            let entry = entry.map_err(read_failure)?;
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden && !self.config.include_hidden_unit_entries {
                debug!("leaving hidden entry {}", entry.path().display());
                continue;
            }
            entries.push(entry.path());
        }
        entries.sort();
        Ok(entries)
    }
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_key_with_date() {
        let key = UnitKey::from_unit_name("TITLE_20190101").unwrap();
        assert_eq!(key.title_code, "TITLE");
        assert_eq!(key.date, "20190101");
        assert_eq!(key.year, "2019");
    }

    #[test]
    fn test_unit_key_ignores_extra_parts() {
        let key = UnitKey::from_unit_name("DOM_20181222_retry").unwrap();
        assert_eq!(key.title_code, "DOM");
        assert_eq!(key.date, "20181222");
    }

    #[test]
    fn test_unit_key_without_separator() {
        let key = UnitKey::from_unit_name("LOOSE").unwrap();
        assert_eq!(key.title_code, "LOOSE");
        assert_eq!(key.date, UNKNOWN_DATE);
        assert_eq!(key.year, UNKNOWN_YEAR);
    }

    #[test]
    fn test_unit_key_bad_date() {
        assert!(UnitKey::from_unit_name("TITLE_2019AB01").is_err());
        assert!(UnitKey::from_unit_name("TITLE_").is_err());
    }
}
