//! Pre-process pass: stage files that are not yet in the post-processed tree.
//!
//! Every archive PDF in the date window is compared first against its
//! post-processed location (newspapers, then magazines) and then against its
//! staging location. The comparison decides one [`Disposition`]:
//!
//! | post-processed copy | staged copy     | disposition                  |
//! |---------------------|-----------------|------------------------------|
//! | same content        | -               | `AlreadyProcessed`           |
//! | other content       | -               | `SendToReview`               |
//! | none                | none            | `Ingest`                     |
//! | none                | same content    | `SkipIdentical`              |
//! | none                | other content   | `RenameDuplicateAndIngest`   |
//!
//! A staged copy under a `-DUPLICATE-<n>` name with the same content also
//! counts as `SkipIdentical`, so a rerun does not stage it again.
//!
//! Files outside the window get `Skip` and are never touched.

use std::path::{Path, PathBuf};
use std::time::Instant;

use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use grouper_core::layout::{ReviewFolders, post_process_stream_path, staging_path};
use grouper_core::naming::{
    existing_duplicates, free_filename, non_duplicate_filename, review_file_name,
};
use grouper_core::{
    ClassifiedFile, Disposition, FileIdentity, FileKind, GrouperConfig, PublicationCategory,
};
use grouper_hash::{ContentHasher, HashError};
use grouper_ops::{ProcessingEvent, ProcessingObserver, TransferExecutor};
use grouper_scan::{SourceListing, SourceScanner};

use crate::error::record_failure;
use crate::{ComparisonResult, FailureKind, ItemFailure, PreProcessReport, ProcessError};

const PHASE: &str = "pre-process";

/// What to do with one archive PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub disposition: Disposition,
    /// Where the file goes, for dispositions that transfer it.
    pub destination: Option<PathBuf>,
    /// The comparison that settled the disposition.
    pub comparison: Option<ComparisonResult>,
}

impl Decision {
    fn new(
        disposition: Disposition,
        destination: Option<PathBuf>,
        comparison: Option<ComparisonResult>,
    ) -> Self {
        Self {
            disposition,
            destination,
            comparison,
        }
    }

    /// The existing file the source was compared with.
    pub fn compared_with(&self) -> Option<&Path> {
        self.comparison.as_ref().and_then(|c| c.target.as_deref())
    }
}

/// Decides and applies the disposition of every file under the source root.
pub struct DuplicateResolver<'a> {
    config: &'a GrouperConfig,
    hasher: &'a dyn ContentHasher,
    transfer: &'a dyn TransferExecutor,
    observer: &'a dyn ProcessingObserver,
    review: ReviewFolders,
}

impl<'a> DuplicateResolver<'a> {
    pub fn new(
        config: &'a GrouperConfig,
        hasher: &'a dyn ContentHasher,
        transfer: &'a dyn TransferExecutor,
        observer: &'a dyn ProcessingObserver,
    ) -> Self {
        Self {
            config,
            hasher,
            transfer,
            observer,
            review: ReviewFolders::new(&config.for_review_root),
        }
    }

    /// Check the roots, walk the source tree and process every file.
    pub fn run(&self) -> Result<PreProcessReport, ProcessError> {
        self.config.prepare_roots()?;
        info!(
            "pre-processing {} for dates {}",
            self.config.source_root.display(),
            self.config.window_description()
        );
        let listing = SourceScanner::new().all_files(&self.config.source_root)?;
        self.process_listing(&listing)
    }

    /// Process an already walked source tree.
    pub fn process_listing(&self, listing: &SourceListing) -> Result<PreProcessReport, ProcessError> {
        let start = Instant::now();
        for folder in self.review.all() {
            self.transfer.create_dir_all(folder)?;
        }

        let mut report = PreProcessReport::new(listing.root.clone(), listing.total_found());
        for warning in &listing.warnings {
            warn!("{}: {}", warning.path.display(), warning.message);
        }

        for rejected in &listing.rejected {
            let failure = ItemFailure::new(&rejected.path, FailureKind::InvalidFileName, &rejected.reason);
            record_failure(self.config, self.observer, &mut report.failures, failure)?;
        }

        let total = listing.files.len();
        for (index, file) in listing.files.iter().enumerate() {
            match file.kind() {
                FileKind::FairfaxPdf(identity) => self.process_pdf(file, identity, &mut report)?,
                FileKind::MetsXml | FileKind::Other | FileKind::DoneSentinel => {
                    self.process_non_pdf(&listing.root, file, &mut report)?
                }
            }

            let completed = index + 1;
            if self.config.status_interval_files > 0 && completed % self.config.status_interval_files == 0 {
                self.observer.on_event(&ProcessingEvent::Status {
                    phase: PHASE,
                    completed,
                    total,
                });
            }
        }

        report.elapsed = start.elapsed();
        info!(
            "{PHASE}: {} files, {} decided, {} failures",
            report.files_found,
            report.decided(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Decide the disposition of one archive PDF without changing anything.
    pub fn decide(&self, file: &ClassifiedFile, identity: &FileIdentity) -> Result<Decision, HashError> {
        if !self.config.window.contains(identity.date()) {
            return Ok(Decision::new(Disposition::Skip, None, None));
        }

        let source = file.path();
        let file_name = file.file_name();

        if let Some(existing) = self.find_post_processed(identity, &file_name) {
            let comparison = ComparisonResult::compare(self.hasher, source, Some(&existing))?;
            return Ok(if comparison.same_content {
                Decision::new(Disposition::AlreadyProcessed, None, Some(comparison))
            } else {
                let destination = free_filename(&self.review.exists_in_post_processing.join(&file_name));
                Decision::new(Disposition::SendToReview, Some(destination), Some(comparison))
            });
        }

        let staged = staging_path(&self.config.pre_process_root, identity, &file_name);
        let comparison = ComparisonResult::compare(self.hasher, source, Some(&staged))?;
        Ok(if !comparison.target_exists {
            Decision::new(Disposition::Ingest, Some(staged), Some(comparison))
        } else if comparison.same_content {
            Decision::new(Disposition::SkipIdentical, None, Some(comparison))
        } else if let Some(renamed) = self.find_staged_duplicate(source, &staged)? {
            Decision::new(Disposition::SkipIdentical, None, Some(renamed))
        } else {
            let destination = non_duplicate_filename(&staged);
            Decision::new(Disposition::RenameDuplicateAndIngest, Some(destination), Some(comparison))
        })
    }

    /// A `-DUPLICATE-<n>` sibling of `staged` holding the same bytes as `source`.
    fn find_staged_duplicate(
        &self,
        source: &Path,
        staged: &Path,
    ) -> Result<Option<ComparisonResult>, HashError> {
        for candidate in existing_duplicates(staged) {
            let comparison = ComparisonResult::compare(self.hasher, source, Some(&candidate))?;
            if comparison.same_content {
                return Ok(Some(comparison));
            }
        }
        Ok(None)
    }

    fn find_post_processed(&self, identity: &FileIdentity, file_name: &str) -> Option<PathBuf> {
        PublicationCategory::iter()
            .map(|category| {
                post_process_stream_path(&self.config.post_process_root, category, identity, file_name)
            })
            .find(|path| path.is_file())
    }

    fn process_pdf(
        &self,
        file: &ClassifiedFile,
        identity: &FileIdentity,
        report: &mut PreProcessReport,
    ) -> Result<(), ProcessError> {
        let decision = self.decide(file, identity)?;
        debug!("{} -> {}", file.path().display(), decision.disposition);
        report.tally(decision.disposition);

        if let Err(failure) = self.apply(file.path(), &decision, report) {
            record_failure(self.config, self.observer, &mut report.failures, failure)?;
        }
        Ok(())
    }

    /// Carry out `decision` for `source`.
    fn apply(
        &self,
        source: &Path,
        decision: &Decision,
        report: &mut PreProcessReport,
    ) -> Result<(), ItemFailure> {
        match decision.disposition {
            Disposition::Skip => {
                self.observer.on_event(&ProcessingEvent::Skipped {
                    path: source.to_path_buf(),
                    reason: format!("outside {}", self.config.window_description()),
                });
            }
            Disposition::AlreadyProcessed => {
                let existing = decision.compared_with().unwrap_or(source);
                self.observer.on_event(&ProcessingEvent::AlreadyProcessed {
                    source: source.to_path_buf(),
                    existing: existing.to_path_buf(),
                });
                self.discard_source(source, report)?;
            }
            Disposition::SkipIdentical => {
                let staged = decision.compared_with().unwrap_or(source);
                self.observer.on_event(&ProcessingEvent::StagedDuplicateIdentical {
                    source: source.to_path_buf(),
                    staged: staged.to_path_buf(),
                });
                self.discard_source(source, report)?;
            }
            Disposition::SendToReview => {
                let existing = decision.compared_with().unwrap_or(source);
                let destination = self.destination_of(source, decision)?;
                warn!(
                    "{} exists in post-processing at {} but is not the same file, sending to {}",
                    source.display(),
                    existing.display(),
                    destination.display()
                );
                self.transfer_into_place(source, destination, report)?;
                self.observer.on_event(&ProcessingEvent::SentToReview {
                    source: source.to_path_buf(),
                    existing: existing.to_path_buf(),
                    destination: destination.to_path_buf(),
                });
            }
            Disposition::Ingest | Disposition::RenameDuplicateAndIngest => {
                let destination = self.destination_of(source, decision)?;
                if decision.disposition == Disposition::RenameDuplicateAndIngest {
                    warn!(
                        "{} differs from the staged file with the same name, staging as {}",
                        source.display(),
                        destination.display()
                    );
                }
                self.transfer_into_place(source, destination, report)?;
                self.observer.on_event(&ProcessingEvent::FileTransferred {
                    source: source.to_path_buf(),
                    destination: destination.to_path_buf(),
                });
            }
        }
        Ok(())
    }

    fn destination_of<'d>(&self, source: &Path, decision: &'d Decision) -> Result<&'d Path, ItemFailure> {
        decision.destination.as_deref().ok_or_else(|| {
            ItemFailure::new(
                source,
                FailureKind::Transfer,
                format!("no destination for {}", decision.disposition),
            )
        })
    }

    fn transfer_into_place(
        &self,
        source: &Path,
        destination: &Path,
        report: &mut PreProcessReport,
    ) -> Result<(), ItemFailure> {
        if let Some(parent) = destination.parent() {
            self.transfer
                .create_dir_all(parent)
                .map_err(|e| ItemFailure::transfer(source, &e))?;
        }
        let bytes = self
            .transfer
            .transfer(source, destination)
            .map_err(|e| ItemFailure::transfer(source, &e))?;
        report.bytes_transferred += bytes;
        Ok(())
    }

    fn discard_source(&self, source: &Path, report: &mut PreProcessReport) -> Result<(), ItemFailure> {
        if !self.transfer.mode().is_move() {
            return Ok(());
        }
        self.transfer
            .remove_file(source)
            .map_err(|e| ItemFailure::transfer(source, &e))?;
        report.sources_deleted += 1;
        self.observer.on_event(&ProcessingEvent::SourceFileDeleted {
            path: source.to_path_buf(),
        });
        Ok(())
    }

    fn process_non_pdf(
        &self,
        source_root: &Path,
        file: &ClassifiedFile,
        report: &mut PreProcessReport,
    ) -> Result<(), ProcessError> {
        if !self.config.include_non_pdf_files {
            report.non_pdf_ignored += 1;
            return Ok(());
        }

        let is_mets = matches!(file.kind(), FileKind::MetsXml);
        let folder = if is_mets {
            &self.review.unprocessed_mets
        } else {
            &self.review.unprocessed_other
        };
        let destination = free_filename(&folder.join(review_file_name(source_root, file.path())));

        match self.transfer_into_place(file.path(), &destination, report) {
            Ok(()) => {
                if is_mets {
                    report.mets_sent_to_review += 1;
                } else {
                    report.other_sent_to_review += 1;
                }
                self.observer.on_event(&ProcessingEvent::FileTransferred {
                    source: file.path().to_path_buf(),
                    destination,
                });
                Ok(())
            }
            Err(failure) => record_failure(self.config, self.observer, &mut report.failures, failure),
        }
    }
}
