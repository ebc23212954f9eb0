//! Distinct archive file names under a source root.

use itertools::Itertools;
use tracing::info;

use grouper_core::{FileKind, GrouperConfig};
use grouper_ops::ProcessingObserver;
use grouper_scan::{SourceListing, SourceScanner};

use crate::error::record_failure;
use crate::{FailureKind, ItemFailure, ProcessError, UniqueFile, UniqueFileListing};

const PDF_SUFFIX: &str = ".pdf";

/// Walk the source root and list each archive PDF name in the window once.
pub fn list_unique_files(
    config: &GrouperConfig,
    observer: &dyn ProcessingObserver,
) -> Result<UniqueFileListing, ProcessError> {
    config.check()?;
    config.prepare_source()?;
    let listing = SourceScanner::new().suffixed_files(&config.source_root, PDF_SUFFIX)?;
    unique_files(config, observer, &listing)
}

/// List the distinct archive PDF names of an already walked tree.
pub fn unique_files(
    config: &GrouperConfig,
    observer: &dyn ProcessingObserver,
    listing: &SourceListing,
) -> Result<UniqueFileListing, ProcessError> {
    let mut failures = Vec::new();
    for rejected in &listing.rejected {
        let failure = ItemFailure::new(&rejected.path, FailureKind::InvalidFileName, &rejected.reason);
        record_failure(config, observer, &mut failures, failure)?;
    }

    let files: Vec<UniqueFile> = listing
        .files
        .iter()
        .filter_map(|file| match file.kind() {
            FileKind::FairfaxPdf(identity) if config.window.contains(identity.date()) => {
                Some(UniqueFile {
                    name: file.file_name(),
                    title_code: identity.title_code().to_string(),
                    edition_code: identity.edition_code().to_string(),
                    date: identity.date(),
                    path: file.path().to_path_buf(),
                })
            }
            _ => None,
        })
        .sorted_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)))
        .dedup_by(|a, b| a.name == b.name)
        .collect();

    info!(
        "{} unique files in {} out of {} found",
        files.len(),
        config.window_description(),
        listing.total_found()
    );

    Ok(UniqueFileListing {
        source_root: listing.root.clone(),
        files_found: listing.total_found(),
        files,
        failures,
    })
}
