//! Run summaries.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;

use grouper_core::{Disposition, yyyymmdd};

use crate::ItemFailure;

/// Outcome of a pre-process pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreProcessReport {
    pub source_root: PathBuf,
    /// Regular files found under the source root.
    pub files_found: usize,
    /// Archive PDFs per disposition.
    pub dispositions: BTreeMap<Disposition, usize>,
    /// `mets.xml` files filed for review.
    pub mets_sent_to_review: usize,
    /// Other non-PDF files filed for review.
    pub other_sent_to_review: usize,
    /// Non-PDF files left alone because they were not included.
    pub non_pdf_ignored: usize,
    pub sources_deleted: usize,
    pub bytes_transferred: u64,
    pub failures: Vec<ItemFailure>,
    pub elapsed: Duration,
}

impl PreProcessReport {
    pub(crate) fn new(source_root: PathBuf, files_found: usize) -> Self {
        Self {
            source_root,
            files_found,
            ..Self::default()
        }
    }

    /// Number of files given `disposition`.
    pub fn count(&self, disposition: Disposition) -> usize {
        self.dispositions.get(&disposition).copied().unwrap_or(0)
    }

    /// Number of archive PDFs that got a disposition.
    pub fn decided(&self) -> usize {
        self.dispositions.values().sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub(crate) fn tally(&mut self, disposition: Disposition) {
        *self.dispositions.entry(disposition).or_default() += 1;
    }
}

/// A unit moved into the post-processed tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotedUnit {
    pub unit: PathBuf,
    pub target: PathBuf,
    /// The plain target was taken and a numbered sibling was used.
    pub renamed: bool,
    pub entries: usize,
}

/// Outcome of a post-process pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostProcessReport {
    pub source_root: PathBuf,
    /// Files matching the sentinel name, ignoring case.
    pub sentinels_found: usize,
    pub promoted: Vec<PromotedUnit>,
    /// Case-variant sentinels that were not promoted.
    pub skipped_sentinels: Vec<PathBuf>,
    pub units_deleted: usize,
    pub bytes_transferred: u64,
    pub failures: Vec<ItemFailure>,
    pub elapsed: Duration,
}

impl PostProcessReport {
    pub fn units_renamed(&self) -> usize {
        self.promoted.iter().filter(|unit| unit.renamed).count()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// A distinct archive file name found under the source root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueFile {
    pub name: String,
    pub title_code: String,
    pub edition_code: String,
    #[serde(with = "yyyymmdd")]
    pub date: NaiveDate,
    /// First path, in walk order, carrying the name.
    pub path: PathBuf,
}

/// Distinct archive file names in the date window, ordered by date then name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UniqueFileListing {
    pub source_root: PathBuf,
    /// Files with a `.pdf` suffix found under the source root.
    pub files_found: usize,
    pub files: Vec<UniqueFile>,
    pub failures: Vec<ItemFailure>,
}
