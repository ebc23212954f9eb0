//! Typed identities for archive files and the values derived from them.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::ClassifyError;

/// Date layout used in file names and directory names.
pub const DATE_PARSE_FORMAT: &str = "%Y%m%d";

/// Date layout used when showing dates to people.
pub const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%d";

/// Parse an 8-digit `yyyyMMdd` string into a calendar date.
pub fn parse_date_string(value: &str) -> Result<NaiveDate, ClassifyError> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ClassifyError::invalid_date(value));
    }

    // All eight bytes are ASCII digits, so these slices are valid numbers.
    let year: i32 = value[0..4].parse().map_err(|_| ClassifyError::invalid_date(value))?;
    let month: u32 = value[4..6].parse().map_err(|_| ClassifyError::invalid_date(value))?;
    let day: u32 = value[6..8].parse().map_err(|_| ClassifyError::invalid_date(value))?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| ClassifyError::invalid_date(value))
}

/// BLAKE3 content fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Identity carried by a file name that follows the archive grammar.
///
/// Values are normalized on construction and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileIdentity {
    title_code: CompactString,
    edition_code: CompactString,
    date: NaiveDate,
    date_string: CompactString,
    qualifier: String,
    extension: CompactString,
}

impl FileIdentity {
    /// Build an identity from raw grammar captures.
    ///
    /// A 4-character title with a 2-character edition is really a 3-character
    /// title followed by a 3-character edition: the title's last character
    /// moves to the front of the edition.
    pub fn from_captures(
        raw_title: &str,
        raw_edition: &str,
        date_string: &str,
        qualifier: &str,
        extension: &str,
    ) -> Result<Self, ClassifyError> {
        let date = parse_date_string(date_string)?;

        let (title_code, edition_code) = if raw_title.len() == 4 && raw_edition.len() == 2 {
            let (title, moved) = raw_title.split_at(3);
            let mut edition = CompactString::from(moved);
            edition.push_str(raw_edition);
            (CompactString::from(title), edition)
        } else {
            (CompactString::from(raw_title), CompactString::from(raw_edition))
        };

        Ok(Self {
            title_code,
            edition_code,
            date,
            date_string: date_string.into(),
            qualifier: qualifier.to_string(),
            extension: extension.into(),
        })
    }

    /// Publication code.
    pub fn title_code(&self) -> &str {
        &self.title_code
    }

    /// Edition code.
    pub fn edition_code(&self) -> &str {
        &self.edition_code
    }

    /// Issue date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The date exactly as it appeared in the name (`yyyyMMdd`).
    pub fn date_string(&self) -> &str {
        &self.date_string
    }

    /// Four-digit year of the issue date.
    pub fn year_string(&self) -> String {
        self.date.year().to_string()
    }

    /// Free-text qualifier between the date and the extension.
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// Extension including its leading dot, in its original case.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

/// Classification tag for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FileKind {
    /// A PDF whose name follows the archive grammar.
    FairfaxPdf(FileIdentity),
    /// The `done` marker of a completed ingestion unit.
    DoneSentinel,
    /// A `mets.xml` metadata file.
    MetsXml,
    /// Anything else.
    Other,
}

impl FileKind {
    /// Short label used in listings and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FairfaxPdf(_) => "fairfax-pdf",
            Self::DoneSentinel => "done-sentinel",
            Self::MetsXml => "mets-xml",
            Self::Other => "other",
        }
    }

    /// The identity when this is a grammar-conforming PDF.
    pub fn identity(&self) -> Option<&FileIdentity> {
        match self {
            Self::FairfaxPdf(identity) => Some(identity),
            _ => None,
        }
    }
}

/// An absolute path paired with its classification.
///
/// Ordering compares the raw path bytes, which gives the same order as
/// sorting the path strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedFile {
    path: PathBuf,
    kind: FileKind,
}

impl ClassifiedFile {
    /// Pair a path with an already computed classification.
    pub fn new(path: impl Into<PathBuf>, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Full path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Classification tag.
    pub fn kind(&self) -> &FileKind {
        &self.kind
    }

    /// Bare file name, decoded lossily.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory holding the file.
    pub fn parent(&self) -> Option<&Path> {
        self.path.parent()
    }
}

impl PartialOrd for ClassifiedFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassifiedFile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path
            .as_os_str()
            .cmp(other.path.as_os_str())
            .then_with(|| self.kind.label().cmp(other.kind.label()))
    }
}

/// Inclusive range of issue dates to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// First date inside the window.
    #[serde(with = "yyyymmdd")]
    pub start: NaiveDate,
    /// Last date inside the window.
    #[serde(with = "yyyymmdd")]
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a window; no ordering check is made here.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `date` lies inside the window, both ends included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether the start is on or before the end.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

impl Default for DateWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2014, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2019, 6, 30).unwrap_or_default(),
        }
    }
}

/// Whether sources are moved or copied into their targets.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransferMode {
    /// Leave sources in place.
    #[default]
    Copy,
    /// Remove sources once they are transferred.
    Move,
}

impl TransferMode {
    /// Whether sources are removed.
    pub fn is_move(&self) -> bool {
        matches!(self, Self::Move)
    }
}

/// What the pre-process pass decided for a single PDF.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    /// Staged for the first time.
    Ingest,
    /// An identical copy is already staged.
    SkipIdentical,
    /// A different file already holds the staging name; staged under a new name.
    RenameDuplicateAndIngest,
    /// Post-processed copy exists but differs; needs a person to look at it.
    SendToReview,
    /// An identical copy is already in the post-processed tree.
    AlreadyProcessed,
    /// Issue date falls outside the date window.
    Skip,
}

impl Disposition {
    /// Whether the source ends up in a target tree.
    pub fn transfers(&self) -> bool {
        matches!(
            self,
            Self::Ingest | Self::RenameDuplicateAndIngest | Self::SendToReview
        )
    }

    /// Whether the source is deleted in move mode without being transferred.
    pub fn discards_source(&self) -> bool {
        matches!(self, Self::SkipIdentical | Self::AlreadyProcessed)
    }
}

/// Top-level subtrees of the post-processed tree, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PublicationCategory {
    Newspapers,
    Magazines,
}

/// Serde adapter for `yyyyMMdd` dates.
pub mod yyyymmdd {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{DATE_PARSE_FORMAT, parse_date_string};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_PARSE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date_string(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_parse_date_string() {
        assert_eq!(
            parse_date_string("20181222").unwrap(),
            NaiveDate::from_ymd_opt(2018, 12, 22).unwrap()
        );
        assert!(parse_date_string("20181322").is_err());
        assert!(parse_date_string("2018122").is_err());
        assert!(parse_date_string("2018-12-2").is_err());
        assert!(parse_date_string("20190229").is_err());
        assert!(parse_date_string("20200229").is_ok());
    }

    #[test]
    fn test_identity_normalization() {
        let identity = FileIdentity::from_captures("DOME", "D1", "20181222", "L04", ".PDF").unwrap();
        assert_eq!(identity.title_code(), "DOM");
        assert_eq!(identity.edition_code(), "ED1");

        let identity = FileIdentity::from_captures("JAZZ", "ABC", "20181222", "L04", ".pdf").unwrap();
        assert_eq!(identity.title_code(), "JAZZ");
        assert_eq!(identity.edition_code(), "ABC");
        assert_eq!(identity.year_string(), "2018");
    }

    #[test]
    fn test_classified_file_ordering_is_by_path_string() {
        let a = ClassifiedFile::new("/src/a-b/c", FileKind::Other);
        let b = ClassifiedFile::new("/src/a/b", FileKind::Other);
        // '-' sorts before '/' when comparing the strings.
        assert!(a < b);
    }

    #[test]
    fn test_date_window_inclusive() {
        let window = DateWindow::default();
        assert!(window.contains(NaiveDate::from_ymd_opt(2014, 1, 1).unwrap()));
        assert!(window.contains(NaiveDate::from_ymd_opt(2019, 6, 30).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2019, 7, 1).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2013, 12, 31).unwrap()));
    }

    #[test]
    fn test_category_lookup_order() {
        let names: Vec<String> = PublicationCategory::iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["newspapers", "magazines"]);
    }

    #[test]
    fn test_disposition_display() {
        assert_eq!(Disposition::SendToReview.to_string(), "send-to-review");
        assert!(Disposition::RenameDuplicateAndIngest.transfers());
        assert!(Disposition::AlreadyProcessed.discards_source());
        assert!(!Disposition::Skip.transfers());
    }
}
