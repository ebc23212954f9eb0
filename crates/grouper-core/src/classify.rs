//! Filename grammar and classification.
//!
//! A conforming name looks like `DOMED1-20181222-L04-and-more.pdf`: a 5 to 7
//! character title+edition block, a dash, an 8 digit date, a dash, a free
//! qualifier and a `.pdf` extension in any case. The pattern may occur
//! anywhere in the name.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ClassifyError;
use crate::identity::{ClassifiedFile, FileIdentity, FileKind};

/// Name of the sentinel that marks a finished ingestion unit.
pub const DONE_FILE_NAME: &str = "done";

/// Name of the per-issue metadata file.
pub const METS_XML_FILE_NAME: &str = "mets.xml";

static FAIRFAX_PDF_FILE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<titleCode>[a-zA-Z0-9]{3,4})(?P<editionCode>[a-zA-Z0-9]{2,3})",
        r"-(?P<date>[0-9]{8})-",
        r"(?P<qualifier>.*?)(?P<extension>\.[pP][dD][fF])",
    ))
    .expect("filename grammar is a valid regex")
});

/// Classify a bare file name.
///
/// The grammar is tried first, then the exact (case-sensitive) sentinel and
/// metadata names. Fails only when a grammar match carries an impossible date.
pub fn classify(file_name: &str) -> Result<FileKind, ClassifyError> {
    if let Some(captures) = FAIRFAX_PDF_FILE_REGEX.captures(file_name) {
        let group = |name: &str| captures.name(name).map(|m| m.as_str()).unwrap_or_default();
        let identity = FileIdentity::from_captures(
            group("titleCode"),
            group("editionCode"),
            group("date"),
            group("qualifier"),
            group("extension"),
        )?;
        return Ok(FileKind::FairfaxPdf(identity));
    }

    Ok(match file_name {
        DONE_FILE_NAME => FileKind::DoneSentinel,
        METS_XML_FILE_NAME => FileKind::MetsXml,
        _ => FileKind::Other,
    })
}

/// Classify the file name component of `path`.
pub fn classify_path(path: &Path) -> Result<ClassifiedFile, ClassifyError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let kind = classify(&name)?;
    Ok(ClassifiedFile::new(path, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn identity(name: &str) -> FileIdentity {
        match classify(name).unwrap() {
            FileKind::FairfaxPdf(identity) => identity,
            other => panic!("expected a PDF identity for {name}, got {other:?}"),
        }
    }

    #[test]
    fn test_special_names() {
        assert_eq!(classify("done").unwrap(), FileKind::DoneSentinel);
        assert_eq!(classify("mets.xml").unwrap(), FileKind::MetsXml);
        assert_eq!(classify("not-a-valid-name").unwrap(), FileKind::Other);
    }

    #[test]
    fn test_special_names_are_case_sensitive() {
        assert_eq!(classify("DONE").unwrap(), FileKind::Other);
        assert_eq!(classify("METS.XML").unwrap(), FileKind::Other);
    }

    #[test]
    fn test_three_char_edition_is_kept() {
        let id = identity("JAZZABC-20181222-L04.pdf");
        assert_eq!(id.title_code(), "JAZZ");
        assert_eq!(id.edition_code(), "ABC");
        assert_eq!(id.date(), NaiveDate::from_ymd_opt(2018, 12, 22).unwrap());
        assert_eq!(id.date_string(), "20181222");
        assert_eq!(id.qualifier(), "L04");
        assert_eq!(id.extension(), ".pdf");
    }

    #[test]
    fn test_four_two_split_is_renormalized() {
        let id = identity("DOMED1-20181222-L04-and-more.PDF");
        assert_eq!(id.title_code(), "DOM");
        assert_eq!(id.edition_code(), "ED1");
        assert_eq!(id.date(), NaiveDate::from_ymd_opt(2018, 12, 22).unwrap());
        assert_eq!(id.qualifier(), "L04-and-more");
        assert_eq!(id.extension(), ".PDF");
    }

    #[test]
    fn test_mixed_case_extension() {
        let id = identity("BA1ODF-20140302-and-more.Pdf");
        assert_eq!(id.title_code(), "BA1");
        assert_eq!(id.edition_code(), "ODF");
        assert_eq!(id.extension(), ".Pdf");
    }

    #[test]
    fn test_grammar_is_unanchored() {
        let id = identity("scan of WAGED1-20150101-001.pdf.bak");
        assert_eq!(id.title_code(), "WAG");
        assert_eq!(id.edition_code(), "ED1");
    }

    #[test]
    fn test_impossible_date_is_an_error() {
        let err = classify("JAZZABC-20181399-L04.pdf").unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidDateFormat { ref value } if value == "20181399"));
    }

    #[test]
    fn test_non_pdf_extension_is_other() {
        assert_eq!(classify("JAZZABC-20181222-L04.tif").unwrap(), FileKind::Other);
    }

    #[test]
    fn test_classify_path_uses_file_name() {
        let file = classify_path(Path::new("/archive/in/done")).unwrap();
        assert_eq!(file.kind(), &FileKind::DoneSentinel);
        assert_eq!(file.file_name(), "done");
    }
}
