//! On-disk layout of the staging, post-processed and review trees.
//!
//! Post-processed issue:
//!
//! ```text
//! <root>/<newspapers|magazines>/<title>/<year>/<yyyyMMdd>/
//!     done
//!     content/mets.xml
//!     content/streams/<files>
//! ```
//!
//! Staged (pre-processed) file: `<root>/<yyyyMMdd>/<title>/<file>`.

use std::path::{Path, PathBuf};

use crate::identity::{FileIdentity, PublicationCategory};

/// Review folder for files whose post-processed namesake has other content.
pub const EXISTS_IN_POST_PROCESSING_FOLDER_NAME: &str =
    "EXISTS-IN-POST-PROCESSING-BUT-NOT-THE-SAME-FILE";

/// Review folder for unprocessed files.
pub const UNPROCESSED_FOLDER_NAME: &str = "UNPROCESSED";

/// Subfolder of [`UNPROCESSED_FOLDER_NAME`] for metadata files.
pub const UNPROCESSED_METS_FOLDER_NAME: &str = "METS";

/// Subfolder of [`UNPROCESSED_FOLDER_NAME`] for everything else.
pub const UNPROCESSED_OTHER_FOLDER_NAME: &str = "OTHER";

/// Date segment for units whose name carries no date.
pub const UNKNOWN_DATE: &str = "UNKNOWN-DATE";

/// Year segment for units whose name carries no date.
pub const UNKNOWN_YEAR: &str = "UNKNOWN-YEAR";

/// Where a post-processed copy of `file_name` would live under `category`.
pub fn post_process_stream_path(
    post_root: &Path,
    category: PublicationCategory,
    identity: &FileIdentity,
    file_name: &str,
) -> PathBuf {
    post_root
        .join(category.to_string())
        .join(identity.title_code())
        .join(identity.year_string())
        .join(identity.date_string())
        .join("content")
        .join("streams")
        .join(file_name)
}

/// Where `file_name` is staged in the pre-processed tree.
pub fn staging_path(pre_root: &Path, identity: &FileIdentity, file_name: &str) -> PathBuf {
    pre_root
        .join(identity.date_string())
        .join(identity.title_code())
        .join(file_name)
}

/// Directory a finished unit is promoted into, before collision numbering.
pub fn unit_target_path(
    post_root: &Path,
    category: &str,
    title_code: &str,
    year: &str,
    date: &str,
) -> PathBuf {
    post_root.join(category).join(title_code).join(year).join(date)
}

/// The three review folders, rooted at the review tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFolders {
    /// Files that differ from their post-processed namesake.
    pub exists_in_post_processing: PathBuf,
    /// Unprocessed `mets.xml` files.
    pub unprocessed_mets: PathBuf,
    /// Other unprocessed files.
    pub unprocessed_other: PathBuf,
}

impl ReviewFolders {
    /// Resolve the folders under `review_root`.
    pub fn new(review_root: &Path) -> Self {
        let unprocessed = review_root.join(UNPROCESSED_FOLDER_NAME);
        Self {
            exists_in_post_processing: review_root.join(EXISTS_IN_POST_PROCESSING_FOLDER_NAME),
            unprocessed_mets: unprocessed.join(UNPROCESSED_METS_FOLDER_NAME),
            unprocessed_other: unprocessed.join(UNPROCESSED_OTHER_FOLDER_NAME),
        }
    }

    /// All folders, in creation order.
    pub fn all(&self) -> [&Path; 3] {
        [
            &self.unprocessed_mets,
            &self.unprocessed_other,
            &self.exists_in_post_processing,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    #[test]
    fn test_paths_for_identity() {
        let name = "JAZZABC-20181222-L04.pdf";
        let identity = classify(name).unwrap().identity().cloned().unwrap();

        assert_eq!(
            post_process_stream_path(Path::new("/post"), PublicationCategory::Magazines, &identity, name),
            PathBuf::from("/post/magazines/JAZZ/2018/20181222/content/streams/JAZZABC-20181222-L04.pdf")
        );
        assert_eq!(
            staging_path(Path::new("/pre"), &identity, name),
            PathBuf::from("/pre/20181222/JAZZ/JAZZABC-20181222-L04.pdf")
        );
    }

    #[test]
    fn test_review_folders() {
        let folders = ReviewFolders::new(Path::new("/review"));
        assert_eq!(folders.unprocessed_mets, PathBuf::from("/review/UNPROCESSED/METS"));
        assert_eq!(folders.unprocessed_other, PathBuf::from("/review/UNPROCESSED/OTHER"));
        assert_eq!(
            folders.exists_in_post_processing,
            PathBuf::from("/review/EXISTS-IN-POST-PROCESSING-BUT-NOT-THE-SAME-FILE")
        );
    }
}
