use chrono::NaiveDate;
use grouper_core::layout::{ReviewFolders, staging_path, unit_target_path};
use grouper_core::naming::{non_duplicate_directory, non_duplicate_filename, review_file_name};
use grouper_core::{
    ClassifiedFile, ContentHash, DateWindow, FileKind, GrouperConfig, TransferMode, classify,
    classify_path,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_classification_is_exhaustive() {
    let cases = [
        ("done", "done-sentinel"),
        ("mets.xml", "mets-xml"),
        ("not-a-valid-name", "other"),
        ("JAZZABC-20181222-L04.pdf", "fairfax-pdf"),
        ("DOMED1-20181222-L04-and-more.PDF", "fairfax-pdf"),
        ("BA1ODF-20140302-and-more.Pdf", "fairfax-pdf"),
        ("AB-20181222-L04.pdf", "other"),
    ];

    for (name, label) in cases {
        assert_eq!(classify(name).unwrap().label(), label, "{name}");
    }
}

#[test]
fn test_classification_is_a_pure_function() {
    let first = classify("DOMED1-20181222-L04-and-more.PDF").unwrap();
    let second = classify("DOMED1-20181222-L04-and-more.PDF").unwrap();
    assert_eq!(first, second);

    let identity = first.identity().unwrap();
    assert_eq!(identity.title_code(), "DOM");
    assert_eq!(identity.edition_code(), "ED1");
    assert_eq!(identity.date(), NaiveDate::from_ymd_opt(2018, 12, 22).unwrap());
}

#[test]
fn test_classified_files_sort_by_path() {
    let mut files = vec![
        classify_path(Path::new("/src/b/JAZZABC-20181222-L04.pdf")).unwrap(),
        classify_path(Path::new("/src/a/done")).unwrap(),
        ClassifiedFile::new("/src/a/mets.xml", FileKind::MetsXml),
    ];
    files.sort();

    let paths: Vec<&Path> = files.iter().map(|f| f.path()).collect();
    assert_eq!(
        paths,
        vec![
            Path::new("/src/a/done"),
            Path::new("/src/a/mets.xml"),
            Path::new("/src/b/JAZZABC-20181222-L04.pdf"),
        ]
    );
}

#[test]
fn test_collision_names_are_never_existing_paths() {
    let temp = TempDir::new().unwrap();
    let staged = temp.path().join("JAZZABC-20181222-L04.pdf");
    fs::write(&staged, "first").unwrap();

    for _ in 0..4 {
        let free = non_duplicate_filename(&staged);
        assert!(!free.exists());
        fs::write(&free, "next").unwrap();
    }
    assert!(temp.path().join("JAZZABC-20181222-L04-DUPLICATE-3.pdf").exists());

    let unit = temp.path().join("20190101");
    fs::create_dir(&unit).unwrap();
    for expected in 0..3 {
        let free = non_duplicate_directory(&unit);
        assert_eq!(free, temp.path().join(format!("20190101-{expected}")));
        fs::create_dir(&free).unwrap();
    }
}

#[test]
fn test_layout_paths() {
    let identity = classify("JAZZABC-20181222-L04.pdf").unwrap().identity().cloned().unwrap();
    assert_eq!(
        staging_path(Path::new("/pre"), &identity, "JAZZABC-20181222-L04.pdf"),
        PathBuf::from("/pre/20181222/JAZZ/JAZZABC-20181222-L04.pdf")
    );
    assert_eq!(
        unit_target_path(Path::new("/post"), "newspapers", "TITLE", "2019", "20190101"),
        PathBuf::from("/post/newspapers/TITLE/2019/20190101")
    );

    let folders = ReviewFolders::new(Path::new("/review"));
    assert_eq!(folders.all().len(), 3);
}

#[test]
fn test_review_file_name_folds_directories() {
    let name = review_file_name(
        Path::new("/in"),
        Path::new("/in/TITLE_20190101/content $old/mets.xml"),
    );
    assert_eq!(name, "TITLE_20190101_content--old_mets.xml");
}

#[test]
fn test_config_round_trip_through_builder() {
    let start = NaiveDate::from_ymd_opt(2015, 3, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2015, 3, 31).unwrap();
    let config = GrouperConfig::builder()
        .source_root("/in")
        .pre_process_root("/pre")
        .post_process_root("/post")
        .for_review_root("/review")
        .window(DateWindow::new(start, end))
        .transfer_mode(TransferMode::Move)
        .build()
        .unwrap();

    config.check().unwrap();
    assert!(config.transfer_mode.is_move());
    assert_eq!(config.window_description(), "2015-03-01 ..= 2015-03-31");
}

#[test]
fn test_content_hash_hex() {
    let hash = ContentHash::new([0xab; 32]);
    let hex = hash.to_hex();
    assert_eq!(hex.len(), 64);
    assert!(hex.starts_with("abab"));
}
