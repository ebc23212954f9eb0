use grouper_core::GrouperConfig;
use grouper_hash::{Blake3Hasher, ContentHasher, HashError, RetryPolicy};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn create_test_files() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::write(root.join("source.pdf"), "page content").unwrap();
    fs::write(root.join("staged.pdf"), "page content").unwrap();
    fs::write(root.join("changed.pdf"), "page content, revised").unwrap();
    fs::write(root.join("empty-a.pdf"), "").unwrap();
    fs::write(root.join("empty-b.pdf"), "").unwrap();

    temp
}

#[test]
fn test_identical_files_match() {
    let temp = create_test_files();
    let hasher = Blake3Hasher::new();

    assert!(hasher
        .same_content(&temp.path().join("source.pdf"), &temp.path().join("staged.pdf"))
        .unwrap());
    assert!(hasher
        .same_content(&temp.path().join("empty-a.pdf"), &temp.path().join("empty-b.pdf"))
        .unwrap());
}

#[test]
fn test_different_files_do_not_match() {
    let temp = create_test_files();
    let hasher = Blake3Hasher::new();

    assert!(!hasher
        .same_content(&temp.path().join("source.pdf"), &temp.path().join("changed.pdf"))
        .unwrap());
}

#[test]
fn test_hash_is_stable() {
    let temp = create_test_files();
    let hasher = Blake3Hasher::new();
    let path = temp.path().join("source.pdf");

    let first = hasher.hash(&path).unwrap();
    let second = hasher.hash(&path).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_hex().len(), 64);
}

#[test]
fn test_missing_side_reports_its_path() {
    let temp = create_test_files();
    let hasher = Blake3Hasher::with_policy(RetryPolicy::immediate(3));
    let missing = temp.path().join("gone.pdf");

    let err = hasher
        .same_content(&temp.path().join("source.pdf"), &missing)
        .unwrap_err();

    let HashError::Exhausted { path, attempts, .. } = err;
    assert_eq!(path, missing);
    assert_eq!(attempts, 3);
}

#[test]
fn test_policy_from_config() {
    let temp = TempDir::new().unwrap();
    let config = GrouperConfig::builder()
        .source_root(temp.path())
        .pre_process_root(temp.path().join("pre"))
        .post_process_root(temp.path().join("post"))
        .for_review_root(temp.path().join("review"))
        .hash_retry_delays_ms(vec![0u64, 10, 20])
        .build()
        .unwrap();

    let hasher = Blake3Hasher::from_config(&config);
    assert_eq!(hasher.policy().max_attempts(), 3);
    assert_eq!(hasher.policy().delays()[2], Duration::from_millis(20));
}

#[test]
fn test_default_policy_is_standard() {
    let hasher = Blake3Hasher::new();
    assert_eq!(hasher.policy(), &RetryPolicy::standard());
    assert_eq!(hasher.policy().delays()[3], Duration::from_secs(4));
}

#[test]
fn test_same_content_is_reflexive_and_symmetric() {
    let temp = create_test_files();
    let hasher = Blake3Hasher::new();
    let names = ["source.pdf", "staged.pdf", "changed.pdf", "empty-a.pdf"];

    for a in names {
        let a = temp.path().join(a);
        assert!(hasher.same_content(&a, &a).unwrap());
        for b in names {
            let b = temp.path().join(b);
            assert_eq!(
                hasher.same_content(&a, &b).unwrap(),
                hasher.same_content(&b, &a).unwrap()
            );
        }
    }
}

#[test]
fn test_hash_is_path_independent() {
    let temp = create_test_files();
    let hasher = Blake3Hasher::new();
    let nested = temp.path().join("deep/er");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("other-name.bin"), "page content").unwrap();

    assert_eq!(
        hasher.hash(&temp.path().join("source.pdf")).unwrap(),
        hasher.hash(&nested.join("other-name.bin")).unwrap()
    );
}
