//! Content hashing for staged and post-processed files.
//!
//! Files are hashed whole with BLAKE3. Reads go through the [`RetryPolicy`],
//! since source trees often live on network shares that drop connections.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use blake3::Hasher;
use thiserror::Error;
use tracing::debug;

use grouper_core::{ContentHash, GrouperConfig};

use crate::RetryPolicy;

/// Files above this size are memory-mapped instead of read in chunks.
const MMAP_THRESHOLD: u64 = 128 * 1024;
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Errors produced while hashing.
#[derive(Debug, Error)]
pub enum HashError {
    /// Every attempt in the retry schedule failed.
    #[error("unable to hash {path} after {attempts} attempts: {source}")]
    Exhausted {
        path: PathBuf,
        attempts: usize,
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Path that could not be hashed.
    pub fn path(&self) -> &Path {
        match self {
            Self::Exhausted { path, .. } => path,
        }
    }
}

/// Produces content digests for files.
pub trait ContentHasher: Send + Sync {
    /// Digest of the file at `path`.
    fn hash(&self, path: &Path) -> Result<ContentHash, HashError>;

    /// Whether the two files hold the same bytes.
    fn same_content(&self, a: &Path, b: &Path) -> Result<bool, HashError> {
        Ok(self.hash(a)? == self.hash(b)?)
    }
}

/// BLAKE3 hasher with retries.
#[derive(Debug, Clone, Default)]
pub struct Blake3Hasher {
    policy: RetryPolicy,
}

impl Blake3Hasher {
    /// Hasher using the standard retry schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hasher using a custom retry schedule.
    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Hasher using the schedule from the run configuration.
    pub fn from_config(config: &GrouperConfig) -> Self {
        Self::with_policy(RetryPolicy::from_millis(&config.hash_retry_delays_ms))
    }

    /// Retry schedule in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn compute_full_hash(path: &Path) -> io::Result<ContentHash> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut hasher = Hasher::new();

        if file_size > MMAP_THRESHOLD {
            hasher.update_mmap(path)?;
        } else {
            let mut buffer = vec![0u8; READ_BUFFER_SIZE];
            let mut file = file;
            loop {
                let bytes_read = file.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
        }

        Ok(ContentHash::new(*hasher.finalize().as_bytes()))
    }
}

impl ContentHasher for Blake3Hasher {
    fn hash(&self, path: &Path) -> Result<ContentHash, HashError> {
        self.policy.run(path, || Self::compute_full_hash(path))
    }

    fn same_content(&self, a: &Path, b: &Path) -> Result<bool, HashError> {
        let (hash_a, hash_b) = rayon::join(|| self.hash(a), || self.hash(b));
        let (hash_a, hash_b) = (hash_a?, hash_b?);
        let same = hash_a == hash_b;
        debug!(
            "{} ({}) {} {} ({})",
            a.display(),
            hash_a.to_hex(),
            if same { "==" } else { "!=" },
            b.display(),
            hash_b.to_hex()
        );
        Ok(same)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_files() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join("file1.pdf"), "duplicate content here").unwrap();
        fs::write(root.join("file2.pdf"), "duplicate content here").unwrap();
        fs::write(root.join("file3.pdf"), "unique content").unwrap();

        temp
    }

    #[test]
    fn test_compute_full_hash() {
        let temp = create_test_files();

        let hash1 = Blake3Hasher::compute_full_hash(&temp.path().join("file1.pdf")).unwrap();
        let hash2 = Blake3Hasher::compute_full_hash(&temp.path().join("file2.pdf")).unwrap();
        let hash3 = Blake3Hasher::compute_full_hash(&temp.path().join("file3.pdf")).unwrap();

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.as_bytes(), blake3::hash(b"duplicate content here").as_bytes());
    }

    #[test]
    fn test_large_file_uses_same_digest() {
        let temp = TempDir::new().unwrap();
        let content = vec![7u8; (MMAP_THRESHOLD as usize) * 2 + 11];
        let path = temp.path().join("large.pdf");
        fs::write(&path, &content).unwrap();

        let hash = Blake3Hasher::compute_full_hash(&path).unwrap();
        assert_eq!(hash.as_bytes(), blake3::hash(&content).as_bytes());
    }

    #[test]
    fn test_missing_file_exhausts_schedule() {
        let hasher = Blake3Hasher::with_policy(RetryPolicy::immediate(2));
        let err = hasher.hash(Path::new("/no/such/file.pdf")).unwrap_err();

        assert_eq!(err.path(), Path::new("/no/such/file.pdf"));
        assert!(matches!(err, HashError::Exhausted { attempts: 2, .. }));
    }
}
