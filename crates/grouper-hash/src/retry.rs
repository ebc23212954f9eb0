//! Retry schedule for hashing.

use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::HashError;

/// Pauses taken before each attempt; the schedule length is the attempt limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    /// Six attempts, pausing 0, 0.3, 0.9, 4, 60 and 120 seconds before each.
    pub fn standard() -> Self {
        Self::from_millis(&[0, 300, 900, 4_000, 60_000, 120_000])
    }

    /// Build a schedule from millisecond pauses. An empty slice means one attempt.
    pub fn from_millis(delays_ms: &[u64]) -> Self {
        let mut delays: Vec<Duration> = delays_ms.iter().map(|ms| Duration::from_millis(*ms)).collect();
        if delays.is_empty() {
            delays.push(Duration::ZERO);
        }
        Self { delays }
    }

    /// `attempts` tries with no pause between them.
    pub fn immediate(attempts: usize) -> Self {
        Self {
            delays: vec![Duration::ZERO; attempts.max(1)],
        }
    }

    /// Maximum number of attempts.
    pub fn max_attempts(&self) -> usize {
        self.delays.len()
    }

    /// Pauses before each attempt.
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Run `op` until it succeeds or the schedule runs out.
    ///
    /// The last I/O error is returned inside [`HashError::Exhausted`].
    pub fn run<T>(&self, path: &Path, mut op: impl FnMut() -> io::Result<T>) -> Result<T, HashError> {
        let max_attempts = self.max_attempts();
        let mut last_error = None;

        for (index, delay) in self.delays.iter().enumerate() {
            let attempt = index + 1;
            if attempt > 1 && !delay.is_zero() {
                info!(
                    "delaying next hash attempt for {:.1} seconds",
                    delay.as_secs_f64()
                );
                thread::sleep(*delay);
            }

            match op() {
                Ok(value) => {
                    if attempt > 1 {
                        info!(
                            "hash attempt={attempt} SUCCEEDED for file={}",
                            path.display()
                        );
                    }
                    return Ok(value);
                }
                Err(err) => {
                    warn!(
                        "hash (attempt {attempt}/{max_attempts}) FAILED for file={}: {err}",
                        path.display()
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(HashError::Exhausted {
            path: path.to_path_buf(),
            attempts: max_attempts,
            source: last_error.unwrap_or_else(|| io::Error::other("no attempt was made")),
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
