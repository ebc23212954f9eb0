//! Content hashing for fairfax-grouper.
//!
//! Two files are considered the same when their BLAKE3 digests match. Each
//! digest is computed under a [`RetryPolicy`]: a failed read is retried after
//! the next pause in the schedule, and only when every attempt has failed is
//! a [`HashError`] returned.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use grouper_hash::{Blake3Hasher, ContentHasher};
//!
//! let hasher = Blake3Hasher::new();
//! let same = hasher
//!     .same_content(Path::new("/in/a.pdf"), Path::new("/staging/a.pdf"))
//!     .unwrap();
//! println!("identical: {same}");
//! ```

mod hasher;
mod retry;

pub use hasher::{Blake3Hasher, ContentHasher, HashError};
pub use retry::RetryPolicy;

// Re-export core types
pub use grouper_core::ContentHash;
