//! Transfer primitives and progress events for fairfax-grouper.
//!
//! [`TransferExecutor`] is the seam between the grouping passes and the
//! filesystem. [`FsTransfer`] moves with a rename, falling back to copy and
//! delete across filesystems, and copies while keeping modification times.
//! Nothing is ever overwritten.
//!
//! The passes report what they do through a [`ProcessingObserver`].

mod error;
mod progress;
mod transfer;

pub use error::TransferError;
pub use progress::{LEGEND, NullObserver, ProcessingEvent, ProcessingObserver, TracingObserver};
pub use transfer::{FsTransfer, TransferExecutor};

// Re-export core types
pub use grouper_core::TransferMode;
