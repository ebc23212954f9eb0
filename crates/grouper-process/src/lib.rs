//! Grouping passes for fairfax-grouper.
//!
//! - [`DuplicateResolver`] stages files that are not yet post-processed,
//!   comparing content wherever a same-named file already exists.
//! - [`IngestionStateResolver`] promotes finished units into the
//!   post-processed tree.
//! - [`list_unique_files`] lists each archive name in the date window once.
//!
//! Configuration and storage failures end a run with a [`ProcessError`].
//! Failures that concern a single file or unit are recorded as
//! [`ItemFailure`]s in the run report and processing continues, unless the
//! configuration asks to fail fast.
//!
//! ```rust,no_run
//! use grouper_core::GrouperConfig;
//! use grouper_hash::Blake3Hasher;
//! use grouper_ops::{FsTransfer, TracingObserver};
//! use grouper_process::DuplicateResolver;
//!
//! let config = GrouperConfig::builder()
//!     .source_root("/archive/in")
//!     .pre_process_root("/archive/pre")
//!     .post_process_root("/archive/post")
//!     .for_review_root("/archive/review")
//!     .build()
//!     .unwrap();
//! let hasher = Blake3Hasher::from_config(&config);
//! let transfer = FsTransfer::from_config(&config);
//!
//! let report = DuplicateResolver::new(&config, &hasher, &transfer, &TracingObserver)
//!     .run()
//!     .unwrap();
//! println!("{} files decided", report.decided());
//! ```

mod comparison;
mod error;
mod post_process;
mod pre_process;
mod report;
mod unique;

pub use comparison::ComparisonResult;
pub use error::{FailureKind, ItemFailure, ProcessError};
pub use post_process::{IngestionStateResolver, UnitKey};
pub use pre_process::{Decision, DuplicateResolver};
pub use report::{
    PostProcessReport, PreProcessReport, PromotedUnit, UniqueFile, UniqueFileListing,
};
pub use unique::{list_unique_files, unique_files};
