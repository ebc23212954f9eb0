//! Source tree walking for fairfax-grouper.
//!
//! Walks a source root with jwalk, classifies every regular file by its
//! name and returns the result in ascending path order, so that every run
//! over the same tree visits files in the same sequence.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use grouper_scan::SourceScanner;
//!
//! let listing = SourceScanner::new().named_files(Path::new("/archive/in"), "done").unwrap();
//! println!("{} sentinel files", listing.files.len());
//! ```

mod scanner;

pub use scanner::{NameFilter, RejectedFile, SourceListing, SourceScanner};

// Re-export core types for convenience
pub use grouper_core::{ClassifiedFile, FileKind, ScanError, ScanWarning, WarningKind};
