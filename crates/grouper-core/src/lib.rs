//! Core types for fairfax-grouper.
//!
//! This crate holds the pieces every other crate agrees on: the filename
//! grammar and its typed identities, the on-disk layout of the staging,
//! post-processed and review trees, collision-free naming, and the run
//! configuration.

mod classify;
mod config;
mod error;
mod identity;
pub mod layout;
pub mod naming;

pub use classify::{DONE_FILE_NAME, METS_XML_FILE_NAME, classify, classify_path};
pub use config::{GrouperConfig, GrouperConfigBuilder, GrouperConfigBuilderError, GrouperSettings};
pub use error::{ClassifyError, ConfigError, ScanError, ScanWarning, WarningKind};
pub use identity::{
    ClassifiedFile, ContentHash, DATE_DISPLAY_FORMAT, DATE_PARSE_FORMAT, DateWindow, Disposition,
    FileIdentity, FileKind, PublicationCategory, TransferMode, parse_date_string, yyyymmdd,
};
