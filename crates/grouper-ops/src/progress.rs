//! Progress events emitted by the grouping passes.

use std::path::PathBuf;

use tracing::{debug, info, warn};

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingEvent {
    /// A file was transferred into the staging or review tree.
    FileTransferred { source: PathBuf, destination: PathBuf },
    /// A unit's entries were transferred into the post-processed tree.
    UnitTransferred { unit: PathBuf, destination: PathBuf },
    /// The staged copy already holds the same bytes.
    StagedDuplicateIdentical { source: PathBuf, staged: PathBuf },
    /// A unit target was taken and a numbered sibling was used.
    UnitRenamed { requested: PathBuf, actual: PathBuf },
    /// The file is already in the post-processed tree.
    AlreadyProcessed { source: PathBuf, existing: PathBuf },
    /// The file differs from its post-processed namesake.
    SentToReview { source: PathBuf, existing: PathBuf, destination: PathBuf },
    /// A source file was deleted.
    SourceFileDeleted { path: PathBuf },
    /// A source unit directory was deleted.
    SourceDirectoryDeleted { path: PathBuf },
    /// The file was left alone.
    Skipped { path: PathBuf, reason: String },
    /// A file or unit could not be processed.
    Failed { path: PathBuf, message: String },
    /// Periodic count.
    Status {
        phase: &'static str,
        completed: usize,
        total: usize,
    },
}

impl ProcessingEvent {
    /// Legend character for the event, if it has one.
    pub fn symbol(&self) -> Option<char> {
        match self {
            Self::FileTransferred { .. } => Some('.'),
            Self::UnitTransferred { .. } => Some(':'),
            Self::StagedDuplicateIdentical { .. } => Some('+'),
            Self::UnitRenamed { .. } => Some('#'),
            Self::AlreadyProcessed { .. } => Some('*'),
            Self::SentToReview { .. } => Some('?'),
            Self::SourceFileDeleted { .. } => Some('-'),
            Self::SourceDirectoryDeleted { .. } => Some('='),
            Self::Skipped { .. } | Self::Failed { .. } | Self::Status { .. } => None,
        }
    }
}

/// Legend lines, one per symbol.
pub const LEGEND: [(char, &str); 8] = [
    ('.', "file transferred"),
    (':', "unit transferred"),
    ('+', "identical duplicate already staged"),
    ('#', "unit target existed, numbered directory used"),
    ('*', "already post-processed"),
    ('?', "sent to review"),
    ('-', "source file deleted"),
    ('=', "source unit deleted"),
];

/// Receives [`ProcessingEvent`]s as a run progresses.
pub trait ProcessingObserver {
    fn on_event(&self, event: &ProcessingEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ProcessingObserver for NullObserver {
    fn on_event(&self, _event: &ProcessingEvent) {}
}

/// Writes events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProcessingObserver for TracingObserver {
    fn on_event(&self, event: &ProcessingEvent) {
        match event {
            ProcessingEvent::Status {
                phase,
                completed,
                total,
            } => info!("{phase}: {completed} of {total} processed"),
            ProcessingEvent::Failed { path, message } => {
                warn!("failed {}: {message}", path.display())
            }
            other => debug!("{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_symbol_has_a_legend_line() {
        let events = [
            ProcessingEvent::FileTransferred {
                source: PathBuf::new(),
                destination: PathBuf::new(),
            },
            ProcessingEvent::UnitTransferred {
                unit: PathBuf::new(),
                destination: PathBuf::new(),
            },
            ProcessingEvent::SourceDirectoryDeleted {
                path: PathBuf::new(),
            },
        ];
        for event in &events {
            let symbol = event.symbol().unwrap();
            assert!(LEGEND.iter().any(|(c, _)| *c == symbol));
        }
    }

    #[test]
    fn test_status_has_no_symbol() {
        let event = ProcessingEvent::Status {
            phase: "pre-process",
            completed: 5000,
            total: 12000,
        };
        assert_eq!(event.symbol(), None);
    }
}
