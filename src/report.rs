use crate::error::Error;
use crate::model::{CleanupType, LibraryItem, LibraryType};
use std::time::Duration;

/// How one item fared in one stage of a pass.
#[derive(Debug)]
pub enum ItemOutcome {
    Done,
    Skipped(&'static str),
    Failed(Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Done => self.done += 1,
            ItemOutcome::Skipped(_) => self.skipped += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: Tally) {
        self.done += other.done;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    pub fn total(&self) -> usize {
        self.done + self.skipped + self.failed
    }
}

/// What a single pass did. Failed items never fail the pass itself.
#[derive(Debug, Clone)]
pub struct PassSummary {
    pub cleanup_type: CleanupType,
    pub library_type: LibraryType,
    /// Set when the pass stopped before touching anything.
    pub not_run_reason: Option<String>,
    pub kept: usize,
    pub preview: Tally,
    pub deletion: Tally,
    pub bytes_freed: u64,
    pub duration: Duration,
}

impl PassSummary {
    pub fn new(cleanup_type: CleanupType, library_type: LibraryType) -> Self {
        Self {
            cleanup_type,
            library_type,
            not_run_reason: None,
            kept: 0,
            preview: Tally::default(),
            deletion: Tally::default(),
            bytes_freed: 0,
            duration: Duration::ZERO,
        }
    }

    pub fn ran(&self) -> bool {
        self.not_run_reason.is_none()
    }
}

/// Progress and metrics sink for passes.
///
/// The CLI implements this with indicatif; all methods default to no-ops.
pub trait PassReporter {
    fn on_pass_start(&self, _cleanup_type: CleanupType, _library_type: LibraryType) {}
    fn on_partition(&self, _kept: usize, _preview: usize, _delete: usize) {}
    fn on_item_linked(&self, _item: &LibraryItem) {}
    fn on_item_deleted(&self, _item: &LibraryItem) {}
    fn on_deleted(&self, _library_type: LibraryType, _count: usize, _bytes: u64) {}
    fn on_pass_complete(&self, _summary: &PassSummary) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl PassReporter for SilentReporter {}
