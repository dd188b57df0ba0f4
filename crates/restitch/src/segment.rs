// Per-segment download lifecycle: state machine and monotonic progress.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::byte_range::ByteRange;

/// Download lifecycle of one segment. Transitions only move forward:
/// `Pending -> Downloading -> Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl SegmentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SegmentState::Completed | SegmentState::Failed)
    }
}

/// Tracks one byte range's download: state and completion ratio. One
/// tracker per range, never reused; the in-flight request future owns a
/// reference, so callbacks are correlated structurally instead of by
/// scanning a shared list for a matching request handle.
///
/// Progress is stored as `f64` bits in an atomic and only ever increased,
/// so concurrent readers (the progress poller) see a monotone value.
#[derive(Debug)]
pub struct SegmentTracker {
    index: usize,
    range: ByteRange,
    state: Mutex<SegmentState>,
    progress_bits: AtomicU64,
}

impl SegmentTracker {
    pub fn new(index: usize, range: ByteRange) -> Self {
        Self {
            index,
            range,
            state: Mutex::new(SegmentState::Pending),
            progress_bits: AtomicU64::new(0.0_f64.to_bits()),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn range(&self) -> ByteRange {
        self.range
    }

    pub fn state(&self) -> SegmentState {
        *self.state.lock()
    }

    /// Completion ratio in `[0.0, 1.0]`.
    pub fn progress(&self) -> f64 {
        f64::from_bits(self.progress_bits.load(Ordering::Acquire))
    }

    /// Marks the segment as downloading once its request was accepted.
    pub fn mark_downloading(&self) {
        let mut state = self.state.lock();
        if *state == SegmentState::Pending {
            *state = SegmentState::Downloading;
            trace!(index = self.index, range = %self.range, "segment downloading");
        }
    }

    /// Records the total number of bytes received so far and recomputes
    /// the completion ratio against the range length.
    pub fn record_received(&self, received: u64) {
        let ratio = (received as f64 / self.range.length as f64).min(1.0);
        self.advance_progress(ratio);
    }

    /// Terminal success: progress is forced to 1.0.
    pub fn mark_completed(&self) {
        let mut state = self.state.lock();
        if state.is_terminal() {
            return;
        }
        *state = SegmentState::Completed;
        self.advance_progress(1.0);
        trace!(index = self.index, range = %self.range, "segment completed");
    }

    /// Terminal failure: the state is recorded but progress is left where
    /// the transfer stopped, so the aggregate reflects the missing bytes.
    pub fn mark_failed(&self) {
        let mut state = self.state.lock();
        if state.is_terminal() {
            return;
        }
        *state = SegmentState::Failed;
        trace!(index = self.index, range = %self.range, "segment failed");
    }

    // Monotonic: concurrent updates keep the maximum ratio seen so far.
    // Valid because non-negative f64 bit patterns order like the floats.
    fn advance_progress(&self, ratio: f64) {
        self.progress_bits
            .fetch_max(ratio.to_bits(), Ordering::AcqRel);
    }
}
