// Aggregate download progress, exposed as a pull accessor for an external
// observer that polls periodically.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::segment::{SegmentState, SegmentTracker};

/// Cloneable handle over all segment trackers of a download.
///
/// The overall ratio is the arithmetic mean of the per-segment ratios,
/// recomputed on every call; segment counts are small, so there is no
/// caching. Before the playlist has been parsed there are no segments and
/// the overall progress is `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ProgressHandle {
    inner: Arc<ProgressInner>,
}

#[derive(Debug, Default)]
struct ProgressInner {
    segments: RwLock<Vec<Arc<SegmentTracker>>>,
    had_failures: AtomicBool,
}

impl ProgressHandle {
    /// Installs the trackers for a fresh download attempt.
    pub(crate) fn install(&self, trackers: Vec<Arc<SegmentTracker>>) {
        self.inner.had_failures.store(false, Ordering::Release);
        *self.inner.segments.write() = trackers;
    }

    pub(crate) fn record_failure(&self) {
        self.inner.had_failures.store(true, Ordering::Release);
    }

    /// Mean of all segment completion ratios, in `[0.0, 1.0]`.
    pub fn overall_progress(&self) -> f64 {
        let segments = self.inner.segments.read();
        if segments.is_empty() {
            return 0.0;
        }
        let sum: f64 = segments.iter().map(|s| s.progress()).sum();
        sum / segments.len() as f64
    }

    pub fn segment_count(&self) -> usize {
        self.inner.segments.read().len()
    }

    pub fn count_in_state(&self, state: SegmentState) -> usize {
        self.inner
            .segments
            .read()
            .iter()
            .filter(|s| s.state() == state)
            .count()
    }

    /// Whether any segment failed to download or write. A file produced by
    /// a run with failures must not be treated as playable.
    pub fn had_failures(&self) -> bool {
        self.inner.had_failures.load(Ordering::Acquire)
    }

    /// True once every segment completed and nothing failed.
    pub fn is_complete(&self) -> bool {
        let segments = self.inner.segments.read();
        !segments.is_empty()
            && !self.had_failures()
            && segments.iter().all(|s| s.state() == SegmentState::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_range::ByteRange;

    fn trackers(lengths: &[u64]) -> Vec<Arc<SegmentTracker>> {
        let mut offset = 0;
        lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                let t = Arc::new(SegmentTracker::new(i, ByteRange::new(offset, len)));
                offset += len;
                t
            })
            .collect()
    }

    #[test]
    fn test_no_segments_is_zero() {
        let handle = ProgressHandle::default();
        assert_eq!(handle.overall_progress(), 0.0);
        assert!(!handle.is_complete());
    }

    #[test]
    fn test_overall_is_mean_of_segments() {
        let handle = ProgressHandle::default();
        let trackers = trackers(&[100, 100]);
        handle.install(trackers.clone());

        trackers[0].record_received(100);
        assert_eq!(handle.overall_progress(), 0.5);
        trackers[1].record_received(50);
        assert_eq!(handle.overall_progress(), 0.75);
    }

    #[test]
    fn test_aggregate_monotonic_under_forward_updates() {
        let handle = ProgressHandle::default();
        let trackers = trackers(&[100, 100, 100]);
        handle.install(trackers.clone());

        let mut last = 0.0;
        for received in [10u64, 40, 70, 100] {
            for t in &trackers {
                t.record_received(received);
            }
            let current = handle.overall_progress();
            assert!(current >= last);
            last = current;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn test_complete_requires_all_segments_and_no_failures() {
        let handle = ProgressHandle::default();
        let trackers = trackers(&[100, 100]);
        handle.install(trackers.clone());

        trackers[0].mark_completed();
        assert!(!handle.is_complete());
        trackers[1].mark_completed();
        assert!(handle.is_complete());

        handle.record_failure();
        assert!(!handle.is_complete());
        assert!(handle.had_failures());
    }

    #[test]
    fn test_install_resets_failure_flag() {
        let handle = ProgressHandle::default();
        handle.record_failure();
        handle.install(trackers(&[100]));
        assert!(!handle.had_failures());
    }
}
