// Segment scheduler: admits segment jobs under the concurrency cap and
// forwards finished segments to the writer.

use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::byte_range::ByteRange;
use crate::config::EngineConfig;
use crate::error::DownloadError;
use crate::fetcher::{SegmentDownloader, SegmentJob};

/// A segment whose transfer reached a terminal state with data to write.
#[derive(Debug)]
pub struct CompletedSegment {
    pub index: usize,
    pub range: ByteRange,
    pub data: Bytes,
}

/// A segment whose transfer failed and will not be written.
#[derive(Debug)]
pub struct SegmentFailure {
    pub index: usize,
    pub error: DownloadError,
}

/// Pulls jobs from a bounded channel and runs at most
/// `download_concurrency` fetches at once. Admission is structural: a new
/// job is only taken from the channel while the in-flight set is below the
/// cap, so backpressure propagates to the job feeder through the channel
/// instead of blocking a thread on a counting primitive.
///
/// Completion order between segments is unconstrained; each result is
/// forwarded to the writer as it arrives.
pub struct SegmentScheduler {
    config: Arc<EngineConfig>,
    fetcher: Arc<dyn SegmentDownloader>,
    job_rx: mpsc::Receiver<SegmentJob>,
    output_tx: mpsc::Sender<Result<CompletedSegment, SegmentFailure>>,
}

impl SegmentScheduler {
    pub fn new(
        config: Arc<EngineConfig>,
        fetcher: Arc<dyn SegmentDownloader>,
        job_rx: mpsc::Receiver<SegmentJob>,
        output_tx: mpsc::Sender<Result<CompletedSegment, SegmentFailure>>,
    ) -> Self {
        Self {
            config,
            fetcher,
            job_rx,
            output_tx,
        }
    }

    async fn fetch_one(
        fetcher: Arc<dyn SegmentDownloader>,
        job: SegmentJob,
    ) -> (SegmentJob, Result<Bytes, crate::fetcher::SegmentFetchFailure>) {
        let result = fetcher.download_segment(&job).await;
        (job, result)
    }

    pub async fn run(&mut self) {
        debug!(
            concurrency = self.config.download_concurrency,
            "segment scheduler started"
        );
        let mut futures = FuturesUnordered::new();
        let mut accepting = true;

        loop {
            let in_flight = futures.len();

            tokio::select! {
                biased;

                // Admit new jobs only while below the concurrency cap.
                maybe_job = self.job_rx.recv(), if accepting && in_flight < self.config.download_concurrency => {
                    match maybe_job {
                        Some(job) => {
                            debug!(index = job.tracker.index(), range = %job.tracker.range(), "admitting segment job");
                            futures.push(Self::fetch_one(Arc::clone(&self.fetcher), job));
                        }
                        None => {
                            // Job channel closed; drain the in-flight set.
                            accepting = false;
                            if futures.is_empty() {
                                break;
                            }
                        }
                    }
                }

                Some((job, fetch_result)) = futures.next(), if in_flight > 0 => {
                    if !self.handle_fetch_result(job, fetch_result).await {
                        break;
                    }
                }

                // All channels closed and nothing in flight.
                else => {
                    break;
                }
            }
        }
        info!("segment scheduler finished");
    }

    /// Transitions the tracker and forwards the outcome to the writer.
    /// Returns false when the output channel is gone and the scheduler
    /// should stop.
    async fn handle_fetch_result(
        &self,
        job: SegmentJob,
        fetch_result: Result<Bytes, crate::fetcher::SegmentFetchFailure>,
    ) -> bool {
        let index = job.tracker.index();
        let range = job.tracker.range();

        let outcome = match fetch_result {
            Ok(data) => {
                job.tracker.mark_completed();
                Ok(CompletedSegment { index, range, data })
            }
            Err(failure) if self.config.complete_on_error => {
                // Legacy mode: the transfer is marked complete regardless
                // of the error and the partial buffer is written as-is.
                warn!(
                    index,
                    range = %range,
                    error = %failure.error,
                    received = failure.partial.len(),
                    "segment transfer failed; completing with partial data (legacy mode)"
                );
                job.tracker.mark_completed();
                Ok(CompletedSegment {
                    index,
                    range,
                    data: failure.partial,
                })
            }
            Err(failure) => {
                warn!(index, range = %range, error = %failure.error, "segment transfer failed");
                job.tracker.mark_failed();
                Err(SegmentFailure {
                    index,
                    error: failure.error,
                })
            }
        };

        if self.output_tx.send(outcome).await.is_err() {
            error!("output channel closed; shutting down scheduler");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_range::ByteRange;
    use crate::fetcher::SegmentFetchFailure;
    use crate::segment::{SegmentState, SegmentTracker};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use url::Url;

    /// Fetcher double that records the high-water mark of concurrent
    /// calls and serves deterministic bytes per range.
    struct RecordingFetcher {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fail_indices: Vec<usize>,
    }

    impl RecordingFetcher {
        fn new(fail_indices: Vec<usize>) -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                fail_indices,
            }
        }

        fn max_observed(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SegmentDownloader for RecordingFetcher {
        async fn download_segment(&self, job: &SegmentJob) -> Result<Bytes, SegmentFetchFailure> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            job.tracker.mark_downloading();
            tokio::time::sleep(Duration::from_millis(10)).await;
            let range = job.tracker.range();
            job.tracker.record_received(range.length);

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_indices.contains(&job.tracker.index()) {
                Err(SegmentFetchFailure {
                    error: DownloadError::SegmentFetchError("simulated failure".to_string()),
                    partial: Bytes::from_static(b"partial"),
                })
            } else {
                Ok(Bytes::from(vec![job.tracker.index() as u8; range.length as usize]))
            }
        }
    }

    fn media_url() -> Url {
        Url::parse("http://example.com/hls_a256K.ts").unwrap()
    }

    fn make_jobs(count: usize, length: u64) -> Vec<SegmentJob> {
        (0..count)
            .map(|i| SegmentJob {
                media_url: media_url(),
                tracker: Arc::new(SegmentTracker::new(
                    i,
                    ByteRange::new(i as u64 * length, length),
                )),
            })
            .collect()
    }

    async fn run_scheduler(
        config: EngineConfig,
        fetcher: Arc<RecordingFetcher>,
        jobs: Vec<SegmentJob>,
    ) -> Vec<Result<CompletedSegment, SegmentFailure>> {
        let config = Arc::new(config);
        let (job_tx, job_rx) = mpsc::channel(config.download_concurrency + 2);
        let (output_tx, mut output_rx) = mpsc::channel(config.download_concurrency * 2);

        let mut scheduler =
            SegmentScheduler::new(Arc::clone(&config), fetcher, job_rx, output_tx);
        let handle = tokio::spawn(async move { scheduler.run().await });

        let collector = tokio::spawn(async move {
            let mut outcomes = Vec::new();
            while let Some(outcome) = output_rx.recv().await {
                outcomes.push(outcome);
            }
            outcomes
        });

        for job in jobs {
            job_tx.send(job).await.unwrap();
        }
        drop(job_tx);

        handle.await.unwrap();
        collector.await.unwrap()
    }

    #[tokio::test]
    async fn test_concurrency_bound_respected() {
        let fetcher = Arc::new(RecordingFetcher::new(vec![]));
        let jobs = make_jobs(8, 100);
        let trackers: Vec<_> = jobs.iter().map(|j| Arc::clone(&j.tracker)).collect();
        let config = EngineConfig::builder().with_download_concurrency(2).build();

        let outcomes = run_scheduler(config, Arc::clone(&fetcher), jobs).await;

        assert_eq!(outcomes.len(), 8);
        assert!(fetcher.max_observed() <= 2, "observed {}", fetcher.max_observed());
        for tracker in trackers {
            assert_eq!(tracker.state(), SegmentState::Completed);
            assert_eq!(tracker.progress(), 1.0);
        }
    }

    #[tokio::test]
    async fn test_all_segments_forwarded_with_data() {
        let fetcher = Arc::new(RecordingFetcher::new(vec![]));
        let jobs = make_jobs(3, 50);
        let config = EngineConfig::builder().with_download_concurrency(2).build();

        let outcomes = run_scheduler(config, fetcher, jobs).await;

        let mut completed: Vec<CompletedSegment> =
            outcomes.into_iter().map(|o| o.unwrap()).collect();
        completed.sort_by_key(|s| s.index);
        for (i, segment) in completed.iter().enumerate() {
            assert_eq!(segment.index, i);
            assert_eq!(segment.data.len(), 50);
            assert!(segment.data.iter().all(|&b| b == i as u8));
        }
    }

    #[tokio::test]
    async fn test_failed_segment_marked_failed_and_not_completed() {
        let fetcher = Arc::new(RecordingFetcher::new(vec![1]));
        let jobs = make_jobs(3, 50);
        let trackers: Vec<_> = jobs.iter().map(|j| Arc::clone(&j.tracker)).collect();
        let config = EngineConfig::builder().with_download_concurrency(2).build();

        let outcomes = run_scheduler(config, fetcher, jobs).await;

        let failures: Vec<&SegmentFailure> =
            outcomes.iter().filter_map(|o| o.as_ref().err()).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(trackers[1].state(), SegmentState::Failed);
        assert_eq!(trackers[0].state(), SegmentState::Completed);
        assert_eq!(trackers[2].state(), SegmentState::Completed);
    }

    #[tokio::test]
    async fn test_legacy_mode_completes_failed_segment_with_partial() {
        let fetcher = Arc::new(RecordingFetcher::new(vec![0]));
        let jobs = make_jobs(1, 50);
        let tracker = Arc::clone(&jobs[0].tracker);
        let config = EngineConfig::builder()
            .with_download_concurrency(2)
            .with_complete_on_error(true)
            .build();

        let outcomes = run_scheduler(config, fetcher, jobs).await;

        assert_eq!(outcomes.len(), 1);
        let segment = outcomes.into_iter().next().unwrap().unwrap();
        assert_eq!(&segment.data[..], b"partial");
        assert_eq!(tracker.state(), SegmentState::Completed);
        assert_eq!(tracker.progress(), 1.0);
    }
}
