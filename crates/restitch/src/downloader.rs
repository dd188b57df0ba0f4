// Download orchestrator: wires playlist parsing, the bounded scheduler
// and the positional writer into one run.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use url::Url;

use crate::client::create_client;
use crate::config::EngineConfig;
use crate::error::DownloadError;
use crate::fetcher::{HttpSegmentFetcher, SegmentDownloader, SegmentJob};
use crate::playlist::{self, HttpPlaylistSource, PlaylistSource};
use crate::progress::ProgressHandle;
use crate::scheduler::SegmentScheduler;
use crate::segment::SegmentTracker;
use crate::writer::{self, OutputWriter};

/// Final accounting for one download attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Segments declared by the playlist.
    pub segments: usize,
    /// Segments whose bytes landed in the output file.
    pub segments_written: usize,
    pub bytes_written: u64,
    /// Segments that failed to download or write.
    pub failed_segments: usize,
}

impl DownloadSummary {
    /// Whether the output file may be handed to a playback consumer.
    pub fn is_complete(&self) -> bool {
        self.segments > 0
            && self.failed_segments == 0
            && self.segments_written == self.segments
    }
}

/// Downloads a byte-range-addressed HLS asset into a single contiguous
/// local file.
///
/// The playlist is fetched once and parsed into ordered byte ranges; one
/// segment job per range is fed to the scheduler, which keeps at most
/// `download_concurrency` ranged requests in flight. Finished segments are
/// handed to the writer task, which performs all positional writes.
/// Overall progress is observable at any time through [`ProgressHandle`].
pub struct RangeDownloader {
    config: Arc<EngineConfig>,
    playlist_source: Arc<dyn PlaylistSource>,
    fetcher: Arc<dyn SegmentDownloader>,
    progress: ProgressHandle,
}

impl RangeDownloader {
    /// Creates a downloader backed by HTTP sources.
    pub fn new(config: EngineConfig) -> Result<Self, DownloadError> {
        let config = Arc::new(config);
        let http_client = create_client(&config)?;
        let playlist_source = Arc::new(HttpPlaylistSource::new(
            http_client.clone(),
            Arc::clone(&config),
        ));
        let fetcher = Arc::new(HttpSegmentFetcher::new(http_client, Arc::clone(&config)));
        Ok(Self::assemble(config, playlist_source, fetcher))
    }

    /// Creates a downloader with injected playlist and segment sources.
    pub fn with_sources(
        config: EngineConfig,
        playlist_source: Arc<dyn PlaylistSource>,
        fetcher: Arc<dyn SegmentDownloader>,
    ) -> Self {
        Self::assemble(Arc::new(config), playlist_source, fetcher)
    }

    fn assemble(
        config: Arc<EngineConfig>,
        playlist_source: Arc<dyn PlaylistSource>,
        fetcher: Arc<dyn SegmentDownloader>,
    ) -> Self {
        Self {
            config,
            playlist_source,
            fetcher,
            progress: ProgressHandle::default(),
        }
    }

    /// Handle for polling overall completion, cheap to clone.
    pub fn progress(&self) -> ProgressHandle {
        self.progress.clone()
    }

    pub fn output_path(&self) -> &Path {
        &self.config.output_path
    }

    /// Runs one full download attempt.
    ///
    /// Playlist-level problems (fetch, parse, URL derivation) are fatal
    /// and returned as `Err`. Segment-level failures do not abort the
    /// run; they are reflected in the summary and in the progress
    /// handle's failure flag.
    pub async fn start(&self, playlist_url: &str) -> Result<DownloadSummary, DownloadError> {
        let playlist_url = Url::parse(playlist_url).map_err(|e| DownloadError::InvalidUrl {
            url: playlist_url.to_string(),
            reason: e.to_string(),
        })?;

        let body = self.playlist_source.load_playlist(&playlist_url).await?;
        let ranges = playlist::parse_byte_ranges(&body)?;
        if ranges.is_empty() {
            warn!(url = %playlist_url, "playlist declares no byte ranges; nothing to download");
            return Ok(DownloadSummary {
                segments: 0,
                segments_written: 0,
                bytes_written: 0,
                failed_segments: 0,
            });
        }

        let media_url = playlist::derive_media_url(&playlist_url, &self.config.media_filename)?;
        info!(
            playlist = %playlist_url,
            media = %media_url,
            segments = ranges.len(),
            concurrency = self.config.download_concurrency,
            "starting ranged download"
        );

        let trackers: Vec<Arc<SegmentTracker>> = ranges
            .iter()
            .enumerate()
            .map(|(index, range)| Arc::new(SegmentTracker::new(index, *range)))
            .collect();
        self.progress.install(trackers.clone());

        let (job_tx, job_rx) = mpsc::channel(self.config.download_concurrency + 2);
        let (output_tx, output_rx) = mpsc::channel(self.config.download_concurrency * 2);

        let mut scheduler = SegmentScheduler::new(
            Arc::clone(&self.config),
            Arc::clone(&self.fetcher),
            job_rx,
            output_tx,
        );
        let scheduler_handle = tokio::spawn(async move { scheduler.run().await });

        let output_writer = OutputWriter::new(
            self.config.output_path.clone(),
            output_rx,
            self.progress.clone(),
        );
        let writer_handle = tokio::spawn(output_writer.run());

        for tracker in trackers {
            let job = SegmentJob {
                media_url: media_url.clone(),
                tracker,
            };
            if job_tx.send(job).await.is_err() {
                // Scheduler gone; the writer result below reports why.
                break;
            }
        }
        drop(job_tx);

        scheduler_handle
            .await
            .map_err(|e| DownloadError::InternalError(format!("scheduler task panicked: {e}")))?;
        let write_summary = writer_handle
            .await
            .map_err(|e| DownloadError::InternalError(format!("writer task panicked: {e}")))??;

        let summary = DownloadSummary {
            segments: ranges.len(),
            segments_written: write_summary.segments_written,
            bytes_written: write_summary.bytes_written,
            failed_segments: write_summary.failed_segments,
        };
        info!(
            segments = summary.segments,
            written = summary.segments_written,
            failed = summary.failed_segments,
            bytes = summary.bytes_written,
            complete = summary.is_complete(),
            "download attempt finished"
        );
        Ok(summary)
    }

    /// Deletes the output artifact; a fresh `start` afterwards rebuilds
    /// it from scratch. Idempotent when the file does not exist.
    pub async fn clear_local_data(&self) -> Result<(), DownloadError> {
        writer::remove_output(&self.config.output_path).await
    }
}
