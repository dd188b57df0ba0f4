// Segment fetcher: one ranged HTTP request per segment, streaming body
// chunks into the segment's buffer while progress is updated.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::EngineConfig;
use crate::error::DownloadError;
use crate::segment::SegmentTracker;

/// One unit of work for the scheduler: the shared media URL plus the
/// tracker owning the byte range.
#[derive(Debug, Clone)]
pub struct SegmentJob {
    pub media_url: Url,
    pub tracker: Arc<SegmentTracker>,
}

/// A failed transfer, carrying whatever bytes arrived before the error.
/// The partial buffer is what the legacy completion mode writes out.
#[derive(Debug)]
pub struct SegmentFetchFailure {
    pub error: DownloadError,
    pub partial: Bytes,
}

#[async_trait]
pub trait SegmentDownloader: Send + Sync {
    async fn download_segment(&self, job: &SegmentJob) -> Result<Bytes, SegmentFetchFailure>;
}

pub struct HttpSegmentFetcher {
    http_client: Client,
    config: Arc<EngineConfig>,
}

impl HttpSegmentFetcher {
    pub fn new(http_client: Client, config: Arc<EngineConfig>) -> Self {
        Self {
            http_client,
            config,
        }
    }
}

#[async_trait]
impl SegmentDownloader for HttpSegmentFetcher {
    /// Issues `GET <media_url>` with `Range: bytes=<offset>-<offset+length>`
    /// and accumulates the body. The tracker moves to downloading once the
    /// response headers are accepted and its ratio is updated per chunk.
    /// There is no retry; a failed transfer is reported once, with the
    /// partial buffer attached.
    async fn download_segment(&self, job: &SegmentJob) -> Result<Bytes, SegmentFetchFailure> {
        let range = job.tracker.range();

        let response = match self
            .http_client
            .get(job.media_url.clone())
            .header(reqwest::header::RANGE, range.header_value())
            .timeout(self.config.segment_download_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Err(SegmentFetchFailure {
                    error: DownloadError::from(e),
                    partial: Bytes::new(),
                });
            }
        };

        if !response.status().is_success() {
            return Err(SegmentFetchFailure {
                error: DownloadError::SegmentFetchError(format!(
                    "HTTP {} for range {} of {}",
                    response.status(),
                    range,
                    job.media_url
                )),
                partial: Bytes::new(),
            });
        }

        job.tracker.mark_downloading();

        let mut buffer = BytesMut::with_capacity(range.length as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => {
                    buffer.extend_from_slice(&chunk);
                    job.tracker.record_received(buffer.len() as u64);
                }
                Err(e) => {
                    return Err(SegmentFetchFailure {
                        error: DownloadError::from(e),
                        partial: buffer.freeze(),
                    });
                }
            }
        }

        debug!(
            range = %range,
            received = buffer.len(),
            "segment transfer finished"
        );
        Ok(buffer.freeze())
    }
}
