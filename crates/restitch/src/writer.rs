// Output writer: a single task owns the output file and performs all
// positional writes, so seek/write pairs from different segments can
// never interleave on the shared file cursor.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::DownloadError;
use crate::progress::ProgressHandle;
use crate::scheduler::{CompletedSegment, SegmentFailure};

/// What the writer observed over one download run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteSummary {
    pub segments_written: usize,
    pub bytes_written: u64,
    pub failed_segments: usize,
}

/// Consumes terminal segments from the scheduler. Completed segments are
/// written at their byte offset; failures are recorded and skipped.
/// Completions may arrive in any order relative to their offsets.
pub struct OutputWriter {
    path: PathBuf,
    input_rx: mpsc::Receiver<Result<CompletedSegment, SegmentFailure>>,
    progress: ProgressHandle,
}

impl OutputWriter {
    pub fn new(
        path: PathBuf,
        input_rx: mpsc::Receiver<Result<CompletedSegment, SegmentFailure>>,
        progress: ProgressHandle,
    ) -> Self {
        Self {
            path,
            input_rx,
            progress,
        }
    }

    /// Runs until the scheduler closes the channel. Fails fast only when
    /// the output file cannot be opened; a write error on one segment
    /// degrades the download instead of aborting it.
    pub async fn run(mut self) -> Result<WriteSummary, DownloadError> {
        let mut file: Option<File> = None;
        let mut summary = WriteSummary::default();

        while let Some(outcome) = self.input_rx.recv().await {
            match outcome {
                Ok(segment) => {
                    if file.is_none() {
                        file = Some(open_output(&self.path).await?);
                    }
                    let file = file.as_mut().expect("output file opened above");
                    match write_segment(file, &segment).await {
                        Ok(()) => {
                            summary.segments_written += 1;
                            summary.bytes_written += segment.data.len() as u64;
                        }
                        Err(e) => {
                            warn!(
                                index = segment.index,
                                offset = segment.range.offset,
                                error = %e,
                                "failed to write segment"
                            );
                            summary.failed_segments += 1;
                            self.progress.record_failure();
                        }
                    }
                    // Segment buffer is dropped here, after its only write.
                }
                Err(failure) => {
                    debug!(index = failure.index, error = %failure.error, "segment not written");
                    summary.failed_segments += 1;
                    self.progress.record_failure();
                }
            }
        }

        if let Some(mut file) = file {
            file.flush().await?;
        }
        info!(
            segments = summary.segments_written,
            bytes = summary.bytes_written,
            failed = summary.failed_segments,
            path = %self.path.display(),
            "output writer finished"
        );
        Ok(summary)
    }
}

/// Opens the output file for random-access update, creating it when
/// absent. The file is never truncated, so earlier writes survive.
async fn open_output(path: &Path) -> Result<File, DownloadError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await
        .map_err(DownloadError::from)
}

async fn write_segment(file: &mut File, segment: &CompletedSegment) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(segment.range.offset)).await?;
    file.write_all(&segment.data).await?;
    Ok(())
}

/// Deletes the output artifact. A missing file is not an error.
pub async fn remove_output(path: &Path) -> Result<(), DownloadError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!(path = %path.display(), "removed output file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DownloadError::from(e)),
    }
}
