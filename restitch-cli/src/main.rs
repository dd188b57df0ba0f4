use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use restitch_engine::{EngineConfig, ProgressHandle, RangeDownloader};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod error;

use cli::CliArgs;
use error::AppError;

/// Polling period of the external progress observer.
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Download failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    let mut builder = EngineConfig::builder()
        .with_download_concurrency(args.concurrency)
        .with_playlist_fetch_timeout(Duration::from_secs(args.timeout))
        .with_segment_download_timeout(Duration::from_secs(args.segment_timeout))
        .with_complete_on_error(args.legacy_complete_on_error);
    if let Some(output) = &args.output {
        builder = builder.with_output_path(output);
    }
    if let Some(media_file) = &args.media_file {
        builder = builder.with_media_filename(media_file);
    }
    let config = builder.build();

    let downloader = RangeDownloader::new(config)?;

    if args.clean {
        downloader.clear_local_data().await?;
        info!("local data cleared");
        return Ok(());
    }
    if args.fresh {
        downloader.clear_local_data().await?;
    }

    info!(
        url = %args.playlist_url,
        output = %downloader.output_path().display(),
        concurrency = args.concurrency,
        "starting download"
    );

    let bar_task = args
        .show_progress
        .then(|| spawn_progress_bar(downloader.progress()));

    let summary = downloader.start(&args.playlist_url).await;

    if let Some((done, handle)) = bar_task {
        done.store(true, Ordering::Release);
        let _ = handle.await;
    }

    let summary = summary?;
    if summary.segments == 0 {
        return Err(AppError::Initialization(
            "playlist declared no byte ranges".to_string(),
        ));
    }
    if !summary.is_complete() {
        return Err(AppError::Degraded {
            failed: summary.failed_segments,
            total: summary.segments,
        });
    }

    info!(
        bytes = summary.bytes_written,
        segments = summary.segments,
        "download complete"
    );
    Ok(())
}

/// Renders overall completion by polling the pull accessor every 100 ms,
/// the same cadence the original player UI used.
fn spawn_progress_bar(
    progress: ProgressHandle,
) -> (Arc<AtomicBool>, tokio::task::JoinHandle<()>) {
    let done = Arc::new(AtomicBool::new(false));
    let done_flag = Arc::clone(&done);

    let handle = tokio::spawn(async move {
        let bar = ProgressBar::new(1000);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {percent:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        loop {
            let ratio = progress.overall_progress();
            bar.set_position((ratio * 1000.0) as u64);
            bar.set_message(format!(
                "{}/{} segments",
                progress.count_in_state(restitch_engine::SegmentState::Completed),
                progress.segment_count()
            ));
            if done_flag.load(Ordering::Acquire) {
                break;
            }
            tokio::time::sleep(PROGRESS_POLL_INTERVAL).await;
        }
        bar.finish_and_clear();
    });

    (done, handle)
}
