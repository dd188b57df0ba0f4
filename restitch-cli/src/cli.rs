use clap::Parser;
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser)]
#[command(
    version,
    about = "Ranged-segment HLS download tool",
    long_about = "Downloads a media asset described by an HLS playlist that addresses a\n\
                  single underlying media file through byte-range directives, and\n\
                  reassembles the ranges into one contiguous local file."
)]
pub struct CliArgs {
    /// Playlist URL to download
    #[arg(required = true, help = "URL of the byte-range playlist (.m3u8)")]
    pub playlist_url: String,

    /// Output file path
    #[arg(
        short,
        long,
        help = "Path of the reassembled output file (default: ./output.mpeg)"
    )]
    pub output: Option<PathBuf>,

    /// Number of concurrent segment downloads
    #[arg(
        short,
        long,
        default_value = "2",
        help = "Maximum number of concurrent segment downloads"
    )]
    pub concurrency: usize,

    /// Media file name resolved against the playlist directory
    #[arg(
        long,
        help = "File name of the byte-range-addressed media file next to the playlist (default: hls_a256K.ts)"
    )]
    pub media_file: Option<String>,

    /// Playlist fetch timeout in seconds
    #[arg(
        long,
        default_value = "15",
        help = "Timeout in seconds for the playlist fetch"
    )]
    pub timeout: u64,

    /// Segment download timeout in seconds
    #[arg(
        long,
        default_value = "30",
        help = "Timeout in seconds for individual segment downloads"
    )]
    pub segment_timeout: u64,

    /// Delete any existing output file before downloading
    #[arg(long, help = "Delete any existing output file before downloading")]
    pub fresh: bool,

    /// Only delete the output file, then exit
    #[arg(
        long,
        conflicts_with = "fresh",
        help = "Delete the output file and exit without downloading"
    )]
    pub clean: bool,

    /// Show a progress bar
    #[arg(
        short = 'P',
        long = "progress",
        help = "Show a progress bar polling overall completion"
    )]
    pub show_progress: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,

    /// Reproduce the legacy always-completes behavior on segment errors
    #[arg(
        long,
        help = "Mark failed segment transfers as completed and write their partial data (legacy compatibility)"
    )]
    pub legacy_complete_on_error: bool,
}
