//! # restitch-engine
//!
//! A download-and-reassembly engine for HLS playlists that address a
//! single underlying media file through byte-range directives.
//!
//! The engine fetches the playlist, parses its `BYTERANGE:` directives
//! into ordered byte ranges, downloads the ranges concurrently under a
//! bounded concurrency cap, and writes each completed segment at its byte
//! offset into one contiguous output file. Overall completion is exposed
//! as a pull-based ratio for an external observer to poll.
//!
//! ## Features
//!
//! - Playlist parsing with parse-time range validation
//! - Structural admission control (no blocking semaphore waits)
//! - Per-segment lifecycle and monotonic progress tracking
//! - Serialized positional writes into a lazily created output file
//! - Distinct failure state per segment, with an opt-in legacy mode that
//!   reproduces the always-completes behavior of the original client

pub mod builder;
pub mod byte_range;
pub mod client;
pub mod config;
pub mod downloader;
pub mod error;
pub mod fetcher;
pub mod playlist;
pub mod progress;
pub mod scheduler;
pub mod segment;
pub mod writer;

pub use builder::EngineConfigBuilder;
pub use byte_range::ByteRange;
pub use client::create_client;
pub use config::EngineConfig;
pub use downloader::{DownloadSummary, RangeDownloader};
pub use error::DownloadError;
pub use fetcher::{HttpSegmentFetcher, SegmentDownloader, SegmentJob};
pub use playlist::{HttpPlaylistSource, PlaylistParseError, PlaylistSource, parse_byte_ranges};
pub use progress::ProgressHandle;
pub use segment::{SegmentState, SegmentTracker};
pub use writer::WriteSummary;
