use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Fixed file name of the byte-range-addressed media file next to the
/// playlist.
pub const DEFAULT_MEDIA_FILENAME: &str = "hls_a256K.ts";

/// Default name of the reassembled output artifact.
pub const DEFAULT_OUTPUT_FILENAME: &str = "output.mpeg";

/// Number of segment requests allowed in flight at once.
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 2;

/// Configurable options for the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Timeout for the single playlist fetch
    pub playlist_fetch_timeout: Duration,

    /// Timeout for each segment request, headers to last byte
    pub segment_download_timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Maximum number of concurrent segment downloads
    pub download_concurrency: usize,

    /// File name of the media file, resolved against the playlist URL's
    /// directory
    pub media_filename: String,

    /// Path of the reassembled output file
    pub output_path: PathBuf,

    /// Legacy completion mode: a failed segment transfer is marked
    /// completed and whatever bytes arrived are written as if valid,
    /// reproducing the behavior of the original client. Off by default;
    /// the failure is then recorded and the segment is not written.
    pub complete_on_error: bool,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            playlist_fetch_timeout: Duration::from_secs(15),
            segment_download_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            media_filename: DEFAULT_MEDIA_FILENAME.to_owned(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILENAME),
            complete_on_error: false,
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: EngineConfig::get_default_headers(),
        }
    }
}

impl EngineConfig {
    pub fn builder() -> crate::builder::EngineConfigBuilder {
        crate::builder::EngineConfigBuilder::new()
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate"),
        );

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );

        default_headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));

        default_headers
    }
}
