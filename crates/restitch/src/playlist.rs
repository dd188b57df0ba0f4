// Playlist handling: fetching the playlist body and extracting the ordered
// byte ranges that describe the single underlying media file.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::byte_range::ByteRange;
use crate::config::EngineConfig;
use crate::error::DownloadError;

/// Directive carrying a `<length>@<offset>` value. Matches both the bare
/// tag and the standard `#EXT-X-BYTERANGE:` form.
static BYTERANGE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"BYTERANGE:([^\r\n]*)").expect("valid byte-range pattern"));

/// A malformed or inconsistent playlist is fatal to the whole download
/// attempt; there is no per-segment skip at parse time.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PlaylistParseError {
    #[error("byte-range directive {value:?}: expected exactly one '@' separator")]
    MalformedDirective { value: String },
    #[error("byte-range directive {value:?}: token {token:?} is not a valid integer")]
    InvalidInteger { value: String, token: String },
    #[error("byte-range directive {value:?}: length must be positive")]
    ZeroLength { value: String },
    #[error("byte range at offset {offset} overlaps or precedes previous range ending at {previous_end}")]
    RangeOverlap { offset: u64, previous_end: u64 },
}

/// Extracts the ordered byte ranges from a playlist body.
///
/// One range per directive occurrence, in order of appearance. Ranges must
/// be strictly forward-moving: each offset has to be at or past the end of
/// the previous range, otherwise positional reassembly would clobber bytes.
pub fn parse_byte_ranges(body: &str) -> Result<Vec<ByteRange>, PlaylistParseError> {
    let mut ranges = Vec::new();
    let mut previous_end: u64 = 0;

    for captures in BYTERANGE_DIRECTIVE.captures_iter(body) {
        let value = captures[1].trim();
        let range = parse_directive_value(value)?;

        if !ranges.is_empty() && range.offset < previous_end {
            return Err(PlaylistParseError::RangeOverlap {
                offset: range.offset,
                previous_end,
            });
        }
        previous_end = range.end();
        ranges.push(range);
    }

    debug!(count = ranges.len(), "parsed byte ranges from playlist");
    Ok(ranges)
}

/// Parses a single `<length>@<offset>` directive value.
fn parse_directive_value(value: &str) -> Result<ByteRange, PlaylistParseError> {
    let Some((length_token, offset_token)) = value.split_once('@') else {
        return Err(PlaylistParseError::MalformedDirective {
            value: value.to_string(),
        });
    };
    if offset_token.contains('@') {
        return Err(PlaylistParseError::MalformedDirective {
            value: value.to_string(),
        });
    }

    let length = parse_integer(value, length_token)?;
    let offset = parse_integer(value, offset_token)?;

    if length == 0 {
        return Err(PlaylistParseError::ZeroLength {
            value: value.to_string(),
        });
    }

    Ok(ByteRange::new(offset, length))
}

fn parse_integer(value: &str, token: &str) -> Result<u64, PlaylistParseError> {
    token
        .trim()
        .parse::<u64>()
        .map_err(|_| PlaylistParseError::InvalidInteger {
            value: value.to_string(),
            token: token.to_string(),
        })
}

/// Derives the media file URL from the playlist URL: the playlist's
/// directory plus a fixed file name.
pub fn derive_media_url(playlist_url: &Url, media_filename: &str) -> Result<Url, DownloadError> {
    playlist_url
        .join(media_filename)
        .map_err(|e| DownloadError::InvalidUrl {
            url: playlist_url.to_string(),
            reason: format!("cannot derive media URL with file name {media_filename:?}: {e}"),
        })
}

/// Source of playlist bodies. The HTTP implementation is the production
/// path; tests substitute an in-memory source.
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    async fn load_playlist(&self, url: &Url) -> Result<String, DownloadError>;
}

pub struct HttpPlaylistSource {
    http_client: Client,
    config: Arc<EngineConfig>,
}

impl HttpPlaylistSource {
    pub fn new(http_client: Client, config: Arc<EngineConfig>) -> Self {
        Self {
            http_client,
            config,
        }
    }
}

#[async_trait]
impl PlaylistSource for HttpPlaylistSource {
    async fn load_playlist(&self, url: &Url) -> Result<String, DownloadError> {
        let response = self
            .http_client
            .get(url.clone())
            .timeout(self.config.playlist_fetch_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DownloadError::PlaylistError(format!(
                "Failed to fetch playlist {url}: HTTP {}",
                response.status()
            )));
        }

        // The body is treated as UTF-8 text.
        response.text().await.map_err(DownloadError::from)
    }
}
