use std::sync::Arc;

use crate::playlist::PlaylistParseError;

#[derive(Debug, thiserror::Error, Clone)]
pub enum DownloadError {
    #[error("Playlist error: {0}")]
    PlaylistError(String),
    #[error("Playlist parse error: {0}")]
    PlaylistParseError(#[from] PlaylistParseError),
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Segment fetch error: {0}")]
    SegmentFetchError(String),
    #[error("Network error: {source}")]
    NetworkError {
        #[from]
        source: Arc<reqwest::Error>,
    },
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: Arc<std::io::Error>,
    },
    #[error("Internal error: {0}")]
    InternalError(String),
}

// Manual implementation of From<reqwest::Error> for DownloadError
// because of the Arc wrapping.
impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        DownloadError::NetworkError {
            source: Arc::new(err),
        }
    }
}

// Manual implementation of From<std::io::Error> for DownloadError
impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        DownloadError::IoError {
            source: Arc::new(err),
        }
    }
}
