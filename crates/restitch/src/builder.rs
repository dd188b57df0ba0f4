//! # Builder for EngineConfig
//!
//! Fluent API for creating and customizing [`EngineConfig`] instances.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use restitch_engine::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .with_download_concurrency(4)
//!     .with_segment_download_timeout(Duration::from_secs(20))
//!     .with_output_path("movie.mpeg")
//!     .with_header("X-Api-Key", "my-secret-key")
//!     .build();
//! ```

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::config::EngineConfig;

/// Builder for creating EngineConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    /// Internal config being built
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Set the timeout for the playlist fetch
    pub fn with_playlist_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.playlist_fetch_timeout = timeout;
        self
    }

    /// Set the timeout for individual segment downloads
    pub fn with_segment_download_timeout(mut self, timeout: Duration) -> Self {
        self.config.segment_download_timeout = timeout;
        self
    }

    /// Set the connection timeout (time to establish initial connection)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the maximum number of concurrent segment downloads.
    /// A value of zero is clamped to one.
    pub fn with_download_concurrency(mut self, concurrency: usize) -> Self {
        self.config.download_concurrency = concurrency.max(1);
        self
    }

    /// Set the media file name resolved against the playlist directory
    pub fn with_media_filename(mut self, filename: impl Into<String>) -> Self {
        self.config.media_filename = filename.into();
        self
    }

    /// Set the path of the reassembled output file
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    /// Enable the legacy mode that marks failed transfers completed and
    /// writes their partial bytes
    pub fn with_complete_on_error(mut self, enabled: bool) -> Self {
        self.config.complete_on_error = enabled;
        self
    }

    /// Set whether to follow redirects
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<reqwest::header::HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.headers.insert(name, value);
        }
        self
    }

    /// Set all HTTP headers, replacing any existing headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.config.headers = headers;
        self
    }

    /// Build the EngineConfig instance
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_MEDIA_FILENAME, DEFAULT_OUTPUT_FILENAME};

    #[test]
    fn test_builder_defaults() {
        let config = EngineConfigBuilder::new().build();
        assert_eq!(config.download_concurrency, 2);
        assert_eq!(config.media_filename, DEFAULT_MEDIA_FILENAME);
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT_FILENAME));
        assert_eq!(config.playlist_fetch_timeout, Duration::from_secs(15));
        assert!(!config.complete_on_error);
        assert!(config.follow_redirects);
    }

    #[test]
    fn test_builder_customization() {
        let config = EngineConfigBuilder::new()
            .with_download_concurrency(4)
            .with_segment_download_timeout(Duration::from_secs(20))
            .with_media_filename("audio.ts")
            .with_output_path("/tmp/audio.mpeg")
            .with_complete_on_error(true)
            .with_user_agent("CustomUserAgent/1.0")
            .with_header("X-Custom-Header", "CustomValue")
            .build();

        assert_eq!(config.download_concurrency, 4);
        assert_eq!(config.segment_download_timeout, Duration::from_secs(20));
        assert_eq!(config.media_filename, "audio.ts");
        assert_eq!(config.output_path, PathBuf::from("/tmp/audio.mpeg"));
        assert!(config.complete_on_error);
        assert_eq!(config.user_agent, "CustomUserAgent/1.0");

        // Verify custom header
        let header_value = config.headers.get("X-Custom-Header").unwrap();
        assert_eq!(header_value.to_str().unwrap(), "CustomValue");
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        let config = EngineConfigBuilder::new().with_download_concurrency(0).build();
        assert_eq!(config.download_concurrency, 1);
    }
}
