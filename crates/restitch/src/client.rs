use reqwest::Client;

use crate::config::EngineConfig;
use crate::error::DownloadError;

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &EngineConfig) -> Result<Client, DownloadError> {
    let client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .connect_timeout(config.connect_timeout)
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    client_builder.build().map_err(DownloadError::from)
}
