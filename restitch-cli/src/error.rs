use restitch_engine::DownloadError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("Download degraded: {failed} of {total} segments failed; output is not playable")]
    Degraded { failed: usize, total: usize },
}
