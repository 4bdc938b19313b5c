use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    RequestFailed(String),

    #[error("notification endpoint returned status {0}")]
    BadStatus(u16),
}
