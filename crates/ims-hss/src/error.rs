use thiserror::Error;

#[derive(Debug, Error)]
pub enum HssError {
    #[error("HSS unreachable: {0}")]
    Unreachable(String),

    #[error("HSS rejected the request: {0}")]
    Rejected(String),

    #[error("subscriber unknown to the HSS")]
    UnknownSubscriber,
}
