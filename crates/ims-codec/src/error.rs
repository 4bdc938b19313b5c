use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("blob too short to contain a format envelope")]
    Truncated,

    #[error("unknown format id {0} (version {1})")]
    UnknownFormat(u8, u8),

    #[error("malformed payload: {0}")]
    Malformed(String),
}
