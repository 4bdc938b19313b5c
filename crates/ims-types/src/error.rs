use thiserror::Error;

/// Error kinds surfaced by the cache core to its callers.
///
/// `DecodeError` (an unknown codec format id/version, or malformed payload
/// bytes) is deliberately absent here: the codec and engine layers treat it
/// as `NotFound` for that key before it ever reaches a caller.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("subscriber not found")]
    NotFound,

    #[error("CAS retries exhausted")]
    Contention,

    #[error("HSS unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("local store error: {0}")]
    LocalStoreError(String),
}

impl CoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_recognized() {
        assert!(CoreError::NotFound.is_not_found());
        assert!(!CoreError::Contention.is_not_found());
    }

    #[test]
    fn upstream_unavailable_carries_its_reason() {
        let err = CoreError::UpstreamUnavailable("no route to HSS".into());
        assert!(err.to_string().contains("no route to HSS"));
    }
}
