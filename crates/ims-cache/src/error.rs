use thiserror::Error;

use ims_store::StoreError;
use ims_types::CoreError;

/// Internal outcome of a per-store CAS engine operation, before the
/// orchestrator folds it into the public [`CoreError`] taxonomy.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("CAS retries exhausted")]
    Contention,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<EngineError> for CoreError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Contention => CoreError::Contention,
            EngineError::Store(e) => CoreError::LocalStoreError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn contention_maps_to_the_public_contention_error() {
        let core: CoreError = EngineError::Contention.into();
        assert!(matches!(core, CoreError::Contention));
    }

    #[test]
    fn store_error_maps_to_local_store_error() {
        let core: CoreError = EngineError::Store(StoreError::Timeout(Duration::from_millis(200))).into();
        assert!(matches!(core, CoreError::LocalStoreError(_)));
    }
}
