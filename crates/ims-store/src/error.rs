use thiserror::Error;

/// Outcome of a store primitive. `CasMismatch`/`NotFound`/`Exists` are
/// ordinary, expected results the engine branches on — they are not failures
/// in the Rust-error sense, which is why `Store::cas`/`add`/`delete` return
/// them as part of an `Ok` variant (see `store.rs`) rather than as `Err`.
/// `StoreError` is reserved for the cases a caller cannot recover from
/// locally: a network-level failure or a deadline expiring.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transient store error: {0}")]
    Transient(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl StoreError {
    /// Whether the per-replica retry budget in the CAS engine should spend a
    /// retry on this error (all current variants are retryable; the type
    /// exists to keep the call sites self-documenting and to leave room for
    /// a future non-retryable variant without a breaking signature change).
    pub fn is_retryable(&self) -> bool {
        true
    }
}
