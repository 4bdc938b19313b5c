use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::StoreError;

/// Opaque CAS token attached to a key by the store. Two reads of the same
/// key after different writes must yield different tokens; beyond that the
/// engine treats it as opaque (the in-memory store uses a per-key counter,
/// a real memcached/Redis client would use the wire CAS value).
pub type CasToken = u64;

/// Result of a `get`.
#[derive(Debug, Clone)]
pub enum GetResult {
    Found {
        bytes: Bytes,
        cas: CasToken,
        ttl_remaining: Duration,
    },
    NotFound,
}

impl GetResult {
    pub fn is_found(&self) -> bool {
        matches!(self, GetResult::Found { .. })
    }
}

/// Result of an `add` (expects the key to be absent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddResult {
    Ok,
    Exists,
}

/// Result of a `cas` (conditional write keyed by a previously-read token).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasResult {
    Ok,
    CasMismatch,
    NotFound,
}

/// Result of a `delete` (conditional on a previously-read token).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteResult {
    Ok,
    CasMismatch,
    NotFound,
}

/// One replica's primitive operations on opaque byte blobs keyed by string.
///
/// All operations are fallible with `StoreError` only for transport-level
/// failure (network error, deadline); application-level outcomes (the key
/// already existed, the CAS token was stale, the key was absent) are ordinary
/// `Ok` variants the per-store CAS engine branches on.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<GetResult, StoreError>;

    async fn add(&self, key: &str, value: Bytes, ttl: Duration) -> Result<AddResult, StoreError>;

    async fn cas(
        &self,
        key: &str,
        value: Bytes,
        cas: CasToken,
        ttl: Duration,
    ) -> Result<CasResult, StoreError>;

    async fn delete(&self, key: &str, cas: CasToken) -> Result<DeleteResult, StoreError>;

    /// Unconditional write. Used only for mapping records where
    /// last-writer-wins is acceptable (see `ims_cache::engine`).
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError>;
}
