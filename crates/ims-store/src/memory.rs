use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::{AddResult, CasResult, CasToken, DeleteResult, GetResult, Store};

struct Entry {
    value: Bytes,
    cas: CasToken,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.map(|e| Instant::now() > e).unwrap_or(false)
    }
}

/// In-memory reference implementation of [`Store`], standing in for a
/// memcached/Redis-backed replica in tests and single-process runs. CAS
/// tokens are a process-wide monotonic counter, so two writes anywhere in
/// the store never race to the same token.
pub struct InMemoryStore {
    data: Arc<RwLock<HashMap<String, Entry>>>,
    next_cas: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            next_cas: AtomicU64::new(1),
        }
    }

    fn fresh_cas(&self) -> CasToken {
        self.next_cas.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, key: &str) -> Result<GetResult, StoreError> {
        let data = self.data.read().await;
        match data.get(key) {
            Some(entry) if !entry.is_expired() => Ok(GetResult::Found {
                bytes: entry.value.clone(),
                cas: entry.cas,
                ttl_remaining: entry
                    .expires_at
                    .map(|e| e.saturating_duration_since(Instant::now()))
                    .unwrap_or(Duration::MAX),
            }),
            _ => Ok(GetResult::NotFound),
        }
    }

    async fn add(&self, key: &str, value: Bytes, ttl: Duration) -> Result<AddResult, StoreError> {
        let mut data = self.data.write().await;
        if let Some(entry) = data.get(key) {
            if !entry.is_expired() {
                return Ok(AddResult::Exists);
            }
        }
        let cas = self.fresh_cas();
        data.insert(
            key.to_string(),
            Entry {
                value,
                cas,
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(AddResult::Ok)
    }

    async fn cas(
        &self,
        key: &str,
        value: Bytes,
        cas: CasToken,
        ttl: Duration,
    ) -> Result<CasResult, StoreError> {
        let mut data = self.data.write().await;
        match data.get(key) {
            None => Ok(CasResult::NotFound),
            Some(entry) if entry.is_expired() => {
                data.remove(key);
                Ok(CasResult::NotFound)
            }
            Some(entry) if entry.cas != cas => Ok(CasResult::CasMismatch),
            Some(_) => {
                let new_cas = self.fresh_cas();
                data.insert(
                    key.to_string(),
                    Entry {
                        value,
                        cas: new_cas,
                        expires_at: Some(Instant::now() + ttl),
                    },
                );
                Ok(CasResult::Ok)
            }
        }
    }

    async fn delete(&self, key: &str, cas: CasToken) -> Result<DeleteResult, StoreError> {
        let mut data = self.data.write().await;
        match data.get(key) {
            None => Ok(DeleteResult::NotFound),
            Some(entry) if entry.is_expired() => {
                data.remove(key);
                Ok(DeleteResult::NotFound)
            }
            Some(entry) if entry.cas != cas => Ok(DeleteResult::CasMismatch),
            Some(_) => {
                data.remove(key);
                Ok(DeleteResult::Ok)
            }
        }
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        let cas = self.fresh_cas();
        data.insert(
            key.to_string(),
            Entry {
                value,
                cas,
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }
}
