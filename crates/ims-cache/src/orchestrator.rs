use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use ims_codec::DefaultImpuRecord;
use ims_store::{GetResult, Store};
use ims_types::CoreError;

use crate::engine::CasEngine;
use crate::irs::Irs;
use crate::keys::impu_key;

/// Fans an IRS read or write out across one local replica and zero-or-more
/// remote replicas. A write is reported successful iff the local
/// replica succeeded; remote failures are logged and non-fatal
/// (`PARTIAL_WRITE`) but never mask a local failure. Reads try local
/// first, then remotes in configured order, opportunistically replicating a
/// remote hit back into local.
pub struct Orchestrator {
    local: Arc<dyn Store>,
    remotes: Vec<Arc<dyn Store>>,
    cas_retries: u32,
}

impl Orchestrator {
    pub fn new(local: Arc<dyn Store>, remotes: Vec<Arc<dyn Store>>, cas_retries: u32) -> Self {
        Self {
            local,
            remotes,
            cas_retries,
        }
    }

    fn local_engine(&self) -> CasEngine {
        CasEngine::new(self.local.clone(), self.cas_retries)
    }

    /// Read an IRS by default IMPU, local-first then remotes.
    pub async fn get(&self, default_impu: &str) -> Result<Option<Irs>, CoreError> {
        let key = impu_key(default_impu);

        match self
            .local
            .get(&key)
            .await
            .map_err(|e| CoreError::LocalStoreError(e.to_string()))?
        {
            GetResult::Found { bytes, cas, .. } => {
                return Ok(decode_irs(default_impu, &bytes, cas));
            }
            GetResult::NotFound => {}
        }

        for remote in &self.remotes {
            let outcome = match remote.get(&key).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(error = %e, impu = %default_impu, "remote store read failed, trying next");
                    continue;
                }
            };
            if let GetResult::Found { bytes, .. } = outcome {
                if let Some(irs) = decode_irs(default_impu, &bytes, 0) {
                    // Opportunistic local replication; EXISTS or a transient
                    // failure are both fine to ignore here, best-effort only.
                    let _ = self
                        .local
                        .add(&key, bytes.clone(), Duration::from_secs(irs.ttl_seconds.max(0) as u64))
                        .await;
                    return Ok(Some(irs));
                }
            }
        }

        Ok(None)
    }

    /// Read an arbitrary key's raw bytes, local-first then remotes, with the
    /// same opportunistic-replication behavior as `get` — used for mapping
    /// and AV keys that don't decode to an `Irs`.
    pub async fn get_raw(&self, key: &str) -> Result<Option<Bytes>, CoreError> {
        match self
            .local
            .get(key)
            .await
            .map_err(|e| CoreError::LocalStoreError(e.to_string()))?
        {
            GetResult::Found { bytes, .. } => return Ok(Some(bytes)),
            GetResult::NotFound => {}
        }

        for remote in &self.remotes {
            let outcome = match remote.get(key).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "remote store read failed, trying next");
                    continue;
                }
            };
            if let GetResult::Found { bytes, ttl_remaining, .. } = outcome {
                let _ = self.local.add(key, bytes.clone(), ttl_remaining).await;
                return Ok(Some(bytes));
            }
        }

        Ok(None)
    }

    /// Unconditional write of an arbitrary key to local and every remote
    /// (the AV cache: auth vectors aren't CAS-protected, so
    /// last-writer-wins is acceptable here same as for mapping records).
    pub async fn set_raw(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CoreError> {
        self.local
            .set(key, value.clone(), ttl)
            .await
            .map_err(|e| CoreError::LocalStoreError(e.to_string()))?;
        for remote in &self.remotes {
            if let Err(e) = remote.set(key, value.clone(), ttl).await {
                tracing::warn!(error = %e, key = %key, "remote set failed, reporting partial write");
            }
        }
        Ok(())
    }

    /// Write an IRS to local and every remote independently. Local failure
    /// or local CONTENTION is surfaced; remote failures are logged and
    /// reported via the returned `partial` flag rather than failing the
    /// call (`PARTIAL_WRITE`).
    pub async fn put(&self, irs: &mut Irs) -> Result<PutOutcome, CoreError> {
        self.local_engine().put(irs).await.map_err(CoreError::from)?;

        let mut partial = false;
        for remote in &self.remotes {
            let mut remote_irs = irs.clone();
            remote_irs.cas = None; // each replica has its own CAS namespace
            let engine = CasEngine::new(remote.clone(), self.cas_retries);
            if let Err(e) = engine.put(&mut remote_irs).await {
                tracing::warn!(error = %e, impu = %irs.default_impu, "remote write failed, reporting partial write");
                partial = true;
            }
        }

        Ok(PutOutcome { partial })
    }

    /// Delete an IRS from local and every remote independently, same
    /// success/partial semantics as `put`.
    pub async fn delete(&self, irs: &Irs) -> Result<PutOutcome, CoreError> {
        self.local_engine().delete(irs).await.map_err(CoreError::from)?;

        let mut partial = false;
        for remote in &self.remotes {
            let engine = CasEngine::new(remote.clone(), self.cas_retries);
            if let Err(e) = engine.delete(irs).await {
                tracing::warn!(error = %e, impu = %irs.default_impu, "remote delete failed, reporting partial write");
                partial = true;
            }
        }

        Ok(PutOutcome { partial })
    }
}

/// Outcome of a fanned-out write: `partial` is set when local succeeded but
/// at least one remote failed. The caller (coordinator) still treats this as
/// success to its own caller (`PARTIAL_WRITE` semantics), but should
/// log it at a level the call site sees fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOutcome {
    pub partial: bool,
}

fn decode_irs(default_impu: &str, bytes: &Bytes, cas: ims_store::CasToken) -> Option<Irs> {
    match DefaultImpuRecord::decode(bytes) {
        Ok(record) => Some(Irs::from_record(default_impu, record, cas)),
        Err(_) => None, // DECODE_ERROR folds into NOT_FOUND for this key
    }
}
