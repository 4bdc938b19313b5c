use std::sync::Arc;

use bytes::Bytes;

use ims_codec::{
    AssociatedImpuRecord, DefaultImpuRecord, ImpiMappingRecord, FORMAT_ASSOCIATED_IMPU,
    FORMAT_DEFAULT_IMPU,
};
use ims_store::{AddResult, CasResult, DeleteResult, GetResult, Store};
use ims_types::RegistrationState;

use crate::error::EngineError;
use crate::irs::Irs;
use crate::keys::{impu_key, mapping_key};
use crate::time::{ttl_duration, expires_at};

/// Registration-state merge rule: the more-registered state wins,
/// since an observation of registration is strictly newer evidence than a
/// no-registration snapshot and a racing write must never regress it.
pub fn merge_registration_state(a: RegistrationState, b: RegistrationState) -> RegistrationState {
    a.max(b)
}

/// Applies one IRS write or delete intent against a single replica,
/// implementing the per-store CAS engine: bounded CAS retry,
/// associated-IMPU collision handling, and additive IMPI-mapping updates.
pub struct CasEngine {
    store: Arc<dyn Store>,
    max_retries: u32,
}

impl CasEngine {
    pub fn new(store: Arc<dyn Store>, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    /// Put protocol: write the default-IMPU record (with CAS retry and
    /// conflict merge), then the associated-IMPU records, then the IMPI
    /// mappings.
    pub async fn put(&self, irs: &mut Irs) -> Result<(), EngineError> {
        self.put_default(irs).await?;
        self.write_associated_impus(irs).await?;
        self.write_impi_mappings(irs).await?;
        Ok(())
    }

    /// Delete protocol: supporting records first, then the default
    /// record, all CAS-guarded with mismatches/not-found ignored — another
    /// writer already moved the key, which is fine. Idempotent by
    /// construction: a repeated delete finds nothing left to remove.
    pub async fn delete(&self, irs: &Irs) -> Result<(), EngineError> {
        for impu in irs.associated_impus.current() {
            self.delete_associated_impu(&impu).await?;
        }
        for impi in irs.associated_impis.current() {
            self.remove_default_from_mapping(&impi, &irs.default_impu, irs.ttl_seconds)
                .await?;
        }

        let key = impu_key(&irs.default_impu);
        let cas = match irs.cas {
            Some(cas) => Some(cas),
            None => match self.store.get(&key).await? {
                GetResult::Found { cas, .. } => Some(cas),
                GetResult::NotFound => None,
            },
        };
        if let Some(cas) = cas {
            // Ignore CAS_MISMATCH/NOT_FOUND: another writer already changed
            // or removed it, which is the outcome we wanted anyway.
            let _ = self.store.delete(&key, cas).await?;
        }
        Ok(())
    }

    async fn put_default(&self, irs: &mut Irs) -> Result<(), EngineError> {
        for _attempt in 0..=self.max_retries {
            let record = irs.to_default_record();
            let bytes = Bytes::from(record.encode());
            let ttl = ttl_duration(irs.ttl_seconds);

            let outcome = match irs.cas {
                Some(cas) => self.store.cas(&key_of(irs), bytes, cas, ttl).await?,
                None => match self.store.add(&key_of(irs), bytes, ttl).await? {
                    AddResult::Ok => CasResult::Ok,
                    AddResult::Exists => CasResult::CasMismatch,
                },
            };

            match outcome {
                CasResult::Ok => return Ok(()),
                CasResult::CasMismatch => {
                    match self.store.get(&key_of(irs)).await? {
                        GetResult::Found { bytes, .. } if is_associated_impu_blob(&bytes) => {
                            // Someone else's associated-IMPU claim already sits at this
                            // default-IMPU's key. Overwriting it here would silently detach
                            // that claim from its owner, so this write doesn't get to win:
                            // leave `cas` unset (forcing an `add` next attempt, which keeps
                            // losing to the same claim) until the retry budget is exhausted.
                            tracing::warn!(
                                default_impu = %irs.default_impu,
                                "default-IMPU write collided with an existing associated-IMPU claim, refusing to overwrite it"
                            );
                            irs.cas = None;
                        }
                        GetResult::Found { bytes, cas, .. } if is_default_impu_blob(&bytes) => {
                            if let Ok(store_record) = DefaultImpuRecord::decode(&bytes) {
                                merge_default(irs, store_record);
                            }
                            irs.cas = Some(cas);
                        }
                        // Unrecognized/corrupt blob: DECODE_ERROR folds to NOT_FOUND for
                        // this key, so this write is free to claim it on the next attempt.
                        GetResult::Found { cas, .. } => irs.cas = Some(cas),
                        GetResult::NotFound => irs.cas = None,
                    }
                }
                CasResult::NotFound => {
                    if irs.deregistering {
                        return Ok(());
                    }
                    irs.cas = None;
                }
            }
        }
        Err(EngineError::Contention)
    }

    async fn write_associated_impus(&self, irs: &mut Irs) -> Result<(), EngineError> {
        let mut collided = Vec::new();

        for impu in irs.associated_impus.added() {
            let key = impu_key(&impu);
            let record = AssociatedImpuRecord {
                default_impu: irs.default_impu.clone(),
                expires_at: expires_at(irs.ttl_seconds),
            };
            let bytes = Bytes::from(record.encode());
            let ttl = ttl_duration(irs.ttl_seconds);

            match self.store.add(&key, bytes, ttl).await? {
                AddResult::Ok => {}
                AddResult::Exists => match self.store.get(&key).await? {
                    GetResult::Found { bytes, .. } => {
                        let already_ours = AssociatedImpuRecord::decode(&bytes)
                            .map(|existing| existing.default_impu == irs.default_impu)
                            .unwrap_or(false);
                        if !already_ours {
                            tracing::warn!(
                                impu = %impu,
                                default_impu = %irs.default_impu,
                                "associated IMPU collision, dropping claim"
                            );
                            collided.push(impu.clone());
                        }
                    }
                    GetResult::NotFound => {}
                },
            }
        }

        if !collided.is_empty() {
            for impu in &collided {
                irs.associated_impus.ban(impu);
            }
            self.put_default(irs).await?;
        }

        for impu in irs.associated_impus.deleted() {
            self.delete_associated_impu(&impu).await?;
        }

        Ok(())
    }

    async fn delete_associated_impu(&self, impu: &str) -> Result<(), EngineError> {
        let key = impu_key(impu);
        if let GetResult::Found { cas, .. } = self.store.get(&key).await? {
            let _ = self.store.delete(&key, cas).await?;
        }
        Ok(())
    }

    async fn write_impi_mappings(&self, irs: &mut Irs) -> Result<(), EngineError> {
        for impi in irs.associated_impis.added() {
            self.add_default_to_mapping(&impi, &irs.default_impu, irs.ttl_seconds)
                .await?;
        }
        for impi in irs.associated_impis.deleted() {
            self.remove_default_from_mapping(&impi, &irs.default_impu, irs.ttl_seconds)
                .await?;
        }
        Ok(())
    }

    async fn add_default_to_mapping(
        &self,
        impi: &str,
        default_impu: &str,
        ttl_seconds: i64,
    ) -> Result<(), EngineError> {
        let key = mapping_key(impi);
        for _attempt in 0..=self.max_retries {
            match self.store.get(&key).await? {
                GetResult::NotFound => {
                    let record = ImpiMappingRecord {
                        default_impus: vec![default_impu.to_string()],
                        expires_at: expires_at(ttl_seconds),
                    };
                    match self
                        .store
                        .add(&key, Bytes::from(record.encode()), ttl_duration(ttl_seconds))
                        .await?
                    {
                        AddResult::Ok => return Ok(()),
                        AddResult::Exists => continue,
                    }
                }
                GetResult::Found { bytes, cas, .. } => {
                    let mut existing = ImpiMappingRecord::decode(&bytes).unwrap_or(ImpiMappingRecord {
                        default_impus: Vec::new(),
                        expires_at: 0,
                    });
                    if !existing.default_impus.iter().any(|d| d == default_impu) {
                        existing.default_impus.push(default_impu.to_string());
                    }
                    existing.expires_at = existing.expires_at.max(expires_at(ttl_seconds));
                    match self
                        .store
                        .cas(&key, Bytes::from(existing.encode()), cas, ttl_duration(ttl_seconds))
                        .await?
                    {
                        CasResult::Ok => return Ok(()),
                        CasResult::CasMismatch | CasResult::NotFound => continue,
                    }
                }
            }
        }
        tracing::warn!(impi = %impi, default_impu = %default_impu, "mapping add retries exhausted, leaving to later convergence");
        Ok(())
    }

    async fn remove_default_from_mapping(
        &self,
        impi: &str,
        default_impu: &str,
        ttl_seconds: i64,
    ) -> Result<(), EngineError> {
        let key = mapping_key(impi);
        for _attempt in 0..=self.max_retries {
            match self.store.get(&key).await? {
                GetResult::NotFound => return Ok(()),
                GetResult::Found { bytes, cas, .. } => {
                    let mut existing = match ImpiMappingRecord::decode(&bytes) {
                        Ok(record) => record,
                        Err(_) => return Ok(()),
                    };
                    existing.default_impus.retain(|d| d != default_impu);
                    if existing.default_impus.is_empty() {
                        match self.store.delete(&key, cas).await? {
                            DeleteResult::Ok | DeleteResult::NotFound => return Ok(()),
                            DeleteResult::CasMismatch => continue,
                        }
                    } else {
                        match self
                            .store
                            .cas(&key, Bytes::from(existing.encode()), cas, ttl_duration(ttl_seconds))
                            .await?
                        {
                            CasResult::Ok => return Ok(()),
                            CasResult::CasMismatch | CasResult::NotFound => continue,
                        }
                    }
                }
            }
        }
        tracing::warn!(impi = %impi, default_impu = %default_impu, "mapping removal retries exhausted, leaving to later convergence");
        Ok(())
    }
}

fn key_of(irs: &Irs) -> String {
    impu_key(&irs.default_impu)
}

/// Merge a re-read store value into the in-memory IRS on a default-IMPU CAS
/// conflict.
fn merge_default(irs: &mut Irs, store: DefaultImpuRecord) {
    if !irs.xml_dirty {
        irs.ims_sub_xml = store.ims_sub_xml;
    }

    if irs.deregistering {
        // Deliberate deregistration: local wins over a racing registration.
    } else {
        irs.registration_state = merge_registration_state(irs.registration_state, store.registration_state);
    }

    if store.charging_addresses.refreshed_at > irs.charging_addresses.refreshed_at {
        irs.charging_addresses = store.charging_addresses.clone();
    }

    irs.associated_impus.merge_union(&store.associated_impus);
    irs.associated_impis.merge_union(&store.impis);

    irs.ttl_seconds = irs.ttl_seconds.max(crate::time::seconds_until(store.expires_at));
}

/// Whether a blob at a shared `impu:` key decodes as a default record (as
/// opposed to an associated record) — used when a `get` is needed to
/// disambiguate an `ADD -> EXISTS` outcome against that namespace.
pub fn is_default_impu_blob(bytes: &[u8]) -> bool {
    ims_codec::peek_format_id(bytes) == Some(FORMAT_DEFAULT_IMPU)
}

pub fn is_associated_impu_blob(bytes: &[u8]) -> bool {
    ims_codec::peek_format_id(bytes) == Some(FORMAT_ASSOCIATED_IMPU)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ims_store::memory::InMemoryStore;
    use ims_types::ChargingAddresses;

    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips_a_fresh_irs() {
        let store = Arc::new(InMemoryStore::new());
        let eng = CasEngine::new(store.clone(), 3);

        let mut irs = Irs::fresh("sip:a@x");
        irs.set_reg_state(RegistrationState::Registered);
        irs.set_associated_impis(&["_u@x".to_string()]);
        eng.put(&mut irs).await.unwrap();

        let found = store.get(&impu_key("sip:a@x")).await.unwrap();
        assert!(found.is_found());
    }

    #[tokio::test]
    async fn put_writes_default_and_mapping_records() {
        let store = Arc::new(InMemoryStore::new());
        let eng = CasEngine::new(store.clone(), 3);

        let mut irs = Irs::fresh("sip:a@x");
        irs.set_reg_state(RegistrationState::Registered);
        irs.set_associated_impis(&["_u@x".to_string()]);
        eng.put(&mut irs).await.unwrap();

        let default = store.get(&impu_key("sip:a@x")).await.unwrap();
        assert!(default.is_found());

        let mapping = store.get(&mapping_key("_u@x")).await.unwrap();
        match mapping {
            GetResult::Found { bytes, .. } => {
                let record = ImpiMappingRecord::decode(&bytes).unwrap();
                assert_eq!(record.default_impus, vec!["sip:a@x".to_string()]);
            }
            GetResult::NotFound => panic!("expected mapping record"),
        }
    }

    #[tokio::test]
    async fn concurrent_impi_additions_converge_to_the_union() {
        let store = Arc::new(InMemoryStore::new());
        let eng = CasEngine::new(store.clone(), 3);

        let mut irs = Irs::fresh("sip:a@x");
        irs.set_reg_state(RegistrationState::Registered);
        irs.set_associated_impis(&["_u@x".to_string()]);
        eng.put(&mut irs).await.unwrap();

        // Two racing writers load the same stored IRS and each add a
        // distinct IMPI.
        let loaded = || async {
            match store.get(&impu_key("sip:a@x")).await.unwrap() {
                GetResult::Found { bytes, cas, .. } => {
                    Irs::from_record("sip:a@x", DefaultImpuRecord::decode(&bytes).unwrap(), cas)
                }
                GetResult::NotFound => panic!("expected the record just written"),
            }
        };

        let mut writer_a = loaded().await;
        writer_a.set_associated_impis(&["_u@x".to_string(), "_v@x".to_string()]);
        let mut writer_b = loaded().await;
        writer_b.set_associated_impis(&["_u@x".to_string(), "_w@x".to_string()]);

        eng.put(&mut writer_a).await.unwrap();
        eng.put(&mut writer_b).await.unwrap();

        let final_record = match store.get(&impu_key("sip:a@x")).await.unwrap() {
            GetResult::Found { bytes, .. } => DefaultImpuRecord::decode(&bytes).unwrap(),
            GetResult::NotFound => panic!("expected the record to still exist"),
        };
        let mut impis = final_record.impis;
        impis.sort();
        assert_eq!(
            impis,
            vec!["_u@x".to_string(), "_v@x".to_string(), "_w@x".to_string()]
        );
    }

    #[tokio::test]
    async fn impu_collision_drops_the_claim_without_touching_the_owner() {
        let store = Arc::new(InMemoryStore::new());
        let eng = CasEngine::new(store.clone(), 3);

        let mut owner = Irs::fresh("sip:a@x");
        owner.set_reg_state(RegistrationState::Registered);
        eng.put(&mut owner).await.unwrap();

        let mut claimant = Irs::fresh("sip:b@x");
        claimant.set_reg_state(RegistrationState::Registered);
        claimant.set_associated_impus(&["sip:a@x".to_string()]);
        eng.put(&mut claimant).await.unwrap();

        assert!(claimant.associated_impus.current().is_empty());

        let owner_record = match store.get(&impu_key("sip:a@x")).await.unwrap() {
            GetResult::Found { bytes, .. } => DefaultImpuRecord::decode(&bytes).unwrap(),
            GetResult::NotFound => panic!("owner record should still exist"),
        };
        assert_eq!(owner_record.registration_state, RegistrationState::Registered);
    }

    #[tokio::test]
    async fn default_write_colliding_with_an_existing_associated_claim_does_not_overwrite_it() {
        let store = Arc::new(InMemoryStore::new());
        let eng = CasEngine::new(store.clone(), 3);

        // "sip:a@x" is already claimed as an associated IMPU of "sip:owner@x".
        let claim = AssociatedImpuRecord {
            default_impu: "sip:owner@x".to_string(),
            expires_at: expires_at(3600),
        };
        store
            .add(&impu_key("sip:a@x"), Bytes::from(claim.encode()), ttl_duration(3600))
            .await
            .unwrap();

        let mut fresh = Irs::fresh("sip:a@x");
        fresh.set_reg_state(RegistrationState::Registered);

        let result = eng.put(&mut fresh).await;
        assert!(matches!(result, Err(EngineError::Contention)));

        let still_there = match store.get(&impu_key("sip:a@x")).await.unwrap() {
            GetResult::Found { bytes, .. } => AssociatedImpuRecord::decode(&bytes).unwrap(),
            GetResult::NotFound => panic!("the associated claim should not have been removed"),
        };
        assert_eq!(still_there.default_impu, "sip:owner@x");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let eng = CasEngine::new(store.clone(), 3);

        let mut irs = Irs::fresh("sip:a@x");
        irs.set_reg_state(RegistrationState::Registered);
        irs.set_associated_impis(&["_u@x".to_string()]);
        eng.put(&mut irs).await.unwrap();

        eng.delete(&irs).await.unwrap();
        eng.delete(&irs).await.unwrap();

        assert!(!store.get(&impu_key("sip:a@x")).await.unwrap().is_found());
        assert!(!store.get(&mapping_key("_u@x")).await.unwrap().is_found());
    }

    #[tokio::test]
    async fn no_regression_concurrent_registered_and_not_registered_converge_registered() {
        let store = Arc::new(InMemoryStore::new());
        let eng = CasEngine::new(store.clone(), 3);

        let mut base = Irs::fresh("sip:a@x");
        base.set_reg_state(RegistrationState::NotRegistered);
        eng.put(&mut base).await.unwrap();

        let load = || async {
            match store.get(&impu_key("sip:a@x")).await.unwrap() {
                GetResult::Found { bytes, cas, .. } => {
                    Irs::from_record("sip:a@x", DefaultImpuRecord::decode(&bytes).unwrap(), cas)
                }
                GetResult::NotFound => panic!("expected a record"),
            }
        };

        let mut registering = load().await;
        registering.set_reg_state(RegistrationState::Registered);
        let mut observing = load().await;
        observing.set_reg_state(RegistrationState::NotRegistered);

        eng.put(&mut registering).await.unwrap();
        eng.put(&mut observing).await.unwrap();

        let final_record = match store.get(&impu_key("sip:a@x")).await.unwrap() {
            GetResult::Found { bytes, .. } => DefaultImpuRecord::decode(&bytes).unwrap(),
            GetResult::NotFound => panic!("expected a record"),
        };
        assert_eq!(final_record.registration_state, RegistrationState::Registered);
    }

    #[tokio::test]
    async fn charging_addresses_merge_keeps_the_most_recently_refreshed() {
        let store = Arc::new(InMemoryStore::new());
        let eng = CasEngine::new(store.clone(), 3);

        let mut irs = Irs::fresh("sip:a@x");
        irs.set_charging_addresses(ChargingAddresses::new(vec!["old-ccf".into()], vec![], 100));
        eng.put(&mut irs).await.unwrap();

        let mut stale_writer = match store.get(&impu_key("sip:a@x")).await.unwrap() {
            GetResult::Found { bytes, cas, .. } => {
                Irs::from_record("sip:a@x", DefaultImpuRecord::decode(&bytes).unwrap(), cas)
            }
            GetResult::NotFound => panic!("expected a record"),
        };
        // Force a CAS mismatch by bumping the store's token underneath us.
        let mut fresher = match store.get(&impu_key("sip:a@x")).await.unwrap() {
            GetResult::Found { bytes, cas, .. } => {
                Irs::from_record("sip:a@x", DefaultImpuRecord::decode(&bytes).unwrap(), cas)
            }
            GetResult::NotFound => panic!("expected a record"),
        };
        fresher.set_charging_addresses(ChargingAddresses::new(vec!["new-ccf".into()], vec![], 200));
        eng.put(&mut fresher).await.unwrap();

        // stale_writer still thinks the old charging addresses are current
        // and has a stale CAS token; it must merge in the newer ones.
        eng.put(&mut stale_writer).await.unwrap();

        let final_record = match store.get(&impu_key("sip:a@x")).await.unwrap() {
            GetResult::Found { bytes, .. } => DefaultImpuRecord::decode(&bytes).unwrap(),
            GetResult::NotFound => panic!("expected a record"),
        };
        assert_eq!(final_record.charging_addresses.ccf, vec!["new-ccf".to_string()]);
    }
}
