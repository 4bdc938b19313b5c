use std::collections::BTreeMap;

use ims_codec::ImpiMappingRecord;
use ims_store::GetResult;
use ims_types::{ChargingAddresses, CoreError};

use crate::irs::Irs;
use crate::keys::mapping_key;
use crate::orchestrator::Orchestrator;

/// A view keyed by IMPI: every IRS the IMPI participates in, plus a shared
/// charging-address setter that propagates one address set to all of them.
pub struct ImsSubscription {
    pub impi: String,
    pub members: BTreeMap<String, Irs>,
    /// Mapping entries that pointed to an absent or non-matching IRS;
    /// scheduled for a best-effort rewrite rather than blocking the read.
    pub stale_mapping_entries: Vec<String>,
}

impl ImsSubscription {
    /// Read the IMPI->IMPU mapping, read every member IRS, and prune mapping
    /// entries that no longer point to an IRS listing this IMPI.
    pub async fn load(orchestrator: &Orchestrator, impi: &str) -> Result<Self, CoreError> {
        let raw_mapping_key = mapping_key(impi);
        let mapping = orchestrator
            .get_raw(&raw_mapping_key)
            .await?
            .and_then(|bytes| ImpiMappingRecord::decode(&bytes).ok())
            .unwrap_or(ImpiMappingRecord {
                default_impus: Vec::new(),
                expires_at: 0,
            });

        let mut members = BTreeMap::new();
        let mut stale = Vec::new();

        for default_impu in mapping.default_impus {
            match orchestrator.get(&default_impu).await? {
                Some(irs) if irs.associated_impis.current().iter().any(|i| i == impi) => {
                    members.insert(default_impu, irs);
                }
                _ => stale.push(default_impu),
            }
        }

        Ok(Self {
            impi: impi.to_string(),
            members,
            stale_mapping_entries: stale,
        })
    }

    /// Set the charging addresses on every member IRS and mark them changed;
    /// a subsequent `put_ims_subscription` writes each one through.
    pub fn set_charging_addrs(&mut self, addresses: ChargingAddresses) {
        for irs in self.members.values_mut() {
            irs.set_charging_addresses(addresses.clone());
        }
    }

    /// Write every changed member IRS through the orchestrator.
    pub async fn put(&mut self, orchestrator: &Orchestrator) -> Result<bool, CoreError> {
        let mut any_partial = false;
        for irs in self.members.values_mut() {
            if !irs.changed {
                continue;
            }
            let outcome = orchestrator.put(irs).await?;
            any_partial |= outcome.partial;
        }
        Ok(any_partial)
    }
}
