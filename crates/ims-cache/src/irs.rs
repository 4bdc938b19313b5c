use ims_codec::DefaultImpuRecord;
use ims_store::CasToken;
use ims_types::{ChargingAddresses, RegistrationState};

use crate::time::expires_at;
use crate::tracked::TrackedSet;

/// The in-memory, request-local representation of an Implicit Registration
/// Set. Holds the default-IMPU's fields, the associated-IMPU/IMPI
/// membership as tracked maps, an origin CAS snapshot, and the dirty/lifecycle
/// flags the CAS engine reads to decide which sub-records need writing.
///
/// An `Irs` never outlives the request that owns it and is never shared
/// between tasks; the store clients and HSS collaborator are the only shared,
/// concurrency-safe state.
#[derive(Debug, Clone)]
pub struct Irs {
    pub default_impu: String,
    pub ims_sub_xml: String,
    pub registration_state: RegistrationState,
    pub charging_addresses: ChargingAddresses,
    pub associated_impus: TrackedSet,
    pub associated_impis: TrackedSet,
    pub ttl_seconds: i64,

    /// Decoded from a store record.
    pub existing: bool,
    /// Any field has been mutated since load/creation.
    pub changed: bool,
    /// Populated (or re-populated) from the HSS this request.
    pub refreshed: bool,
    /// `set_ttl` was called: the default record must be rewritten to extend
    /// TTL even if nothing else changed.
    pub ttl_touched: bool,

    pub xml_dirty: bool,
    pub reg_state_dirty: bool,
    pub charging_dirty: bool,

    /// A deliberate, control-plane-requested REGISTERED -> NOT_REGISTERED
    /// transition; on a merge conflict this side wins over a racing
    /// registration, rather than yielding to the higher-ranked state.
    pub deregistering: bool,

    /// CAS token of the default-IMPU record this IRS was loaded from, `None`
    /// for an IRS that doesn't exist in this store yet.
    pub cas: Option<CasToken>,
}

impl Irs {
    /// Decoded from an existing store record.
    pub fn from_record(default_impu: impl Into<String>, record: DefaultImpuRecord, cas: CasToken) -> Self {
        Self {
            default_impu: default_impu.into(),
            ims_sub_xml: record.ims_sub_xml,
            registration_state: record.registration_state,
            charging_addresses: record.charging_addresses,
            associated_impus: TrackedSet::from_existing(record.associated_impus),
            associated_impis: TrackedSet::from_existing(record.impis),
            ttl_seconds: crate::time::seconds_until(record.expires_at),
            existing: true,
            changed: false,
            refreshed: false,
            ttl_touched: false,
            xml_dirty: false,
            reg_state_dirty: false,
            charging_dirty: false,
            deregistering: false,
            cas: Some(cas),
        }
    }

    /// Populated from an HSS answer for an IRS the store doesn't have yet.
    pub fn fresh(default_impu: impl Into<String>) -> Self {
        Self {
            default_impu: default_impu.into(),
            ims_sub_xml: String::new(),
            registration_state: RegistrationState::NotRegistered,
            charging_addresses: ChargingAddresses::default(),
            associated_impus: TrackedSet::default(),
            associated_impis: TrackedSet::default(),
            ttl_seconds: 0,
            existing: false,
            changed: true,
            refreshed: true,
            ttl_touched: true,
            xml_dirty: true,
            reg_state_dirty: true,
            charging_dirty: true,
            deregistering: false,
            cas: None,
        }
    }

    pub fn set_ims_sub_xml(&mut self, xml: impl Into<String>) {
        self.ims_sub_xml = xml.into();
        self.xml_dirty = true;
        self.changed = true;
    }

    pub fn set_reg_state(&mut self, state: RegistrationState) {
        if self.registration_state == RegistrationState::Registered
            && state == RegistrationState::NotRegistered
        {
            self.deregistering = true;
        }
        self.registration_state = state;
        self.reg_state_dirty = true;
        self.changed = true;
    }

    pub fn set_charging_addresses(&mut self, addresses: ChargingAddresses) {
        self.charging_addresses = addresses;
        self.charging_dirty = true;
        self.changed = true;
    }

    pub fn set_associated_impus(&mut self, new_list: &[String]) {
        self.associated_impus.reconcile(new_list);
        self.changed = true;
    }

    pub fn set_associated_impis(&mut self, new_list: &[String]) {
        self.associated_impis.reconcile(new_list);
        self.changed = true;
    }

    pub fn set_ttl(&mut self, ttl_seconds: i64) {
        self.ttl_seconds = ttl_seconds;
        self.ttl_touched = true;
        self.changed = true;
    }

    pub fn to_default_record(&self) -> DefaultImpuRecord {
        DefaultImpuRecord {
            ims_sub_xml: self.ims_sub_xml.clone(),
            registration_state: self.registration_state,
            charging_addresses: self.charging_addresses.clone(),
            associated_impus: self.associated_impus.current(),
            impis: self.associated_impis.current(),
            expires_at: expires_at(self.ttl_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_irs_is_changed_and_refreshed_with_no_cas() {
        let irs = Irs::fresh("sip:a@x");
        assert!(!irs.existing);
        assert!(irs.changed);
        assert!(irs.refreshed);
        assert!(irs.cas.is_none());
    }

    #[test]
    fn decoded_irs_starts_clean() {
        let record = DefaultImpuRecord {
            ims_sub_xml: "<xml/>".into(),
            registration_state: RegistrationState::Registered,
            charging_addresses: ChargingAddresses::default(),
            associated_impus: vec!["sip:b@x".into()],
            impis: vec!["_u@x".into()],
            expires_at: expires_at(3600),
        };
        let irs = Irs::from_record("sip:a@x", record, 7);
        assert!(irs.existing);
        assert!(!irs.changed);
        assert_eq!(irs.cas, Some(7));
        assert_eq!(irs.associated_impus.current(), vec!["sip:b@x".to_string()]);
    }

    #[test]
    fn set_reg_state_to_not_registered_from_registered_marks_deregistering() {
        let mut irs = Irs::fresh("sip:a@x");
        irs.registration_state = RegistrationState::Registered;
        irs.set_reg_state(RegistrationState::NotRegistered);
        assert!(irs.deregistering);
    }

    #[test]
    fn set_associated_impus_reconciles_instead_of_overwriting() {
        let record = DefaultImpuRecord {
            ims_sub_xml: String::new(),
            registration_state: RegistrationState::Registered,
            charging_addresses: ChargingAddresses::default(),
            associated_impus: vec!["sip:b@x".into()],
            impis: vec![],
            expires_at: expires_at(10),
        };
        let mut irs = Irs::from_record("sip:a@x", record, 1);
        irs.set_associated_impus(&["sip:b@x".to_string(), "sip:c@x".to_string()]);
        assert_eq!(irs.associated_impus.added(), vec!["sip:c@x".to_string()]);
        assert!(irs.associated_impus.deleted().is_empty());
    }

    #[test]
    fn to_default_record_reflects_current_membership() {
        let mut irs = Irs::fresh("sip:a@x");
        irs.set_associated_impus(&["sip:b@x".to_string()]);
        irs.set_associated_impis(&["_u@x".to_string()]);
        let record = irs.to_default_record();
        assert_eq!(record.associated_impus, vec!["sip:b@x".to_string()]);
        assert_eq!(record.impis, vec!["_u@x".to_string()]);
    }
}
