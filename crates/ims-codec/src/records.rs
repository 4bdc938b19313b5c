use serde::{Deserialize, Serialize};

use ims_types::{ChargingAddresses, RegistrationState};

use crate::envelope::{decode, encode};
use crate::error::CodecError;

pub const FORMAT_DEFAULT_IMPU: u8 = 1;
pub const FORMAT_ASSOCIATED_IMPU: u8 = 2;
pub const FORMAT_IMPI_MAPPING: u8 = 3;
const CURRENT_VERSION: u8 = 1;

/// The authoritative record for an IRS, keyed by its default IMPU string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultImpuRecord {
    pub ims_sub_xml: String,
    pub registration_state: RegistrationState,
    pub charging_addresses: ChargingAddresses,
    pub associated_impus: Vec<String>,
    pub impis: Vec<String>,
    /// Absolute expiry (unix millis).
    pub expires_at: i64,
}

impl DefaultImpuRecord {
    pub fn encode(&self) -> Vec<u8> {
        encode(FORMAT_DEFAULT_IMPU, CURRENT_VERSION, self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(FORMAT_DEFAULT_IMPU, CURRENT_VERSION, bytes)
    }
}

/// A non-default member of an IRS: points back at its default IMPU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociatedImpuRecord {
    pub default_impu: String,
    pub expires_at: i64,
}

impl AssociatedImpuRecord {
    pub fn encode(&self) -> Vec<u8> {
        encode(FORMAT_ASSOCIATED_IMPU, CURRENT_VERSION, self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(FORMAT_ASSOCIATED_IMPU, CURRENT_VERSION, bytes)
    }
}

/// The set of default-IMPUs whose IRSs include a given IMPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpiMappingRecord {
    pub default_impus: Vec<String>,
    pub expires_at: i64,
}

impl ImpiMappingRecord {
    pub fn encode(&self) -> Vec<u8> {
        encode(FORMAT_IMPI_MAPPING, CURRENT_VERSION, self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(FORMAT_IMPI_MAPPING, CURRENT_VERSION, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_default() -> DefaultImpuRecord {
        DefaultImpuRecord {
            ims_sub_xml: "<IMSSubscription/>".into(),
            registration_state: RegistrationState::Registered,
            charging_addresses: ChargingAddresses::new(vec!["ccf1".into()], vec![], 100),
            associated_impus: vec!["sip:b@x".into()],
            impis: vec!["_u@x".into()],
            expires_at: 123456,
        }
    }

    #[test]
    fn default_impu_record_round_trips() {
        let record = sample_default();
        let bytes = record.encode();
        assert_eq!(DefaultImpuRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn associated_impu_record_round_trips() {
        let record = AssociatedImpuRecord {
            default_impu: "sip:a@x".into(),
            expires_at: 42,
        };
        let bytes = record.encode();
        assert_eq!(AssociatedImpuRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn impi_mapping_record_round_trips() {
        let record = ImpiMappingRecord {
            default_impus: vec!["sip:a@x".into(), "sip:b@x".into()],
            expires_at: 42,
        };
        let bytes = record.encode();
        assert_eq!(ImpiMappingRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn default_impu_bytes_do_not_decode_as_associated_impu() {
        let bytes = sample_default().encode();
        assert!(AssociatedImpuRecord::decode(&bytes).is_err());
    }

    #[test]
    fn decode_of_garbage_is_a_codec_error_not_a_panic() {
        let garbage = vec![255u8, 255, 1, 2, 3];
        assert!(DefaultImpuRecord::decode(&garbage).is_err());
    }
}
