use ims_types::{ChargingAddresses, RegistrationState};

/// Reasons Cx carries on a Server-Assignment-Request. Mirrors the
/// `Server-Assignment-Type` AVP values relevant to this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SarReason {
    Registration,
    ReRegistration,
    UnregisteredUser,
    TimeoutDeregistration,
    UserDeregistration,
    AdministrativeDeregistration,
}

impl SarReason {
    /// Deregistration reasons request the HSS drop the registration; used by
    /// the coordinator to decide whether a `NotFound`-on-delete is expected.
    pub fn is_deregistration(self) -> bool {
        matches!(
            self,
            SarReason::TimeoutDeregistration
                | SarReason::UserDeregistration
                | SarReason::AdministrativeDeregistration
        )
    }
}

/// A conceptual Multimedia-Auth-Request. The AVPs carried mirror the Cx
/// dictionary (Destination-Realm, Destination-Host, User-Name,
/// Public-Identity, SIP-Auth-Data-Item/SIP-Auth-Scheme, Server-Name).
#[derive(Debug, Clone)]
pub struct MultimediaAuthRequest {
    pub dest_realm: String,
    pub dest_host: String,
    pub server_name: String,
    pub impi: String,
    pub impu: String,
    pub sip_auth_scheme: String,
    /// SIP-Authorization-Item, present for AKA re-synchronization.
    pub authorization: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MultimediaAuthAnswer {
    pub auth_vector: ims_types::AuthVector,
    pub ttl_seconds: i64,
}

/// A conceptual Server-Assignment-Request.
#[derive(Debug, Clone)]
pub struct ServerAssignmentRequest {
    pub dest_realm: String,
    pub dest_host: String,
    pub server_name: String,
    pub impu: String,
    pub impi: Option<String>,
    pub reason: SarReason,
}

#[derive(Debug, Clone)]
pub struct ServerAssignmentAnswer {
    pub ims_sub_xml: String,
    pub registration_state: RegistrationState,
    pub charging_addresses: ChargingAddresses,
    pub associated_impus: Vec<String>,
    pub impis: Vec<String>,
    pub ttl_seconds: i64,
}

/// An inbound Push-Profile-Request: the HSS asking the cache to update the
/// subscription XML and/or charging addresses for every IRS of an IMPI.
#[derive(Debug, Clone)]
pub struct PushProfileRequest {
    pub impi: String,
    pub ims_sub_xml: Option<String>,
    pub charging_addresses: Option<ChargingAddresses>,
}

/// An inbound Registration-Termination-Request: the HSS asking the cache to
/// drop registrations, identified by IMPI and/or IMPU lists.
#[derive(Debug, Clone)]
pub struct RegistrationTerminationRequest {
    pub impis: Vec<String>,
    pub impus: Vec<String>,
    pub reason: RtrReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtrReason {
    PermanentTermination,
    NewServerAssigned,
    ServerChange,
    RemoveScscf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deregistration_reasons_are_recognized() {
        assert!(SarReason::UserDeregistration.is_deregistration());
        assert!(SarReason::TimeoutDeregistration.is_deregistration());
        assert!(SarReason::AdministrativeDeregistration.is_deregistration());
        assert!(!SarReason::Registration.is_deregistration());
        assert!(!SarReason::UnregisteredUser.is_deregistration());
    }
}
