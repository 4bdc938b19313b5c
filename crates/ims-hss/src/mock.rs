use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use ims_types::{AuthVector, ChargingAddresses, RegistrationState};

use crate::client::HssClient;
use crate::cx::{
    MultimediaAuthAnswer, MultimediaAuthRequest, SarReason, ServerAssignmentAnswer,
    ServerAssignmentRequest,
};
use crate::error::HssError;

fn default_ims_sub_xml(impi: &str, impu: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><IMSSubscription><PrivateID>{impi}</PrivateID>\
         <ServiceProfile><PublicIdentity><Identity>{impu}</Identity></PublicIdentity>\
         </ServiceProfile></IMSSubscription>"
    )
}

/// Deterministic in-memory stand-in for the Diameter Cx collaborator.
///
/// Without configuration it answers every MAR/SAR with a freshly-minted,
/// internally-consistent profile, which is enough to drive the register /
/// cache-hit / PPR scenarios end to end. Tests that need a specific answer
/// (to exercise merge/collision paths, or HSS failure) preconfigure one with
/// [`MockHssClient::with_profile`]/[`MockHssClient::with_auth_vector`] or
/// inject a failure with [`MockHssClient::fail_next`].
pub struct MockHssClient {
    profiles: Mutex<HashMap<String, ServerAssignmentAnswer>>,
    vectors: Mutex<HashMap<String, MultimediaAuthAnswer>>,
    fail_next_sar: AtomicU32,
    fail_next_mar: AtomicU32,
}

impl MockHssClient {
    pub fn new() -> Self {
        Self {
            profiles: Mutex::new(HashMap::new()),
            vectors: Mutex::new(HashMap::new()),
            fail_next_sar: AtomicU32::new(0),
            fail_next_mar: AtomicU32::new(0),
        }
    }

    /// Preconfigure the answer `server_assignment` returns for `impu`.
    pub async fn with_profile(self, impu: impl Into<String>, answer: ServerAssignmentAnswer) -> Self {
        self.profiles.lock().await.insert(impu.into(), answer);
        self
    }

    /// Preconfigure the answer `multimedia_auth` returns for `impi`.
    pub async fn with_auth_vector(self, impi: impl Into<String>, answer: MultimediaAuthAnswer) -> Self {
        self.vectors.lock().await.insert(impi.into(), answer);
        self
    }

    /// Make the next `n` `server_assignment` calls fail with `Unreachable`.
    pub fn fail_next_sar(&self, n: u32) {
        self.fail_next_sar.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` `multimedia_auth` calls fail with `Unreachable`.
    pub fn fail_next_mar(&self, n: u32) {
        self.fail_next_mar.store(n, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        let mut current = counter.load(Ordering::SeqCst);
        while current > 0 {
            match counter.compare_exchange(
                current,
                current - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
        false
    }
}

impl Default for MockHssClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HssClient for MockHssClient {
    async fn multimedia_auth(
        &self,
        request: MultimediaAuthRequest,
    ) -> Result<MultimediaAuthAnswer, HssError> {
        if Self::take_failure(&self.fail_next_mar) {
            return Err(HssError::Unreachable("mock MAR failure injected".into()));
        }

        if let Some(answer) = self.vectors.lock().await.get(&request.impi) {
            return Ok(answer.clone());
        }

        Ok(MultimediaAuthAnswer {
            auth_vector: AuthVector::Digest {
                realm: request.dest_realm,
                qop: "auth".into(),
                ha1: format!("{}:{}", request.impi, request.impu),
            },
            ttl_seconds: 300,
        })
    }

    async fn server_assignment(
        &self,
        request: ServerAssignmentRequest,
    ) -> Result<ServerAssignmentAnswer, HssError> {
        if Self::take_failure(&self.fail_next_sar) {
            return Err(HssError::Unreachable("mock SAR failure injected".into()));
        }

        if let Some(answer) = self.profiles.lock().await.get(&request.impu) {
            return Ok(answer.clone());
        }

        let registration_state = if request.reason.is_deregistration() {
            RegistrationState::NotRegistered
        } else {
            RegistrationState::Registered
        };
        let impis = request.impi.clone().into_iter().collect::<Vec<_>>();
        let ims_sub_xml = default_ims_sub_xml(
            request.impi.as_deref().unwrap_or(""),
            &request.impu,
        );

        Ok(ServerAssignmentAnswer {
            ims_sub_xml,
            registration_state,
            charging_addresses: ChargingAddresses::default(),
            associated_impus: Vec::new(),
            impis,
            ttl_seconds: 3600,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sar(impu: &str, impi: Option<&str>, reason: SarReason) -> ServerAssignmentRequest {
        ServerAssignmentRequest {
            dest_realm: "example.com".into(),
            dest_host: "hss.example.com".into(),
            server_name: "scscf.example.com".into(),
            impu: impu.to_string(),
            impi: impi.map(|s| s.to_string()),
            reason,
        }
    }

    #[tokio::test]
    async fn unconfigured_sar_returns_registered_profile_with_the_requested_impi() {
        let client = MockHssClient::new();
        let answer = client
            .server_assignment(sar("sip:a@x", Some("_u@x"), SarReason::Registration))
            .await
            .unwrap();
        assert_eq!(answer.registration_state, RegistrationState::Registered);
        assert_eq!(answer.impis, vec!["_u@x".to_string()]);
        assert!(answer.ims_sub_xml.contains("_u@x"));
        assert!(answer.ims_sub_xml.contains("sip:a@x"));
    }

    #[tokio::test]
    async fn deregistration_reason_yields_not_registered_state() {
        let client = MockHssClient::new();
        let answer = client
            .server_assignment(sar("sip:a@x", Some("_u@x"), SarReason::UserDeregistration))
            .await
            .unwrap();
        assert_eq!(answer.registration_state, RegistrationState::NotRegistered);
    }

    #[tokio::test]
    async fn preconfigured_profile_is_returned_verbatim() {
        let canned = ServerAssignmentAnswer {
            ims_sub_xml: "<canned/>".into(),
            registration_state: RegistrationState::Registered,
            charging_addresses: ChargingAddresses::default(),
            associated_impus: vec!["sip:b@x".into()],
            impis: vec!["_u@x".into()],
            ttl_seconds: 60,
        };
        let client = MockHssClient::new()
            .with_profile("sip:a@x", canned.clone())
            .await;
        let answer = client
            .server_assignment(sar("sip:a@x", None, SarReason::Registration))
            .await
            .unwrap();
        assert_eq!(answer.ims_sub_xml, canned.ims_sub_xml);
        assert_eq!(answer.associated_impus, canned.associated_impus);
    }

    #[tokio::test]
    async fn injected_failure_surfaces_once_then_recovers() {
        let client = MockHssClient::new();
        client.fail_next_sar(1);
        let first = client
            .server_assignment(sar("sip:a@x", Some("_u@x"), SarReason::Registration))
            .await;
        assert!(first.is_err());
        let second = client
            .server_assignment(sar("sip:a@x", Some("_u@x"), SarReason::Registration))
            .await;
        assert!(second.is_ok());
    }
}
