use std::sync::Arc;

use ims_hss::{
    HssClient, MultimediaAuthRequest, PushProfileRequest, RegistrationTerminationRequest,
    SarReason, ServerAssignmentRequest,
};
use ims_notify::{NotificationClient, RegistrationRef};
use ims_types::{AuthVector, CoreError, RegistrationState};

use crate::irs::Irs;
use crate::keys::av_key;
use crate::orchestrator::Orchestrator;
use crate::subscription::ImsSubscription;
use crate::time::ttl_duration;

/// A caller-requested registration-state transition for `PUT
/// /impu/{impu}/reg-data`.
#[derive(Debug, Clone)]
pub enum RegistrationChange {
    Register { impi: String },
    ReRegister { impi: String },
    Deregister { impi: Option<String> },
}

/// Destination-Realm/Host and Server-Name are carried on every outbound Cx
/// request; they identify this cache instance to the HSS.
#[derive(Debug, Clone)]
pub struct CxIdentity {
    pub dest_realm: String,
    pub dest_host: String,
    pub server_name: String,
}

/// The cache/HSS coordinator (C7): serves reads from the replicated cache,
/// refreshing from the HSS on miss; drives registration-state changes
/// through the orchestrator; and handles HSS-inbound PPR/RTR.
pub struct Coordinator {
    orchestrator: Orchestrator,
    hss: Arc<dyn HssClient>,
    notifier: Arc<dyn NotificationClient>,
    identity: CxIdentity,
}

impl Coordinator {
    pub fn new(
        orchestrator: Orchestrator,
        hss: Arc<dyn HssClient>,
        notifier: Arc<dyn NotificationClient>,
        identity: CxIdentity,
    ) -> Self {
        Self {
            orchestrator,
            hss,
            notifier,
            identity,
        }
    }

    /// Cache hit returns directly; on miss, fetch from the
    /// HSS, write through, and return the fresh IRS.
    pub async fn get_registration(&self, impu: &str, impi: Option<&str>) -> Result<Irs, CoreError> {
        if let Some(irs) = self.orchestrator.get(impu).await? {
            return Ok(irs);
        }

        let request = ServerAssignmentRequest {
            dest_realm: self.identity.dest_realm.clone(),
            dest_host: self.identity.dest_host.clone(),
            server_name: self.identity.server_name.clone(),
            impu: impu.to_string(),
            impi: impi.map(str::to_string),
            reason: SarReason::Registration,
        };
        let answer = self
            .hss
            .server_assignment(request)
            .await
            .map_err(|e| CoreError::UpstreamUnavailable(e.to_string()))?;

        let mut irs = Irs::fresh(impu);
        irs.set_ims_sub_xml(answer.ims_sub_xml);
        irs.set_reg_state(answer.registration_state);
        irs.set_charging_addresses(answer.charging_addresses);
        irs.set_associated_impus(&answer.associated_impus);
        irs.set_associated_impis(&answer.impis);
        irs.set_ttl(answer.ttl_seconds);

        self.orchestrator.put(&mut irs).await?;
        Ok(irs)
    }

    /// Register, re-register, or deregister an
    /// IMPU, round-tripping through the HSS first.
    pub async fn apply_registration_change(
        &self,
        impu: &str,
        change: RegistrationChange,
    ) -> Result<Irs, CoreError> {
        let (impi, reason) = match &change {
            RegistrationChange::Register { impi } => (Some(impi.clone()), SarReason::Registration),
            RegistrationChange::ReRegister { impi } => (Some(impi.clone()), SarReason::ReRegistration),
            RegistrationChange::Deregister { impi } => {
                return self.deregister(impu, impi.as_deref()).await;
            }
        };

        let impi = impi.expect("register/re-register always carries an impi");
        let request = ServerAssignmentRequest {
            dest_realm: self.identity.dest_realm.clone(),
            dest_host: self.identity.dest_host.clone(),
            server_name: self.identity.server_name.clone(),
            impu: impu.to_string(),
            impi: Some(impi),
            reason,
        };
        let answer = self
            .hss
            .server_assignment(request)
            .await
            .map_err(|e| CoreError::UpstreamUnavailable(e.to_string()))?;

        let mut irs = match self.orchestrator.get(impu).await? {
            Some(existing) => existing,
            None => Irs::fresh(impu),
        };
        irs.set_ims_sub_xml(answer.ims_sub_xml);
        irs.set_reg_state(answer.registration_state);
        irs.set_charging_addresses(answer.charging_addresses);
        irs.set_associated_impus(&answer.associated_impus);
        irs.set_associated_impis(&answer.impis);
        irs.set_ttl(answer.ttl_seconds);

        self.orchestrator.put(&mut irs).await?;
        Ok(irs)
    }

    /// SAR(dereg), then delete the IRS and notify the call-control layer.
    pub async fn deregister(&self, impu: &str, impi: Option<&str>) -> Result<Irs, CoreError> {
        let request = ServerAssignmentRequest {
            dest_realm: self.identity.dest_realm.clone(),
            dest_host: self.identity.dest_host.clone(),
            server_name: self.identity.server_name.clone(),
            impu: impu.to_string(),
            impi: impi.map(str::to_string),
            reason: SarReason::UserDeregistration,
        };
        self.hss
            .server_assignment(request)
            .await
            .map_err(|e| CoreError::UpstreamUnavailable(e.to_string()))?;

        let mut irs = match self.orchestrator.get(impu).await? {
            Some(irs) => irs,
            None => Irs::fresh(impu),
        };
        irs.set_reg_state(RegistrationState::NotRegistered);

        self.orchestrator.delete(&irs).await?;

        let registration = RegistrationRef {
            primary_impu: impu.to_string(),
            impi: impi.map(str::to_string),
        };
        if let Err(e) = self.notifier.deregister(true, vec![registration]).await {
            tracing::warn!(error = %e, impu = %impu, "deregistration notification delivery failed");
        }

        Ok(irs)
    }

    /// Inbound Registration-Termination-Request: drop the named IRSs
    /// via the orchestrator, then notify the call-control layer.
    pub async fn handle_registration_termination(
        &self,
        request: RegistrationTerminationRequest,
    ) -> Result<(), CoreError> {
        let mut affected_impus: Vec<String> = request.impus;

        for impi in &request.impis {
            let subscription = ImsSubscription::load(&self.orchestrator, impi).await?;
            affected_impus.extend(subscription.members.keys().cloned());
        }
        affected_impus.sort();
        affected_impus.dedup();

        let mut registrations = Vec::new();
        for impu in &affected_impus {
            if let Some(irs) = self.orchestrator.get(impu).await? {
                self.orchestrator.delete(&irs).await?;
                registrations.push(RegistrationRef {
                    primary_impu: impu.clone(),
                    impi: None,
                });
            }
        }

        if !registrations.is_empty() {
            if let Err(e) = self.notifier.deregister(true, registrations).await {
                tracing::warn!(error = %e, "registration-termination notification delivery failed");
            }
        }
        Ok(())
    }

    /// Inbound Push-Profile-Request: apply the XML/charging-address
    /// change to every IRS of the IMPI, write through, and only then notify
    /// the call-control layer — notification must follow local success.
    pub async fn handle_push_profile(&self, request: PushProfileRequest) -> Result<(), CoreError> {
        let mut subscription = ImsSubscription::load(&self.orchestrator, &request.impi).await?;

        if let Some(xml) = &request.ims_sub_xml {
            for irs in subscription.members.values_mut() {
                irs.set_ims_sub_xml(xml.clone());
            }
        }
        if let Some(addresses) = request.charging_addresses {
            subscription.set_charging_addrs(addresses);
        }

        subscription.put(&self.orchestrator).await?;

        for (impu, irs) in &subscription.members {
            if let Err(e) = self.notifier.push_profile(impu, &irs.ims_sub_xml).await {
                tracing::warn!(error = %e, impu = %impu, "push-profile notification delivery failed");
            }
        }
        Ok(())
    }

    /// Read (and cache) an authentication vector for an IMPI/IMPU pair.
    /// Auth vectors aren't one of the three CAS-protected record types, so
    /// last-writer-wins caching is acceptable here.
    pub async fn get_auth_vector(
        &self,
        impi: &str,
        impu: &str,
        sip_auth_scheme: &str,
    ) -> Result<AuthVector, CoreError> {
        let key = av_key(impi);
        if let Some(bytes) = self.orchestrator.get_raw(&key).await? {
            if let Ok(av) = bincode::deserialize::<AuthVector>(&bytes) {
                return Ok(av);
            }
        }

        let request = MultimediaAuthRequest {
            dest_realm: self.identity.dest_realm.clone(),
            dest_host: self.identity.dest_host.clone(),
            server_name: self.identity.server_name.clone(),
            impi: impi.to_string(),
            impu: impu.to_string(),
            sip_auth_scheme: sip_auth_scheme.to_string(),
            authorization: None,
        };
        let answer = self
            .hss
            .multimedia_auth(request)
            .await
            .map_err(|e| CoreError::UpstreamUnavailable(e.to_string()))?;

        if let Ok(bytes) = bincode::serialize(&answer.auth_vector) {
            self.orchestrator
                .set_raw(&key, bytes.into(), ttl_duration(answer.ttl_seconds))
                .await?;
        }

        Ok(answer.auth_vector)
    }
}
