use async_trait::async_trait;
use serde::Serialize;

use crate::client::{NotificationClient, RegistrationRef};
use crate::error::NotifyError;

#[derive(Serialize)]
struct RegistrationEntry {
    #[serde(rename = "primary-impu")]
    primary_impu: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    impi: Option<String>,
}

#[derive(Serialize)]
struct DeregisterBody {
    registrations: Vec<RegistrationEntry>,
}

#[derive(Serialize)]
struct PushProfileBody {
    #[serde(rename = "user-data-xml")]
    user_data_xml: String,
}

/// reqwest-backed [`NotificationClient`] talking to a real call-control
/// notification endpoint.
pub struct HttpNotificationClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNotificationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl NotificationClient for HttpNotificationClient {
    async fn deregister(
        &self,
        send_notifications: bool,
        registrations: Vec<RegistrationRef>,
    ) -> Result<(), NotifyError> {
        let body = DeregisterBody {
            registrations: registrations
                .into_iter()
                .map(|r| RegistrationEntry {
                    primary_impu: r.primary_impu,
                    impi: r.impi,
                })
                .collect(),
        };

        let url = format!(
            "{}/registrations?send-notifications={}",
            self.base_url, send_notifications
        );

        let response = self
            .client
            .delete(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::BadStatus(response.status().as_u16()));
        }
        tracing::debug!(url = %url, "deregister notification delivered");
        Ok(())
    }

    async fn push_profile(&self, impu: &str, user_data_xml: &str) -> Result<(), NotifyError> {
        let body = PushProfileBody {
            user_data_xml: user_data_xml.to_string(),
        };
        let url = format!("{}/registrations/{}", self.base_url, impu);

        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::BadStatus(response.status().as_u16()));
        }
        tracing::debug!(url = %url, "push-profile notification delivered");
        Ok(())
    }
}
