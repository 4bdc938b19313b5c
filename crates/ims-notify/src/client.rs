use async_trait::async_trait;

use crate::error::NotifyError;

/// One entry of a `DELETE /registrations` body: a primary (default) IMPU and,
/// when known, the IMPI being dropped from it. IMPI is omitted when the
/// caller only has IMPUs to hand (e.g. a delete driven purely by IRS lookup).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRef {
    pub primary_impu: String,
    pub impi: Option<String>,
}

/// Client for the call-control layer's notification endpoint.
#[async_trait]
pub trait NotificationClient: Send + Sync {
    /// `DELETE /registrations?send-notifications={send_notifications}`.
    async fn deregister(
        &self,
        send_notifications: bool,
        registrations: Vec<RegistrationRef>,
    ) -> Result<(), NotifyError>;

    /// `PUT /registrations/{impu}` with the refreshed subscription XML.
    async fn push_profile(&self, impu: &str, user_data_xml: &str) -> Result<(), NotifyError>;
}
