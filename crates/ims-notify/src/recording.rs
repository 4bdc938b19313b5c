use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{NotificationClient, RegistrationRef};
use crate::error::NotifyError;

/// A single call captured by [`RecordingNotificationClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Deregister {
        send_notifications: bool,
        registrations: Vec<RegistrationRef>,
    },
    PushProfile {
        impu: String,
        user_data_xml: String,
    },
}

/// In-memory [`NotificationClient`] that records every call instead of
/// making one, for asserting on notification side effects in tests.
#[derive(Default)]
pub struct RecordingNotificationClient {
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingNotificationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("recorder mutex poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("recorder mutex poisoned").len()
    }
}

#[async_trait]
impl NotificationClient for RecordingNotificationClient {
    async fn deregister(
        &self,
        send_notifications: bool,
        registrations: Vec<RegistrationRef>,
    ) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .expect("recorder mutex poisoned")
            .push(RecordedCall::Deregister {
                send_notifications,
                registrations,
            });
        Ok(())
    }

    async fn push_profile(&self, impu: &str, user_data_xml: &str) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .expect("recorder mutex poisoned")
            .push(RecordedCall::PushProfile {
                impu: impu.to_string(),
                user_data_xml: user_data_xml.to_string(),
            });
        Ok(())
    }
}
