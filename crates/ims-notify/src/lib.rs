//! ims-notify: the outbound notification client (C9).
//!
//! Matches the exact wire contract the call-control layer's registration
//! endpoint expects: a `DELETE /registrations` for de-registrations/RTR and a
//! `PUT /registrations/{impu}` for a push-profile's updated subscription XML.

pub mod client;
pub mod error;
pub mod http;
pub mod recording;

pub use client::{NotificationClient, RegistrationRef};
pub use error::NotifyError;
pub use http::HttpNotificationClient;
pub use recording::RecordingNotificationClient;
