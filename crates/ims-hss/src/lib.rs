//! ims-hss: the typed Cx collaborator boundary (C8).
//!
//! `HssClient` stands in for the Diameter stack's MAR/SAR exchange; a real
//! binding would marshal `MultimediaAuthRequest`/`ServerAssignmentRequest`
//! onto the wire and parse the Diameter answer back into these types. That
//! marshalling is out of scope here — the trait boundary plus a
//! deterministic in-memory client are what the coordinator and its tests
//! need.

pub mod client;
pub mod cx;
pub mod error;
pub mod mock;

pub use client::HssClient;
pub use cx::{
    MultimediaAuthAnswer, MultimediaAuthRequest, PushProfileRequest,
    RegistrationTerminationRequest, SarReason, ServerAssignmentAnswer, ServerAssignmentRequest,
};
pub use error::HssError;
pub use mock::MockHssClient;
