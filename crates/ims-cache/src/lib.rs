//! ims-cache: the IRS data model, per-store CAS engine, multi-store
//! orchestrator, IMS-Subscription aggregator, and cache/HSS coordinator
//! (C3-C7) — the hard engineering this crate exists for.

pub mod coordinator;
pub mod engine;
pub mod error;
pub mod irs;
pub mod keys;
pub mod orchestrator;
pub mod subscription;
pub mod tracked;
mod time;

pub use coordinator::{Coordinator, CxIdentity, RegistrationChange};
pub use engine::{merge_registration_state, CasEngine};
pub use error::EngineError;
pub use irs::Irs;
pub use orchestrator::{Orchestrator, PutOutcome};
pub use subscription::ImsSubscription;
pub use tracked::{Tracked, TrackedSet};
