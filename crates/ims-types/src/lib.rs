//! ims-types: Shared domain types for the IMS subscriber-data cache core
//!
//! Mirrors the IMPU/IMPI/registration-state/charging-address/auth-vector vocabulary
//! used across the store, codec, cache-engine, HSS-collaborator, and HTTP crates.

pub mod charging;
pub mod error;
pub mod identity;
pub mod registration;
pub mod vector;

pub use charging::ChargingAddresses;
pub use error::CoreError;
pub use identity::{Impi, Impu};
pub use registration::RegistrationState;
pub use vector::AuthVector;
