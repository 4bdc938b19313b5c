//! ims-store: the per-replica store capability interface (C1).
//!
//! Modeled on `ssmd_middleware::Cache`/`Storage`: a trait boundary plus an
//! in-memory reference implementation, except the operations here carry CAS
//! tokens so the engine can detect racing writers on the same key.

pub mod error;
pub mod memory;
pub mod store;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use store::{CasToken, GetResult, Store};
