//! ims-codec: self-describing byte-blob encoding for the three record types
//! the store holds (C2).
//!
//! Every blob starts with a one-byte format id and a one-byte version, so a
//! future record shape can be introduced without breaking readers of the old
//! one: an unrecognized id/version decodes to `CodecError::UnknownFormat`,
//! which callers (the CAS engine) fold into NOT_FOUND for that key rather
//! than treating it as a hard failure.

pub mod envelope;
pub mod error;
pub mod records;

pub use envelope::{decode, encode, peek_format_id};
pub use error::CodecError;
pub use records::{
    AssociatedImpuRecord, DefaultImpuRecord, ImpiMappingRecord, FORMAT_ASSOCIATED_IMPU,
    FORMAT_DEFAULT_IMPU, FORMAT_IMPI_MAPPING,
};
