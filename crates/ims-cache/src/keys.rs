//! Store key layout: `impu:{impu}`, `impi:{impi}:av`,
//! `impi:{impi}:mapping`.
//!
//! A default-IMPU record and an associated-IMPU record share the same key
//! namespace — an IMPU string is either a default or an associated, never
//! both, within a replica at one instant — so the two record shapes are
//! told apart by peeking the codec envelope, not by the key.

pub fn impu_key(impu: &str) -> String {
    format!("impu:{impu}")
}

pub fn av_key(impi: &str) -> String {
    format!("impi:{impi}:av")
}

pub fn mapping_key(impi: &str) -> String {
    format!("impi:{impi}:mapping")
}
