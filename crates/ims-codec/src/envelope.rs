use serde::{de::DeserializeOwned, Serialize};

use crate::error::CodecError;

/// Encode `value` behind a `[format_id, version]` envelope.
pub fn encode<T: Serialize>(format_id: u8, version: u8, value: &T) -> Vec<u8> {
    let payload = bincode::serialize(value).expect("record types are always serializable");
    let mut out = Vec::with_capacity(2 + payload.len());
    out.push(format_id);
    out.push(version);
    out.extend_from_slice(&payload);
    out
}

/// Read the envelope's format id without decoding the payload, for callers
/// that hold one key shared by more than one record shape (the `impu:`
/// namespace holds either a default or an associated record) and must tell
/// them apart before picking a decoder.
pub fn peek_format_id(bytes: &[u8]) -> Option<u8> {
    bytes.first().copied()
}

/// Decode a blob previously produced by [`encode`], checking that its
/// envelope matches `expected_format_id`/`expected_version` before attempting
/// to deserialize the payload.
pub fn decode<T: DeserializeOwned>(
    expected_format_id: u8,
    expected_version: u8,
    bytes: &[u8],
) -> Result<T, CodecError> {
    if bytes.len() < 2 {
        return Err(CodecError::Truncated);
    }
    let (format_id, version) = (bytes[0], bytes[1]);
    if format_id != expected_format_id || version != expected_version {
        return Err(CodecError::UnknownFormat(format_id, version));
    }
    bincode::deserialize(&bytes[2..]).map_err(|e| CodecError::Malformed(e.to_string()))
}
