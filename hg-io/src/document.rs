//! Container documents: decoded JSON trees and their re-encoding

use hg_codec::{decode_container, encode_container, DecodeOpts, EncodeOpts, StopReason};
use hg_format::{Result, SaveError, Truncation};
use serde_json::Value;

/// A decoded save document
#[derive(Debug, Clone)]
pub struct DecodedDocument {
    /// Parsed JSON tree, keys as stored in the container
    pub document: Value,
    /// Length of the opaque header in front of the first block
    pub header_len: usize,
    /// Number of data blocks decoded
    pub block_count: usize,
    /// Why block reading ended
    pub stop: StopReason,
}

impl DecodedDocument {
    /// Truncation details when the container ended inside a block
    pub fn truncation(&self) -> Option<Truncation> {
        match self.stop {
            StopReason::Truncated(t) => Some(t),
            _ => None,
        }
    }
}

/// Decode container bytes and parse the JSON payload.
pub fn decode_document(bytes: &[u8], opts: &DecodeOpts) -> Result<DecodedDocument> {
    let decoded = decode_container(bytes, opts)?;
    if decoded.text.trim().is_empty() {
        return Err(SaveError::EmptyPayload);
    }

    let document: Value = serde_json::from_str(&decoded.text)?;
    Ok(DecodedDocument {
        document,
        header_len: decoded.header_len,
        block_count: decoded.block_count,
        stop: decoded.stop,
    })
}

/// Serialize `document` compactly and encode it against the previous file contents.
pub fn encode_document(original: &[u8], document: &Value, opts: &EncodeOpts) -> Result<Vec<u8>> {
    let text = serde_json::to_string(document)?;
    Ok(encode_container(original, &text, opts)?.bytes)
}

/// Canonical serialization used for change detection
pub fn canonical_json(value: &Value) -> String {
    // Serializing a Value cannot fail: every map key is already a string
    serde_json::to_string(value).unwrap_or_default()
}
