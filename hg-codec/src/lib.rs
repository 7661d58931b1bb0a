//! hg Codec - Block codec engines
//!
//! This crate provides the block codec for hg save containers:
//!
//! - Block decoding (safe LZ4 decompression into stream-declared sizes)
//! - JSON text cleanup (NUL stripping, trailing garbage truncation)
//! - Block building (fixed 64 KiB zero-padded blocks plus terminal sentinel)
//! - Container encoding that preserves the original header bytes

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod block_builder;
pub mod block_decode;
pub mod container;

// Re-export commonly used types
pub use hg_format::{Limits, Result, SaveError, StopReason, Truncation};

// Re-export our own types
pub use block_builder::{encode_blocks, BlockBuilder, BlockData};
pub use block_decode::{clean_json_text, decode_blocks, decode_text, BlockDecoder, DecodedBlocks, DecodedText};
pub use container::{decode_container, encode_container, EncodedContainer};

/// Decoding options
#[derive(Debug, Clone, Default)]
pub struct DecodeOpts {
    /// Security limits
    pub limits: Limits,
    /// Fail on truncated input instead of keeping the decoded prefix
    pub strict: bool,
}

/// Encoding options
#[derive(Debug, Clone)]
pub struct EncodeOpts {
    /// Uncompressed size of every data block
    pub block_size: usize,
}

impl Default for EncodeOpts {
    fn default() -> Self {
        Self {
            block_size: hg_format::constants::BLOCK_SIZE,
        }
    }
}

/// Decode container bytes into cleaned JSON text with default options.
pub fn decode(bytes: &[u8]) -> Result<String> {
    Ok(decode_container(bytes, &DecodeOpts::default())?.text)
}

/// Encode `json_text` against the previous file contents with default options.
pub fn encode(original: &[u8], json_text: &str) -> Result<Vec<u8>> {
    Ok(encode_container(original, json_text, &EncodeOpts::default())?.bytes)
}
