//! Whole-container decode and encode
//!
//! Decoding skips the opaque header and reads blocks from the first magic.
//! Encoding recovers the header from the previous file contents and writes
//! `header ++ data blocks ++ sentinel`.

use crate::block_builder::{BlockBuilder, BlockData};
use crate::block_decode::{decode_text, DecodedText};
use crate::{DecodeOpts, EncodeOpts};
use hg_format::{find_magic, ContainerHeader, Result, StopReason};
use tracing::{debug, info};

/// Summary of an encoded container
#[derive(Debug, Clone)]
pub struct EncodedContainer {
    /// Complete container bytes
    pub bytes: Vec<u8>,
    /// Length of the preserved header
    pub header_len: usize,
    /// Number of data blocks written
    pub blocks_written: usize,
}

/// Decode a complete container into cleaned JSON text.
///
/// Input without any block magic decodes to empty text.
pub fn decode_container(bytes: &[u8], opts: &DecodeOpts) -> Result<DecodedText> {
    let header_len = match find_magic(bytes) {
        Some(offset) => offset,
        None => {
            debug!(len = bytes.len(), "no block magic in input");
            return Ok(DecodedText {
                text: String::new(),
                header_len: bytes.len(),
                block_count: 0,
                stop: StopReason::ForeignMagic { offset: 0 },
            });
        }
    };

    let mut decoded = decode_text(&bytes[header_len..], opts)?;
    decoded.header_len = header_len;
    decoded.stop = shift_stop(decoded.stop, header_len);
    info!(
        header_len,
        blocks = decoded.block_count,
        text_len = decoded.text.len(),
        "decoded container"
    );
    Ok(decoded)
}

/// Encode `json_text` as a container, keeping the header of `original`.
///
/// `original` is the previous content of the file being replaced. It must
/// contain a block magic, otherwise [`hg_format::SaveError::InvalidContainer`]
/// is returned and nothing is produced.
pub fn encode_container(
    original: &[u8],
    json_text: &str,
    opts: &EncodeOpts,
) -> Result<EncodedContainer> {
    let header = ContainerHeader::locate(original)?;
    if header.is_empty() {
        debug!("no header region, container starts with block magic");
    } else {
        debug!(header_len = header.len(), "preserving container header");
    }

    let mut builder = BlockBuilder::new(opts.clone())?;
    builder.push(json_text.as_bytes());
    let BlockData {
        bytes: blocks,
        blocks_written,
        input_len,
    } = builder.finish();

    let mut bytes = Vec::with_capacity(header.len() + blocks.len());
    bytes.extend_from_slice(header.bytes());
    bytes.extend_from_slice(&blocks);

    info!(
        header_len = header.len(),
        json_len = input_len,
        blocks = blocks_written,
        total = bytes.len(),
        "encoded container"
    );

    Ok(EncodedContainer {
        bytes,
        header_len: header.len(),
        blocks_written,
    })
}

fn shift_stop(stop: StopReason, by: usize) -> StopReason {
    match stop {
        StopReason::EndOfData { offset } => StopReason::EndOfData {
            offset: offset + by,
        },
        StopReason::ForeignMagic { offset } => StopReason::ForeignMagic {
            offset: offset + by,
        },
        StopReason::Sentinel { offset } => StopReason::Sentinel {
            offset: offset + by,
        },
        StopReason::Truncated(mut t) => {
            t.offset += by;
            StopReason::Truncated(t)
        }
    }
}
