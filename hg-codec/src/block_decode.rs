//! Block decoding: framed LZ4 blocks to JSON text

use crate::DecodeOpts;
use hg_format::{BlockIter, RawBlock, Result, SaveError, StopReason, Truncation};
use tracing::{debug, warn};

/// Concatenated, still padded, block payloads
#[derive(Debug, Clone)]
pub struct DecodedBlocks {
    /// Decompressed bytes of every block, in order
    pub payload: Vec<u8>,
    /// Number of data blocks decoded
    pub block_count: usize,
    /// Why block reading ended
    pub stop: StopReason,
}

impl DecodedBlocks {
    /// Truncation details when the input ended inside a block
    pub fn truncation(&self) -> Option<Truncation> {
        match self.stop {
            StopReason::Truncated(t) => Some(t),
            _ => None,
        }
    }
}

/// Decoded JSON text plus what was learned about the container on the way
#[derive(Debug, Clone)]
pub struct DecodedText {
    /// Cleaned JSON text
    pub text: String,
    /// Length of the opaque header skipped before the first block
    pub header_len: usize,
    /// Number of data blocks decoded
    pub block_count: usize,
    /// Why block reading ended
    pub stop: StopReason,
}

impl DecodedText {
    /// Truncation details when the input ended inside a block
    pub fn truncation(&self) -> Option<Truncation> {
        match self.stop {
            StopReason::Truncated(t) => Some(t),
            _ => None,
        }
    }
}

/// Block decoder
pub struct BlockDecoder<'a> {
    opts: &'a DecodeOpts,
    payload: Vec<u8>,
    block_count: usize,
}

impl<'a> BlockDecoder<'a> {
    /// Create new block decoder
    pub fn new(opts: &'a DecodeOpts) -> Self {
        Self {
            opts,
            payload: Vec::new(),
            block_count: 0,
        }
    }

    /// Decompress one block and append it to the output.
    pub fn push_block(&mut self, block: &RawBlock<'_>) -> Result<()> {
        let limits = &self.opts.limits;
        let expected = block.header.uncompressed_size as usize;

        if expected > limits.max_block_uncompressed_len {
            return Err(SaveError::LimitExceeded(format!(
                "Block {} declares {} uncompressed bytes, limit {}",
                block.index, expected, limits.max_block_uncompressed_len
            )));
        }
        let total = self.payload.len().saturating_add(expected);
        if total > limits.max_total_uncompressed_len {
            return Err(SaveError::LimitExceeded(format!(
                "Uncompressed total {} exceeds limit {}",
                total, limits.max_total_uncompressed_len
            )));
        }

        let start = self.payload.len();
        self.payload.resize(total, 0);
        let written = lz4_flex::block::decompress_into(block.payload, &mut self.payload[start..])
            .map_err(|e| SaveError::Decompress {
                block: block.index,
                message: e.to_string(),
            })?;
        if written != expected {
            return Err(SaveError::SizeMismatch {
                block: block.index,
                expected,
                actual: written,
            });
        }

        debug!(
            block = block.index,
            offset = block.offset,
            compressed = block.header.compressed_size,
            uncompressed = expected,
            "decoded block"
        );
        self.block_count += 1;
        Ok(())
    }

    /// Number of blocks decoded so far
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Finish decoding, returning the raw payload
    pub fn finish(self, stop: StopReason) -> DecodedBlocks {
        DecodedBlocks {
            payload: self.payload,
            block_count: self.block_count,
            stop,
        }
    }
}

/// Decode every block of a block region (bytes starting at the first block).
///
/// Reading stops at the first word that is not the block magic, at the
/// terminal sentinel, or at the end of input. Any decompression failure aborts
/// the whole decode. A block that runs past the end of the input stops reading
/// and, unless `opts.strict` is set, keeps what was accumulated so far.
pub fn decode_blocks(bytes: &[u8], opts: &DecodeOpts) -> Result<DecodedBlocks> {
    let mut decoder = BlockDecoder::new(opts);
    let mut iter = BlockIter::new(bytes);

    for block in iter.by_ref() {
        decoder.push_block(&block)?;
    }

    let stop = iter
        .stop_reason()
        .unwrap_or(StopReason::EndOfData { offset: bytes.len() });

    if let StopReason::Truncated(truncation) = stop {
        if opts.strict {
            return Err(truncation.into());
        }
        warn!(
            block = truncation.block,
            offset = truncation.offset,
            declared = truncation.declared,
            available = truncation.available,
            "truncated stream, keeping decoded prefix"
        );
    }

    Ok(decoder.finish(stop))
}

/// Strip NUL padding and cut the text after the last `}` or `]`.
///
/// Text without any closing bracket is returned with only the NULs removed.
pub fn clean_json_text(raw: &str) -> String {
    let mut text: String = raw.chars().filter(|&c| c != '\0').collect();
    if let Some(last) = text.rfind(|c: char| c == '}' || c == ']') {
        text.truncate(last + 1);
    }
    text
}

/// Decode a block region into cleaned JSON text.
pub fn decode_text(bytes: &[u8], opts: &DecodeOpts) -> Result<DecodedText> {
    let blocks = decode_blocks(bytes, opts)?;
    let raw = String::from_utf8_lossy(&blocks.payload);
    Ok(DecodedText {
        text: clean_json_text(&raw),
        header_len: 0,
        block_count: blocks.block_count,
        stop: blocks.stop,
    })
}
