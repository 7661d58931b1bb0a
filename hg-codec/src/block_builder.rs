//! Block builder: JSON text to fixed-size LZ4 blocks

use crate::EncodeOpts;
use hg_format::{BlockHeader, Result, SaveError};
use tracing::debug;

/// Encoded blocks produced by [`BlockBuilder::finish`]
#[derive(Debug, Clone)]
pub struct BlockData {
    /// Data blocks followed by the terminal sentinel
    pub bytes: Vec<u8>,
    /// Number of data blocks written (sentinel excluded)
    pub blocks_written: usize,
    /// Input bytes consumed
    pub input_len: usize,
}

/// Block builder that slices its input into zero-padded fixed-size blocks
pub struct BlockBuilder {
    /// Encoding options
    opts: EncodeOpts,
    /// Current block, always `block_size` long
    buffer: Vec<u8>,
    /// Bytes of `buffer` holding input
    filled: usize,
    /// Encoded blocks so far
    out: Vec<u8>,
    blocks_written: usize,
    input_len: usize,
}

impl BlockBuilder {
    /// Create new block builder
    pub fn new(opts: EncodeOpts) -> Result<Self> {
        if opts.block_size == 0 || u32::try_from(opts.block_size).is_err() {
            return Err(SaveError::LimitExceeded(format!(
                "Block size {} must be between 1 and {}",
                opts.block_size,
                u32::MAX
            )));
        }

        Ok(Self {
            buffer: vec![0u8; opts.block_size],
            opts,
            filled: 0,
            out: Vec::new(),
            blocks_written: 0,
            input_len: 0,
        })
    }

    /// Append input bytes, emitting a block each time the buffer fills up
    pub fn push(&mut self, mut data: &[u8]) {
        self.input_len += data.len();

        while !data.is_empty() {
            let take = (self.opts.block_size - self.filled).min(data.len());
            self.buffer[self.filled..self.filled + take].copy_from_slice(&data[..take]);
            self.filled += take;
            data = &data[take..];

            if self.filled == self.opts.block_size {
                self.flush_block();
            }
        }
    }

    /// Number of data blocks emitted so far
    pub fn blocks_written(&self) -> usize {
        self.blocks_written
    }

    /// Flush the partial block (zero-padded) and append the terminal sentinel
    pub fn finish(mut self) -> BlockData {
        if self.filled > 0 {
            self.flush_block();
        }
        self.out
            .extend_from_slice(&BlockHeader::sentinel().encode());

        BlockData {
            bytes: self.out,
            blocks_written: self.blocks_written,
            input_len: self.input_len,
        }
    }

    fn flush_block(&mut self) {
        // The whole buffer is compressed, so a short final block carries its zero padding
        let compressed = lz4_flex::block::compress(&self.buffer);
        let header = BlockHeader::new(compressed.len() as u32, self.opts.block_size as u32);

        self.out.extend_from_slice(&header.encode());
        self.out.extend_from_slice(&compressed);

        debug!(
            block = self.blocks_written,
            filled = self.filled,
            compressed = compressed.len(),
            "encoded block"
        );

        self.blocks_written += 1;
        self.buffer.fill(0);
        self.filled = 0;
    }
}

/// Encode `data` into framed blocks followed by the terminal sentinel.
pub fn encode_blocks(data: &[u8], opts: &EncodeOpts) -> Result<BlockData> {
    let mut builder = BlockBuilder::new(opts.clone())?;
    builder.push(data);
    Ok(builder.finish())
}
