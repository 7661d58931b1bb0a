//! Block header framing and raw block iteration

use crate::constants::{BLOCK_HEADER_LEN, BLOCK_MAGIC, RESERVED_WORD, SENTINEL_LEN};
use crate::error::SaveError;

/// Block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Length of the LZ4 payload following the header
    pub compressed_size: u32,
    /// Length of the payload once decompressed
    pub uncompressed_size: u32,
    /// Reserved word, written as zero and ignored on read
    pub reserved: u32,
}

impl BlockHeader {
    /// Header for a data block
    pub fn new(compressed_size: u32, uncompressed_size: u32) -> Self {
        Self {
            compressed_size,
            uncompressed_size,
            reserved: RESERVED_WORD,
        }
    }

    /// Header of the terminal sentinel
    pub fn sentinel() -> Self {
        Self::new(0, 0)
    }

    /// True when this header carries no payload and marks end-of-stream
    pub fn is_sentinel(&self) -> bool {
        self.compressed_size == 0
    }

    /// Encode header to bytes, magic included
    pub fn encode(&self) -> [u8; BLOCK_HEADER_LEN] {
        let mut out = [0u8; BLOCK_HEADER_LEN];
        out[0..4].copy_from_slice(&BLOCK_MAGIC.to_le_bytes());
        out[4..8].copy_from_slice(&self.compressed_size.to_le_bytes());
        out[8..12].copy_from_slice(&self.uncompressed_size.to_le_bytes());
        out[12..16].copy_from_slice(&self.reserved.to_le_bytes());
        out
    }

    /// Decode header from bytes.
    ///
    /// Returns `None` when fewer than [`BLOCK_HEADER_LEN`] bytes are available or
    /// the leading word is not the block magic.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < BLOCK_HEADER_LEN || read_u32_le(bytes, 0)? != BLOCK_MAGIC {
            return None;
        }

        Some(Self {
            compressed_size: read_u32_le(bytes, 4)?,
            uncompressed_size: read_u32_le(bytes, 8)?,
            reserved: read_u32_le(bytes, 12)?,
        })
    }
}

/// Read a little-endian u32 at `pos`, if four bytes are available
pub fn read_u32_le(bytes: &[u8], pos: usize) -> Option<u32> {
    let end = pos.checked_add(4)?;
    let word = bytes.get(pos..end)?;
    Some(u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
}

/// One framed block borrowed from a container
#[derive(Debug, Clone, Copy)]
pub struct RawBlock<'a> {
    /// Zero-based block index
    pub index: usize,
    /// Offset of the block header within the scanned bytes
    pub offset: usize,
    /// Decoded block header
    pub header: BlockHeader,
    /// Compressed payload, exactly `header.compressed_size` bytes
    pub payload: &'a [u8],
}

/// Details of a block that ran past the end of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncation {
    /// Zero-based index of the truncated block
    pub block: usize,
    /// Offset of the truncated block header
    pub offset: usize,
    /// Bytes required from `offset` onwards
    pub declared: usize,
    /// Bytes available from `offset` onwards
    pub available: usize,
}

impl From<Truncation> for SaveError {
    fn from(t: Truncation) -> Self {
        SaveError::TruncatedStream {
            block: t.block,
            offset: t.offset,
            declared: t.declared,
            available: t.available,
        }
    }
}

/// Why block iteration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Fewer than four bytes remained
    EndOfData {
        /// Offset where iteration stopped
        offset: usize,
    },
    /// A word other than the block magic was found (padding or trailing data)
    ForeignMagic {
        /// Offset of the foreign word
        offset: usize,
    },
    /// The terminal sentinel was reached
    Sentinel {
        /// Offset of the sentinel header
        offset: usize,
    },
    /// A block header or payload extends past the end of the input
    Truncated(Truncation),
}

/// Iterator over the framed blocks of a container body
#[derive(Debug, Clone)]
pub struct BlockIter<'a> {
    bytes: &'a [u8],
    pos: usize,
    index: usize,
    stop: Option<StopReason>,
}

impl<'a> BlockIter<'a> {
    /// Iterate blocks starting at the beginning of `bytes`
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            index: 0,
            stop: None,
        }
    }

    /// Reason iteration ended, once it has
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    /// Current read cursor
    pub fn position(&self) -> usize {
        self.pos
    }

    fn halt(&mut self, reason: StopReason) -> Option<RawBlock<'a>> {
        self.stop = Some(reason);
        None
    }
}

impl<'a> Iterator for BlockIter<'a> {
    type Item = RawBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stop.is_some() {
            return None;
        }

        let offset = self.pos;
        let rest = &self.bytes[offset..];

        let magic = match read_u32_le(rest, 0) {
            Some(magic) => magic,
            None => return self.halt(StopReason::EndOfData { offset }),
        };
        if magic != BLOCK_MAGIC {
            return self.halt(StopReason::ForeignMagic { offset });
        }

        let header = match BlockHeader::decode(rest) {
            Some(header) => header,
            None => {
                return self.halt(StopReason::Truncated(Truncation {
                    block: self.index,
                    offset,
                    declared: BLOCK_HEADER_LEN,
                    available: rest.len(),
                }))
            }
        };

        if header.is_sentinel() {
            self.pos += SENTINEL_LEN;
            return self.halt(StopReason::Sentinel { offset });
        }

        // Saturates on targets where the declared size does not fit
        let declared = usize::try_from(header.compressed_size)
            .ok()
            .and_then(|len| len.checked_add(BLOCK_HEADER_LEN))
            .unwrap_or(usize::MAX);
        if rest.len() < declared {
            return self.halt(StopReason::Truncated(Truncation {
                block: self.index,
                offset,
                declared,
                available: rest.len(),
            }));
        }

        let block = RawBlock {
            index: self.index,
            offset,
            header,
            payload: &rest[BLOCK_HEADER_LEN..declared],
        };
        self.pos += declared;
        self.index += 1;
        Some(block)
    }
}
