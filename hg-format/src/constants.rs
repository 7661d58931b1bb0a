//! Constants and magic numbers for the hg container format

/// Block magic, stored little-endian on disk as `E5 A1 ED FE`.
pub const BLOCK_MAGIC: u32 = 0xFEED_A1E5;

/// Block magic as it appears in the byte stream.
pub const BLOCK_MAGIC_BYTES: [u8; 4] = BLOCK_MAGIC.to_le_bytes();

/// Uncompressed size of every data block written by the encoder (64 KiB).
pub const BLOCK_SIZE: usize = 0x10000;

/// Length of a block header: magic, compressed size, uncompressed size, reserved.
pub const BLOCK_HEADER_LEN: usize = 16;

/// Length of the terminal sentinel: magic followed by 12 zero bytes.
pub const SENTINEL_LEN: usize = BLOCK_HEADER_LEN;

/// Value written to the reserved header word.
pub const RESERVED_WORD: u32 = 0;
