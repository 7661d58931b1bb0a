//! Security limits and configuration

/// Limits applied while decoding, since block sizes come from the stream itself
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum uncompressed size a single block may declare (default: 64 MiB)
    pub max_block_uncompressed_len: usize,
    /// Maximum uncompressed total across all blocks (default: 1 GiB)
    pub max_total_uncompressed_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_block_uncompressed_len: 64 * 1024 * 1024,
            max_total_uncompressed_len: 1024 * 1024 * 1024,
        }
    }
}
