//! Container header location
//!
//! Everything before the first block magic is an opaque header that must be
//! preserved byte-for-byte when the container is rewritten.

use crate::constants::BLOCK_MAGIC_BYTES;
use crate::error::{Result, SaveError};

/// Offset of the first block magic in `bytes`, if any
pub fn find_magic(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(BLOCK_MAGIC_BYTES.len())
        .position(|window| window == BLOCK_MAGIC_BYTES)
}

/// Opaque bytes preceding the first block of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader<'a> {
    bytes: &'a [u8],
}

impl<'a> ContainerHeader<'a> {
    /// Locate the header of an existing container.
    ///
    /// Fails with [`SaveError::InvalidContainer`] when no block magic is present.
    pub fn locate(container: &'a [u8]) -> Result<Self> {
        let offset = find_magic(container).ok_or(SaveError::InvalidContainer)?;
        Ok(Self {
            bytes: &container[..offset],
        })
    }

    /// Header bytes, possibly empty
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Header length, which is also the offset of the first block
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the container starts directly with a block
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Split a container into its header and the block region that follows.
pub fn split_container(container: &[u8]) -> Result<(ContainerHeader<'_>, &[u8])> {
    let header = ContainerHeader::locate(container)?;
    Ok((header, &container[header.len()..]))
}
