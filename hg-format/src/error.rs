//! Error types shared by the hg crates

use thiserror::Error;

/// Errors raised while decoding, encoding, remapping or editing a save.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The encode target holds no block magic anywhere, so it is not a container.
    #[error("Invalid container: no block magic found")]
    InvalidContainer,
    /// The LZ4 decompressor rejected a block payload.
    #[error("Decompression error in block {block}: {message}")]
    Decompress {
        /// Zero-based index of the failing block.
        block: usize,
        /// Message reported by the decompressor.
        message: String,
    },
    /// A block decompressed to a different length than its header declares.
    #[error("Block {block} decompressed to {actual} bytes, header declares {expected}")]
    SizeMismatch {
        /// Zero-based index of the failing block.
        block: usize,
        /// Uncompressed size declared by the block header.
        expected: usize,
        /// Bytes actually produced by the decompressor.
        actual: usize,
    },
    /// Fewer bytes remain than a block header declares.
    #[error(
        "Truncated stream at offset {offset}: block {block} declares {declared} bytes, {available} available"
    )]
    TruncatedStream {
        /// Zero-based index of the truncated block.
        block: usize,
        /// Byte offset of the truncated block header.
        offset: usize,
        /// Bytes the block header requires.
        declared: usize,
        /// Bytes left in the input.
        available: usize,
    },
    /// A configured decoding limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    /// Decoding succeeded but left no JSON text behind.
    #[error("Container holds no JSON payload")]
    EmptyPayload,
    /// The key mapping resource could not be read or understood.
    #[error("Mapping load error: {0}")]
    MappingLoad(String),
    /// A node path could not be parsed.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// Offending path text.
        path: String,
        /// What is wrong with it.
        reason: String,
    },
    /// An edit handle does not belong to the session.
    #[error("Unknown edit node #{0}")]
    UnknownNode(usize),
    /// The parent of a node no longer exists in the live tree.
    #[error("Node '{0}' is detached from the document")]
    NodeDetached(String),
    /// I/O operation failed while reading or writing data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a [`SaveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Block payload could not be decompressed or decoded.
    Decode,
    /// Encode target is not a recognized container.
    InvalidContainer,
    /// Input ended inside a block.
    TruncatedStream,
    /// Mapping resource unreadable or malformed.
    MappingLoad,
    /// Malformed node path.
    Path,
    /// Edit session misuse.
    Session,
    /// Filesystem failure.
    Io,
    /// JSON syntax or serialization failure.
    Json,
}

impl SaveError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SaveError::InvalidContainer => ErrorKind::InvalidContainer,
            SaveError::Decompress { .. }
            | SaveError::SizeMismatch { .. }
            | SaveError::LimitExceeded(_)
            | SaveError::EmptyPayload => ErrorKind::Decode,
            SaveError::TruncatedStream { .. } => ErrorKind::TruncatedStream,
            SaveError::MappingLoad(_) => ErrorKind::MappingLoad,
            SaveError::InvalidPath { .. } => ErrorKind::Path,
            SaveError::UnknownNode(_) | SaveError::NodeDetached(_) => ErrorKind::Session,
            SaveError::Io(_) => ErrorKind::Io,
            SaveError::Json(_) => ErrorKind::Json,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SaveError>;
