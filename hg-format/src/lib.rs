//! hg Format - Core primitives for LZ4 block-framed save containers
//!
//! This crate provides the wire-level building blocks of the container format
//! with no I/O or compression dependencies. It includes:
//!
//! - Magic numbers and constants
//! - Block header framing and raw block iteration
//! - Container header location
//! - Error types
//! - Decoding limits

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod block;
pub mod constants;
pub mod error;
pub mod header;
pub mod limits;

// Re-export commonly used types
pub use block::{BlockHeader, BlockIter, RawBlock, StopReason, Truncation};
pub use error::{ErrorKind, Result, SaveError};
pub use header::{find_magic, split_container, ContainerHeader};
pub use limits::Limits;
