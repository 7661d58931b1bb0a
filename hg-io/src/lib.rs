//! hg I/O - Documents, key mapping and edit sessions
//!
//! This crate provides the document layer on top of the block codec:
//!
//! - Container ↔ `serde_json::Value` decoding and encoding
//! - The short ↔ readable key mapping table and deep key remapping
//! - Node paths with optional field lookups
//! - Edit sessions with per-node dirty tracking and revert
//! - The open/edit/save workflow with `.bak` backups, and save folder scanning
//!
//! ```no_run
//! use hg_io::{DecodeOpts, MappingTable, NodePath, OpenSave};
//!
//! # fn main() -> hg_io::Result<()> {
//! let table = MappingTable::from_path("mapping.json")?;
//! let mut save = OpenSave::open("save2.hg", &table, &DecodeOpts::default())?;
//! let units = NodePath::parse("/PlayerStateData/Units")?;
//! save.session_mut().set_path(&units, serde_json::json!(100_000))?;
//! save.save()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod document;
pub mod folder;
pub mod mapping;
pub mod path;
pub mod remap;
pub mod save;
pub mod session;

// Re-export commonly used types
pub use hg_codec::{DecodeOpts, EncodeOpts};
pub use hg_format::{ErrorKind, Limits, Result, SaveError, StopReason, Truncation};

pub use document::{canonical_json, decode_document, encode_document, DecodedDocument};
pub use folder::{is_save_slot_name, load_all_saves, most_recent_save};
pub use mapping::{global, init_global, MappingSource, MappingTable, MAPPING_ENV_VAR};
pub use path::{NodePath, PathSegment, ValueExt};
pub use remap::{to_readable, to_short};
pub use save::{backup_path, OpenSave, SaveOptions, SaveReport};
pub use session::{EditSession, NodeId};
