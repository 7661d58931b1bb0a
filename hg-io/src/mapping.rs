//! Short key ↔ readable key translation table
//!
//! A mapping resource is JSON in one of two shapes:
//!
//! ```text
//! { "<short>": "<readable>", ... }
//! { "Mapping": [ { "Key": "<short>", "Value": "<readable>" }, ... ] }
//! ```
//!
//! Lookups never fail: a key the table does not know is returned unchanged.
//! An unloaded table is therefore the identity mapping.

use hg_format::{Result, SaveError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Environment variable naming the mapping file used by [`global`]
pub const MAPPING_ENV_VAR: &str = "HGSAVE_MAPPING";

const LEGACY_FIELD: &str = "Mapping";

/// Bidirectional key translation table
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    forward: HashMap<String, String>,
    reverse: HashMap<String, String>,
    // Insertion order of short keys, for stable iteration
    order: Vec<String>,
    loaded: bool,
}

/// Where a mapping table comes from
#[derive(Debug, Clone)]
pub enum MappingSource {
    /// JSON file on disk
    Path(PathBuf),
    /// In-memory JSON text
    Json(String),
    /// No mapping; every lookup is the identity
    Identity,
}

impl MappingTable {
    /// Table that maps every key to itself.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Parse a mapping resource in the flat or legacy shape.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SaveError::MappingLoad(format!("malformed mapping JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Read and parse a mapping resource.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| SaveError::MappingLoad(format!("unreadable mapping resource: {e}")))?;
        Self::from_json_str(&text)
    }

    /// Load a mapping file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SaveError::MappingLoad(format!("cannot read '{}': {e}", path.display()))
        })?;
        let table = Self::from_json_str(&text)?;
        info!(path = %path.display(), entries = table.len(), "loaded key mapping");
        Ok(table)
    }

    /// Build a table from an already parsed resource.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            SaveError::MappingLoad("mapping resource must be a JSON object".to_string())
        })?;

        let pairs = match object.get(LEGACY_FIELD) {
            Some(Value::Array(entries)) if object.len() == 1 => legacy_pairs(entries),
            _ => flat_pairs(object)?,
        };

        let mut table = Self {
            loaded: true,
            ..Self::default()
        };
        for (short, readable) in pairs {
            if table.forward.insert(short.clone(), readable).is_none() {
                table.order.push(short);
            }
        }
        // Reverse map is derived once; duplicate readable names keep the last short key
        for short in &table.order {
            table.reverse.insert(table.forward[short].clone(), short.clone());
        }
        Ok(table)
    }

    /// Load `source`, degrading to the identity table when it cannot be read.
    pub fn load_or_identity(source: &MappingSource) -> Self {
        let loaded = match source {
            MappingSource::Path(path) => Self::from_path(path),
            MappingSource::Json(text) => Self::from_json_str(text),
            MappingSource::Identity => return Self::identity(),
        };
        loaded.unwrap_or_else(|e| {
            warn!(error = %e, "key mapping unavailable, showing raw keys");
            Self::identity()
        })
    }

    /// Readable name for a short key, or the key itself.
    pub fn lookup_readable<'a>(&'a self, short: &'a str) -> &'a str {
        self.forward.get(short).map(String::as_str).unwrap_or(short)
    }

    /// Short key for a readable name, or the name itself.
    pub fn lookup_short<'a>(&'a self, readable: &'a str) -> &'a str {
        self.reverse.get(readable).map(String::as_str).unwrap_or(readable)
    }

    /// Number of short → readable entries
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// True when the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// True once a mapping resource has been loaded successfully
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Entries as `(short, readable)` in resource order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.order
            .iter()
            .map(move |short| (short.as_str(), self.forward[short].as_str()))
    }
}

fn flat_pairs(object: &Map<String, Value>) -> Result<Vec<(String, String)>> {
    object
        .iter()
        .map(|(short, readable)| match readable {
            Value::String(readable) => Ok((short.clone(), readable.clone())),
            other => Err(SaveError::MappingLoad(format!(
                "value for key '{short}' must be a string, found {other}"
            ))),
        })
        .collect()
}

fn legacy_pairs(entries: &[Value]) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let key = entry.get("Key").and_then(Value::as_str);
        let value = entry.get("Value").and_then(Value::as_str);
        match (key, value) {
            (Some(key), Some(value)) => pairs.push((key.to_string(), value.to_string())),
            _ => debug!(index = idx, "skipping incomplete legacy mapping entry"),
        }
    }
    pairs
}

static GLOBAL: OnceLock<MappingTable> = OnceLock::new();

/// Install the process-wide table.
///
/// Returns false if a table was already installed; the existing table is kept.
pub fn init_global(source: &MappingSource) -> bool {
    let mut installed = false;
    GLOBAL.get_or_init(|| {
        installed = true;
        MappingTable::load_or_identity(source)
    });
    installed
}

/// The process-wide table.
///
/// First access without [`init_global`] loads the file named by
/// `HGSAVE_MAPPING`, or falls back to the identity table.
pub fn global() -> &'static MappingTable {
    GLOBAL.get_or_init(|| match std::env::var_os(MAPPING_ENV_VAR) {
        Some(path) => MappingTable::load_or_identity(&MappingSource::Path(PathBuf::from(path))),
        None => MappingTable::identity(),
    })
}
