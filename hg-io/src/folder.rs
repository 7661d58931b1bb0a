//! Save folder scanning

use crate::document::decode_document;
use hg_codec::DecodeOpts;
use hg_format::{Result, SaveError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Save container file extension
pub const SAVE_EXTENSION: &str = "hg";

/// Decode every `*.hg` file in `folder`, keyed by file name.
///
/// Files that fail to decode are logged and skipped.
pub fn load_all_saves(folder: impl AsRef<Path>, opts: &DecodeOpts) -> Result<BTreeMap<String, Value>> {
    let mut saves = BTreeMap::new();
    for entry in fs::read_dir(folder.as_ref())? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(SAVE_EXTENSION) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };

        match fs::read(&path).map_err(SaveError::from).and_then(|bytes| decode_document(&bytes, opts)) {
            Ok(decoded) => {
                debug!(file = %name, blocks = decoded.block_count, "loaded save");
                saves.insert(name, decoded.document);
            }
            Err(e) => warn!(file = %name, error = %e, "failed to load save"),
        }
    }
    Ok(saves)
}

/// True for `save<N>.hg` names; manifest files (`mf_save<N>.hg`) do not match
pub fn is_save_slot_name(name: &str) -> bool {
    name.strip_prefix("save")
        .and_then(|rest| rest.strip_suffix(".hg"))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Most recently modified `save<N>.hg` in `folder`, if any.
pub fn most_recent_save(folder: impl AsRef<Path>) -> Result<Option<PathBuf>> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(folder.as_ref())? {
        let entry = entry?;
        let name = entry.file_name();
        if !name.to_str().is_some_and(is_save_slot_name) {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if latest.as_ref().map_or(true, |(newest, _)| modified > *newest) {
            latest = Some((modified, entry.path()));
        }
    }
    Ok(latest.map(|(_, path)| path))
}
