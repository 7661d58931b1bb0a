//! Open save workflow: load, edit, write back

use crate::document::{decode_document, encode_document};
use crate::mapping::MappingTable;
use crate::remap::{to_readable, to_short};
use crate::session::EditSession;
use hg_codec::{DecodeOpts, EncodeOpts};
use hg_format::{Result, Truncation};
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Write options
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Copy the previous file to `<file>.bak` before overwriting it
    pub backup: bool,
    /// Indent exported JSON
    pub pretty_export: bool,
    /// Block encoding options
    pub encode: EncodeOpts,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            backup: true,
            pretty_export: false,
            encode: EncodeOpts::default(),
        }
    }
}

/// Outcome of a write
#[derive(Debug, Clone)]
pub struct SaveReport {
    /// File written
    pub path: PathBuf,
    /// Backup copy of the previous contents, if one was made
    pub backup: Option<PathBuf>,
    /// Bytes written
    pub bytes_written: usize,
}

/// A save file opened for editing.
///
/// The session holds the document with readable keys; keys are translated
/// back to their short form on every write.
#[derive(Debug)]
pub struct OpenSave<'t> {
    path: PathBuf,
    original: Vec<u8>,
    table: &'t MappingTable,
    session: EditSession,
    options: SaveOptions,
    header_len: usize,
    truncation: Option<Truncation>,
}

impl<'t> OpenSave<'t> {
    /// Read, decode and remap the save at `path`.
    pub fn open(path: impl AsRef<Path>, table: &'t MappingTable, opts: &DecodeOpts) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let original = fs::read(&path)?;
        let decoded = decode_document(&original, opts)?;
        let truncation = decoded.truncation();
        if let Some(t) = &truncation {
            warn!(path = %path.display(), block = t.block, "save file is truncated, editing the readable prefix");
        }

        let readable = to_readable(&decoded.document, table);
        info!(
            path = %path.display(),
            blocks = decoded.block_count,
            header_len = decoded.header_len,
            mapped = table.is_loaded(),
            "opened save"
        );
        Ok(Self {
            path,
            original,
            table,
            session: EditSession::build(readable),
            options: SaveOptions::default(),
            header_len: decoded.header_len,
            truncation,
        })
    }

    /// Replace the write options.
    pub fn with_options(mut self, options: SaveOptions) -> Self {
        self.options = options;
        self
    }

    /// File this save was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length of the opaque header of the opened file
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Truncation report when the opened file ended inside a block
    pub fn truncation(&self) -> Option<Truncation> {
        self.truncation
    }

    /// Edit session over the readable document
    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Mutable edit session
    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    /// Document with short keys, as it would be written
    pub fn short_document(&self) -> Value {
        to_short(self.session.document(), self.table)
    }

    /// Write the document back to the file it was opened from.
    ///
    /// The header is taken from the file as it is on disk now. The previous
    /// contents are copied to `<file>.bak` first when backups are enabled.
    /// Dirty markers are cleared once the write succeeds.
    pub fn save(&mut self) -> Result<SaveReport> {
        let on_disk = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.original.clone(),
            Err(e) => return Err(e.into()),
        };
        let bytes = encode_document(&on_disk, &self.short_document(), &self.options.encode)?;

        let backup = if self.options.backup && self.path.exists() {
            let backup = backup_path(&self.path);
            fs::copy(&self.path, &backup)?;
            Some(backup)
        } else {
            None
        };

        write_file(&self.path, &bytes)?;
        self.original = bytes;
        self.session.commit();

        info!(path = %self.path.display(), bytes = self.original.len(), "saved");
        Ok(SaveReport {
            path: self.path.clone(),
            backup,
            bytes_written: self.original.len(),
        })
    }

    /// Write the document to another file, keeping the opened file's header.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<SaveReport> {
        let path = path.as_ref();
        let bytes = encode_document(&self.original, &self.short_document(), &self.options.encode)?;
        write_file(path, &bytes)?;
        self.session.commit();

        info!(path = %path.display(), bytes = bytes.len(), "saved as");
        Ok(SaveReport {
            path: path.to_path_buf(),
            backup: None,
            bytes_written: bytes.len(),
        })
    }

    /// Write the readable document as JSON.
    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let text = if self.options.pretty_export {
            serde_json::to_string_pretty(self.session.document())?
        } else {
            serde_json::to_string(self.session.document())?
        };
        write_file(path.as_ref(), text.as_bytes())?;
        Ok(text.len())
    }
}

/// `<file>.bak` beside `path`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}
