//! Node paths into a document tree
//!
//! A [`NodePath`] is a stable address of a node: a list of object keys and
//! array indices from the root. Paths render as RFC 6901 JSON Pointers
//! (`/Inventory/Slots/3/Amount`) and every lookup returns an `Option`, so a
//! missing field is an ordinary outcome rather than an error.

use crate::mapping::MappingTable;
use hg_format::{Result, SaveError};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One step from a node to a child
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Object field
    Key(String),
    /// Array element
    Index(usize),
}

/// Address of a node, from the document root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    /// The document root
    pub fn root() -> Self {
        Self::default()
    }

    /// Path from explicit segments
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Parse a JSON Pointer.
    ///
    /// Tokens that are canonical decimal integers become [`PathSegment::Index`];
    /// when such a token names an object field, [`resolve`](Self::resolve)
    /// still finds it.
    pub fn parse(pointer: &str) -> Result<Self> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let rest = pointer.strip_prefix('/').ok_or_else(|| SaveError::InvalidPath {
            path: pointer.to_string(),
            reason: "pointer must start with '/' (or be empty for the root)".to_string(),
        })?;

        let mut segments = Vec::new();
        for raw in rest.split('/') {
            validate_escapes(raw).map_err(|reason| SaveError::InvalidPath {
                path: pointer.to_string(),
                reason,
            })?;
            let token = unescape_token(raw);
            segments.push(match parse_index(&token) {
                Some(index) => PathSegment::Index(index),
                None => PathSegment::Key(token),
            });
        }
        Ok(Self { segments })
    }

    /// Segments from the root
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// True for the document root
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Child path through an object field
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathSegment::Key(key.into()))
    }

    /// Child path through an array element
    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    /// Child path through `segment`
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// Parent path, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// Last segment, `None` for the root
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// True when `self` is `other` or lies beneath it
    pub fn starts_with(&self, other: &NodePath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Node at this path, if present.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| step(node, segment))
    }

    /// Mutable node at this path, if present.
    pub fn resolve_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| step_mut(node, segment))
    }

    /// Replace the node at this path.
    ///
    /// Setting an absent object field inserts it at the end of the object.
    /// Returns the previous value. Fails when the parent does not exist or
    /// an array index is out of range.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<Option<Value>> {
        let Some((last, parent_segments)) = self.segments.split_last() else {
            return Ok(Some(std::mem::replace(root, value)));
        };
        let parent = parent_segments
            .iter()
            .try_fold(root, |node, segment| step_mut(node, segment))
            .ok_or_else(|| SaveError::NodeDetached(self.to_string()))?;

        match (parent, last) {
            (Value::Object(fields), PathSegment::Key(key)) => Ok(fields.insert(key.clone(), value)),
            (Value::Object(fields), PathSegment::Index(index)) => {
                Ok(fields.insert(index.to_string(), value))
            }
            (Value::Array(items), PathSegment::Index(index)) => match items.get_mut(*index) {
                Some(slot) => Ok(Some(std::mem::replace(slot, value))),
                None => Err(SaveError::NodeDetached(self.to_string())),
            },
            _ => Err(SaveError::NodeDetached(self.to_string())),
        }
    }

    /// Translate key segments from readable to short names.
    pub fn to_short(&self, table: &MappingTable) -> Self {
        self.map_keys(|key| table.lookup_short(key).to_string())
    }

    /// Translate key segments from short to readable names.
    pub fn to_readable(&self, table: &MappingTable) -> Self {
        self.map_keys(|key| table.lookup_readable(key).to_string())
    }

    fn map_keys(&self, rename: impl Fn(&str) -> String) -> Self {
        let segments = self
            .segments
            .iter()
            .map(|segment| match segment {
                PathSegment::Key(key) => PathSegment::Key(rename(key)),
                PathSegment::Index(index) => PathSegment::Index(*index),
            })
            .collect();
        Self { segments }
    }
}

fn step<'a>(node: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (node, segment) {
        (Value::Object(fields), PathSegment::Key(key)) => fields.get(key),
        (Value::Object(fields), PathSegment::Index(index)) => fields.get(&index.to_string()),
        (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
        _ => None,
    }
}

fn step_mut<'a>(node: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    match (node, segment) {
        (Value::Object(fields), PathSegment::Key(key)) => fields.get_mut(key),
        (Value::Object(fields), PathSegment::Index(index)) => fields.get_mut(&index.to_string()),
        (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
        _ => None,
    }
}

fn parse_index(token: &str) -> Option<usize> {
    let canonical = token == "0" || (!token.starts_with('0') && !token.is_empty());
    if canonical && token.bytes().all(|b| b.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

/// Unescape a JSON Pointer token (`~1` → `/`, `~0` → `~`)
fn unescape_token(token: &str) -> String {
    // ~1 first so "~01" yields "~1"
    token.replace("~1", "/").replace("~0", "~")
}

/// Escape a string for use as a JSON Pointer token
fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn validate_escapes(token: &str) -> std::result::Result<(), String> {
    let mut chars = token.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') | Some('1') => {}
                Some(other) => {
                    return Err(format!(
                        "invalid escape sequence '~{other}', use '~0' for '~' and '~1' for '/'"
                    ))
                }
                None => return Err("incomplete escape sequence at end of token".to_string()),
            }
        }
    }
    Ok(())
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => write!(f, "/{}", escape_token(key))?,
                PathSegment::Index(index) => write!(f, "/{index}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = SaveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Optional lookups on document values
pub trait ValueExt {
    /// Object field named `key`
    fn field(&self, key: &str) -> Option<&Value>;
    /// Array element at `index`
    fn item(&self, index: usize) -> Option<&Value>;
    /// Node at `path`
    fn at(&self, path: &NodePath) -> Option<&Value>;
}

impl ValueExt for Value {
    fn field(&self, key: &str) -> Option<&Value> {
        self.as_object()?.get(key)
    }

    fn item(&self, index: usize) -> Option<&Value> {
        self.as_array()?.get(index)
    }

    fn at(&self, path: &NodePath) -> Option<&Value> {
        path.resolve(self)
    }
}
