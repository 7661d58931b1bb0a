//! Edit tracking over a decoded document
//!
//! [`EditSession::build`] creates one node per value in the tree (the root,
//! every object field and every array element) and keeps the load-time
//! document as the snapshot every node is compared against. Nodes are
//! addressed by [`NodeId`] handles into an arena and carry their
//! [`NodePath`], so dirty tracking and revert stay correct however the live
//! tree is edited.
//!
//! Per node the state is either Clean or Dirty:
//!
//! - `set_value` makes a node Dirty when its canonical serialization differs
//!   from the snapshot, Clean when it matches
//! - `revert` restores the snapshot and makes the node and its descendants Clean
//! - both re-evaluate the node's descendants and ancestors the same way, so a
//!   parent reads Dirty while any edit below it is live; detached descendants
//!   read Clean
//! - `commit` makes every node Clean without touching values; snapshots are
//!   never replaced, so later edits still compare against the load-time content

use crate::document::canonical_json;
use crate::path::{NodePath, PathSegment};
use hg_format::{Result, SaveError};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Handle of a node in an [`EditSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in the session arena
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct EditNode {
    path: NodePath,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    dirty: bool,
}

/// A document under edit
#[derive(Debug, Clone)]
pub struct EditSession {
    document: Value,
    original: Value,
    nodes: Vec<EditNode>,
    index: HashMap<NodePath, NodeId>,
}

impl EditSession {
    /// Build a session over `root`, snapshotting it as the original state.
    pub fn build(root: Value) -> Self {
        let mut session = Self {
            document: Value::Null,
            original: Value::Null,
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        session.add_node(&root, NodePath::root(), None);
        session.original = root.clone();
        session.document = root;
        debug!(nodes = session.nodes.len(), "built edit session");
        session
    }

    fn add_node(&mut self, value: &Value, path: NodePath, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(EditNode {
            path: path.clone(),
            parent,
            children: Vec::new(),
            dirty: false,
        });
        self.index.insert(path.clone(), id);

        let children: Vec<NodeId> = match value {
            Value::Object(fields) => fields
                .iter()
                .map(|(key, child)| self.add_node(child, path.key(key.as_str()), Some(id)))
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, child)| self.add_node(child, path.index(i), Some(id)))
                .collect(),
            _ => Vec::new(),
        };
        self.nodes[id.0].children = children;
        id
    }

    fn node(&self, id: NodeId) -> Result<&EditNode> {
        self.nodes.get(id.0).ok_or(SaveError::UnknownNode(id.0))
    }

    /// Root node handle
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of tracked nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a session tracks at least the root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node at `path` as it existed at load time
    pub fn find(&self, path: &NodePath) -> Option<NodeId> {
        if let Some(id) = self.index.get(path) {
            return Some(*id);
        }
        // "/7" parses as an index but may name an object field
        let mut current = self.root();
        for segment in path.segments() {
            current = *self.nodes.get(current.0)?.children.iter().find(|child| {
                match (self.nodes[child.0].path.last(), segment) {
                    (Some(PathSegment::Key(key)), PathSegment::Index(i)) => *key == i.to_string(),
                    (Some(last), segment) => last == segment,
                    (None, _) => false,
                }
            })?;
        }
        Some(current)
    }

    /// Path of a node
    pub fn path(&self, id: NodeId) -> Option<&NodePath> {
        self.nodes.get(id.0).map(|node| &node.path)
    }

    /// Parent of a node, `None` for the root
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    /// Children of a node, in document order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Live value of a node, `None` if it no longer exists in the tree
    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.nodes.get(id.0)?.path.resolve(&self.document)
    }

    /// Load-time value of a node
    pub fn original(&self, id: NodeId) -> Option<&Value> {
        self.nodes.get(id.0)?.path.resolve(&self.original)
    }

    /// True when the node's live content differs from its snapshot
    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|node| node.dirty)
    }

    /// Dirty nodes in arena order
    pub fn dirty_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.dirty)
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// True when any node is dirty
    pub fn has_changes(&self) -> bool {
        self.nodes.iter().any(|node| node.dirty)
    }

    /// The live document
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Consume the session, returning the live document
    pub fn into_document(self) -> Value {
        self.document
    }

    /// Replace the live value at a node.
    ///
    /// Returns the node's new dirty state.
    pub fn set_value(&mut self, id: NodeId, value: Value) -> Result<bool> {
        let path = self.node(id)?.path.clone();
        path.set(&mut self.document, value)?;

        self.refresh(id);
        let dirty = self.nodes[id.0].dirty;
        debug!(path = %path, dirty, "set node value");
        Ok(dirty)
    }

    fn differs_from_original(&self, id: NodeId) -> bool {
        let path = &self.nodes[id.0].path;
        match (path.resolve(&self.document), path.resolve(&self.original)) {
            (Some(live), Some(original)) => canonical_json(live) != canonical_json(original),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Re-evaluate the flags of `id`, its descendants and its ancestors.
    fn refresh(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            self.nodes[current.0].dirty = self.differs_from_original(current);
            pending.extend_from_slice(&self.nodes[current.0].children);
        }

        let mut ancestor = self.nodes[id.0].parent;
        while let Some(current) = ancestor {
            self.nodes[current.0].dirty = self.differs_from_original(current);
            ancestor = self.nodes[current.0].parent;
        }
    }

    /// Replace the live value at the node addressed by `path`.
    pub fn set_path(&mut self, path: &NodePath, value: Value) -> Result<NodeId> {
        let id = self.find(path).ok_or_else(|| SaveError::InvalidPath {
            path: path.to_string(),
            reason: "no such node in the loaded document".to_string(),
        })?;
        self.set_value(id, value)?;
        Ok(id)
    }

    /// Restore a node from its snapshot.
    ///
    /// Returns false without changes when the node has no snapshot.
    pub fn revert(&mut self, id: NodeId) -> Result<bool> {
        let node = self.node(id)?;
        let Some(original) = node.path.resolve(&self.original) else {
            return Ok(false);
        };
        let path = node.path.clone();
        path.set(&mut self.document, original.clone())?;

        self.refresh(id);
        debug!(path = %path, "reverted node");
        Ok(true)
    }

    /// Clear every dirty flag, keeping values and snapshots.
    pub fn commit(&mut self) {
        for node in &mut self.nodes {
            node.dirty = false;
        }
    }
}
