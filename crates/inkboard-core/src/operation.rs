//! Atomic board edits and batches.
//!
//! Every [`Operation`] carries enough state to be inverted exactly, so undo
//! never has to re-derive what an edit replaced.

use crate::elements::{BoardElement, Node};
use crate::error::{BoardError, BoardResult};
use crate::selection::Selection;
use crate::tree;
use crate::viewport::ViewPort;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Index sequence locating a node; nested indices descend into frame children.
pub type Path = Vec<usize>;

/// Shallow property map of an element.
pub type Props = Map<String, Value>;

/// One atomic edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Operation {
    InsertNode {
        path: Path,
        node: Node,
    },
    /// `node` is the removed pre-image.
    RemoveNode {
        path: Path,
        node: Node,
    },
    /// `new_path` addresses the node's location after it has been detached from `path`.
    MoveNode {
        path: Path,
        new_path: Path,
    },
    /// Keys of `before` missing from `after` are deleted; keys of `after` are set,
    /// a null value deleting the key.
    SetNode {
        path: Path,
        before: Props,
        after: Props,
    },
    SetSelection {
        before: Selection,
        after: Selection,
    },
    SetViewport {
        before: ViewPort,
        after: ViewPort,
    },
}

impl Operation {
    pub fn insert(path: Path, node: Node) -> Self {
        Operation::InsertNode { path, node }
    }

    pub fn remove(path: Path, node: Node) -> Self {
        Operation::RemoveNode { path, node }
    }

    /// Patch turning `before` into `after`, limited to the keys that differ.
    pub fn set_node(path: Path, before: &BoardElement, after: &BoardElement) -> BoardResult<Self> {
        let old = before.to_props()?;
        let new = after.to_props()?;
        let mut before_props = Props::new();
        let mut after_props = Props::new();
        for (key, value) in &old {
            match new.get(key) {
                None => {
                    before_props.insert(key.clone(), value.clone());
                }
                Some(next) if next != value => {
                    before_props.insert(key.clone(), value.clone());
                    after_props.insert(key.clone(), next.clone());
                }
                Some(_) => {}
            }
        }
        for (key, value) in &new {
            if !old.contains_key(key) {
                after_props.insert(key.clone(), value.clone());
            }
        }
        Ok(Operation::SetNode {
            path,
            before: before_props,
            after: after_props,
        })
    }

    /// The operation that undoes this one.
    pub fn inverse(&self) -> Operation {
        match self {
            Operation::InsertNode { path, node } => Operation::RemoveNode {
                path: path.clone(),
                node: node.clone(),
            },
            Operation::RemoveNode { path, node } => Operation::InsertNode {
                path: path.clone(),
                node: node.clone(),
            },
            Operation::MoveNode { path, new_path } => Operation::MoveNode {
                path: new_path.clone(),
                new_path: path.clone(),
            },
            Operation::SetNode { path, before, after } => Operation::SetNode {
                path: path.clone(),
                before: after.clone(),
                after: before.clone(),
            },
            Operation::SetSelection { before, after } => Operation::SetSelection {
                before: after.clone(),
                after: before.clone(),
            },
            Operation::SetViewport { before, after } => Operation::SetViewport {
                before: *after,
                after: *before,
            },
        }
    }

    /// True for operations that edit the element tree.
    pub fn is_tree_op(&self) -> bool {
        !matches!(
            self,
            Operation::SetSelection { .. } | Operation::SetViewport { .. }
        )
    }

    /// A `set_node` whose patch changes nothing.
    pub fn is_noop(&self) -> bool {
        match self {
            Operation::SetNode { before, after, .. } => before.is_empty() && after.is_empty(),
            Operation::MoveNode { path, new_path } => path == new_path,
            _ => false,
        }
    }
}

/// A batch under construction.
///
/// Operations are applied to a scratch copy of the tree as they are pushed,
/// so later operations address the tree as edited by earlier ones.
#[derive(Debug, Clone)]
pub struct Transaction {
    children: Vec<Node>,
    ops: Vec<Operation>,
}

impl Transaction {
    pub fn new(children: &[Node]) -> Self {
        Self {
            children: children.to_vec(),
            ops: Vec::new(),
        }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<Operation> {
        self.ops
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        tree::find(&self.children, id)
    }

    pub fn path_of(&self, id: &str) -> Option<Path> {
        tree::path_of(&self.children, id)
    }

    /// Apply `op` to the scratch tree and record it.
    pub fn push(&mut self, op: Operation) -> BoardResult<()> {
        if op.is_noop() {
            return Ok(());
        }
        tree::apply_op(&mut self.children, &op)?;
        self.ops.push(op);
        Ok(())
    }

    /// Replace the element with `updated.id` by `updated`.
    pub fn set_element(&mut self, updated: &BoardElement) -> BoardResult<()> {
        let path = self
            .path_of(&updated.id)
            .ok_or_else(|| BoardError::ElementNotFound(updated.id.clone()))?;
        let current = tree::node_at(&self.children, &path)
            .cloned()
            .ok_or_else(|| BoardError::PathNotFound(path.clone()))?;
        let op = Operation::set_node(path, &current, updated)?;
        self.push(op)
    }

    pub fn insert(&mut self, path: Path, node: Node) -> BoardResult<()> {
        self.push(Operation::insert(path, node))
    }

    /// Insert at the end of the top level.
    pub fn append(&mut self, node: Node) -> BoardResult<()> {
        let path = vec![self.children.len()];
        self.insert(path, node)
    }

    /// Remove the element with `id`, returning its pre-image.
    pub fn remove(&mut self, id: &str) -> BoardResult<Node> {
        let path = self
            .path_of(id)
            .ok_or_else(|| BoardError::ElementNotFound(id.to_string()))?;
        let node = tree::node_at(&self.children, &path)
            .cloned()
            .ok_or_else(|| BoardError::PathNotFound(path.clone()))?;
        self.push(Operation::remove(path, node.clone()))?;
        Ok(node)
    }

    /// Move the element with `id` to `new_path` (post-removal coordinates).
    pub fn move_to(&mut self, id: &str, new_path: Path) -> BoardResult<()> {
        let path = self
            .path_of(id)
            .ok_or_else(|| BoardError::ElementNotFound(id.to_string()))?;
        self.push(Operation::MoveNode { path, new_path })
    }
}
