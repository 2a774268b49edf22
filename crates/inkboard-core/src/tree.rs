//! Path-addressed queries and edits over an element tree.
//!
//! Edits go through `Arc::make_mut`, so only the nodes along the edited path
//! are copied and every other subtree stays shared with earlier snapshots.

use crate::elements::{BoardElement, Frame, Node};
use crate::error::{BoardError, BoardResult};
use crate::operation::{Operation, Path, Props};
use std::sync::Arc;

/// What a single tree operation did.
#[derive(Debug, Clone)]
pub enum TreeChange {
    Inserted(Node),
    Removed(Node),
    Moved(Node),
    Patched(Node),
}

pub fn node_at<'a>(children: &'a [Node], path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let mut node = children.get(*first)?;
    for index in rest {
        node = node.children().get(*index)?;
    }
    Some(node)
}

/// Mutable access to the node at `path`, un-sharing every node on the way.
pub fn node_at_mut<'a>(children: &'a mut Vec<Node>, path: &[usize]) -> Option<&'a mut BoardElement> {
    let (first, rest) = path.split_first()?;
    let mut node = Arc::make_mut(children.get_mut(*first)?);
    for index in rest {
        node = Arc::make_mut(node.children_mut()?.get_mut(*index)?);
    }
    Some(node)
}

fn siblings_mut<'a>(children: &'a mut Vec<Node>, parent: &[usize]) -> Option<&'a mut Vec<Node>> {
    if parent.is_empty() {
        Some(children)
    } else {
        node_at_mut(children, parent)?.children_mut()
    }
}

pub fn path_of(children: &[Node], id: &str) -> Option<Path> {
    for (index, node) in children.iter().enumerate() {
        if node.id == id {
            return Some(vec![index]);
        }
        if let Some(mut rest) = path_of(node.children(), id) {
            rest.insert(0, index);
            return Some(rest);
        }
    }
    None
}

pub fn find<'a>(children: &'a [Node], id: &str) -> Option<&'a Node> {
    path_of(children, id).and_then(|path| node_at(children, &path))
}

/// The frame directly containing `id`, if it is not at the top level.
pub fn parent_of<'a>(children: &'a [Node], id: &str) -> Option<&'a Node> {
    let path = path_of(children, id)?;
    if path.len() < 2 {
        return None;
    }
    node_at(children, &path[..path.len() - 1])
}

/// Depth-first walk in render order: a frame is visited before its children.
pub fn walk<'a>(children: &'a [Node], visit: &mut impl FnMut(&'a Node, &[usize])) {
    fn inner<'a>(children: &'a [Node], prefix: &mut Vec<usize>, visit: &mut impl FnMut(&'a Node, &[usize])) {
        for (index, node) in children.iter().enumerate() {
            prefix.push(index);
            visit(node, prefix);
            inner(node.children(), prefix, visit);
            prefix.pop();
        }
    }
    inner(children, &mut Vec::new(), visit);
}

/// Every node in render order.
pub fn flatten(children: &[Node]) -> Vec<Node> {
    let mut out = Vec::new();
    walk(children, &mut |node, _| out.push(node.clone()));
    out
}

pub fn insert_at(children: &mut Vec<Node>, path: &[usize], node: Node) -> BoardResult<()> {
    let Some((&index, parent)) = path.split_last() else {
        return Err(BoardError::InvalidPath(path.to_vec()));
    };
    if !parent.is_empty() {
        let parent_node = node_at(children, parent).ok_or_else(|| BoardError::PathNotFound(parent.to_vec()))?;
        if !parent_node.is_frame() {
            return Err(BoardError::InvalidPath(path.to_vec()));
        }
        if !Frame::can_nest(&node) {
            return Err(BoardError::InvalidNesting {
                frame: parent_node.id.clone(),
                child: node.id.clone(),
            });
        }
    }
    let siblings = siblings_mut(children, parent).ok_or_else(|| BoardError::PathNotFound(parent.to_vec()))?;
    if index > siblings.len() {
        return Err(BoardError::InvalidPath(path.to_vec()));
    }
    siblings.insert(index, node);
    Ok(())
}

pub fn remove_at(children: &mut Vec<Node>, path: &[usize]) -> BoardResult<Node> {
    let Some((&index, parent)) = path.split_last() else {
        return Err(BoardError::InvalidPath(path.to_vec()));
    };
    if node_at(children, path).is_none() {
        return Err(BoardError::PathNotFound(path.to_vec()));
    }
    let siblings = siblings_mut(children, parent).ok_or_else(|| BoardError::PathNotFound(path.to_vec()))?;
    Ok(siblings.remove(index))
}

/// Merge a `set_node` patch into `element`.
pub fn patch_element(element: &BoardElement, before: &Props, after: &Props) -> serde_json::Result<BoardElement> {
    let mut props = element.to_props()?;
    for key in before.keys() {
        if !after.contains_key(key) {
            props.remove(key);
        }
    }
    for (key, value) in after {
        if value.is_null() {
            props.remove(key);
        } else {
            props.insert(key.clone(), value.clone());
        }
    }
    BoardElement::from_props(props)
}

/// Apply one tree operation in place. Selection and viewport operations are rejected.
pub fn apply_op(children: &mut Vec<Node>, op: &Operation) -> BoardResult<TreeChange> {
    match op {
        Operation::InsertNode { path, node } => {
            insert_at(children, path, node.clone())?;
            Ok(TreeChange::Inserted(node.clone()))
        }
        Operation::RemoveNode { path, .. } => remove_at(children, path).map(TreeChange::Removed),
        Operation::MoveNode { path, new_path } => {
            let node = remove_at(children, path)?;
            if let Err(err) = insert_at(children, new_path, node.clone()) {
                // Put it back so a failed move leaves the tree untouched
                insert_at(children, path, node)?;
                return Err(err);
            }
            Ok(TreeChange::Moved(node))
        }
        Operation::SetNode { path, before, after } => {
            let current = node_at(children, path).ok_or_else(|| BoardError::PathNotFound(path.clone()))?;
            let patched = patch_element(current, before, after).map_err(|source| BoardError::InvalidPatch {
                path: path.clone(),
                source,
            })?;
            let slot = node_at_mut(children, path).ok_or_else(|| BoardError::PathNotFound(path.clone()))?;
            *slot = patched;
            let node = node_at(children, path)
                .cloned()
                .ok_or_else(|| BoardError::PathNotFound(path.clone()))?;
            Ok(TreeChange::Patched(node))
        }
        Operation::SetSelection { .. } | Operation::SetViewport { .. } => Err(BoardError::InvalidPath(Vec::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementKind, Geometry};
    use crate::geometry::BBox;
    use serde_json::json;

    fn rect(id: &str) -> Node {
        BoardElement::with_id(id, ElementKind::Geometry(Geometry::rect(BBox::new(0.0, 0.0, 10.0, 10.0)))).into_node()
    }

    fn frame(id: &str, children: Vec<Node>) -> Node {
        let mut f = Frame::new(BBox::new(0.0, 0.0, 100.0, 100.0), id);
        f.children = children;
        BoardElement::with_id(id, ElementKind::Frame(f)).into_node()
    }

    fn tree() -> Vec<Node> {
        vec![rect("a"), frame("f", vec![rect("b"), rect("c")]), rect("d")]
    }

    #[test]
    fn test_queries() {
        let children = tree();
        assert_eq!(path_of(&children, "c"), Some(vec![1, 1]));
        assert_eq!(node_at(&children, &[1, 0]).map(|n| n.id.as_str()), Some("b"));
        assert_eq!(parent_of(&children, "b").map(|n| n.id.as_str()), Some("f"));
        assert!(parent_of(&children, "a").is_none());
        let order: Vec<_> = flatten(&children).iter().map(|n| n.id.clone()).collect();
        assert_eq!(order, ["a", "f", "b", "c", "d"]);
    }

    #[test]
    fn test_edit_shares_untouched_subtrees() {
        let original = tree();
        let mut draft = original.clone();
        let op = Operation::set_node(vec![0], &original[0], &{
            let mut a = (*original[0]).clone();
            a.translate(1.0, 0.0);
            a
        })
        .unwrap();
        apply_op(&mut draft, &op).unwrap();
        assert!(!Arc::ptr_eq(&original[0], &draft[0]));
        assert!(Arc::ptr_eq(&original[1], &draft[1]));
        assert_eq!(original[0].bbox().x, 0.0);
    }

    #[test]
    fn test_move_into_and_out_of_frame() {
        let mut children = tree();
        // "d" detached from [2] lands as the frame's third child
        apply_op(&mut children, &Operation::MoveNode { path: vec![2], new_path: vec![1, 2] }).unwrap();
        assert_eq!(path_of(&children, "d"), Some(vec![1, 2]));
        apply_op(&mut children, &Operation::MoveNode { path: vec![1, 2], new_path: vec![2] }).unwrap();
        assert_eq!(path_of(&children, "d"), Some(vec![2]));
    }

    #[test]
    fn test_nesting_rejected() {
        let mut children = tree();
        let err = insert_at(&mut children, &[1, 0], frame("g", vec![])).unwrap_err();
        assert!(matches!(err, BoardError::InvalidNesting { .. }));
        let err = insert_at(&mut children, &[0, 0], rect("x")).unwrap_err();
        assert!(matches!(err, BoardError::InvalidPath(_)));
    }

    #[test]
    fn test_patch_deletes_missing_and_null_keys() {
        let mut element = (*rect("a")).clone();
        if let ElementKind::Geometry(g) = &mut element.kind {
            g.fill = Some("red".into());
            g.stroke = Some("blue".into());
        }
        let before = json!({"fill": "red", "stroke": "blue"});
        let after = json!({"stroke": null, "width": 20.0});
        let patched = patch_element(
            &element,
            before.as_object().unwrap(),
            after.as_object().unwrap(),
        )
        .unwrap();
        let props = patched.to_props().unwrap();
        assert!(!props.contains_key("fill"));
        assert!(!props.contains_key("stroke"));
        assert_eq!(patched.bbox().width, 20.0);
    }

    #[test]
    fn test_missing_path() {
        let mut children = tree();
        let op = Operation::SetNode { path: vec![9], before: Props::new(), after: Props::new() };
        assert!(matches!(apply_op(&mut children, &op), Err(BoardError::PathNotFound(_))));
        assert!(matches!(remove_at(&mut children, &[]), Err(BoardError::InvalidPath(_))));
    }
}
