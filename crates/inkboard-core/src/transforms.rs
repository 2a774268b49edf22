//! Multi-operation edits shared by the gesture plugins and the host.
//!
//! Builders take a tree snapshot and return a [`Transaction`]; the `Board`
//! level helpers apply it as one undo step.

use crate::board::{ApplyReport, Board};
use crate::collab::{CollabError, ResourceFile, ResourceUploader};
use crate::elements::{ArrowEnd, BoardElement, ElementKind, Frame, Image, Node, Video};
use crate::error::{BoardError, BoardResult};
use crate::events::BoardEvent;
use crate::geometry::{BBox, bounding_box};
use crate::operation::{Operation, Transaction};
use crate::plugins::{Registry, RichTextBehavior};
use crate::selection::{SelectArea, Selection};
use crate::tree;
use crate::viewport::ViewPort;
use kurbo::{Point, Vec2};
use serde_json::Value;

/// Size of freshly inserted images and videos.
pub const MEDIA_WIDTH: f64 = 400.0;
pub const MEDIA_HEIGHT: f64 = 300.0;

fn subtree_ids(node: &Node, out: &mut Vec<String>) {
    tree::walk(std::slice::from_ref(node), &mut |n: &Node, _: &[usize]| out.push(n.id.clone()));
}

/// `ids` without the elements whose frame is also listed.
fn roots<'a>(children: &'a [Node], ids: &[String]) -> Vec<&'a Node> {
    ids.iter()
        .filter(|id| !tree::parent_of(children, id).is_some_and(|p| ids.contains(&p.id)))
        .filter_map(|id| tree::find(children, id))
        .collect()
}

/// The arrow with its bound endpoints moved onto the current bind points,
/// or `None` when nothing changes.
pub fn follow_bindings(children: &[Node], registry: &Registry, element: &BoardElement) -> Option<BoardElement> {
    let arrow = element.as_arrow()?;
    let resolve = |end: &ArrowEnd| -> Option<Point> {
        let (id, connect_id) = end.binding()?;
        let Some(target) = tree::find(children, id) else {
            log::debug!("arrow {} bound to missing element {}", element.id, id);
            return None;
        };
        registry.arrow_bind_point(target, connect_id)
    };
    let start = resolve(&arrow.source);
    let end = resolve(&arrow.target);

    let mut updated = element.clone();
    let arrow = updated.as_arrow_mut()?;
    if let Some(point) = start {
        arrow.set_start(point);
    }
    if let Some(point) = end {
        arrow.set_end(point);
    }
    (updated != *element).then_some(updated)
}

/// Re-derive the endpoints of every arrow bound to one of `ids`.
pub fn sync_bound_arrows(tx: &mut Transaction, registry: &Registry, ids: &[String]) -> BoardResult<()> {
    let arrows: Vec<Node> = tree::flatten(tx.children())
        .into_iter()
        .filter(|n| n.as_arrow().is_some_and(|a| ids.iter().any(|id| a.is_bound_to(id))))
        .collect();
    for arrow in arrows {
        if let Some(updated) = follow_bindings(tx.children(), registry, &arrow) {
            tx.set_element(&updated)?;
        }
    }
    Ok(())
}

/// Move `ids` by `(dx, dy)` and let bound arrows follow.
///
/// Children of a frame that is moved too travel with the frame; elements
/// that cannot move on their own stay put.
pub fn move_transaction(children: &[Node], registry: &Registry, ids: &[String], dx: f64, dy: f64) -> BoardResult<Transaction> {
    let mut tx = Transaction::new(children);
    let mut touched = Vec::new();
    for node in roots(children, ids) {
        let Some(moved) = registry.move_element(node, dx, dy) else {
            continue;
        };
        tx.set_element(&moved)?;
        subtree_ids(node, &mut touched);
    }
    sync_bound_arrows(&mut tx, registry, &touched)?;
    Ok(tx)
}

/// Top-most frame that would take `element` as a child at its current bounds.
pub fn frame_at<'a>(children: &'a [Node], element: &BoardElement) -> Option<&'a Node> {
    if !Frame::can_nest(element) {
        return None;
    }
    let bbox = element.bbox();
    children
        .iter()
        .rev()
        .filter(|n| n.id != element.id)
        .find(|n| n.as_frame().is_some_and(|f| f.contains_bbox(&bbox)))
}

/// Move `element_id` to the end of frame `frame_id`'s children.
pub fn move_into_frame(tx: &mut Transaction, element_id: &str, frame_id: &str) -> BoardResult<()> {
    let path = tx
        .path_of(element_id)
        .ok_or_else(|| BoardError::ElementNotFound(element_id.to_string()))?;
    let mut scratch = tx.children().to_vec();
    let node = tree::remove_at(&mut scratch, &path)?;
    if !Frame::can_nest(&node) {
        return Err(BoardError::InvalidNesting {
            frame: frame_id.to_string(),
            child: element_id.to_string(),
        });
    }
    let mut new_path = tree::path_of(&scratch, frame_id).ok_or_else(|| BoardError::ElementNotFound(frame_id.to_string()))?;
    let len = tree::node_at(&scratch, &new_path).map(|f| f.children().len()).unwrap_or_default();
    new_path.push(len);
    tx.move_to(element_id, new_path)
}

/// Move `element_id` to the top of the top level.
pub fn move_out_of_frame(tx: &mut Transaction, element_id: &str) -> BoardResult<()> {
    let path = tx
        .path_of(element_id)
        .ok_or_else(|| BoardError::ElementNotFound(element_id.to_string()))?;
    let mut scratch = tx.children().to_vec();
    tree::remove_at(&mut scratch, &path)?;
    tx.move_to(element_id, vec![scratch.len()])
}

/// Re-home dropped elements: into the frame they now sit in, or out of the
/// frame they left. Frames receiving children grow to fit them.
pub fn drop_into_frames(tx: &mut Transaction, ids: &[String]) -> BoardResult<()> {
    for id in ids {
        let Some(node) = tx.find(id).cloned() else {
            continue;
        };
        if !Frame::can_nest(&node) {
            continue;
        }
        let target = frame_at(tx.children(), &node).map(|f| f.id.clone());
        let current = tree::parent_of(tx.children(), id).map(|p| p.id.clone());
        if target == current {
            if target.is_some() {
                crate::plugins::expand_parent_frame(tx, id)?;
            }
            continue;
        }
        match target {
            Some(frame_id) => {
                move_into_frame(tx, id, &frame_id)?;
                crate::plugins::expand_parent_frame(tx, id)?;
                log::debug!("dropped {} into frame {}", id, frame_id);
            }
            None => {
                move_out_of_frame(tx, id)?;
                log::debug!("dropped {} out of its frame", id);
            }
        }
    }
    Ok(())
}

/// Nudge or move the elements as one undo step and announce the move.
pub fn move_elements(board: &mut Board, ids: &[String], dx: f64, dy: f64) -> BoardResult<ApplyReport> {
    let tx = move_transaction(board.children(), board.registry(), ids, dx, dy)?;
    let report = board.apply(tx.into_ops(), true);
    refresh_selection(board);
    let moved: Vec<Node> = ids.iter().filter_map(|id| board.find(id).cloned()).collect();
    board.emit(BoardEvent::ElementMoveEnd(moved));
    Ok(report)
}

/// Delete elements with the compensating edits in the same undo step:
/// arrows bound to a removed element are unbound, frames take their children
/// with them and the selection drops removed elements.
pub fn remove_elements(board: &mut Board, ids: &[String]) -> BoardResult<ApplyReport> {
    let children = board.snapshot();
    let roots = roots(&children, ids);
    let mut removed = Vec::new();
    for root in &roots {
        subtree_ids(root, &mut removed);
    }
    if removed.is_empty() {
        return Ok(ApplyReport::default());
    }

    let mut tx = Transaction::new(&children);
    for node in tree::flatten(&children) {
        if removed.contains(&node.id) || !node.is_arrow() {
            continue;
        }
        let mut updated = (*node).clone();
        if let Some(arrow) = updated.as_arrow_mut() {
            for end in [&mut arrow.source, &mut arrow.target] {
                if end.binding().is_some_and(|(id, _)| removed.iter().any(|r| r == id)) {
                    end.unbind();
                }
            }
        }
        if updated != *node {
            tx.set_element(&updated)?;
        }
    }
    for root in &roots {
        tx.remove(&root.id)?;
    }

    let mut ops = tx.into_ops();
    let before = board.selection().clone();
    let after = Selection::of(
        before
            .selected_elements
            .iter()
            .filter(|e| !removed.contains(&e.id))
            .cloned()
            .collect(),
    );
    if after != before {
        ops.push(Operation::SetSelection { before, after });
    }
    log::debug!("removing {} elements", removed.len());
    Ok(board.apply(ops, true))
}

/// Lift a frame's children to the top level and delete the frame, in one undo step.
pub fn unwrap_frame(board: &mut Board, frame_id: &str) -> BoardResult<ApplyReport> {
    let frame = board
        .find(frame_id)
        .cloned()
        .ok_or_else(|| BoardError::ElementNotFound(frame_id.to_string()))?;
    if !frame.is_frame() {
        return Err(BoardError::ElementNotFound(frame_id.to_string()));
    }
    let mut tx = Transaction::new(board.children());
    for child in frame.children() {
        move_out_of_frame(&mut tx, &child.id)?;
    }
    tx.remove(frame_id)?;
    Ok(board.apply(tx.into_ops(), true))
}

fn find_element(board: &Board, id: &str) -> BoardResult<Node> {
    board
        .find(id)
        .cloned()
        .ok_or_else(|| BoardError::ElementNotFound(id.to_string()))
}

/// Record `updated` in place of `before`. A size change drags bound arrows
/// along and grows the enclosing frame in the same undo step.
fn commit_element_update(board: &mut Board, before: &BoardElement, updated: BoardElement) -> BoardResult<ApplyReport> {
    let mut tx = Transaction::new(board.children());
    tx.set_element(&updated)?;
    if updated.bbox() != before.bbox() {
        sync_bound_arrows(&mut tx, board.registry(), std::slice::from_ref(&updated.id))?;
        crate::plugins::expand_parent_frame(&mut tx, &updated.id)?;
    }
    let report = board.apply(tx.into_ops(), true);
    refresh_selection(board);
    Ok(report)
}

/// Feed the editor's laid-out size back into a rich text or card element.
/// Ignored once the element has been resized by hand.
pub fn editor_size_change(board: &mut Board, id: &str, width: f64, height: f64) -> BoardResult<ApplyReport> {
    let node = find_element(board, id)?;
    match RichTextBehavior::editor_size_change(&node, width, height) {
        Some(updated) => commit_element_update(board, &node, updated),
        None => Ok(ApplyReport::default()),
    }
}

/// Store edited rich text content.
pub fn content_change(board: &mut Board, id: &str, content: Value) -> BoardResult<ApplyReport> {
    let node = find_element(board, id)?;
    match RichTextBehavior::content_change(&node, content) {
        Some(updated) => commit_element_update(board, &node, updated),
        None => Ok(ApplyReport::default()),
    }
}

pub fn remove_auto_focus(board: &mut Board, id: &str) -> BoardResult<ApplyReport> {
    let node = find_element(board, id)?;
    match RichTextBehavior::remove_auto_focus(&node) {
        Some(updated) => commit_element_update(board, &node, updated),
        None => Ok(ApplyReport::default()),
    }
}

/// Insert an element at the top of the board, optionally selecting it.
pub fn insert_element(board: &mut Board, element: BoardElement, select: bool) -> BoardResult<Node> {
    let node = element.into_node();
    let path = vec![board.children().len()];
    let report = board.apply([Operation::insert(path, node.clone())], true);
    if let Some((_, err)) = report.skipped.into_iter().next() {
        return Err(err);
    }
    if select {
        update_selection(board, vec![node.clone()]);
    }
    Ok(node)
}

/// Upload pasted bytes and place the resulting image or video centered on `at`.
pub async fn insert_resource(
    board: &mut Board,
    uploader: &dyn ResourceUploader,
    file: &ResourceFile,
    at: Point,
) -> Result<Node, CollabError> {
    if !file.is_image() && !file.is_video() {
        return Err(CollabError::Other(format!("unsupported resource type {}", file.mime)));
    }
    let url = uploader.upload_resource(file).await?;
    let bbox = BBox::new(at.x - MEDIA_WIDTH / 2.0, at.y - MEDIA_HEIGHT / 2.0, MEDIA_WIDTH, MEDIA_HEIGHT);
    let kind = if file.is_video() {
        ElementKind::Video(Video::new(bbox, url))
    } else {
        ElementKind::Image(Image::new(bbox, url))
    };
    insert_element(board, BoardElement::new(kind), true).map_err(|err| CollabError::Other(err.to_string()))
}

/// Replace the selection with `elements`. Never recorded in history.
pub fn update_selection(board: &mut Board, elements: Vec<Node>) -> ApplyReport {
    set_selection(board, Selection::of(elements))
}

pub fn set_selection(board: &mut Board, after: Selection) -> ApplyReport {
    let before = board.selection().clone();
    if before == after {
        return ApplyReport::default();
    }
    board.apply([Operation::SetSelection { before, after }], false)
}

/// Update the lasso rectangle, keeping the selected elements.
pub fn set_select_area(board: &mut Board, area: Option<SelectArea>, elements: Vec<Node>) -> ApplyReport {
    set_selection(board, Selection {
        select_area: area,
        selected_elements: elements,
    })
}

/// Re-snapshot the selected elements from the current tree, dropping deleted ones.
pub fn refresh_selection(board: &mut Board) -> ApplyReport {
    let fresh: Vec<Node> = board
        .selection()
        .selected_elements
        .iter()
        .filter_map(|e| board.find(&e.id).cloned())
        .collect();
    let area = board.selection().select_area;
    set_select_area(board, area, fresh)
}

/// Select every element, frame children included.
pub fn select_all(board: &mut Board) -> ApplyReport {
    let all = tree::flatten(board.children());
    update_selection(board, all)
}

pub fn set_viewport(board: &mut Board, after: ViewPort) -> ApplyReport {
    let before = *board.viewport();
    if before == after {
        return ApplyReport::default();
    }
    board.apply([Operation::SetViewport { before, after }], false)
}

/// Pan so content follows a screen-space drag of `delta`.
pub fn pan_viewport(board: &mut Board, delta: Vec2) -> ApplyReport {
    let after = board.viewport().panned(delta);
    set_viewport(board, after)
}

/// Shift the window by `offset` document units.
pub fn scroll_viewport(board: &mut Board, offset: Vec2) -> ApplyReport {
    let current = *board.viewport();
    let after = ViewPort {
        min_x: current.min_x + offset.x,
        min_y: current.min_y + offset.y,
        ..current
    };
    set_viewport(board, after)
}

/// Zoom to `zoom` about the screen point `screen`.
pub fn zoom_viewport(board: &mut Board, screen: Point, zoom: f64) -> ApplyReport {
    let config = board.config();
    let after = board.viewport().zoomed_at(screen, zoom, config.min_zoom, config.max_zoom);
    set_viewport(board, after)
}

/// One zoom step in or out about `screen`.
pub fn zoom_step(board: &mut Board, screen: Point, zoom_in: bool) -> ApplyReport {
    let step = board.config().zoom_step;
    let current = board.viewport().zoom;
    let zoom = if zoom_in { current * step } else { current / step };
    zoom_viewport(board, screen, zoom)
}

/// Fit the viewport to the selection, or to every element when nothing is selected.
pub fn fit_viewport(board: &mut Board) -> ApplyReport {
    let bounds = if board.selection().is_empty() {
        bounding_box(board.children().iter().map(|n| n.bbox()))
    } else {
        bounding_box(board.selection().selected_elements.iter().map(|n| n.bbox()))
    };
    let Some(bounds) = bounds else {
        return ApplyReport::default();
    };
    let config = board.config();
    let after = board
        .viewport()
        .fit_to_bounds(bounds, config.fit_padding, config.min_zoom, config.max_zoom);
    set_viewport(board, after)
}
