//! Dragging and nudging elements.

use super::{BoardPlugin, Flow, doc_point};
use crate::board::Board;
use crate::elements::{ElementId, Node};
use crate::error::BoardResult;
use crate::events::BoardEvent;
use crate::geometry::bounding_box;
use crate::input::{KeyInput, MouseButton, PointerInput};
use crate::operation::Transaction;
use crate::refline::{RefLine, RefLines, RefRect};
use crate::transforms::{drop_into_frames, frame_at, move_elements, move_transaction, refresh_selection, update_selection};
use crate::tree;
use kurbo::Point;
use std::sync::Arc;

const SELECTION_KEY: &str = "moving-selection";

#[derive(Debug)]
struct Gesture {
    base: Arc<[Node]>,
    start: Point,
    ids: Vec<ElementId>,
    moved: bool,
}

/// Moves the selection, or the top-most element under the pointer, and
/// re-homes dropped elements into or out of frames.
#[derive(Debug, Default)]
pub struct MovePlugin {
    gesture: Option<Gesture>,
}

/// The moved tree for the pointer at `point`, snapped unless `snap` is off,
/// plus the guides to show.
fn preview(board: &Board, gesture: &Gesture, point: Point, snap: bool) -> BoardResult<(Transaction, Vec<RefLine>)> {
    let registry = board.registry();
    let mut offset = point - gesture.start;
    let tx = move_transaction(&gesture.base, registry, &gesture.ids, offset.x, offset.y)?;

    let mut moving: Vec<ElementId> = Vec::new();
    for id in &gesture.ids {
        if let Some(node) = tree::find(&gesture.base, id) {
            tree::walk(std::slice::from_ref(node), &mut |n: &Node, _: &[usize]| moving.push(n.id.clone()));
        }
    }
    let Some(current) = bounding_box(
        gesture
            .ids
            .iter()
            .filter_map(|id| tx.find(id))
            .filter(|n| !n.is_arrow())
            .map(|n| n.bbox()),
    ) else {
        return Ok((tx, Vec::new()));
    };

    let mut lines = RefLines::new();
    lines.set_ref_rects(
        tree::flatten(&gesture.base)
            .into_iter()
            .filter(|n| !n.is_arrow() && !moving.contains(&n.id))
            .map(|n| RefRect::new(n.id.clone(), n.bbox()))
            .collect(),
    );
    lines.set_current(vec![RefRect::new(SELECTION_KEY, current)]);
    let distance = board.config().snap_distance / board.viewport().zoom;
    let outcome = lines.update_current(snap, distance, None);
    if outcome.offset.x == 0.0 && outcome.offset.y == 0.0 {
        return Ok((tx, outcome.guides));
    }
    offset += outcome.offset;
    let tx = move_transaction(&gesture.base, registry, &gesture.ids, offset.x, offset.y)?;
    Ok((tx, outcome.guides))
}

/// Frame the first droppable moved element would land in.
fn drop_target(children: &[Node], ids: &[ElementId]) -> Option<ElementId> {
    ids.iter()
        .filter_map(|id| tree::find(children, id))
        .find_map(|node| frame_at(children, node))
        .map(|frame| frame.id.clone())
}

fn current_nodes(board: &Board, ids: &[ElementId]) -> Vec<Node> {
    ids.iter().filter_map(|id| board.find(id).cloned()).collect()
}

impl MovePlugin {
    fn commit(board: &mut Board, gesture: &Gesture, point: Point, snap: bool) -> BoardResult<()> {
        let (mut tx, _) = preview(board, gesture, point, snap)?;
        drop_into_frames(&mut tx, &gesture.ids)?;
        board.restore_children(gesture.base.clone());
        let report = board.apply(tx.into_ops(), true);
        if !report.is_complete() {
            log::warn!("move committed with {} skipped operations", report.skipped.len());
        }
        let moved = current_nodes(board, &gesture.ids);
        update_selection(board, moved.clone());
        board.emit(BoardEvent::ElementMoveEnd(moved));
        Ok(())
    }
}

impl BoardPlugin for MovePlugin {
    fn name(&self) -> &'static str {
        "move"
    }

    fn on_pointer_down(&mut self, board: &mut Board, input: &PointerInput) -> Flow {
        // Multi-select clicks stay with the select plugin.
        if input.button != MouseButton::Left || input.modifiers.is_mod() || board.is_readonly() {
            return Flow::Continue;
        }
        let start = doc_point(board, input);
        let hit = board.hit_elements(start);
        let selection = board.selection();
        let ids = if hit.iter().any(|n| selection.is_selected(&n.id)) {
            selection.ids()
        } else {
            match hit.last() {
                Some(top) => vec![top.id.clone()],
                None => return Flow::Continue,
            }
        };
        self.gesture = Some(Gesture {
            base: board.snapshot(),
            start,
            ids,
            moved: false,
        });
        Flow::Continue
    }

    fn on_pointer_move(&mut self, board: &mut Board, input: &PointerInput) -> Flow {
        let Some(gesture) = self.gesture.as_mut() else {
            return Flow::Continue;
        };
        let point = doc_point(board, input);
        if !gesture.moved {
            if (point - gesture.start).hypot() <= board.config().move_threshold {
                return Flow::Continue;
            }
            gesture.moved = true;
        }
        match preview(board, gesture, point, !input.modifiers.alt) {
            Ok((tx, guides)) => {
                let target = drop_target(tx.children(), &gesture.ids);
                board.restore_children(gesture.base.clone());
                board.apply(tx.into_ops(), false);
                board.set_guides(guides);
                board.set_drop_target(target);
                refresh_selection(board);
                let moved = current_nodes(board, &gesture.ids);
                board.emit(BoardEvent::ElementMove(moved));
            }
            Err(err) => log::warn!("move preview failed: {}", err),
        }
        Flow::Stop
    }

    fn on_pointer_up(&mut self, board: &mut Board, input: &PointerInput) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        if gesture.moved {
            let point = doc_point(board, input);
            if let Err(err) = Self::commit(board, &gesture, point, !input.modifiers.alt) {
                log::warn!("move commit failed: {}", err);
                board.restore_children(gesture.base.clone());
            }
        }
        board.set_guides(Vec::new());
        board.set_drop_target(None);
    }

    fn on_key_down(&mut self, board: &mut Board, input: &KeyInput) -> Flow {
        let Some(direction) = input.arrow_direction() else {
            return Flow::Continue;
        };
        if input.modifiers.is_mod() || board.selection().is_empty() || board.is_readonly() {
            return Flow::Continue;
        }
        let config = board.config();
        let step = if input.modifiers.alt { config.precise_nudge_step } else { config.nudge_step };
        let delta = direction * step;
        let ids = board.selection().ids();
        if let Err(err) = move_elements(board, &ids, delta.x, delta.y) {
            log::warn!("nudge failed: {}", err);
        }
        Flow::Stop
    }
}
