//! Drawing arrows out of connection points and re-targeting arrow ends.
//!
//! While an arrow end is dragged, elements near the cursor broadcast their
//! connection points; the closest point within the bind distance wins and the
//! end snaps to it. Elements entering or leaving that neighbourhood are
//! announced so the host can show their connection points.

use super::{BoardPlugin, Flow, doc_point};
use crate::board::Board;
use crate::elements::{Arrow, ArrowEnd, BoardElement, ConnectId, ElementId, ElementKind, Marker, Node};
use crate::error::{BoardError, BoardResult};
use crate::events::BoardEvent;
use crate::input::{MouseButton, PointerInput};
use crate::operation::{Operation, Transaction};
use crate::transforms::update_selection;
use crate::tree;
use kurbo::Point;
use std::sync::Arc;

/// Screen distance the pointer travels before a drag starts.
const DRAG_START_DISTANCE: f64 = 5.0;

/// Which end of an arrow is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowEndSide {
    Source,
    Target,
}

#[derive(Debug, Clone)]
enum Origin {
    /// A new arrow leaving `element_id` at `connect_id`.
    Connect {
        element_id: ElementId,
        connect_id: ConnectId,
        start: Point,
    },
    /// An existing arrow end.
    Retarget { arrow_id: ElementId, side: ArrowEndSide },
}

#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    element_id: ElementId,
    connect_id: ConnectId,
    point: Point,
}

#[derive(Debug)]
struct Gesture {
    origin: Origin,
    base: Arc<[Node]>,
    down: Point,
    started: bool,
    preview_id: Option<ElementId>,
    closing: Vec<ElementId>,
    candidate: Option<Candidate>,
}

impl Gesture {
    fn arrow_id(&self) -> Option<&str> {
        match &self.origin {
            Origin::Retarget { arrow_id, .. } => Some(arrow_id),
            Origin::Connect { .. } => self.preview_id.as_deref(),
        }
    }
}

/// Creates and re-targets arrows by dragging.
#[derive(Debug, Default)]
pub struct ArrowBindPlugin {
    gesture: Option<Gesture>,
}

/// What the pointer grabbed: an end of a selected arrow, or a side
/// connection handle of a nearby element (selected elements first, then
/// top-most). The center point is a bind target only.
fn find_origin(board: &Board, point: Point) -> Option<Origin> {
    let config = board.config();
    let radius = config.connect_point_radius / board.viewport().zoom;
    let selection = board.selection();

    for selected in &selection.selected_elements {
        let Some(node) = board.find(&selected.id) else {
            continue;
        };
        let Some(arrow) = node.as_arrow() else {
            continue;
        };
        let ends = [(arrow.start(), ArrowEndSide::Source), (arrow.end(), ArrowEndSide::Target)];
        for (end, side) in ends {
            if end.is_some_and(|p| p.distance(point) <= radius) {
                return Some(Origin::Retarget {
                    arrow_id: node.id.clone(),
                    side,
                });
            }
        }
    }

    let reach = config.connect_extend + radius;
    let elements = tree::flatten(board.children());
    let selected = elements.iter().filter(|n| selection.is_selected(&n.id));
    let others = elements.iter().rev().filter(|n| !selection.is_selected(&n.id));
    let registry = board.registry();
    selected
        .chain(others)
        .filter(|n| !n.is_arrow() && n.bbox().inflate(reach).contains(point))
        .find_map(|node| {
            let handle = registry
                .connect_extend_points(node, config.connect_extend)
                .into_iter()
                .find(|cp| cp.connect_id != ConnectId::Center && cp.point.distance(point) <= radius)?;
            let start = registry.arrow_bind_point(node, handle.connect_id)?;
            Some(Origin::Connect {
                element_id: node.id.clone(),
                connect_id: handle.connect_id,
                start,
            })
        })
}

/// Refresh the broadcasting elements and the winning candidate for `point`.
fn track(board: &mut Board, gesture: &mut Gesture, point: Point) {
    let config = board.config();
    let range = config.closing_range;
    let max_distance = config.bind_distance / board.viewport().zoom;
    let dragged = gesture.arrow_id().map(str::to_string);

    let closing: Vec<Node> = tree::flatten(board.children())
        .into_iter()
        .filter(|n| !n.is_arrow() && Some(&n.id) != dragged.as_ref() && n.bbox().inflate(range).contains(point))
        .collect();

    let mut candidates: Vec<(f64, Candidate)> = Vec::new();
    for node in &closing {
        for cp in board.registry().connect_points(node) {
            let distance = cp.point.distance(point);
            if distance < max_distance {
                candidates.push((
                    distance,
                    Candidate {
                        element_id: node.id.clone(),
                        connect_id: cp.connect_id,
                        point: cp.point,
                    },
                ));
            }
        }
    }
    // Stable: equal distances keep broadcast order.
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
    gesture.candidate = candidates.into_iter().next().map(|(_, c)| c);

    let ids: Vec<ElementId> = closing.iter().map(|n| n.id.clone()).collect();
    let added: Vec<Node> = closing.iter().filter(|n| !gesture.closing.contains(&n.id)).cloned().collect();
    let removed: Vec<Node> = gesture
        .closing
        .iter()
        .filter(|id| !ids.contains(id))
        .filter_map(|id| board.find(id).cloned())
        .collect();
    gesture.closing = ids;
    if !added.is_empty() {
        board.emit(BoardEvent::ArrowAddClosingElements(added));
    }
    if !removed.is_empty() {
        board.emit(BoardEvent::ArrowRemoveClosingElements(removed));
    }
    board.emit(BoardEvent::ArrowDrop {
        element_id: gesture.candidate.as_ref().map(|c| c.element_id.clone()),
        connect_id: gesture.candidate.as_ref().map(|c| c.connect_id),
    });
}

fn end_point(gesture: &Gesture, point: Point) -> Point {
    gesture.candidate.as_ref().map_or(point, |c| c.point)
}

fn dragged_end(gesture: &Gesture, marker: Marker) -> ArrowEnd {
    match &gesture.candidate {
        Some(c) => ArrowEnd::bound(marker, c.element_id.clone(), c.connect_id),
        None => ArrowEnd::floating(marker),
    }
}

fn set_end_point(arrow: &mut Arrow, side: ArrowEndSide, point: Point) {
    match side {
        ArrowEndSide::Source => arrow.set_start(point),
        ArrowEndSide::Target => arrow.set_end(point),
    }
}

/// Show the dragged end at its live position without recording history.
fn preview(board: &mut Board, gesture: &mut Gesture, point: Point) -> BoardResult<()> {
    let end = end_point(gesture, point);
    let (arrow_id, side) = match (&gesture.origin, gesture.preview_id.clone()) {
        (Origin::Connect { .. }, Some(id)) => (id, ArrowEndSide::Target),
        (Origin::Connect { start, .. }, None) => {
            let node = BoardElement::new(ElementKind::Arrow(Arrow::between(*start, end))).into_node();
            gesture.preview_id = Some(node.id.clone());
            let path = vec![board.children().len()];
            board.apply([Operation::insert(path, node.clone())], false);
            board.emit(BoardEvent::ArrowUpdate(node));
            return Ok(());
        }
        (Origin::Retarget { arrow_id, side }, _) => (arrow_id.clone(), *side),
    };
    let node = board
        .find(&arrow_id)
        .cloned()
        .ok_or_else(|| BoardError::ElementNotFound(arrow_id.clone()))?;
    let mut updated = (*node).clone();
    if let Some(arrow) = updated.as_arrow_mut() {
        set_end_point(arrow, side, end);
    }
    let mut tx = Transaction::new(board.children());
    tx.set_element(&updated)?;
    board.apply(tx.into_ops(), false);
    if let Some(node) = board.find(&arrow_id).cloned() {
        board.emit(BoardEvent::ArrowUpdate(node));
    }
    Ok(())
}

/// Replace the previews with one recorded batch that leaves the arrow on top.
fn commit(board: &mut Board, gesture: &Gesture, point: Point) -> BoardResult<Node> {
    let end = end_point(gesture, point);
    let mut tx = Transaction::new(&gesture.base);
    let node = match &gesture.origin {
        Origin::Connect {
            element_id,
            connect_id,
            start,
        } => {
            let id = gesture
                .preview_id
                .clone()
                .ok_or_else(|| BoardError::ElementNotFound("arrow preview".to_string()))?;
            let mut arrow = Arrow::between(*start, end);
            arrow.source = ArrowEnd::bound(Marker::None, element_id.clone(), *connect_id);
            arrow.target = dragged_end(gesture, Marker::Arrow);
            BoardElement::with_id(id, ElementKind::Arrow(arrow)).into_node()
        }
        Origin::Retarget { arrow_id, side } => {
            let original = tx.remove(arrow_id)?;
            let mut updated = (*original).clone();
            if let Some(arrow) = updated.as_arrow_mut() {
                match side {
                    ArrowEndSide::Source => arrow.source = dragged_end(gesture, arrow.source.marker),
                    ArrowEndSide::Target => arrow.target = dragged_end(gesture, arrow.target.marker),
                }
                set_end_point(arrow, *side, end);
            }
            updated.into_node()
        }
    };
    tx.append(node.clone())?;
    board.restore_children(gesture.base.clone());
    board.apply(tx.into_ops(), true);
    Ok(node)
}

impl BoardPlugin for ArrowBindPlugin {
    fn name(&self) -> &'static str {
        "arrow-bind"
    }

    fn on_pointer_down(&mut self, board: &mut Board, input: &PointerInput) -> Flow {
        if input.button != MouseButton::Left || board.is_readonly() {
            return Flow::Continue;
        }
        let point = doc_point(board, input);
        let Some(origin) = find_origin(board, point) else {
            return Flow::Continue;
        };
        log::debug!("arrow drag from {:?}", origin);
        self.gesture = Some(Gesture {
            origin,
            base: board.snapshot(),
            down: input.position,
            started: false,
            preview_id: None,
            closing: Vec::new(),
            candidate: None,
        });
        Flow::Stop
    }

    fn on_pointer_move(&mut self, board: &mut Board, input: &PointerInput) -> Flow {
        let Some(gesture) = self.gesture.as_mut() else {
            return Flow::Continue;
        };
        if !gesture.started {
            if (input.position - gesture.down).hypot() <= DRAG_START_DISTANCE {
                return Flow::Stop;
            }
            gesture.started = true;
        }
        let point = doc_point(board, input);
        track(board, gesture, point);
        if let Err(err) = preview(board, gesture, point) {
            log::warn!("arrow preview failed: {}", err);
        }
        Flow::Stop
    }

    fn on_pointer_up(&mut self, board: &mut Board, input: &PointerInput) {
        let Some(mut gesture) = self.gesture.take() else {
            return;
        };
        if !gesture.started {
            return;
        }
        let point = doc_point(board, input);
        track(board, &mut gesture, point);
        match commit(board, &gesture, point) {
            Ok(node) => {
                update_selection(board, vec![node.clone()]);
                board.emit(BoardEvent::ArrowMoveEnd(node));
            }
            Err(err) => {
                log::warn!("failed to commit arrow: {}", err);
                board.restore_children(gesture.base.clone());
            }
        }
        let closing: Vec<Node> = gesture.closing.iter().filter_map(|id| board.find(id).cloned()).collect();
        if !closing.is_empty() {
            board.emit(BoardEvent::ArrowRemoveClosingElements(closing));
        }
    }
}
