//! Dragging the selection's resize handles.

use super::{BoardPlugin, Flow, doc_point};
use crate::board::Board;
use crate::elements::{BoardElement, ElementId, Node};
use crate::error::BoardResult;
use crate::events::BoardEvent;
use crate::geometry::{BBox, HandlePosition, MIN_BBOX_SIZE, bounding_box, resize_bbox};
use crate::input::{MouseButton, PointerInput};
use crate::operation::Transaction;
use crate::refline::{RefLine, RefLines, RefRect};
use crate::transforms::{refresh_selection, sync_bound_arrows};
use crate::tree;
use kurbo::Point;
use std::sync::Arc;

#[derive(Debug)]
struct Gesture {
    base: Arc<[Node]>,
    handle: HandlePosition,
    anchor: Point,
    union: BBox,
    originals: Vec<Node>,
    resized: bool,
}

impl Gesture {
    fn ids(&self) -> Vec<ElementId> {
        self.originals.iter().map(|n| n.id.clone()).collect()
    }

    /// Every original scaled with the union box dragged to `current`.
    fn layout(&self, board: &Board, current: Point, preserve_ratio: bool) -> Vec<BoardElement> {
        let target = resize_bbox(self.union, self.handle, self.anchor, current, preserve_ratio);
        let sx = if self.union.width > 0.0 { target.width / self.union.width } else { 1.0 };
        let sy = if self.union.height > 0.0 { target.height / self.union.height } else { 1.0 };
        self.originals
            .iter()
            .filter_map(|node| {
                let b = node.bbox();
                let bbox = BBox::new(
                    target.x + (b.x - self.union.x) * sx,
                    target.y + (b.y - self.union.y) * sy,
                    (b.width * sx).max(MIN_BBOX_SIZE),
                    (b.height * sy).max(MIN_BBOX_SIZE),
                );
                board.registry().resize(node, bbox)
            })
            .collect()
    }

    /// The layout with the first element pulled onto nearby reference lines.
    fn snapped_layout(&self, board: &Board, current: Point, preserve_ratio: bool, snap: bool) -> (Vec<BoardElement>, Vec<RefLine>) {
        let elements = self.layout(board, current, preserve_ratio);
        let Some(first) = elements.first() else {
            return (elements, Vec::new());
        };
        let ids = self.ids();
        let mut lines = RefLines::new();
        lines.set_ref_rects(
            tree::flatten(&self.base)
                .into_iter()
                .filter(|n| !n.is_arrow() && !ids.contains(&n.id))
                .map(|n| RefRect::new(n.id.clone(), n.bbox()))
                .collect(),
        );
        lines.set_current(vec![RefRect::new(first.id.clone(), first.bbox())]);
        let distance = board.config().snap_distance / board.viewport().zoom;
        let outcome = lines.update_current(snap, distance, Some(self.handle));
        if outcome.offset.x == 0.0 && outcome.offset.y == 0.0 {
            return (elements, outcome.guides);
        }
        (self.layout(board, current + outcome.offset, preserve_ratio), outcome.guides)
    }
}

/// Resizes every resizable selected element proportionally to the handle drag.
///
/// Snapping looks at the first element only; the rest follow its correction.
#[derive(Debug, Default)]
pub struct ResizePlugin {
    gesture: Option<Gesture>,
}

fn patch(board: &Board, children: &[Node], elements: &[BoardElement]) -> BoardResult<Transaction> {
    let mut tx = Transaction::new(children);
    for element in elements {
        tx.set_element(element)?;
    }
    let ids: Vec<ElementId> = elements.iter().map(|e| e.id.clone()).collect();
    sync_bound_arrows(&mut tx, board.registry(), &ids)?;
    Ok(tx)
}

impl ResizePlugin {
    fn commit(board: &mut Board, gesture: &Gesture, elements: &[BoardElement]) -> BoardResult<()> {
        let ids = gesture.ids();
        let mut tx = patch(board, &gesture.base, elements)?;
        for id in &ids {
            if let Some(element) = tx.find(id).cloned() {
                board.registry().on_resize_end(&element, &mut tx)?;
            }
        }
        // Frames may have been refitted by the resize-end hooks.
        sync_bound_arrows(&mut tx, board.registry(), &ids)?;
        board.restore_children(gesture.base.clone());
        board.apply(tx.into_ops(), true);
        refresh_selection(board);
        let resized: Vec<Node> = ids.iter().filter_map(|id| board.find(id).cloned()).collect();
        board.emit(BoardEvent::ElementResize(resized));
        Ok(())
    }
}

impl BoardPlugin for ResizePlugin {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn on_pointer_down(&mut self, board: &mut Board, input: &PointerInput) -> Flow {
        if input.button != MouseButton::Left || board.is_readonly() {
            return Flow::Continue;
        }
        let anchor = doc_point(board, input);
        let tolerance = board.config().handle_hit_tolerance / board.viewport().zoom;
        let Some(handle) = board.selection().hit_handle(anchor, tolerance) else {
            return Flow::Continue;
        };
        let originals: Vec<Node> = board
            .selection()
            .resizable()
            .filter_map(|n| board.find(&n.id).cloned())
            .filter(|n| board.registry().is_resizable(n))
            .collect();
        let Some(union) = bounding_box(originals.iter().map(|n| n.bbox())) else {
            return Flow::Continue;
        };
        log::debug!("resize {:?} on {} elements", handle, originals.len());
        self.gesture = Some(Gesture {
            base: board.snapshot(),
            handle,
            anchor,
            union,
            originals,
            resized: false,
        });
        Flow::Stop
    }

    fn on_pointer_move(&mut self, board: &mut Board, input: &PointerInput) -> Flow {
        let Some(gesture) = self.gesture.as_mut() else {
            return Flow::Continue;
        };
        let current = doc_point(board, input);
        let (elements, guides) = gesture.snapped_layout(board, current, input.modifiers.shift, !input.modifiers.alt);
        match patch(board, board.children(), &elements) {
            Ok(tx) => {
                board.apply(tx.into_ops(), false);
                board.set_guides(guides);
                refresh_selection(board);
                gesture.resized = true;
                let resized: Vec<Node> = elements.iter().filter_map(|e| board.find(&e.id).cloned()).collect();
                board.emit(BoardEvent::ElementResize(resized));
            }
            Err(err) => log::warn!("resize preview failed: {}", err),
        }
        Flow::Stop
    }

    fn on_pointer_up(&mut self, board: &mut Board, input: &PointerInput) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        board.set_guides(Vec::new());
        let current = doc_point(board, input);
        if !gesture.resized && current == gesture.anchor {
            return;
        }
        let (elements, _) = gesture.snapped_layout(board, current, input.modifiers.shift, !input.modifiers.alt);
        if let Err(err) = Self::commit(board, &gesture, &elements) {
            log::warn!("resize commit failed: {}", err);
            board.restore_children(gesture.base.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::elements::{Arrow, ArrowEnd, BoardElement, ConnectId, ElementKind, Frame, Marker, Node, RichText};
    use crate::geometry::BBox;
    use crate::input::Modifiers;
    use crate::transforms::update_selection;
    use kurbo::Point;

    fn select(editor: &mut crate::interaction::Editor, ids: &[&str]) {
        let nodes: Vec<Node> = ids.iter().filter_map(|id| editor.board().find(id).cloned()).collect();
        update_selection(editor.board_mut(), nodes);
    }

    #[test]
    fn test_corner_drag_resizes_one_undo_step() {
        let mut editor = editor(vec![rect("r", BBox::new(0.0, 0.0, 100.0, 50.0))]);
        select(&mut editor, &["r"]);
        drag(&mut editor, Point::new(100.0, 50.0), Point::new(150.0, 80.0), Modifiers::alt());
        assert_eq!(editor.board().find("r").unwrap().bbox(), BBox::new(0.0, 0.0, 150.0, 80.0));
        assert_eq!(editor.board().selection().selected_elements[0].bbox().width, 150.0);

        assert!(editor.board_mut().undo());
        assert_eq!(editor.board().find("r").unwrap().bbox(), BBox::new(0.0, 0.0, 100.0, 50.0));
        assert!(!editor.board().can_undo());
    }

    #[test]
    fn test_left_handle_keeps_right_edge() {
        let mut editor = editor(vec![rect("r", BBox::new(100.0, 100.0, 100.0, 50.0))]);
        select(&mut editor, &["r"]);
        drag(&mut editor, Point::new(100.0, 125.0), Point::new(400.0, 125.0), Modifiers::alt());
        let bbox = editor.board().find("r").unwrap().bbox();
        assert_eq!(bbox.right(), 200.0);
        assert!(bbox.width > 0.0);
    }

    #[test]
    fn test_shift_preserves_ratio() {
        let mut editor = editor(vec![rect("r", BBox::new(0.0, 0.0, 100.0, 50.0))]);
        select(&mut editor, &["r"]);
        let mods = Modifiers { shift: true, alt: true, ..Modifiers::NONE };
        drag(&mut editor, Point::new(100.0, 50.0), Point::new(200.0, 60.0), mods);
        assert_eq!(editor.board().find("r").unwrap().bbox(), BBox::new(0.0, 0.0, 200.0, 100.0));
    }

    #[test]
    fn test_multi_resize_is_proportional() {
        let mut editor = editor(vec![
            rect("a", BBox::new(0.0, 0.0, 50.0, 50.0)),
            rect("b", BBox::new(50.0, 50.0, 50.0, 50.0)),
        ]);
        select(&mut editor, &["a", "b"]);
        drag(&mut editor, Point::new(100.0, 100.0), Point::new(200.0, 200.0), Modifiers::alt());
        assert_eq!(editor.board().find("a").unwrap().bbox(), BBox::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(editor.board().find("b").unwrap().bbox(), BBox::new(100.0, 100.0, 100.0, 100.0));
    }

    #[test]
    fn test_resize_snaps_dragged_edge() {
        let mut editor = editor(vec![
            rect("r", BBox::new(0.0, 0.0, 100.0, 50.0)),
            rect("wall", BBox::new(203.0, 300.0, 10.0, 10.0)),
        ]);
        select(&mut editor, &["r"]);
        drag(&mut editor, Point::new(100.0, 25.0), Point::new(200.0, 25.0), Modifiers::NONE);
        assert_eq!(editor.board().find("r").unwrap().bbox(), BBox::new(0.0, 0.0, 203.0, 50.0));
    }

    #[test]
    fn test_bound_arrow_tracks_resize() {
        let mut arrow = Arrow::between(Point::new(100.0, 25.0), Point::new(300.0, 25.0));
        arrow.source = ArrowEnd::bound(Marker::None, "r", ConnectId::Right);
        let mut editor = editor(vec![
            rect("r", BBox::new(0.0, 0.0, 100.0, 50.0)),
            BoardElement::with_id("arrow", ElementKind::Arrow(arrow)).into_node(),
        ]);
        select(&mut editor, &["r"]);
        drag(&mut editor, Point::new(100.0, 50.0), Point::new(150.0, 100.0), Modifiers::alt());
        let start = editor.board().find("arrow").unwrap().as_arrow().unwrap().start();
        assert_eq!(start, Some(Point::new(150.0, 50.0)));
    }

    #[test]
    fn test_child_resize_expands_frame() {
        let mut frame = Frame::new(BBox::new(0.0, 0.0, 200.0, 200.0), "F");
        frame.auto_resize = false;
        frame.children.push(rect("c", BBox::new(50.0, 50.0, 50.0, 50.0)));
        let mut editor = editor(vec![BoardElement::with_id("f", ElementKind::Frame(frame)).into_node()]);
        select(&mut editor, &["c"]);
        drag(&mut editor, Point::new(100.0, 100.0), Point::new(300.0, 100.0), Modifiers::alt());
        let frame_box = editor.board().find("f").unwrap().bbox();
        assert!(frame_box.contains_bbox(&editor.board().find("c").unwrap().bbox()));
        assert!(frame_box.right() > 250.0);

        editor.board_mut().undo();
        assert_eq!(editor.board().find("f").unwrap().bbox(), BBox::new(0.0, 0.0, 200.0, 200.0));
    }

    #[test]
    fn test_frame_resize_adopts_and_evicts() {
        let mut frame = Frame::new(BBox::new(0.0, 0.0, 100.0, 100.0), "F");
        frame.auto_resize = false;
        frame.children.push(rect("inside", BBox::new(10.0, 10.0, 20.0, 20.0)));
        let mut editor = editor(vec![
            BoardElement::with_id("f", ElementKind::Frame(frame)).into_node(),
            rect("outside", BBox::new(150.0, 10.0, 20.0, 20.0)),
        ]);
        select(&mut editor, &["f"]);
        // Shrink from the left past "inside" and grow right over "outside".
        editor.pointer_down(&at(0.0, 50.0));
        editor.pointer_move(&at(60.0, 50.0));
        editor.pointer_up(&at(60.0, 50.0));
        select(&mut editor, &["f"]);
        editor.pointer_down(&at(100.0, 50.0));
        editor.pointer_move(&at(200.0, 50.0).with_modifiers(Modifiers::alt()));
        editor.pointer_up(&at(200.0, 50.0).with_modifiers(Modifiers::alt()));

        assert!(editor.board().parent_of("inside").is_none());
        assert_eq!(editor.board().parent_of("outside").map(|p| p.id.clone()), Some("f".to_string()));
    }

    #[test]
    fn test_rich_text_resize_is_manual() {
        let text = RichText::new(Point::new(0.0, 0.0));
        let mut editor = editor(vec![BoardElement::with_id("t", ElementKind::RichText(text)).into_node()]);
        select(&mut editor, &["t"]);
        let corner = editor.board().find("t").unwrap().bbox();
        drag(&mut editor, Point::new(corner.right(), corner.bottom()), Point::new(120.0, 90.0), Modifiers::alt());
        let ElementKind::RichText(text) = &editor.board().find("t").unwrap().kind else {
            panic!("expected rich text");
        };
        assert_eq!(text.resized, Some(true));
        assert_eq!(text.max_width, 120.0);
    }
}
