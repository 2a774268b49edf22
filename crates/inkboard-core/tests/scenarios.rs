//! End-to-end behavior of the document engine.

use inkboard_core::elements::{Arrow, ArrowEnd, ConnectId, ContainmentPolicy, Frame, Geometry, Marker, bind_point};
use inkboard_core::geometry::resize_bbox;
use inkboard_core::input::Modifiers;
use inkboard_core::plugins::recompute_frame_containment;
use inkboard_core::transforms::{insert_element, move_elements, remove_elements};
use inkboard_core::{
    BBox, Board, BoardConfig, BoardElement, Editor, ElementKind, HandlePosition, Node, Operation, PointerInput,
    Transaction,
};
use kurbo::Point;
use pretty_assertions::assert_eq;

fn rect(id: &str, bbox: BBox) -> Node {
    BoardElement::with_id(id, ElementKind::Geometry(Geometry::rect(bbox))).into_node()
}

fn arrow(id: &str, arrow: Arrow) -> Node {
    BoardElement::with_id(id, ElementKind::Arrow(arrow)).into_node()
}

fn immediate_editor(children: Vec<Node>) -> Editor {
    let config = BoardConfig {
        pointer_move_throttle_ms: 0,
        wheel_throttle_ms: 0,
        ..BoardConfig::default()
    };
    Editor::new(Board::with_config(children, config))
}

fn drag(editor: &mut Editor, from: Point, to: Point) {
    editor.pointer_down(&PointerInput::new(from));
    editor.pointer_move(&PointerInput::new(from.midpoint(to)));
    editor.pointer_move(&PointerInput::new(to));
    editor.pointer_up(&PointerInput::new(to));
}

// ─── Scenarios ──────────────────────────────────────────────────────────────

#[test]
fn test_bottom_right_resize_from_json() {
    let element: BoardElement = serde_json::from_str(
        r#"{"id":"r1","kind":"geometry","x":0,"y":0,"width":100,"height":100}"#,
    )
    .unwrap();
    let mut board = Board::default();
    insert_element(&mut board, element, false).unwrap();

    let bbox = resize_bbox(
        board.find("r1").unwrap().bbox(),
        HandlePosition::BottomRight,
        Point::new(100.0, 100.0),
        Point::new(150.0, 130.0),
        false,
    );
    assert_eq!(bbox, BBox::new(0.0, 0.0, 150.0, 130.0));

    // Same gesture through the editor.
    let mut editor = immediate_editor(vec![rect("r1", BBox::new(0.0, 0.0, 100.0, 100.0))]);
    editor.pointer_down(&PointerInput::new(Point::new(50.0, 50.0)));
    editor.pointer_up(&PointerInput::new(Point::new(50.0, 50.0)));
    drag(&mut editor, Point::new(100.0, 100.0), Point::new(150.0, 130.0));
    assert_eq!(editor.board().find("r1").unwrap().bbox(), BBox::new(0.0, 0.0, 150.0, 130.0));
}

#[test]
fn test_bound_source_follows_move() {
    let mut link = Arrow::between(Point::new(100.0, 50.0), Point::new(300.0, 50.0));
    link.source = ArrowEnd::bound(Marker::None, "r1", ConnectId::Right);
    let mut board = Board::new(vec![
        rect("r1", BBox::new(0.0, 0.0, 100.0, 100.0)),
        arrow("a1", link),
    ]);

    move_elements(&mut board, &["r1".to_string()], 20.0, 10.0).unwrap();

    let moved = board.find("a1").unwrap().as_arrow().unwrap().clone();
    assert_eq!(moved.points.first().copied(), Some(Point::new(120.0, 60.0)));
    assert_eq!(moved.points.last().copied(), Some(Point::new(300.0, 50.0)));
    assert_eq!(moved.source.binding(), Some(("r1", ConnectId::Right)));
}

#[test]
fn test_full_containment_takes_only_inner_sibling() {
    let mut frame = Frame::new(BBox::new(0.0, 0.0, 200.0, 200.0), "F");
    frame.containment_policy = ContainmentPolicy::Full;
    let mut board = Board::new(vec![
        BoardElement::with_id("F", ElementKind::Frame(frame)).into_node(),
        rect("r1", BBox::new(10.0, 10.0, 50.0, 50.0)),
        rect("r2", BBox::new(190.0, 10.0, 50.0, 50.0)),
    ]);

    let mut tx = Transaction::new(board.children());
    recompute_frame_containment(&mut tx, "F").unwrap();
    board.apply(tx.into_ops(), true);

    let ids: Vec<&str> = board.find("F").unwrap().children().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["r1"]);
    assert!(board.parent_of("r2").is_none());
}

#[test]
fn test_set_node_removes_absent_key() {
    let mut filled = Geometry::rect(BBox::new(0.0, 0.0, 10.0, 10.0));
    filled.fill = Some("#ff0000".to_string());
    let before = BoardElement::with_id("r1", ElementKind::Geometry(filled));
    let mut after = before.clone();
    if let ElementKind::Geometry(g) = &mut after.kind {
        g.fill = None;
    }
    let mut board = Board::new(vec![before.clone().into_node()]);

    let op = Operation::set_node(vec![0], &before, &after).unwrap();
    assert!(board.apply([op], true).is_complete());

    let props = board.find("r1").unwrap().to_props().unwrap();
    assert!(!props.contains_key("fill"));

    board.undo();
    let props = board.find("r1").unwrap().to_props().unwrap();
    assert_eq!(props.get("fill").and_then(|v| v.as_str()), Some("#ff0000"));
}

// ─── Properties ─────────────────────────────────────────────────────────────

#[test]
fn test_resize_keeps_opposite_edges_and_positive_size() {
    let original = BBox::new(10.0, 20.0, 80.0, 40.0);
    let drags = [(37.0, -11.0), (-300.0, 250.0), (5.0, 5.0), (-79.5, -39.5)];
    for handle in HandlePosition::ALL {
        let anchor = handle.point_on(&original);
        for (dx, dy) in drags {
            let current = Point::new(anchor.x + dx, anchor.y + dy);
            for ratio in [false, true] {
                let result = resize_bbox(original, handle, anchor, current, ratio);
                assert!(result.width > 0.0 && result.height > 0.0, "{:?} {:?}", handle, result);
                if handle.horizontal_sign() < 0.0 {
                    assert!((result.right() - original.right()).abs() < 1e-9);
                }
                if handle.horizontal_sign() > 0.0 {
                    assert!((result.x - original.x).abs() < 1e-9);
                }
                if handle.vertical_sign() < 0.0 {
                    assert!((result.bottom() - original.bottom()).abs() < 1e-9);
                }
                if handle.vertical_sign() > 0.0 {
                    assert!((result.y - original.y).abs() < 1e-9);
                }
                if ratio {
                    let expected = original.width / original.height;
                    assert!((result.width / result.height - expected).abs() < 1e-9, "{:?}", handle);
                }
            }
        }
    }
}

#[test]
fn test_degenerate_resize_returns_original() {
    let original = BBox::new(0.0, 0.0, 40.0, 40.0);
    let anchor = Point::new(40.0, 40.0);
    assert_eq!(resize_bbox(original, HandlePosition::BottomRight, anchor, anchor, false), original);
    // Dragging an edge handle along its own edge changes nothing.
    assert_eq!(
        resize_bbox(original, HandlePosition::Right, Point::new(40.0, 20.0), Point::new(40.0, 90.0), false),
        original
    );
}

#[test]
fn test_undo_redo_round_trip() {
    let initial = vec![
        rect("a", BBox::new(0.0, 0.0, 50.0, 50.0)),
        rect("b", BBox::new(100.0, 0.0, 50.0, 50.0)),
    ];
    let mut board = Board::new(initial.clone());

    let c = BoardElement::with_id("c", ElementKind::Geometry(Geometry::rect(BBox::new(0.0, 100.0, 20.0, 20.0))));
    insert_element(&mut board, c, true).unwrap();
    move_elements(&mut board, &["a".to_string(), "c".to_string()], 5.0, -5.0).unwrap();
    let mut resized = (**board.find("b").unwrap()).clone();
    resized.set_bbox(BBox::new(100.0, 0.0, 80.0, 10.0));
    let mut tx = Transaction::new(board.children());
    tx.set_element(&resized).unwrap();
    board.apply(tx.into_ops(), true);
    remove_elements(&mut board, &["a".to_string()]).unwrap();

    let done: Vec<Node> = board.children().to_vec();
    assert_eq!(board.undo_depth(), 4);

    for _ in 0..4 {
        assert!(board.undo());
    }
    assert_eq!(board.children().to_vec(), initial);
    assert!(!board.undo());

    for _ in 0..4 {
        assert!(board.redo());
    }
    assert_eq!(board.children().to_vec(), done);
}

#[test]
fn test_bound_arrows_track_gestures() {
    let mut link = Arrow::between(Point::new(100.0, 50.0), Point::new(300.0, 50.0));
    link.source = ArrowEnd::bound(Marker::None, "a", ConnectId::Right);
    link.target = ArrowEnd::bound(Marker::Arrow, "b", ConnectId::Left);
    let mut editor = immediate_editor(vec![
        rect("a", BBox::new(0.0, 0.0, 100.0, 100.0)),
        rect("b", BBox::new(300.0, 0.0, 100.0, 100.0)),
        arrow("link", link),
    ]);

    let check = |editor: &Editor| {
        let board = editor.board();
        let link = board.find("link").unwrap().as_arrow().unwrap().clone();
        for (end, point) in [(&link.source, link.start()), (&link.target, link.end())] {
            let (id, connect_id) = end.binding().unwrap();
            let bbox = board.find(id).unwrap().bbox();
            assert_eq!(point, Some(bind_point(&bbox, connect_id)));
        }
    };

    // Move a.
    drag(&mut editor, Point::new(50.0, 50.0), Point::new(80.0, 160.0));
    check(&editor);

    // Resize b from its bottom-right corner after selecting it.
    editor.pointer_down(&PointerInput::new(Point::new(350.0, 50.0)));
    editor.pointer_up(&PointerInput::new(Point::new(350.0, 50.0)));
    drag(&mut editor, Point::new(400.0, 100.0), Point::new(460.0, 180.0));
    assert_eq!(editor.board().find("b").unwrap().bbox(), BBox::new(300.0, 0.0, 160.0, 180.0));
    check(&editor);

    editor.board_mut().undo();
    check(&editor);
    editor.board_mut().undo();
    check(&editor);
}

#[test]
fn test_containment_recompute_is_idempotent() {
    let frame = Frame::new(BBox::new(0.0, 0.0, 200.0, 200.0), "F");
    let mut board = Board::new(vec![
        BoardElement::with_id("F", ElementKind::Frame(frame)).into_node(),
        rect("in", BBox::new(10.0, 10.0, 20.0, 20.0)),
        rect("edge", BBox::new(190.0, 10.0, 50.0, 50.0)),
        rect("out", BBox::new(500.0, 500.0, 20.0, 20.0)),
    ]);

    let children_of = |board: &Board| -> Vec<String> {
        board.find("F").unwrap().children().iter().map(|c| c.id.clone()).collect()
    };

    let mut tx = Transaction::new(board.children());
    recompute_frame_containment(&mut tx, "F").unwrap();
    board.apply(tx.into_ops(), true);
    let first = children_of(&board);
    assert_eq!(first, ["in", "edge"]);

    let mut tx = Transaction::new(board.children());
    recompute_frame_containment(&mut tx, "F").unwrap();
    assert!(tx.is_empty());
    board.apply(tx.into_ops(), true);
    assert_eq!(children_of(&board), first);
}

#[test]
fn test_rect_hit_is_boundary_inclusive() {
    let board = Board::new(vec![rect("r", BBox::new(10.0, 20.0, 30.0, 40.0))]);
    let registry = board.registry();
    let element = board.find("r").unwrap();
    let inside = [(10.0, 20.0), (40.0, 60.0), (10.0, 60.0), (25.0, 40.0)];
    let outside = [(9.999, 20.0), (40.001, 60.0), (25.0, 19.999), (25.0, 60.001)];
    for (x, y) in inside {
        assert!(registry.is_hit(element, Point::new(x, y), board.config()), "({}, {})", x, y);
    }
    for (x, y) in outside {
        assert!(!registry.is_hit(element, Point::new(x, y), board.config()), "({}, {})", x, y);
    }
}

// ─── Gestures ───────────────────────────────────────────────────────────────

#[test]
fn test_draw_arrow_then_move_target() {
    let mut editor = immediate_editor(vec![
        rect("a", BBox::new(0.0, 0.0, 100.0, 100.0)),
        rect("b", BBox::new(300.0, 0.0, 100.0, 100.0)),
    ]);
    drag(&mut editor, Point::new(120.0, 50.0), Point::new(301.0, 50.0));
    let arrow_id = editor.board().selection().ids()[0].clone();

    // Click empty canvas, then drag b down.
    editor.pointer_down(&PointerInput::new(Point::new(200.0, 400.0)));
    editor.pointer_up(&PointerInput::new(Point::new(200.0, 400.0)));
    drag(&mut editor, Point::new(350.0, 80.0), Point::new(350.0, 280.0));

    let link = editor.board().find(&arrow_id).unwrap().as_arrow().unwrap().clone();
    assert_eq!(link.end(), Some(Point::new(300.0, 250.0)));
    assert_eq!(link.start(), Some(Point::new(100.0, 50.0)));
    assert_eq!(editor.board().undo_depth(), 2);
}

#[test]
fn test_readonly_board_ignores_edits() {
    let mut editor = immediate_editor(vec![rect("r", BBox::new(0.0, 0.0, 50.0, 50.0))]);
    editor.board_mut().set_readonly(true);
    drag(&mut editor, Point::new(10.0, 10.0), Point::new(110.0, 10.0));
    editor.double_click(&PointerInput::new(Point::new(300.0, 300.0)));
    editor.key_down(&inkboard_core::KeyInput::new("Delete"));
    editor.key_down(&inkboard_core::KeyInput::new("z").with_modifiers(Modifiers::ctrl()));

    let board = editor.board();
    assert_eq!(board.children().len(), 1);
    assert_eq!(board.find("r").unwrap().bbox().x, 0.0);
    assert!(!board.can_undo());
}
