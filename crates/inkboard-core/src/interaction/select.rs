//! Click, lasso and keyboard selection.

use super::{BoardPlugin, Flow, doc_point};
use crate::board::Board;
use crate::elements::Node;
use crate::input::{KeyInput, MouseButton, PointerInput};
use crate::selection::SelectArea;
use crate::transforms::{remove_elements, select_all, set_select_area, update_selection};
use crate::tree;
use kurbo::Point;

#[derive(Debug)]
struct Gesture {
    start: Point,
    hit: Vec<Node>,
    moved: bool,
}

/// Selects what was clicked or lassoed.
///
/// A press on an element keeps the current selection when the element is
/// already part of it, so a following drag moves the whole selection.
#[derive(Debug, Default)]
pub struct SelectPlugin {
    gesture: Option<Gesture>,
}

impl BoardPlugin for SelectPlugin {
    fn name(&self) -> &'static str {
        "select"
    }

    fn on_pointer_down(&mut self, board: &mut Board, input: &PointerInput) -> Flow {
        if input.button != MouseButton::Left {
            return Flow::Continue;
        }
        let start = doc_point(board, input);
        let hit = board.hit_elements(start);
        match hit.last() {
            None => {
                update_selection(board, Vec::new());
            }
            Some(top) => {
                let keeps = input.modifiers.is_mod() || hit.iter().any(|n| board.selection().is_selected(&n.id));
                if !keeps {
                    update_selection(board, vec![top.clone()]);
                }
            }
        }
        self.gesture = Some(Gesture { start, hit, moved: false });
        Flow::Continue
    }

    fn on_pointer_move(&mut self, board: &mut Board, input: &PointerInput) -> Flow {
        let Some(gesture) = self.gesture.as_mut() else {
            return Flow::Continue;
        };
        let focus = doc_point(board, input);
        let threshold = board.config().select_threshold;
        if !gesture.moved && ((focus.x - gesture.start.x).abs() > threshold || (focus.y - gesture.start.y).abs() > threshold) {
            gesture.moved = true;
        }
        // Drags that start on an element belong to the move gesture.
        if !gesture.hit.is_empty() {
            return Flow::Continue;
        }
        let area = SelectArea::new(gesture.start, focus);
        let registry = board.registry();
        let config = board.config();
        let selected: Vec<Node> = tree::flatten(board.children())
            .into_iter()
            .filter(|n| registry.is_element_selected(n, &area, config))
            .collect();
        set_select_area(board, Some(area), selected);
        Flow::Continue
    }

    fn on_pointer_up(&mut self, board: &mut Board, input: &PointerInput) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        let mut selected = board.selection().selected_elements.clone();
        if !gesture.moved {
            if let Some(top) = gesture.hit.last() {
                if input.modifiers.is_mod() {
                    match selected.iter().position(|n| n.id == top.id) {
                        Some(index) => {
                            selected.remove(index);
                        }
                        None => selected.push(top.clone()),
                    }
                } else {
                    selected = vec![top.clone()];
                }
            }
        }
        set_select_area(board, None, selected);
        board.set_guides(Vec::new());
    }

    fn on_key_down(&mut self, board: &mut Board, input: &KeyInput) -> Flow {
        if input.is_hotkey("a", true) {
            select_all(board);
            return Flow::Stop;
        }
        if input.modifiers.is_mod() || !matches!(input.key.as_str(), "Delete" | "Backspace") {
            return Flow::Continue;
        }
        if board.selection().is_empty() || board.is_readonly() {
            return Flow::Continue;
        }
        let ids = board.selection().ids();
        if let Err(err) = remove_elements(board, &ids) {
            log::warn!("failed to delete selection: {}", err);
        }
        Flow::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::elements::{BoardElement, ElementKind, Frame};
    use crate::geometry::BBox;
    use crate::input::{KeyInput, Modifiers};

    fn board_rects() -> Vec<crate::elements::Node> {
        vec![
            rect("a", BBox::new(0.0, 0.0, 50.0, 50.0)),
            rect("b", BBox::new(30.0, 30.0, 50.0, 50.0)),
            rect("c", BBox::new(300.0, 300.0, 50.0, 50.0)),
        ]
    }

    #[test]
    fn test_click_selects_top_most() {
        let mut editor = editor(board_rects());
        editor.pointer_down(&at(40.0, 40.0));
        editor.pointer_up(&at(40.0, 40.0));
        assert_eq!(editor.board().selection().ids(), ["b"]);
        assert!(editor.board().selection().select_area.is_none());
    }

    #[test]
    fn test_click_empty_clears() {
        let mut editor = editor(board_rects());
        editor.pointer_down(&at(10.0, 10.0));
        editor.pointer_up(&at(10.0, 10.0));
        editor.pointer_down(&at(200.0, 200.0));
        editor.pointer_up(&at(200.0, 200.0));
        assert!(editor.board().selection().is_empty());
    }

    #[test]
    fn test_lasso_selects_intersecting() {
        let mut editor = editor(board_rects());
        editor.pointer_down(&at(-10.0, -10.0));
        editor.pointer_move(&at(35.0, 35.0));
        {
            let selection = editor.board().selection();
            assert!(selection.select_area.is_some());
            assert_eq!(selection.ids(), ["a", "b"]);
        }
        editor.pointer_up(&at(35.0, 35.0));
        assert!(editor.board().selection().select_area.is_none());
        assert_eq!(editor.board().selection().ids(), ["a", "b"]);
    }

    #[test]
    fn test_lasso_reaches_frame_children() {
        let mut frame = Frame::new(BBox::new(100.0, 100.0, 200.0, 200.0), "F");
        frame.children.push(rect("inner", BBox::new(150.0, 150.0, 20.0, 20.0)));
        let mut editor = editor(vec![BoardElement::with_id("f", ElementKind::Frame(frame)).into_node()]);
        editor.pointer_down(&at(140.0, 140.0 - 60.0));
        editor.pointer_move(&at(180.0, 180.0));
        editor.pointer_up(&at(180.0, 180.0));
        assert_eq!(editor.board().selection().ids(), ["f", "inner"]);
    }

    #[test]
    fn test_mod_click_toggles() {
        let mut editor = editor(board_rects());
        editor.pointer_down(&at(10.0, 10.0));
        editor.pointer_up(&at(10.0, 10.0));
        let ctrl = at(310.0, 310.0).with_modifiers(Modifiers::ctrl());
        editor.pointer_down(&ctrl);
        editor.pointer_up(&ctrl);
        assert_eq!(editor.board().selection().ids(), ["a", "c"]);

        let ctrl_a = at(10.0, 10.0).with_modifiers(Modifiers::ctrl());
        editor.pointer_down(&ctrl_a);
        editor.pointer_up(&ctrl_a);
        assert_eq!(editor.board().selection().ids(), ["c"]);
    }

    #[test]
    fn test_select_all_and_delete() {
        let mut editor = editor(board_rects());
        editor.key_down(&KeyInput::new("a").with_modifiers(Modifiers::ctrl()));
        assert_eq!(editor.board().selection().ids(), ["a", "b", "c"]);

        editor.key_down(&KeyInput::new("Backspace"));
        assert!(editor.board().children().is_empty());
        assert!(editor.board().selection().is_empty());

        editor.board_mut().undo();
        assert_eq!(editor.board().children().len(), 3);
    }

    #[test]
    fn test_selection_changes_are_not_undoable() {
        let mut editor = editor(board_rects());
        editor.pointer_down(&at(10.0, 10.0));
        editor.pointer_up(&at(10.0, 10.0));
        assert!(!editor.board().can_undo());
    }
}
