use super::{BoardPlugin, Flow, doc_point};
use crate::board::Board;
use crate::elements::{BoardElement, ElementKind, RichText};
use crate::input::PointerInput;
use crate::transforms::insert_element;

/// Double-clicking empty canvas drops a text element there and selects it.
#[derive(Debug, Default)]
pub struct CreatePlugin;

impl BoardPlugin for CreatePlugin {
    fn name(&self) -> &'static str {
        "create"
    }

    fn on_double_click(&mut self, board: &mut Board, input: &PointerInput) -> Flow {
        if board.is_readonly() {
            return Flow::Continue;
        }
        let point = doc_point(board, input);
        if board.top_hit(point).is_some() {
            return Flow::Continue;
        }
        let element = BoardElement::new(ElementKind::RichText(RichText::new(point)));
        match insert_element(board, element, true) {
            Ok(node) => log::debug!("created text {} at {:?}", node.id, point),
            Err(err) => log::warn!("failed to create text: {}", err),
        }
        Flow::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::elements::{NEW_TEXT_HEIGHT, NEW_TEXT_WIDTH};
    use crate::geometry::BBox;

    #[test]
    fn test_double_click_creates_selected_text() {
        let mut editor = editor(Vec::new());
        editor.double_click(&at(40.0, 60.0));

        let board = editor.board();
        assert_eq!(board.children().len(), 1);
        let text = &board.children()[0];
        assert_eq!(text.bbox(), BBox::new(40.0, 60.0, NEW_TEXT_WIDTH, NEW_TEXT_HEIGHT));
        assert_eq!(board.selection().ids(), [text.id.clone()]);

        editor.board_mut().undo();
        assert!(editor.board().children().is_empty());
    }

    #[test]
    fn test_double_click_uses_document_coordinates() {
        let mut editor = editor(Vec::new());
        let mut viewport = *editor.board().viewport();
        viewport.min_x = 100.0;
        viewport.zoom = 2.0;
        crate::transforms::set_viewport(editor.board_mut(), viewport);

        editor.double_click(&at(40.0, 60.0));
        let bbox = editor.board().children()[0].bbox();
        assert_eq!((bbox.x, bbox.y), (120.0, 30.0));
    }

    #[test]
    fn test_double_click_on_element_or_readonly_does_nothing() {
        let mut editor = editor(vec![rect("r", BBox::new(0.0, 0.0, 50.0, 50.0))]);
        editor.double_click(&at(10.0, 10.0));
        assert_eq!(editor.board().children().len(), 1);

        editor.board_mut().set_readonly(true);
        editor.double_click(&at(200.0, 200.0));
        assert_eq!(editor.board().children().len(), 1);
    }
}
