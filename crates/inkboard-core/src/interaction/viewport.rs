//! Panning and zooming.

use super::{BoardPlugin, Flow};
use crate::board::Board;
use crate::input::{KeyInput, MouseButton, PointerInput, Throttle, WheelInput};
use crate::transforms::{fit_viewport, scroll_viewport, set_viewport, zoom_step};
use crate::viewport::ViewPort;
use kurbo::{Point, Vec2};

/// Right-button drag pans, the wheel scrolls or zooms, keyboard shortcuts
/// zoom and fit, and arrow keys scroll while nothing is selected.
#[derive(Debug)]
pub struct ViewPortPlugin {
    pan: Option<(Point, ViewPort)>,
    wheel_throttle: Throttle,
}

impl ViewPortPlugin {
    pub fn new(wheel_throttle_ms: u64) -> Self {
        Self {
            pan: None,
            wheel_throttle: Throttle::new(wheel_throttle_ms),
        }
    }
}

fn screen_center(board: &Board) -> Point {
    let size = board.viewport().screen_size();
    Point::new(size.width / 2.0, size.height / 2.0)
}

impl BoardPlugin for ViewPortPlugin {
    fn name(&self) -> &'static str {
        "viewport"
    }

    fn on_pointer_down(&mut self, board: &mut Board, input: &PointerInput) -> Flow {
        if input.button != MouseButton::Right {
            return Flow::Continue;
        }
        self.pan = Some((input.position, *board.viewport()));
        Flow::Stop
    }

    fn on_pointer_move(&mut self, board: &mut Board, input: &PointerInput) -> Flow {
        let Some((origin, start)) = self.pan else {
            return Flow::Continue;
        };
        set_viewport(board, start.panned(input.position - origin));
        Flow::Stop
    }

    fn on_pointer_up(&mut self, _board: &mut Board, _input: &PointerInput) {
        self.pan = None;
    }

    fn on_wheel(&mut self, board: &mut Board, input: &WheelInput) -> Flow {
        if !self.wheel_throttle.ready() {
            return Flow::Stop;
        }
        if input.modifiers.ctrl {
            if input.delta.y != 0.0 {
                zoom_step(board, input.position, input.delta.y < 0.0);
            }
        } else {
            let (kx, ky) = if input.is_trackpad() { (10.0, 10.0) } else { (3.0, 2.0) };
            scroll_viewport(board, Vec2::new(kx * input.delta.x, ky * input.delta.y));
        }
        Flow::Stop
    }

    fn on_key_down(&mut self, board: &mut Board, input: &KeyInput) -> Flow {
        if let Some(direction) = input.arrow_direction() {
            if !board.selection().is_empty() || input.modifiers.is_mod() {
                return Flow::Continue;
            }
            let config = board.config();
            let step = if input.modifiers.alt { config.precise_nudge_step } else { config.nudge_step };
            scroll_viewport(board, direction * step);
            return Flow::Stop;
        }
        if !input.modifiers.is_mod() {
            return Flow::Continue;
        }
        match input.key.as_str() {
            "=" | "+" => {
                let center = screen_center(board);
                zoom_step(board, center, true);
            }
            "-" => {
                let center = screen_center(board);
                zoom_step(board, center, false);
            }
            "o" | "O" => {
                fit_viewport(board);
            }
            _ => return Flow::Continue,
        }
        Flow::Stop
    }
}

impl Default for ViewPortPlugin {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::geometry::BBox;
    use crate::input::{KeyInput, Modifiers, MouseButton, WheelInput};
    use kurbo::{Point, Vec2};

    fn wheel(dx: f64, dy: f64, modifiers: Modifiers) -> WheelInput {
        WheelInput {
            position: Point::new(100.0, 100.0),
            delta: Vec2::new(dx, dy),
            modifiers,
        }
    }

    #[test]
    fn test_right_drag_pans() {
        let mut editor = editor(Vec::new());
        let down = at(200.0, 200.0).with_button(MouseButton::Right);
        editor.pointer_down(&down);
        editor.pointer_move(&at(150.0, 170.0).with_button(MouseButton::Right));
        editor.pointer_up(&at(150.0, 170.0).with_button(MouseButton::Right));
        let vp = editor.board().viewport();
        assert_eq!((vp.min_x, vp.min_y), (50.0, 30.0));
        assert!(!editor.board().can_undo());
    }

    #[test]
    fn test_wheel_scroll_scaling() {
        let mut editor = editor(Vec::new());
        editor.wheel(&wheel(0.0, 40.0, Modifiers::NONE));
        assert_eq!(editor.board().viewport().min_y, 80.0);
        editor.wheel(&wheel(2.0, 0.0, Modifiers::NONE));
        assert_eq!(editor.board().viewport().min_x, 20.0);
    }

    #[test]
    fn test_ctrl_wheel_zooms_about_cursor() {
        let mut editor = editor(Vec::new());
        let anchor = editor.board().screen_to_viewport(Point::new(100.0, 100.0));
        editor.wheel(&wheel(0.0, -3.0, Modifiers::ctrl()));
        assert!((editor.board().viewport().zoom - 1.1).abs() < 1e-9);
        let after = editor.board().screen_to_viewport(Point::new(100.0, 100.0));
        assert!((after - anchor).hypot() < 1e-9);

        editor.wheel(&wheel(0.0, 3.0, Modifiers::ctrl()));
        assert!((editor.board().viewport().zoom - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_is_throttled_by_default() {
        let mut editor = crate::interaction::Editor::new(crate::board::Board::default());
        editor.wheel(&wheel(0.0, 40.0, Modifiers::NONE));
        editor.wheel(&wheel(0.0, 40.0, Modifiers::NONE));
        assert_eq!(editor.board().viewport().min_y, 80.0);
    }

    #[test]
    fn test_zoom_hotkeys_clamp() {
        let mut editor = editor(Vec::new());
        for _ in 0..40 {
            editor.key_down(&KeyInput::new("=").with_modifiers(Modifiers::ctrl()));
        }
        assert!((editor.board().viewport().zoom - 10.0).abs() < 1e-9);
        editor.key_down(&KeyInput::new("-").with_modifiers(Modifiers::ctrl()));
        assert!((editor.board().viewport().zoom - 10.0 / 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_fit_shortcut_shows_everything() {
        let mut editor = editor(vec![
            rect("a", BBox::new(-500.0, -500.0, 100.0, 100.0)),
            rect("b", BBox::new(2000.0, 1500.0, 100.0, 100.0)),
        ]);
        editor.key_down(&KeyInput::new("o").with_modifiers(Modifiers::ctrl()));
        let visible = editor.board().viewport().bbox();
        assert!(visible.contains_bbox(&BBox::new(-500.0, -500.0, 2600.0, 2100.0)));
    }

    #[test]
    fn test_arrow_keys_scroll_only_without_selection() {
        let mut editor = editor(vec![rect("r", BBox::new(0.0, 0.0, 50.0, 50.0))]);
        editor.key_down(&KeyInput::new("ArrowRight"));
        assert_eq!(editor.board().viewport().min_x, 5.0);
        editor.key_down(&KeyInput::new("ArrowDown").with_modifiers(Modifiers::alt()));
        assert_eq!(editor.board().viewport().min_y, 1.0);

        editor.pointer_down(&at(10.0 - 5.0, 10.0 - 1.0));
        editor.pointer_up(&at(10.0 - 5.0, 10.0 - 1.0));
        assert!(editor.board().selection().is_selected("r"));
        editor.key_down(&KeyInput::new("ArrowRight"));
        assert_eq!(editor.board().viewport().min_x, 5.0);
    }
}
