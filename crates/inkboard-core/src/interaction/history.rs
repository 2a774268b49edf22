use super::{BoardPlugin, Flow};
use crate::board::Board;
use crate::input::KeyInput;
use crate::transforms::refresh_selection;

/// Undo and redo shortcuts: mod+z, mod+shift+z and mod+y.
#[derive(Debug, Default)]
pub struct HistoryPlugin;

impl BoardPlugin for HistoryPlugin {
    fn name(&self) -> &'static str {
        "history"
    }

    fn on_key_down(&mut self, board: &mut Board, input: &KeyInput) -> Flow {
        let modifiers = input.modifiers;
        if !modifiers.is_mod() || modifiers.alt {
            return Flow::Continue;
        }
        let key = input.key.to_ascii_lowercase();
        let done = match (key.as_str(), modifiers.shift) {
            ("z", false) => board.undo(),
            ("z", true) | ("y", false) => board.redo(),
            _ => return Flow::Continue,
        };
        if done {
            refresh_selection(board);
        } else {
            log::debug!("nothing to {}", if key == "y" || modifiers.shift { "redo" } else { "undo" });
        }
        Flow::Stop
    }
}
