//! Scripted input replay.

use anyhow::{Context, Result};
use inkboard_core::plugins::RenderContext;
use inkboard_core::{Board, BoardConfig, BoardEvent, Editor, InputEvent, Topic};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

/// Summary of a replay run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReplayStats {
    pub events: usize,
    pub value_changes: usize,
    pub undo_steps: usize,
}

/// Load a board file. A missing file starts an empty board.
pub fn load_board(path: &Path, config: BoardConfig) -> Result<Board> {
    if !path.exists() {
        log::info!("{} does not exist, starting with an empty board", path.display());
        return Ok(Board::with_config(Vec::new(), config));
    }
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Board::from_json(&json, config).with_context(|| format!("parsing {}", path.display()))
}

pub fn load_script(path: &Path) -> Result<Vec<InputEvent>> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing script {}", path.display()))
}

/// Scripted events carry no timing, so throttles are disabled.
pub fn replay_config(mut config: BoardConfig) -> BoardConfig {
    config.pointer_move_throttle_ms = 0;
    config.wheel_throttle_ms = 0;
    config
}

/// Feed every event through the editor.
pub fn replay(editor: &mut Editor, events: &[InputEvent]) -> ReplayStats {
    let changes = Rc::new(Cell::new(0));
    let counter = changes.clone();
    let _subscription = editor.board().subscribe(Topic::ValueChange, move |event| {
        if let BoardEvent::ValueChange(_) = event {
            counter.set(counter.get() + 1);
        }
    });

    for (index, event) in events.iter().enumerate() {
        log::trace!("event {}: {:?}", index, event);
        editor.handle(event);
    }

    ReplayStats {
        events: events.len(),
        value_changes: changes.get(),
        undo_steps: editor.board().undo_depth(),
    }
}

pub fn render_svg(board: &Board) -> String {
    let ctx = RenderContext {
        readonly: board.is_readonly(),
        ..RenderContext::default()
    };
    board.registry().render_svg(board.children(), &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::PointerInput;
    use pretty_assertions::assert_eq;

    const BOARD: &str = r#"[
        {"id": "a", "kind": "geometry", "x": 0, "y": 0, "width": 100, "height": 100},
        {"id": "b", "kind": "geometry", "x": 300, "y": 0, "width": 100, "height": 100}
    ]"#;

    fn pointer(kind: &str, x: f64, y: f64) -> String {
        format!(r#"{{"type":"{}","position":{{"x":{},"y":{}}}}}"#, kind, x, y)
    }

    #[test]
    fn test_replay_drag_script() {
        let dir = tempfile::tempdir().unwrap();
        let board_path = dir.path().join("board.json");
        let script_path = dir.path().join("script.json");
        std::fs::write(&board_path, BOARD).unwrap();
        let script = format!(
            "[{},{},{},{}]",
            pointer("pointerDown", 10.0, 10.0),
            pointer("pointerMove", 60.0, 10.0),
            pointer("pointerMove", 110.0, 10.0),
            pointer("pointerUp", 110.0, 10.0),
        );
        std::fs::write(&script_path, script).unwrap();

        let board = load_board(&board_path, replay_config(BoardConfig::default())).unwrap();
        let mut editor = Editor::new(board);
        let events = load_script(&script_path).unwrap();
        let stats = replay(&mut editor, &events);

        assert_eq!(stats.events, 4);
        assert_eq!(stats.undo_steps, 1);
        assert_eq!(editor.board().find("a").unwrap().bbox().x, 100.0);
        assert!(stats.value_changes >= 1);
    }

    #[test]
    fn test_missing_board_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let board = load_board(&dir.path().join("none.json"), BoardConfig::default()).unwrap();
        assert!(board.children().is_empty());
    }

    #[test]
    fn test_replay_config_disables_throttles() {
        let config = replay_config(BoardConfig::default());
        assert_eq!(config.pointer_move_throttle_ms, 0);
        assert_eq!(config.wheel_throttle_ms, 0);
        assert_eq!(config.history_limit, BoardConfig::default().history_limit);
    }

    #[test]
    fn test_render_svg_contains_elements() {
        let board = Board::from_json(BOARD, BoardConfig::default()).unwrap();
        let svg = render_svg(&board);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_double_click_script_creates_text() {
        let mut editor = Editor::new(Board::with_config(Vec::new(), replay_config(BoardConfig::default())));
        let json = pointer("doubleClick", 40.0, 40.0);
        let event: InputEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(event, InputEvent::DoubleClick(PointerInput { .. })));
        let stats = replay(&mut editor, &[event]);
        assert_eq!(editor.board().children().len(), 1);
        assert_eq!(stats.undo_steps, 1);
    }
}
