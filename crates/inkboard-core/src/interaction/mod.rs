//! Gesture handling.
//!
//! An [`Editor`] owns the board and a stack of [`BoardPlugin`]s. Input is
//! offered to the plugins in order; a plugin that claims an event returns
//! [`Flow::Stop`] and the rest never see it. Pointer-up reaches every plugin
//! so each can finish or drop its own gesture.
//!
//! Gestures preview with unrecorded batches and commit once on pointer-up:
//! the tree is restored to the snapshot taken at pointer-down and the whole
//! gesture is applied again as a single recorded batch, which makes it one
//! undo step.

mod arrow_bind;
mod create;
mod history;
mod moving;
mod resize;
mod select;
mod viewport;

pub use arrow_bind::{ArrowBindPlugin, ArrowEndSide};
pub use create::CreatePlugin;
pub use history::HistoryPlugin;
pub use moving::MovePlugin;
pub use resize::ResizePlugin;
pub use select::SelectPlugin;
pub use viewport::ViewPortPlugin;

use crate::board::Board;
use crate::config::BoardConfig;
use crate::input::{InputEvent, KeyInput, PointerInput, Throttle, WheelInput};
use kurbo::Point;

/// Whether later plugins get to see an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// One gesture state machine.
pub trait BoardPlugin {
    fn name(&self) -> &'static str;

    fn on_pointer_down(&mut self, _board: &mut Board, _input: &PointerInput) -> Flow {
        Flow::Continue
    }

    fn on_pointer_move(&mut self, _board: &mut Board, _input: &PointerInput) -> Flow {
        Flow::Continue
    }

    /// Always delivered, regardless of what earlier plugins returned.
    fn on_pointer_up(&mut self, _board: &mut Board, _input: &PointerInput) {}

    fn on_double_click(&mut self, _board: &mut Board, _input: &PointerInput) -> Flow {
        Flow::Continue
    }

    fn on_key_down(&mut self, _board: &mut Board, _input: &KeyInput) -> Flow {
        Flow::Continue
    }

    fn on_key_up(&mut self, _board: &mut Board, _input: &KeyInput) -> Flow {
        Flow::Continue
    }

    fn on_wheel(&mut self, _board: &mut Board, _input: &WheelInput) -> Flow {
        Flow::Continue
    }
}

/// The standard plugin stack, in dispatch order.
pub fn default_plugins(config: &BoardConfig) -> Vec<Box<dyn BoardPlugin>> {
    vec![
        Box::new(HistoryPlugin),
        Box::new(ViewPortPlugin::new(config.wheel_throttle_ms)),
        Box::new(ArrowBindPlugin::default()),
        Box::new(ResizePlugin::default()),
        Box::new(SelectPlugin::default()),
        Box::new(MovePlugin::default()),
        Box::new(CreatePlugin),
    ]
}

/// Dispatches input events to the plugins.
pub struct Editor {
    board: Board,
    plugins: Vec<Box<dyn BoardPlugin>>,
    move_throttle: Throttle,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("board", &self.board)
            .field("plugins", &self.plugin_names())
            .finish()
    }
}

impl Editor {
    pub fn new(board: Board) -> Self {
        let plugins = default_plugins(board.config());
        Self::with_plugins(board, plugins)
    }

    pub fn with_plugins(board: Board, plugins: Vec<Box<dyn BoardPlugin>>) -> Self {
        let move_throttle = Throttle::new(board.config().pointer_move_throttle_ms);
        Self {
            board,
            plugins,
            move_throttle,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn into_board(self) -> Board {
        self.board
    }

    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown(input) => self.pointer_down(input),
            InputEvent::PointerMove(input) => {
                self.pointer_move(input);
            }
            InputEvent::PointerUp(input) => self.pointer_up(input),
            InputEvent::DoubleClick(input) => self.double_click(input),
            InputEvent::KeyDown(input) => self.key_down(input),
            InputEvent::KeyUp(input) => self.key_up(input),
            InputEvent::Wheel(input) => self.wheel(input),
        }
    }

    fn dispatch(&mut self, mut handler: impl FnMut(&mut dyn BoardPlugin, &mut Board) -> Flow) {
        for plugin in self.plugins.iter_mut() {
            if handler(plugin.as_mut(), &mut self.board) == Flow::Stop {
                log::trace!("event handled by {}", plugin.name());
                break;
            }
        }
    }

    pub fn pointer_down(&mut self, input: &PointerInput) {
        self.move_throttle.reset();
        self.dispatch(|plugin, board| plugin.on_pointer_down(board, input));
    }

    /// Returns `false` when the move fell inside the throttle window and was dropped.
    pub fn pointer_move(&mut self, input: &PointerInput) -> bool {
        if !self.move_throttle.ready() {
            return false;
        }
        self.dispatch(|plugin, board| plugin.on_pointer_move(board, input));
        true
    }

    pub fn pointer_up(&mut self, input: &PointerInput) {
        for plugin in self.plugins.iter_mut() {
            plugin.on_pointer_up(&mut self.board, input);
        }
    }

    pub fn double_click(&mut self, input: &PointerInput) {
        self.dispatch(|plugin, board| plugin.on_double_click(board, input));
    }

    pub fn key_down(&mut self, input: &KeyInput) {
        self.dispatch(|plugin, board| plugin.on_key_down(board, input));
    }

    pub fn key_up(&mut self, input: &KeyInput) {
        self.dispatch(|plugin, board| plugin.on_key_up(board, input));
    }

    pub fn wheel(&mut self, input: &WheelInput) {
        self.dispatch(|plugin, board| plugin.on_wheel(board, input));
    }
}

pub(crate) fn doc_point(board: &Board, input: &PointerInput) -> Point {
    board.screen_to_viewport(input.position)
}
