//! Inkboard Core Library
//!
//! Document engine for an infinite-canvas whiteboard: an element tree edited
//! through invertible operations, per-kind element behavior, snapping and
//! arrow binding, and the pointer gestures that drive them.

pub mod board;
pub mod collab;
pub mod config;
pub mod elements;
pub mod error;
pub mod events;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod operation;
pub mod plugins;
pub mod refline;
pub mod selection;
pub mod storage;
pub mod transforms;
pub mod tree;
pub mod viewport;

pub use board::{ApplyReport, Board};
pub use config::{BoardConfig, ConfigError};
pub use elements::{BoardElement, ElementId, ElementKind, ElementType, Node};
pub use error::{BoardError, BoardResult};
pub use events::{BoardEvent, EventBus, Subscription, Topic};
pub use geometry::{BBox, HandlePosition};
pub use input::{InputEvent, KeyInput, Modifiers, MouseButton, PointerInput, WheelInput};
pub use interaction::{BoardPlugin, Editor, Flow};
pub use operation::{Operation, Path, Transaction};
pub use plugins::{ElementBehavior, Registry};
pub use refline::{RefLine, RefLines, RefRect};
pub use selection::{SelectArea, Selection};
pub use storage::{Storage, StorageError};
pub use viewport::ViewPort;
