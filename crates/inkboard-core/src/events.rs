//! Typed event bus for change notifications.
//!
//! Listeners are registered per [`Topic`] and stay registered for as long as
//! the returned [`Subscription`] is alive.

use crate::elements::{ConnectId, Node};
use crate::selection::Selection;
use crate::viewport::ViewPort;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    ValueChange,
    ViewPortChange,
    SelectionChange,
    ElementChange,
    ElementMove,
    ElementMoveEnd,
    ElementResize,
    ElementRemove,
    ArrowUpdate,
    ArrowMoveEnd,
    ArrowDrop,
    ArrowAddClosingElements,
    ArrowRemoveClosingElements,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::ValueChange => "onValueChange",
            Topic::ViewPortChange => "onViewPortChange",
            Topic::SelectionChange => "onSelectionChange",
            Topic::ElementChange => "element:change",
            Topic::ElementMove => "element:move",
            Topic::ElementMoveEnd => "element:move-end",
            Topic::ElementResize => "element:resize",
            Topic::ElementRemove => "element:remove",
            Topic::ArrowUpdate => "arrow:update",
            Topic::ArrowMoveEnd => "arrow:move-end",
            Topic::ArrowDrop => "arrow:drop",
            Topic::ArrowAddClosingElements => "arrow:add-closing-elements",
            Topic::ArrowRemoveClosingElements => "arrow:remove-closing-elements",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum BoardEvent {
    /// The committed element tree.
    ValueChange(Arc<[Node]>),
    ViewPortChange(ViewPort),
    SelectionChange(Selection),
    /// Nodes patched or inserted by the last batch.
    ElementChange(Vec<Node>),
    ElementMove(Vec<Node>),
    ElementMoveEnd(Vec<Node>),
    ElementResize(Vec<Node>),
    ElementRemove(Vec<Node>),
    /// Live state of an arrow being dragged.
    ArrowUpdate(Node),
    ArrowMoveEnd(Node),
    /// The connection point the dragged arrow end currently snaps to, if any.
    ArrowDrop {
        element_id: Option<String>,
        connect_id: Option<ConnectId>,
    },
    /// Elements that started broadcasting connection points.
    ArrowAddClosingElements(Vec<Node>),
    ArrowRemoveClosingElements(Vec<Node>),
}

impl BoardEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BoardEvent::ValueChange(_) => Topic::ValueChange,
            BoardEvent::ViewPortChange(_) => Topic::ViewPortChange,
            BoardEvent::SelectionChange(_) => Topic::SelectionChange,
            BoardEvent::ElementChange(_) => Topic::ElementChange,
            BoardEvent::ElementMove(_) => Topic::ElementMove,
            BoardEvent::ElementMoveEnd(_) => Topic::ElementMoveEnd,
            BoardEvent::ElementResize(_) => Topic::ElementResize,
            BoardEvent::ElementRemove(_) => Topic::ElementRemove,
            BoardEvent::ArrowUpdate(_) => Topic::ArrowUpdate,
            BoardEvent::ArrowMoveEnd(_) => Topic::ArrowMoveEnd,
            BoardEvent::ArrowDrop { .. } => Topic::ArrowDrop,
            BoardEvent::ArrowAddClosingElements(_) => Topic::ArrowAddClosingElements,
            BoardEvent::ArrowRemoveClosingElements(_) => Topic::ArrowRemoveClosingElements,
        }
    }
}

type Listener = Rc<RefCell<dyn FnMut(&BoardEvent)>>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Topic, Listener)>,
}

/// Single-threaded publish/subscribe hub.
#[derive(Default)]
pub struct EventBus {
    inner: Rc<RefCell<Listeners>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.inner.borrow().entries.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `topic`. Dropping the subscription unregisters it.
    pub fn subscribe(&self, topic: Topic, listener: impl FnMut(&BoardEvent) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push((id, topic, Rc::new(RefCell::new(listener))));
        Subscription {
            id,
            bus: Rc::downgrade(&self.inner),
        }
    }

    pub fn emit(&self, event: BoardEvent) {
        let topic = event.topic();
        // Snapshot first: listeners may subscribe or unsubscribe while being called
        let listeners: Vec<Listener> = self
            .inner
            .borrow()
            .entries
            .iter()
            .filter(|(_, t, _)| *t == topic)
            .map(|(_, _, l)| l.clone())
            .collect();
        for listener in listeners {
            match listener.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(&event),
                Err(_) => log::warn!("skipping re-entrant {} listener", topic),
            }
        }
    }

    pub fn listener_count(&self, topic: Topic) -> usize {
        self.inner
            .borrow()
            .entries
            .iter()
            .filter(|(_, t, _)| *t == topic)
            .count()
    }
}

/// Keeps a listener registered until dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    bus: Weak<RefCell<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            if let Ok(mut inner) = bus.try_borrow_mut() {
                inner.entries.retain(|(id, _, _)| *id != self.id);
            }
        }
    }
}
