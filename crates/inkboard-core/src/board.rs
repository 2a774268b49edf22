//! The document store.
//!
//! A [`Board`] owns the element tree, the viewport and the selection. Every
//! change goes through [`Board::apply`], which edits a copy-on-write draft,
//! commits it in one step, records history and notifies subscribers.

use crate::config::BoardConfig;
use crate::elements::{ElementId, Node};
use crate::error::{BoardError, BoardResult};
use crate::events::{BoardEvent, EventBus, Subscription, Topic};
use crate::operation::{Operation, Path};
use crate::plugins::Registry;
use crate::refline::RefLine;
use crate::selection::Selection;
use crate::tree::{self, TreeChange};
use crate::viewport::ViewPort;
use kurbo::Point;
use std::collections::VecDeque;
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// What an [`Board::apply`] call did.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Operations that took effect.
    pub applied: usize,
    /// Index within the batch and reason for every skipped operation.
    pub skipped: Vec<(usize, BoardError)>,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug, Default)]
struct History {
    undos: VecDeque<Vec<Operation>>,
    redos: Vec<Vec<Operation>>,
    last_push: Option<Instant>,
}

/// Element tree, viewport and selection of one whiteboard.
pub struct Board {
    children: Arc<[Node]>,
    viewport: ViewPort,
    selection: Selection,
    history: History,
    registry: Arc<Registry>,
    events: EventBus,
    config: BoardConfig,
    readonly: bool,
    /// Alignment guides of the gesture in progress.
    guides: Vec<RefLine>,
    /// Frame a drag would currently drop into.
    drop_target: Option<ElementId>,
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("children", &self.children.len())
            .field("viewport", &self.viewport)
            .field("selected", &self.selection.ids())
            .field("undos", &self.history.undos.len())
            .field("redos", &self.history.redos.len())
            .field("readonly", &self.readonly)
            .finish()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Board {
    pub fn new(children: Vec<Node>) -> Self {
        Self::with_config(children, BoardConfig::default())
    }

    pub fn with_config(children: Vec<Node>, config: BoardConfig) -> Self {
        Self::with_registry(children, config, Arc::new(Registry::with_defaults()))
    }

    pub fn with_registry(children: Vec<Node>, config: BoardConfig, registry: Arc<Registry>) -> Self {
        Self {
            children: children.into(),
            viewport: ViewPort::default(),
            selection: Selection::default(),
            history: History::default(),
            registry,
            events: EventBus::new(),
            config,
            readonly: false,
            guides: Vec::new(),
            drop_target: None,
        }
    }

    /// Parse a persisted element array.
    pub fn from_json(json: &str, config: BoardConfig) -> BoardResult<Self> {
        let children: Vec<Node> = serde_json::from_str(json)?;
        Ok(Self::with_config(children, config))
    }

    pub fn to_json(&self) -> BoardResult<String> {
        Ok(serde_json::to_string_pretty(&*self.children)?)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Cheap handle to the committed tree.
    pub fn snapshot(&self) -> Arc<[Node]> {
        self.children.clone()
    }

    pub fn viewport(&self) -> &ViewPort {
        &self.viewport
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self, topic: Topic, listener: impl FnMut(&BoardEvent) + 'static) -> Subscription {
        self.events.subscribe(topic, listener)
    }

    pub fn emit(&self, event: BoardEvent) {
        self.events.emit(event);
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    pub fn guides(&self) -> &[RefLine] {
        &self.guides
    }

    pub fn set_guides(&mut self, guides: Vec<RefLine>) {
        self.guides = guides;
    }

    pub fn drop_target(&self) -> Option<&str> {
        self.drop_target.as_deref()
    }

    pub fn set_drop_target(&mut self, target: Option<ElementId>) {
        self.drop_target = target;
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        tree::find(&self.children, id)
    }

    pub fn path_of(&self, id: &str) -> Option<Path> {
        tree::path_of(&self.children, id)
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        tree::node_at(&self.children, path)
    }

    pub fn parent_of(&self, id: &str) -> Option<&Node> {
        tree::parent_of(&self.children, id)
    }

    /// Every element in render order.
    pub fn elements(&self) -> Vec<Node> {
        tree::flatten(&self.children)
    }

    /// Elements under `point` in render order; the top-most is last.
    pub fn hit_elements(&self, point: Point) -> Vec<Node> {
        let mut hits = Vec::new();
        tree::walk(&self.children, &mut |node: &Node, _: &[usize]| {
            if self.registry.is_hit(node, point, &self.config) {
                hits.push(node.clone());
            }
        });
        hits
    }

    pub fn top_hit(&self, point: Point) -> Option<Node> {
        self.hit_elements(point).pop()
    }

    pub fn screen_to_viewport(&self, screen: Point) -> Point {
        self.viewport.screen_to_viewport(screen)
    }

    /// Apply a batch.
    ///
    /// Tree operations edit a draft that is committed once the whole batch
    /// has run. An operation that fails is skipped and reported while the
    /// rest of the batch still applies. With `record` the applied operations
    /// become one undo step.
    pub fn apply(&mut self, ops: impl IntoIterator<Item = Operation>, record: bool) -> ApplyReport {
        let mut report = ApplyReport::default();
        let mut draft: Option<Vec<Node>> = None;
        let mut selection = None;
        let mut viewport = None;
        let mut changed = Vec::new();
        let mut removed = Vec::new();
        let mut applied = Vec::new();

        for (index, op) in ops.into_iter().enumerate() {
            if self.readonly && !matches!(op, Operation::SetViewport { .. }) {
                log::debug!("read-only board, skipping operation {}", index);
                report.skipped.push((index, BoardError::ReadOnly));
                continue;
            }
            match &op {
                Operation::SetViewport { after, .. } => viewport = Some(*after),
                Operation::SetSelection { after, .. } => selection = Some(after.clone()),
                _ => {
                    let children = draft.get_or_insert_with(|| self.children.to_vec());
                    match tree::apply_op(children, &op) {
                        Ok(TreeChange::Inserted(node)) | Ok(TreeChange::Patched(node)) => changed.push(node),
                        Ok(TreeChange::Removed(node)) => removed.push(node),
                        Ok(TreeChange::Moved(_)) => {}
                        Err(err) => {
                            log::warn!("skipping operation {}: {}", index, err);
                            report.skipped.push((index, err));
                            continue;
                        }
                    }
                }
            }
            report.applied += 1;
            applied.push(op);
        }

        if let Some(children) = draft {
            self.children = children.into();
        }
        if let Some(viewport) = viewport {
            self.viewport = viewport;
        }
        if let Some(selection) = &selection {
            self.selection = selection.clone();
        }
        if record && !applied.is_empty() {
            self.push_history(applied.clone());
        }

        let tree_changed = applied.iter().any(Operation::is_tree_op);
        if tree_changed {
            self.events.emit(BoardEvent::ValueChange(self.children.clone()));
        }
        if let Some(viewport) = viewport {
            self.events.emit(BoardEvent::ViewPortChange(viewport));
        }
        if let Some(selection) = selection {
            self.events.emit(BoardEvent::SelectionChange(selection));
        }
        if !changed.is_empty() {
            self.events.emit(BoardEvent::ElementChange(changed));
        }
        if !removed.is_empty() {
            self.events.emit(BoardEvent::ElementRemove(removed));
        }
        report
    }

    /// Replace the tree without events or history. Used to drop the previews
    /// of a gesture before committing its final state.
    pub fn restore_children(&mut self, children: Arc<[Node]>) {
        self.children = children;
    }

    fn push_history(&mut self, ops: Vec<Operation>) {
        let now = Instant::now();
        let window = self.config.history_merge_window_ms;
        let merge = window > 0
            && self
                .history
                .last_push
                .is_some_and(|last| now.duration_since(last).as_millis() < u128::from(window));
        match self.history.undos.back_mut() {
            Some(last) if merge => last.extend(ops),
            _ => self.history.undos.push_back(ops),
        }
        self.history.last_push = Some(now);
        self.history.redos.clear();
        while self.history.undos.len() > self.config.history_limit {
            self.history.undos.pop_front();
            log::debug!("history limit {} reached, dropping oldest entry", self.config.history_limit);
        }
    }

    /// Number of undo steps currently available.
    pub fn undo_depth(&self) -> usize {
        self.history.undos.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.history.redos.is_empty()
    }

    /// Revert the last recorded batch. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if self.readonly {
            return false;
        }
        let Some(batch) = self.history.undos.pop_back() else {
            return false;
        };
        let inverse: Vec<Operation> = batch.iter().rev().map(Operation::inverse).collect();
        let report = self.apply(inverse, false);
        debug_assert!(report.is_complete(), "undo skipped operations: {:?}", report.skipped);
        self.history.redos.push(batch);
        self.history.last_push = None;
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.readonly {
            return false;
        }
        let Some(batch) = self.history.redos.pop() else {
            return false;
        };
        let report = self.apply(batch.clone(), false);
        debug_assert!(report.is_complete(), "redo skipped operations: {:?}", report.skipped);
        self.history.undos.push_back(batch);
        self.history.last_push = None;
        true
    }
}
