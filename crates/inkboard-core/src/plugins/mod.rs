//! Per-kind element behavior.
//!
//! Each element kind registers an [`ElementBehavior`] in a [`Registry`]. The
//! trait's default methods treat the element as an axis-aligned rectangle with
//! eight resize handles and five connection points; kinds override what differs.

mod arrow;
mod common;
mod frame;
mod media;
mod text;

pub use arrow::ArrowBehavior;
pub use common::{escape_xml, expand_parent_frame};
pub use frame::{FrameBehavior, recompute_frame_containment};
pub use media::{GeometryBehavior, ImageBehavior, VideoBehavior, WebviewBehavior};
pub use text::{CardBehavior, RichTextBehavior, plain_text};

use crate::collab::{CardStore, ContentRenderer};
use crate::config::BoardConfig;
use crate::elements::{
    BoardElement, ConnectId, ConnectPoint, ElementType, Node, bind_point, connect_points,
    extend_connect_points,
};
use crate::error::BoardResult;
use crate::geometry::{BBox, bounding_box};
use crate::operation::Transaction;
use crate::selection::SelectArea;
use kurbo::Point;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Collaborators and flags available while rendering.
#[derive(Clone, Copy, Default)]
pub struct RenderContext<'a> {
    pub card_store: Option<&'a dyn CardStore>,
    pub content_renderer: Option<&'a dyn ContentRenderer>,
    pub readonly: bool,
}

/// Capabilities of one element kind.
pub trait ElementBehavior: Send + Sync {
    fn element_type(&self) -> ElementType;

    /// Inclusive rectangle hit test.
    fn is_hit(&self, element: &BoardElement, point: Point, _config: &BoardConfig) -> bool {
        element.bbox().contains(point)
    }

    /// The element translated by `(dx, dy)`, or `None` if it cannot move on its own.
    fn move_element(&self, element: &BoardElement, dx: f64, dy: f64) -> Option<BoardElement> {
        let mut moved = element.clone();
        moved.translate(dx, dy);
        Some(moved)
    }

    fn is_element_selected(&self, element: &BoardElement, area: &SelectArea, _config: &BoardConfig) -> bool {
        element.bbox().intersects(&area.to_bbox())
    }

    /// Points an arrow end can bind to.
    fn connect_points(&self, element: &BoardElement) -> Vec<ConnectPoint> {
        connect_points(&element.bbox()).to_vec()
    }

    /// Draggable arrow origins, pushed outward by `extend`.
    fn connect_extend_points(&self, element: &BoardElement, extend: f64) -> Vec<ConnectPoint> {
        extend_connect_points(&element.bbox(), extend).to_vec()
    }

    fn arrow_bind_point(&self, element: &BoardElement, connect_id: ConnectId) -> Option<Point> {
        Some(bind_point(&element.bbox(), connect_id))
    }

    fn is_resizable(&self) -> bool {
        true
    }

    /// The element after a user resize to `bbox`.
    fn resize(&self, element: &BoardElement, bbox: BBox) -> BoardElement {
        let mut resized = element.clone();
        resized.set_bbox(bbox);
        resized
    }

    /// Follow-up edits once a resize of `element_id` is committed.
    fn on_resize_end(&self, element_id: &str, tx: &mut Transaction, _registry: &Registry) -> BoardResult<()> {
        expand_parent_frame(tx, element_id)
    }

    /// SVG fragment for the element. `children` holds the rendered children.
    fn render(&self, element: &BoardElement, children: &str, ctx: &RenderContext<'_>) -> Option<String>;
}

/// Maps element kinds to their behavior.
pub struct Registry {
    behaviors: HashMap<ElementType, Box<dyn ElementBehavior>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.behaviors.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("Registry").field("kinds", &kinds).finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Registry {
    /// Registry with no kinds.
    pub fn empty() -> Self {
        Self {
            behaviors: HashMap::new(),
        }
    }

    /// Registry with every built-in kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(GeometryBehavior));
        registry.register(Box::new(RichTextBehavior));
        registry.register(Box::new(CardBehavior));
        registry.register(Box::new(ImageBehavior));
        registry.register(Box::new(VideoBehavior));
        registry.register(Box::new(WebviewBehavior));
        registry.register(Box::new(FrameBehavior));
        registry.register(Box::new(ArrowBehavior));
        registry
    }

    /// Register or replace the behavior for its kind.
    pub fn register(&mut self, behavior: Box<dyn ElementBehavior>) {
        self.behaviors.insert(behavior.element_type(), behavior);
    }

    pub fn get(&self, element_type: ElementType) -> Option<&dyn ElementBehavior> {
        self.behaviors.get(&element_type).map(|b| b.as_ref())
    }

    pub fn behavior_for(&self, element: &BoardElement) -> Option<&dyn ElementBehavior> {
        self.get(element.element_type())
    }

    pub fn is_hit(&self, element: &BoardElement, point: Point, config: &BoardConfig) -> bool {
        self.behavior_for(element)
            .is_some_and(|b| b.is_hit(element, point, config))
    }

    pub fn move_element(&self, element: &BoardElement, dx: f64, dy: f64) -> Option<BoardElement> {
        self.behavior_for(element)?.move_element(element, dx, dy)
    }

    pub fn is_element_selected(&self, element: &BoardElement, area: &SelectArea, config: &BoardConfig) -> bool {
        self.behavior_for(element)
            .is_some_and(|b| b.is_element_selected(element, area, config))
    }

    pub fn connect_points(&self, element: &BoardElement) -> Vec<ConnectPoint> {
        self.behavior_for(element)
            .map(|b| b.connect_points(element))
            .unwrap_or_default()
    }

    pub fn connect_extend_points(&self, element: &BoardElement, extend: f64) -> Vec<ConnectPoint> {
        self.behavior_for(element)
            .map(|b| b.connect_extend_points(element, extend))
            .unwrap_or_default()
    }

    pub fn arrow_bind_point(&self, element: &BoardElement, connect_id: ConnectId) -> Option<Point> {
        self.behavior_for(element)?.arrow_bind_point(element, connect_id)
    }

    pub fn is_resizable(&self, element: &BoardElement) -> bool {
        self.behavior_for(element).is_some_and(|b| b.is_resizable())
    }

    pub fn resize(&self, element: &BoardElement, bbox: BBox) -> Option<BoardElement> {
        Some(self.behavior_for(element)?.resize(element, bbox))
    }

    pub fn on_resize_end(&self, element: &BoardElement, tx: &mut Transaction) -> BoardResult<()> {
        match self.behavior_for(element) {
            Some(behavior) => behavior.on_resize_end(&element.id, tx, self),
            None => Ok(()),
        }
    }

    /// Render one node and its subtree. Kinds without a behavior render nothing.
    pub fn render_node(&self, node: &BoardElement, ctx: &RenderContext<'_>) -> Option<String> {
        let Some(behavior) = self.behavior_for(node) else {
            log::debug!("no behavior for {} element {}, skipping render", node.element_type(), node.id);
            return None;
        };
        let mut children = String::new();
        for child in node.children() {
            if let Some(svg) = self.render_node(child, ctx) {
                children.push_str(&svg);
            }
        }
        behavior.render(node, &children, ctx)
    }

    /// Render a whole tree into a standalone SVG document.
    pub fn render_svg(&self, children: &[Node], ctx: &RenderContext<'_>) -> String {
        let bounds = bounding_box(children.iter().map(|c| c.bbox()))
            .unwrap_or_default()
            .inflate(10.0);
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
            bounds.x, bounds.y, bounds.width, bounds.height
        );
        for node in children {
            if let Some(svg) = self.render_node(node, ctx) {
                out.push_str(&svg);
            }
        }
        out.push_str("</svg>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementKind, Geometry};

    fn rect(id: &str, bbox: BBox) -> BoardElement {
        BoardElement::with_id(id, ElementKind::Geometry(Geometry::rect(bbox)))
    }

    #[test]
    fn test_hit_test_is_inclusive() {
        let registry = Registry::with_defaults();
        let config = BoardConfig::default();
        let element = rect("r", BBox::new(0.0, 0.0, 100.0, 50.0));
        assert!(registry.is_hit(&element, Point::new(0.0, 0.0), &config));
        assert!(registry.is_hit(&element, Point::new(100.0, 50.0), &config));
        assert!(!registry.is_hit(&element, Point::new(100.01, 50.0), &config));
    }

    #[test]
    fn test_missing_kind_renders_nothing() {
        let registry = Registry::empty();
        let children = vec![rect("r", BBox::new(0.0, 0.0, 10.0, 10.0)).into_node()];
        let svg = registry.render_svg(&children, &RenderContext::default());
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("<rect"));
        assert!(!registry.is_hit(&children[0], Point::new(5.0, 5.0), &BoardConfig::default()));
    }

    #[test]
    fn test_default_bind_point() {
        let registry = Registry::with_defaults();
        let element = rect("r", BBox::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(
            registry.arrow_bind_point(&element, ConnectId::Right),
            Some(Point::new(100.0, 50.0))
        );
        assert_eq!(registry.connect_points(&element).len(), 5);
    }
}
