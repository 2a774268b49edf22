//! Element model for the board.
//!
//! Every element is a [`BoardElement`]: a stable id plus an [`ElementKind`]
//! payload discriminated by a `kind` tag in JSON. Frames own their children
//! as shared [`Node`]s so unchanged subtrees are reused between snapshots.

mod arrow;
mod frame;
mod media;
mod shape;
mod text;

pub use arrow::{
    Arrow, ArrowEnd, ArrowLineType, ConnectId, ConnectPoint, Marker, bind_point, connect_points,
    extend_connect_points,
};
pub use frame::{ContainmentPolicy, Frame};
pub use media::{Image, Video, Webview};
pub use shape::Geometry;
pub use text::{Card, NEW_TEXT_HEIGHT, NEW_TEXT_WIDTH, RichText};

use crate::geometry::BBox;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Element identifier.
pub type ElementId = String;

/// Shared, immutable element handle. Mutate through `Arc::make_mut`.
pub type Node = Arc<BoardElement>;

/// Generate a fresh element id.
pub fn new_element_id() -> ElementId {
    Uuid::new_v4().to_string()
}

/// A single element on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardElement {
    pub id: ElementId,
    #[serde(flatten)]
    pub kind: ElementKind,
}

/// Kind-specific element payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ElementKind {
    Geometry(Geometry),
    RichText(RichText),
    Card(Card),
    Image(Image),
    Video(Video),
    Webview(Webview),
    Frame(Frame),
    Arrow(Arrow),
}

/// Kind tag used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Geometry,
    RichText,
    Card,
    Image,
    Video,
    Webview,
    Frame,
    Arrow,
}

impl ElementType {
    pub const ALL: [ElementType; 8] = [
        ElementType::Geometry,
        ElementType::RichText,
        ElementType::Card,
        ElementType::Image,
        ElementType::Video,
        ElementType::Webview,
        ElementType::Frame,
        ElementType::Arrow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Geometry => "geometry",
            ElementType::RichText => "richtext",
            ElementType::Card => "card",
            ElementType::Image => "image",
            ElementType::Video => "video",
            ElementType::Webview => "webview",
            ElementType::Frame => "frame",
            ElementType::Arrow => "arrow",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BoardElement {
    /// Wrap a payload with a freshly generated id.
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: new_element_id(),
            kind,
        }
    }

    pub fn with_id(id: impl Into<ElementId>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn into_node(self) -> Node {
        Arc::new(self)
    }

    pub fn element_type(&self) -> ElementType {
        match &self.kind {
            ElementKind::Geometry(_) => ElementType::Geometry,
            ElementKind::RichText(_) => ElementType::RichText,
            ElementKind::Card(_) => ElementType::Card,
            ElementKind::Image(_) => ElementType::Image,
            ElementKind::Video(_) => ElementType::Video,
            ElementKind::Webview(_) => ElementType::Webview,
            ElementKind::Frame(_) => ElementType::Frame,
            ElementKind::Arrow(_) => ElementType::Arrow,
        }
    }

    /// Bounding box in document coordinates. Arrows report the box of their points.
    pub fn bbox(&self) -> BBox {
        match &self.kind {
            ElementKind::Geometry(e) => e.bbox(),
            ElementKind::RichText(e) => e.bbox(),
            ElementKind::Card(e) => e.bbox(),
            ElementKind::Image(e) => e.bbox(),
            ElementKind::Video(e) => e.bbox(),
            ElementKind::Webview(e) => e.bbox(),
            ElementKind::Frame(e) => e.bbox(),
            ElementKind::Arrow(e) => e.bbox(),
        }
    }

    /// Replace the element's box. Arrow points are remapped into the new box.
    pub fn set_bbox(&mut self, bbox: BBox) {
        match &mut self.kind {
            ElementKind::Geometry(e) => e.set_bbox(bbox),
            ElementKind::RichText(e) => e.set_bbox(bbox),
            ElementKind::Card(e) => e.set_bbox(bbox),
            ElementKind::Image(e) => e.set_bbox(bbox),
            ElementKind::Video(e) => e.set_bbox(bbox),
            ElementKind::Webview(e) => e.set_bbox(bbox),
            ElementKind::Frame(e) => e.set_bbox(bbox),
            ElementKind::Arrow(e) => e.set_bbox(bbox),
        }
    }

    /// Shift this element only. Frame children stay where they are.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        if let Some(arrow) = self.as_arrow_mut() {
            arrow.translate(dx, dy);
            return;
        }
        let bbox = self.bbox();
        self.set_bbox(bbox.translate(dx, dy));
    }

    /// Shift this element and every descendant.
    pub fn translate_deep(&mut self, dx: f64, dy: f64) {
        self.translate(dx, dy);
        if let Some(children) = self.children_mut() {
            for child in children.iter_mut() {
                Arc::make_mut(child).translate_deep(dx, dy);
            }
        }
    }

    pub fn is_frame(&self) -> bool {
        matches!(self.kind, ElementKind::Frame(_))
    }

    pub fn is_arrow(&self) -> bool {
        matches!(self.kind, ElementKind::Arrow(_))
    }

    pub fn as_frame(&self) -> Option<&Frame> {
        match &self.kind {
            ElementKind::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_frame_mut(&mut self) -> Option<&mut Frame> {
        match &mut self.kind {
            ElementKind::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_arrow(&self) -> Option<&Arrow> {
        match &self.kind {
            ElementKind::Arrow(arrow) => Some(arrow),
            _ => None,
        }
    }

    pub fn as_arrow_mut(&mut self) -> Option<&mut Arrow> {
        match &mut self.kind {
            ElementKind::Arrow(arrow) => Some(arrow),
            _ => None,
        }
    }

    /// Direct children (frames only).
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            ElementKind::Frame(frame) => &frame.children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        self.as_frame_mut().map(|frame| &mut frame.children)
    }

    /// Serialize to a JSON property map (`id`, `kind` and payload keys).
    pub fn to_props(&self) -> serde_json::Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Ok(serde_json::Map::new()),
        }
    }

    pub fn from_props(props: serde_json::Map<String, serde_json::Value>) -> serde_json::Result<Self> {
        serde_json::from_value(serde_json::Value::Object(props))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use serde_json::json;

    #[test]
    fn test_minimal_geometry_json() {
        let element: BoardElement = serde_json::from_value(json!({
            "id": "r1", "kind": "geometry", "x": 0, "y": 0, "width": 100, "height": 100
        }))
        .unwrap();
        assert_eq!(element.id, "r1");
        assert_eq!(element.element_type(), ElementType::Geometry);
        assert_eq!(element.bbox(), BBox::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_kind_tag_and_camel_case() {
        let frame = Frame::new(BBox::new(0.0, 0.0, 200.0, 200.0), "Frame");
        let element = BoardElement::with_id("f1", ElementKind::Frame(frame));
        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["kind"], "frame");
        assert_eq!(value["containmentPolicy"], "partial");
        assert_eq!(value["autoResize"], true);
        assert!(value["children"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_arrow_json_shape() {
        let arrow = Arrow::between(Point::new(0.0, 0.0), Point::new(10.0, 5.0));
        let element = BoardElement::with_id("a1", ElementKind::Arrow(arrow));
        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["kind"], "arrow");
        assert_eq!(value["points"][1]["x"], 10.0);
        assert_eq!(value["target"]["marker"], "arrow");
        assert!(value["source"].get("bindId").is_none());
    }

    #[test]
    fn test_translate_deep_moves_children() {
        let child = BoardElement::with_id(
            "c",
            ElementKind::Geometry(Geometry::rect(BBox::new(10.0, 10.0, 10.0, 10.0))),
        );
        let mut frame = Frame::new(BBox::new(0.0, 0.0, 100.0, 100.0), "F");
        frame.children.push(child.into_node());
        let mut element = BoardElement::with_id("f", ElementKind::Frame(frame));

        element.translate(5.0, 0.0);
        assert_eq!(element.children()[0].bbox().x, 10.0);

        element.translate_deep(5.0, 5.0);
        assert_eq!(element.bbox(), BBox::new(10.0, 5.0, 100.0, 100.0));
        assert_eq!(element.children()[0].bbox(), BBox::new(15.0, 15.0, 10.0, 10.0));
    }

    #[test]
    fn test_props_round_trip() {
        let element = BoardElement::with_id(
            "t",
            ElementKind::RichText(RichText::new(Point::new(1.0, 2.0))),
        );
        let props = element.to_props().unwrap();
        assert_eq!(props["kind"], "richtext");
        assert_eq!(BoardElement::from_props(props).unwrap(), element);
    }
}
