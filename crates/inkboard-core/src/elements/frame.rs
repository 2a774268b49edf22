//! Frame element: a titled container that owns the elements inside it.

use super::{BoardElement, Node};
use crate::geometry::{BBox, bounding_box};
use serde::{Deserialize, Serialize};

/// How much of an element must overlap a frame for it to count as a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainmentPolicy {
    /// The element's box lies fully inside the padded frame.
    Full,
    /// Any overlap with positive area with the padded frame.
    #[default]
    Partial,
}

fn default_title() -> String {
    "Frame".to_string()
}

fn default_padding() -> f64 {
    20.0
}

fn default_true() -> bool {
    true
}

fn default_min_width() -> f64 {
    100.0
}

fn default_min_height() -> f64 {
    60.0
}

fn default_background() -> String {
    "#f7f8fa".to_string()
}

fn default_border_color() -> String {
    "#d0d5dd".to_string()
}

fn default_border_width() -> f64 {
    1.0
}

fn default_border_radius() -> f64 {
    8.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_title")]
    pub title: String,
    /// Snapshot of the elements inside the frame when containment was last computed.
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default = "default_padding")]
    pub padding: f64,
    #[serde(default)]
    pub containment_policy: ContainmentPolicy,
    #[serde(default = "default_true")]
    pub auto_resize: bool,
    #[serde(default = "default_min_width")]
    pub min_width: f64,
    #[serde(default = "default_min_height")]
    pub min_height: f64,
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default = "default_border_color")]
    pub border_color: String,
    #[serde(default = "default_border_width")]
    pub border_width: f64,
    #[serde(default = "default_border_radius")]
    pub border_radius: f64,
}

impl Frame {
    /// Empty frame with the default style and partial containment.
    pub fn new(bbox: BBox, title: impl Into<String>) -> Self {
        Self {
            x: bbox.x,
            y: bbox.y,
            width: bbox.width,
            height: bbox.height,
            title: title.into(),
            children: Vec::new(),
            padding: default_padding(),
            containment_policy: ContainmentPolicy::default(),
            auto_resize: true,
            min_width: default_min_width(),
            min_height: default_min_height(),
            background_color: default_background(),
            border_color: default_border_color(),
            border_width: default_border_width(),
            border_radius: default_border_radius(),
        }
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_bbox(&mut self, bbox: BBox) {
        self.x = bbox.x;
        self.y = bbox.y;
        self.width = bbox.width;
        self.height = bbox.height;
    }

    /// Frames never nest and arrows are never owned by a frame.
    pub fn can_nest(child: &BoardElement) -> bool {
        !child.is_frame() && !child.is_arrow()
    }

    /// The frame's bounds grown by its padding. Containment is measured against these.
    pub fn padded_bounds(&self) -> BBox {
        self.bbox().inflate(self.padding)
    }

    /// Whether `bbox` satisfies this frame's containment policy.
    pub fn contains_bbox(&self, bbox: &BBox) -> bool {
        let bounds = self.padded_bounds();
        match self.containment_policy {
            ContainmentPolicy::Full => bounds.contains_bbox(bbox),
            ContainmentPolicy::Partial => bounds.intersection_area(bbox) > 0.0,
        }
    }

    pub fn has_child(&self, id: &str) -> bool {
        self.children.iter().any(|c| c.id == id)
    }

    /// Add `child` unless already present or not nestable. Returns whether it was added.
    pub fn add_child(&mut self, child: Node) -> bool {
        if self.has_child(&child.id) || !Self::can_nest(&child) {
            return false;
        }
        self.children.push(child);
        true
    }

    pub fn remove_child(&mut self, id: &str) -> Option<Node> {
        let index = self.children.iter().position(|c| c.id == id)?;
        Some(self.children.remove(index))
    }

    fn children_bounds(children: &[Node]) -> Option<BBox> {
        bounding_box(children.iter().map(|c| c.bbox()))
    }

    /// Bounds grown (never shrunk) so every child fits inside with padding.
    pub fn expanded_bounds(&self, children: &[Node]) -> BBox {
        let Some(content) = Self::children_bounds(children) else {
            return BBox::new(
                self.x,
                self.y,
                self.width.max(self.min_width),
                self.height.max(self.min_height),
            );
        };
        let required = content.inflate(self.padding);
        let x = self.x.min(required.x);
        let y = self.y.min(required.y);
        let right = (self.x + self.width).max(required.right());
        let bottom = (self.y + self.height).max(required.bottom());
        BBox::new(
            x,
            y,
            (right - x).max(self.min_width),
            (bottom - y).max(self.min_height),
        )
    }

    /// Bounds that tightly wrap the children plus padding.
    pub fn fit_bounds(&self, children: &[Node]) -> BBox {
        match Self::children_bounds(children) {
            Some(content) => content.inflate(self.padding),
            None => BBox::new(
                self.x,
                self.y,
                self.width.max(self.min_width),
                self.height.max(self.min_height),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementKind, Geometry};

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Node {
        BoardElement::with_id(id, ElementKind::Geometry(Geometry::rect(BBox::new(x, y, w, h))))
            .into_node()
    }

    #[test]
    fn test_full_policy() {
        let mut frame = Frame::new(BBox::new(0.0, 0.0, 200.0, 200.0), "F");
        frame.containment_policy = ContainmentPolicy::Full;
        assert!(frame.contains_bbox(&BBox::new(10.0, 10.0, 50.0, 50.0)));
        assert!(!frame.contains_bbox(&BBox::new(190.0, 10.0, 50.0, 50.0)));
    }

    #[test]
    fn test_partial_policy_needs_area() {
        let frame = Frame::new(BBox::new(0.0, 0.0, 200.0, 200.0), "F");
        assert!(frame.contains_bbox(&BBox::new(190.0, 10.0, 50.0, 50.0)));
        // Touching the padded edge is not an overlap.
        assert!(!frame.contains_bbox(&BBox::new(220.0, 10.0, 50.0, 50.0)));
        assert!(!frame.contains_bbox(&BBox::new(10.0, -70.0, 50.0, 50.0)));
    }

    #[test]
    fn test_padding_band_counts_as_inside() {
        let frame = Frame::new(BBox::new(0.0, 0.0, 200.0, 200.0), "F");
        // Flush against the frame edge and inside the padding band.
        assert!(frame.contains_bbox(&BBox::new(200.0, 10.0, 50.0, 50.0)));
        assert!(frame.contains_bbox(&BBox::new(205.0, 10.0, 10.0, 10.0)));

        let mut full = frame.clone();
        full.containment_policy = ContainmentPolicy::Full;
        assert!(full.contains_bbox(&BBox::new(-20.0, -20.0, 240.0, 240.0)));
        assert!(full.contains_bbox(&BBox::new(205.0, 10.0, 10.0, 10.0)));
        assert!(!full.contains_bbox(&BBox::new(205.0, 10.0, 20.0, 10.0)));
    }

    #[test]
    fn test_nesting_rules() {
        let mut frame = Frame::new(BBox::new(0.0, 0.0, 100.0, 100.0), "F");
        let inner = BoardElement::with_id(
            "inner",
            ElementKind::Frame(Frame::new(BBox::new(0.0, 0.0, 10.0, 10.0), "I")),
        );
        assert!(!frame.add_child(inner.into_node()));
        assert!(frame.add_child(rect("r", 0.0, 0.0, 5.0, 5.0)));
        assert!(!frame.add_child(rect("r", 0.0, 0.0, 5.0, 5.0)));
        assert!(frame.remove_child("r").is_some());
        assert!(frame.children.is_empty());
    }

    #[test]
    fn test_expanded_bounds_only_grow() {
        let frame = Frame::new(BBox::new(0.0, 0.0, 200.0, 200.0), "F");
        let inside = [rect("a", 50.0, 50.0, 10.0, 10.0)];
        assert_eq!(frame.expanded_bounds(&inside), frame.bbox());

        let outside = [rect("b", 190.0, 10.0, 50.0, 50.0)];
        assert_eq!(frame.expanded_bounds(&outside), BBox::new(0.0, 0.0, 260.0, 200.0));
    }

    #[test]
    fn test_fit_bounds() {
        let frame = Frame::new(BBox::new(0.0, 0.0, 500.0, 500.0), "F");
        let children = [rect("a", 50.0, 50.0, 10.0, 10.0), rect("b", 100.0, 80.0, 20.0, 20.0)];
        assert_eq!(frame.fit_bounds(&children), BBox::new(30.0, 30.0, 110.0, 90.0));
        assert_eq!(frame.fit_bounds(&[]), frame.bbox());
    }
}
