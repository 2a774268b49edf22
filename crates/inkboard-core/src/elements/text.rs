//! Rich text and card elements.
//!
//! Both kinds size themselves to their laid-out content until the user
//! resizes them by hand; `resized` records which regime applies.

use crate::geometry::BBox;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Size of a freshly created text block.
pub const NEW_TEXT_WIDTH: f64 = 32.0;
pub const NEW_TEXT_HEIGHT: f64 = 42.0;

fn default_max_width() -> f64 {
    300.0
}

fn default_max_height() -> f64 {
    1000.0
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Apply a laid-out content size. Returns false when nothing changed or the
/// element has been manually resized.
fn track_natural_size(
    width: &mut f64,
    height: &mut f64,
    resized: Option<bool>,
    natural_width: f64,
    natural_height: f64,
) -> bool {
    if resized == Some(true) {
        return false;
    }
    let (w, h) = (round2(natural_width), round2(natural_height));
    if *width == w && *height == h {
        return false;
    }
    *width = w;
    *height = h;
    true
}

/// Empty document for the rich-text editor.
pub fn empty_content() -> Value {
    json!([{ "type": "paragraph", "children": [{ "type": "formatted", "text": "" }] }])
}

/// A free-floating rich text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichText {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Editor document, opaque to the engine.
    #[serde(default)]
    pub content: Value,
    #[serde(default = "default_max_width")]
    pub max_width: f64,
    #[serde(default = "default_max_height")]
    pub max_height: f64,
    /// `Some(true)` once the user has resized the block by hand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resized: Option<bool>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_focus: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl RichText {
    /// Empty, auto-sized, focused block at `position`.
    pub fn new(position: Point) -> Self {
        Self {
            x: position.x,
            y: position.y,
            width: NEW_TEXT_WIDTH,
            height: NEW_TEXT_HEIGHT,
            content: empty_content(),
            max_width: default_max_width(),
            max_height: default_max_height(),
            resized: Some(false),
            readonly: false,
            auto_focus: true,
            background: None,
            color: None,
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

    /// Manual resize: stop tracking content size and pin the limits to the box.
    pub fn resize_manually(&mut self, bbox: BBox) {
        self.set_bbox(bbox);
        self.resized = Some(true);
        self.max_width = bbox.width;
        self.max_height = bbox.height;
    }

    pub fn apply_natural_size(&mut self, width: f64, height: f64) -> bool {
        track_natural_size(&mut self.width, &mut self.height, self.resized, width, height)
    }
}

/// A card: text whose content lives in an external card store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub card_id: String,
    #[serde(default = "default_max_width")]
    pub max_width: f64,
    #[serde(default = "default_max_height")]
    pub max_height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resized: Option<bool>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl Card {
    pub fn new(position: Point, card_id: impl Into<String>) -> Self {
        Self {
            x: position.x,
            y: position.y,
            width: default_max_width(),
            height: NEW_TEXT_HEIGHT,
            card_id: card_id.into(),
            max_width: default_max_width(),
            max_height: default_max_height(),
            resized: Some(false),
            readonly: false,
            background: None,
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

    pub fn resize_manually(&mut self, bbox: BBox) {
        self.set_bbox(bbox);
        self.resized = Some(true);
        self.max_width = bbox.width;
        self.max_height = bbox.height;
    }

    pub fn apply_natural_size(&mut self, width: f64, height: f64) -> bool {
        track_natural_size(&mut self.width, &mut self.height, self.resized, width, height)
    }
}
