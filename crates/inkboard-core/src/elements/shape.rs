//! Geometry element: a rectangle or a normalized SVG path scaled to its box.

use crate::geometry::{BBox, transform_path};
use serde::{Deserialize, Serialize};

fn default_stroke_width() -> f64 {
    2.0
}

/// A basic shape. `path`, when present, is drawn in the unit square.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
}

impl Geometry {
    /// Plain rectangle.
    pub fn rect(bbox: BBox) -> Self {
        Self {
            x: bbox.x,
            y: bbox.y,
            width: bbox.width,
            height: bbox.height,
            path: None,
            fill: None,
            stroke: None,
            stroke_width: default_stroke_width(),
        }
    }

    pub fn with_path(bbox: BBox, path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::rect(bbox)
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

    /// Path data scaled to the current size, relative to the element origin.
    pub fn scaled_path(&self) -> Option<String> {
        self.path
            .as_deref()
            .map(|path| transform_path(path, self.width, self.height))
    }
}
