//! Visible window of the board.

use crate::geometry::BBox;
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// The world-space window shown on screen.
///
/// `width`/`height` are in document units, so the screen size in pixels is
/// `width * zoom` by `height * zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPort {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
}

impl Default for ViewPort {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            width: 1280.0,
            height: 800.0,
            zoom: 1.0,
        }
    }
}

impl ViewPort {
    /// Window for a screen of `size` pixels at zoom 1.
    pub fn for_screen(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
            ..Self::default()
        }
    }

    /// Screen size in pixels.
    pub fn screen_size(&self) -> Size {
        Size::new(self.width * self.zoom, self.height * self.zoom)
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.min_x, self.min_y, self.width, self.height)
    }

    /// World-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(Vec2::new(-self.min_x, -self.min_y))
    }

    pub fn screen_to_viewport(&self, screen: Point) -> Point {
        Point::new(self.min_x + screen.x / self.zoom, self.min_y + screen.y / self.zoom)
    }

    pub fn viewport_to_screen(&self, world: Point) -> Point {
        self.transform() * world
    }

    /// Shift the window so content follows a screen-space drag of `delta`.
    pub fn panned(&self, delta: Vec2) -> Self {
        Self {
            min_x: self.min_x - delta.x / self.zoom,
            min_y: self.min_y - delta.y / self.zoom,
            ..*self
        }
    }

    /// Zoom to `zoom` (clamped to `[min_zoom, max_zoom]`) keeping the world point
    /// under `screen` fixed.
    pub fn zoomed_at(&self, screen: Point, zoom: f64, min_zoom: f64, max_zoom: f64) -> Self {
        let zoom = zoom.clamp(min_zoom, max_zoom);
        if (zoom - self.zoom).abs() < f64::EPSILON {
            return *self;
        }
        let anchor = self.screen_to_viewport(screen);
        let screen_size = self.screen_size();
        Self {
            min_x: anchor.x - screen.x / zoom,
            min_y: anchor.y - screen.y / zoom,
            width: screen_size.width / zoom,
            height: screen_size.height / zoom,
            zoom,
        }
    }

    /// Center `bounds` on screen at the largest zoom that fits it with `padding` pixels to spare.
    pub fn fit_to_bounds(&self, bounds: BBox, padding: f64, min_zoom: f64, max_zoom: f64) -> Self {
        let screen = self.screen_size();
        if bounds.width <= 0.0 && bounds.height <= 0.0 {
            let center = bounds.center();
            return Self {
                min_x: center.x - 0.5 * self.width,
                min_y: center.y - 0.5 * self.height,
                ..*self
            };
        }
        let available_w = (screen.width - 2.0 * padding).max(1.0);
        let available_h = (screen.height - 2.0 * padding).max(1.0);
        let scale_x = if bounds.width > 0.0 { available_w / bounds.width } else { f64::INFINITY };
        let scale_y = if bounds.height > 0.0 { available_h / bounds.height } else { f64::INFINITY };
        let zoom = scale_x.min(scale_y).clamp(min_zoom, max_zoom);
        let width = screen.width / zoom;
        let height = screen.height / zoom;
        let center = bounds.center();
        Self {
            min_x: center.x - 0.5 * width,
            min_y: center.y - 0.5 * height,
            width,
            height,
            zoom,
        }
    }
}
