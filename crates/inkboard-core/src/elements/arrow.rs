//! Arrow element and connection points.

use crate::geometry::{BBox, polyline_path};
use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length reserved for an arrow head at a curved end.
pub const ARROW_SIZE: f64 = 8.0;

/// Named anchor on an element's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectId {
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

impl ConnectId {
    pub const ALL: [ConnectId; 5] = [
        ConnectId::Top,
        ConnectId::Bottom,
        ConnectId::Left,
        ConnectId::Right,
        ConnectId::Center,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectId::Top => "top",
            ConnectId::Bottom => "bottom",
            ConnectId::Left => "left",
            ConnectId::Right => "right",
            ConnectId::Center => "center",
        }
    }

    fn is_vertical_side(self) -> bool {
        matches!(self, ConnectId::Top | ConnectId::Bottom)
    }
}

impl fmt::Display for ConnectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectPoint {
    pub connect_id: ConnectId,
    pub point: Point,
}

/// Location of a connection point on `bbox`.
pub fn bind_point(bbox: &BBox, connect_id: ConnectId) -> Point {
    let center = bbox.center();
    match connect_id {
        ConnectId::Top => Point::new(center.x, bbox.y),
        ConnectId::Bottom => Point::new(center.x, bbox.bottom()),
        ConnectId::Left => Point::new(bbox.x, center.y),
        ConnectId::Right => Point::new(bbox.right(), center.y),
        ConnectId::Center => center,
    }
}

/// The five connection points of a box.
pub fn connect_points(bbox: &BBox) -> [ConnectPoint; 5] {
    ConnectId::ALL.map(|connect_id| ConnectPoint {
        connect_id,
        point: bind_point(bbox, connect_id),
    })
}

/// Connection points pushed `extend` units outward (the center stays put).
pub fn extend_connect_points(bbox: &BBox, extend: f64) -> [ConnectPoint; 5] {
    connect_points(bbox).map(|mut cp| {
        match cp.connect_id {
            ConnectId::Top => cp.point.y -= extend,
            ConnectId::Bottom => cp.point.y += extend,
            ConnectId::Left => cp.point.x -= extend,
            ConnectId::Right => cp.point.x += extend,
            ConnectId::Center => {}
        }
        cp
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    #[default]
    None,
    Arrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowLineType {
    #[default]
    Straight,
    Curve,
    Orthogonal,
}

/// One end of an arrow. A bound end follows `bind_id`'s connection point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowEnd {
    #[serde(default)]
    pub marker: Marker,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_id: Option<ConnectId>,
}

impl ArrowEnd {
    pub fn floating(marker: Marker) -> Self {
        Self {
            marker,
            bind_id: None,
            connect_id: None,
        }
    }

    pub fn bound(marker: Marker, bind_id: impl Into<String>, connect_id: ConnectId) -> Self {
        Self {
            marker,
            bind_id: Some(bind_id.into()),
            connect_id: Some(connect_id),
        }
    }

    /// The bound element and anchor, when both are set.
    pub fn binding(&self) -> Option<(&str, ConnectId)> {
        match (&self.bind_id, self.connect_id) {
            (Some(id), Some(connect_id)) => Some((id.as_str(), connect_id)),
            _ => None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bind_id.is_some()
    }

    pub fn is_bound_to(&self, id: &str) -> bool {
        self.bind_id.as_deref() == Some(id)
    }

    pub fn unbind(&mut self) {
        self.bind_id = None;
        self.connect_id = None;
    }
}

fn default_target() -> ArrowEnd {
    ArrowEnd::floating(Marker::Arrow)
}

fn default_stroke() -> String {
    "#1f1f1f".to_string()
}

fn default_stroke_width() -> f64 {
    2.0
}

/// A connector. Only the first and last points can be derived from bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrow {
    pub points: Vec<Point>,
    #[serde(default)]
    pub source: ArrowEnd,
    #[serde(default = "default_target")]
    pub target: ArrowEnd,
    #[serde(default)]
    pub line_type: ArrowLineType,
    #[serde(default = "default_stroke")]
    pub stroke: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
}

impl Arrow {
    /// Unbound straight arrow with a head at `end`.
    pub fn between(start: Point, end: Point) -> Self {
        Self {
            points: vec![start, end],
            source: ArrowEnd::floating(Marker::None),
            target: default_target(),
            line_type: ArrowLineType::default(),
            stroke: default_stroke(),
            stroke_width: default_stroke_width(),
        }
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn set_start(&mut self, point: Point) {
        if let Some(first) = self.points.first_mut() {
            *first = point;
        }
    }

    pub fn set_end(&mut self, point: Point) {
        if let Some(last) = self.points.last_mut() {
            *last = point;
        }
    }

    pub fn is_bound(&self) -> bool {
        self.source.is_bound() || self.target.is_bound()
    }

    pub fn is_bound_to(&self, id: &str) -> bool {
        self.source.is_bound_to(id) || self.target.is_bound_to(id)
    }

    pub fn bbox(&self) -> BBox {
        let mut iter = self.points.iter();
        let Some(first) = iter.next() else {
            return BBox::default();
        };
        let (mut min, mut max) = (*first, *first);
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        BBox::from_points(min, max)
    }

    /// Map every point from the current box into `bbox`.
    pub fn set_bbox(&mut self, bbox: BBox) {
        let old = self.bbox();
        let sx = if old.width > 0.0 { bbox.width / old.width } else { 1.0 };
        let sy = if old.height > 0.0 { bbox.height / old.height } else { 1.0 };
        for p in &mut self.points {
            p.x = bbox.x + (p.x - old.x) * sx;
            p.y = bbox.y + (p.y - old.y) * sy;
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }

    /// Vertices of the drawn route. Two-point orthogonal arrows gain elbows.
    pub fn route(&self) -> Vec<Point> {
        match (self.line_type, self.points.as_slice()) {
            (ArrowLineType::Orthogonal, [start, end]) => orthogonal_points(
                *start,
                *end,
                self.source.connect_id,
                self.target.connect_id,
            ),
            _ => self.points.clone(),
        }
    }

    /// Drawn outline of the arrow.
    pub fn to_path(&self) -> BezPath {
        match self.line_type {
            ArrowLineType::Straight | ArrowLineType::Orthogonal => {
                polyline_path(&self.route(), false)
            }
            ArrowLineType::Curve => self.curve_path(),
        }
    }

    /// SVG path data for the arrow.
    pub fn svg_path(&self) -> String {
        self.to_path().to_svg()
    }

    fn curve_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(first) = self.points.first() else {
            return path;
        };
        path.move_to(*first);
        let last_index = self.points.len() - 1;
        for (index, pair) in self.points.windows(2).enumerate() {
            let segment = index + 1;
            let mid = middle_points(
                pair[0],
                pair[1],
                segment == 1 && self.source.marker != Marker::None,
                segment == last_index && self.target.marker != Marker::None,
            );
            path.line_to(mid[0]);
            path.curve_to(mid[1], mid[2], mid[3]);
            path.line_to(pair[1]);
        }
        path
    }
}

/// Control points of the cubic joining `start` and `end`, leaving room for markers.
fn middle_points(start: Point, end: Point, start_marker: bool, end_marker: bool) -> [Point; 4] {
    let w = end.x - start.x;
    let h = end.y - start.y;
    let offset = |has_marker: bool, delta: f64| {
        if has_marker { delta.signum() * ARROW_SIZE } else { 0.0 }
    };
    if w.abs() >= h.abs() {
        [
            Point::new(start.x + offset(start_marker, w), start.y),
            Point::new(start.x + w / 2.0, start.y),
            Point::new(start.x + w / 2.0, end.y),
            Point::new(end.x - offset(end_marker, w), end.y),
        ]
    } else {
        [
            Point::new(start.x, start.y + offset(start_marker, h)),
            Point::new(start.x, start.y + h / 2.0),
            Point::new(end.x, start.y + h / 2.0),
            Point::new(end.x, end.y - offset(end_marker, h)),
        ]
    }
}

/// Elbow route between two points, chosen from the anchors the ends attach to.
pub fn orthogonal_points(
    start: Point,
    end: Point,
    source: Option<ConnectId>,
    target: Option<ConnectId>,
) -> Vec<Point> {
    let w = end.x - start.x;
    let h = end.y - start.y;
    let vertical_first = match (source, target) {
        (Some(s), Some(_)) => s.is_vertical_side(),
        _ => w.abs() <= h.abs(),
    };
    let (a, b) = if vertical_first {
        let mid_y = start.y + h / 2.0;
        (Point::new(start.x, mid_y), Point::new(end.x, mid_y))
    } else {
        let mid_x = start.x + w / 2.0;
        (Point::new(mid_x, start.y), Point::new(mid_x, end.y))
    };
    vec![start, a, b, end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_points() {
        let bbox = BBox::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(bind_point(&bbox, ConnectId::Right), Point::new(100.0, 50.0));
        assert_eq!(bind_point(&bbox, ConnectId::Top), Point::new(50.0, 0.0));
        let extended = extend_connect_points(&bbox, 20.0);
        assert_eq!(extended[2].connect_id, ConnectId::Left);
        assert_eq!(extended[2].point, Point::new(-20.0, 50.0));
        assert_eq!(extended[4].point, Point::new(50.0, 50.0));
    }

    #[test]
    fn test_orthogonal_routes() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(100.0, 40.0);
        let lr = orthogonal_points(start, end, Some(ConnectId::Right), Some(ConnectId::Left));
        assert_eq!(lr[1], Point::new(50.0, 0.0));
        assert_eq!(lr[2], Point::new(50.0, 40.0));

        let tb = orthogonal_points(start, end, Some(ConnectId::Bottom), Some(ConnectId::Top));
        assert_eq!(tb[1], Point::new(0.0, 20.0));

        let free = orthogonal_points(start, end, None, None);
        assert_eq!(free[1], Point::new(50.0, 0.0));
    }

    #[test]
    fn test_set_bbox_remaps_points() {
        let mut arrow = Arrow::between(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        arrow.set_bbox(BBox::new(5.0, 5.0, 20.0, 20.0));
        assert_eq!(arrow.points, vec![Point::new(5.0, 5.0), Point::new(25.0, 25.0)]);
    }

    #[test]
    fn test_curve_path_starts_and_ends_on_points() {
        let mut arrow = Arrow::between(Point::new(0.0, 0.0), Point::new(100.0, 20.0));
        arrow.line_type = ArrowLineType::Curve;
        let svg = arrow.svg_path();
        assert!(svg.starts_with("M0,0"));
        assert!(svg.ends_with("L100,20"));
        assert!(svg.contains('C'));
    }

    #[test]
    fn test_binding() {
        let mut end = ArrowEnd::bound(Marker::Arrow, "r1", ConnectId::Left);
        assert_eq!(end.binding(), Some(("r1", ConnectId::Left)));
        end.unbind();
        assert!(!end.is_bound());
        assert_eq!(end.marker, Marker::Arrow);
    }
}
