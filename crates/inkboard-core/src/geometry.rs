//! Geometry kernel: bounding boxes, resize math, hit-testing and path scaling.

use kurbo::{BezPath, ParamCurveNearest, Point, Rect, Shape};
use serde::{Deserialize, Serialize};

/// Smallest width or height a resize can produce.
pub const MIN_BBOX_SIZE: f64 = 1.0;

/// Axis-aligned box in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Box spanned by two arbitrary corners.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.right(), self.bottom())
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + 0.5 * self.width, self.y + 0.5 * self.height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Inclusive point containment: points on the boundary are inside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// True if `other` lies entirely inside this box (edges may touch).
    pub fn contains_bbox(&self, other: &BBox) -> bool {
        other.x >= self.x
            && other.right() <= self.right()
            && other.y >= self.y
            && other.bottom() <= self.bottom()
    }

    /// Inclusive overlap test: touching edges count as intersecting.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    /// Area of the overlap with `other`, zero when disjoint or only touching.
    pub fn intersection_area(&self, other: &BBox) -> f64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }

    pub fn inflate(&self, amount: f64) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
        )
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn union(&self, other: &BBox) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// Smallest box enclosing every input box, or `None` for an empty input.
pub fn bounding_box<I: IntoIterator<Item = BBox>>(boxes: I) -> Option<BBox> {
    boxes.into_iter().reduce(|acc, b| acc.union(&b))
}

/// The eight resize handle positions around a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HandlePosition {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl HandlePosition {
    pub const ALL: [HandlePosition; 8] = [
        HandlePosition::TopLeft,
        HandlePosition::Top,
        HandlePosition::TopRight,
        HandlePosition::Right,
        HandlePosition::BottomRight,
        HandlePosition::Bottom,
        HandlePosition::BottomLeft,
        HandlePosition::Left,
    ];

    /// -1 when the handle drags the left edge, 1 for the right edge, 0 otherwise.
    pub fn horizontal_sign(self) -> f64 {
        match self {
            Self::TopLeft | Self::Left | Self::BottomLeft => -1.0,
            Self::TopRight | Self::Right | Self::BottomRight => 1.0,
            Self::Top | Self::Bottom => 0.0,
        }
    }

    /// -1 when the handle drags the top edge, 1 for the bottom edge, 0 otherwise.
    pub fn vertical_sign(self) -> f64 {
        match self {
            Self::TopLeft | Self::Top | Self::TopRight => -1.0,
            Self::BottomLeft | Self::Bottom | Self::BottomRight => 1.0,
            Self::Left | Self::Right => 0.0,
        }
    }

    pub fn is_corner(self) -> bool {
        self.horizontal_sign() != 0.0 && self.vertical_sign() != 0.0
    }

    /// Where this handle sits on `bbox`.
    pub fn point_on(self, bbox: &BBox) -> Point {
        let x = match self.horizontal_sign() {
            s if s < 0.0 => bbox.x,
            s if s > 0.0 => bbox.right(),
            _ => bbox.x + 0.5 * bbox.width,
        };
        let y = match self.vertical_sign() {
            s if s < 0.0 => bbox.y,
            s if s > 0.0 => bbox.bottom(),
            _ => bbox.y + 0.5 * bbox.height,
        };
        Point::new(x, y)
    }
}

/// A resize handle with its position.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in document coordinates.
    pub position: Point,
    pub kind: HandlePosition,
}

impl Handle {
    pub fn new(position: Point, kind: HandlePosition) -> Self {
        Self { position, kind }
    }

    /// Check if a point hits this handle.
    /// `tolerance` should be adjusted for viewport zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// The eight resize handles of a box.
pub fn handles_for(bbox: &BBox) -> [Handle; 8] {
    HandlePosition::ALL.map(|kind| Handle::new(kind.point_on(bbox), kind))
}

/// Resize `original` by dragging `handle` from `anchor` to `current`.
///
/// Only the edges controlled by the handle move; the opposite edges stay put.
/// Sizes never drop below [`MIN_BBOX_SIZE`]. With `preserve_ratio` the axis
/// with the larger delta drives both dimensions at the original aspect ratio.
pub fn resize_bbox(
    original: BBox,
    handle: HandlePosition,
    anchor: Point,
    current: Point,
    preserve_ratio: bool,
) -> BBox {
    let sx = handle.horizontal_sign();
    let sy = handle.vertical_sign();
    let dx = if sx != 0.0 { current.x - anchor.x } else { 0.0 };
    let dy = if sy != 0.0 { current.y - anchor.y } else { 0.0 };
    if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
        return original;
    }

    let mut width = original.width + sx * dx;
    let mut height = original.height + sy * dy;

    if preserve_ratio && original.width > 0.0 && original.height > 0.0 {
        let ratio = original.width / original.height;
        let width_driven = match (sx != 0.0, sy != 0.0) {
            (true, true) => dx.abs() >= dy.abs(),
            (false, true) => false,
            _ => true,
        };
        if width_driven {
            width = width.max(MIN_BBOX_SIZE);
            height = width / ratio;
        } else {
            height = height.max(MIN_BBOX_SIZE);
            width = height * ratio;
        }
    } else {
        width = width.max(MIN_BBOX_SIZE);
        height = height.max(MIN_BBOX_SIZE);
    }

    let x = if sx < 0.0 { original.right() - width } else { original.x };
    let y = if sy < 0.0 { original.bottom() - height } else { original.y };
    BBox::new(x, y, width, height)
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    point.distance(proj)
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => point.distance(*only),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// True if any vertex of the polyline lies in `rect` or any segment crosses its edges.
pub fn polyline_intersects_rect(points: &[Point], rect: &BBox) -> bool {
    if points.iter().any(|p| rect.contains(*p)) {
        return true;
    }
    let corners = [
        Point::new(rect.x, rect.y),
        Point::new(rect.right(), rect.y),
        Point::new(rect.right(), rect.bottom()),
        Point::new(rect.x, rect.bottom()),
    ];
    let edges = [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
    ];
    points.windows(2).any(|w| {
        edges
            .iter()
            .any(|&(c, d)| segments_intersect(w[0], w[1], c, d))
    })
}

/// Test if two line segments (a-b) and (c-d) intersect.
fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let cross = |o: Point, p: Point, q: Point| -> f64 {
        (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x)
    };
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    // Collinear: an endpoint lies on the other segment
    let on_segment = |p: Point, q: Point, r: Point| -> bool {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1.abs() < 1e-10 && on_segment(c, d, a))
        || (d2.abs() < 1e-10 && on_segment(c, d, b))
        || (d3.abs() < 1e-10 && on_segment(a, b, c))
        || (d4.abs() < 1e-10 && on_segment(a, b, d))
}

/// Build a path through `points`, optionally closed.
pub fn polyline_path(points: &[Point], close: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        path.move_to(*first);
        for p in iter {
            path.line_to(*p);
        }
        if close {
            path.close_path();
        }
    }
    path
}

/// Nonzero-winding fill containment.
pub fn is_point_in_path(path: &BezPath, point: Point) -> bool {
    path.contains(point)
}

/// True if `point` is within half of `stroke_width` of any segment of `path`.
pub fn is_point_in_stroke(path: &BezPath, stroke_width: f64, point: Point) -> bool {
    let half = stroke_width * 0.5;
    let limit = half * half;
    path.segments()
        .any(|seg| seg.nearest(point, 1e-6).distance_sq <= limit)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PathToken<'a> {
    Command(char),
    Number(&'a str, f64),
}

fn tokenize_path(path: &str) -> Vec<PathToken<'_>> {
    let bytes = path.as_bytes();
    let mut tokens = Vec::new();
    let mut command = ' ';
    let mut param_index = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() || c == ',' {
            i += 1;
            continue;
        }
        if c.is_ascii_alphabetic() && c != 'e' && c != 'E' {
            command = c;
            param_index = 0;
            tokens.push(PathToken::Command(c));
            i += 1;
            continue;
        }

        // Arc flags may be written without separators ("a1 1 0 0110 10")
        let is_flag = matches!(command, 'A' | 'a') && matches!(param_index % 7, 3 | 4);
        let start = i;
        if is_flag {
            i += 1;
        } else {
            if bytes[i] == b'+' || bytes[i] == b'-' {
                i += 1;
            }
            let mut seen_dot = false;
            let mut seen_exp = false;
            while i < bytes.len() {
                let b = bytes[i];
                if b.is_ascii_digit() {
                    i += 1;
                } else if b == b'.' && !seen_dot && !seen_exp {
                    seen_dot = true;
                    i += 1;
                } else if (b == b'e' || b == b'E') && !seen_exp {
                    seen_exp = true;
                    i += 1;
                    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
                        i += 1;
                    }
                } else {
                    break;
                }
            }
        }

        let text = &path[start..i];
        match text.parse::<f64>() {
            Ok(value) => {
                tokens.push(PathToken::Number(text, value));
                param_index += 1;
            }
            Err(_) => {
                log::debug!("skipping unparsable path token {:?}", text);
                if i == start {
                    i += 1;
                }
            }
        }
    }
    tokens
}

fn format_number(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{}", rounded)
    }
}

/// Scale a path drawn in the unit square to `scale_x` × `scale_y`.
///
/// Coordinates are scaled per command. Arc commands only scale their end
/// point; radii, rotation and flags are emitted unchanged.
pub fn transform_path(path: &str, scale_x: f64, scale_y: f64) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut command = ' ';
    let mut index = 0usize;

    for token in tokenize_path(path) {
        match token {
            PathToken::Command(c) => {
                command = c;
                index = 0;
                out.push(c.to_string());
            }
            PathToken::Number(text, value) => {
                let scaled = match command.to_ascii_uppercase() {
                    'H' => Some(value * scale_x),
                    'V' => Some(value * scale_y),
                    'A' => match index % 7 {
                        5 => Some(value * scale_x),
                        6 => Some(value * scale_y),
                        _ => None,
                    },
                    'M' | 'L' | 'T' | 'C' | 'S' | 'Q' => {
                        if index % 2 == 0 {
                            Some(value * scale_x)
                        } else {
                            Some(value * scale_y)
                        }
                    }
                    _ => None,
                };
                match scaled {
                    Some(v) => out.push(format_number(v)),
                    None => out.push(text.to_string()),
                }
                index += 1;
            }
        }
    }
    out.join(" ")
}
