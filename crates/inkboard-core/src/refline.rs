//! Reference lines for aligning elements while they move or resize.
//!
//! The rectangles being dragged are "current"; every other rectangle is a
//! reference. Edges (and centers, when moving) are compared per orientation
//! and the closest reference within tolerance pulls the current rectangles
//! onto it.

use crate::geometry::{BBox, HandlePosition, MIN_BBOX_SIZE};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOrientation {
    Vertical,
    Horizontal,
}

/// A keyed rectangle taking part in alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefRect {
    pub key: String,
    pub bbox: BBox,
}

impl RefRect {
    pub fn new(key: impl Into<String>, bbox: BBox) -> Self {
        Self { key: key.into(), bbox }
    }
}

/// An axis-aligned segment. Vertical lines share `x`, horizontal lines share `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefLine {
    pub key: String,
    pub orientation: LineOrientation,
    pub start: Point,
    pub end: Point,
}

impl RefLine {
    pub fn vertical(key: impl Into<String>, x: f64, y1: f64, y2: f64) -> Self {
        Self {
            key: key.into(),
            orientation: LineOrientation::Vertical,
            start: Point::new(x, y1),
            end: Point::new(x, y2),
        }
    }

    pub fn horizontal(key: impl Into<String>, y: f64, x1: f64, x2: f64) -> Self {
        Self {
            key: key.into(),
            orientation: LineOrientation::Horizontal,
            start: Point::new(x1, y),
            end: Point::new(x2, y),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self.orientation {
            LineOrientation::Vertical => self.start.x == self.end.x,
            LineOrientation::Horizontal => self.start.y == self.end.y,
        }
    }

    /// Coordinate on the axis the line is fixed on.
    fn position(&self) -> f64 {
        match self.orientation {
            LineOrientation::Vertical => self.start.x,
            LineOrientation::Horizontal => self.start.y,
        }
    }
}

/// A reference line within tolerance of a current line.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedLine {
    /// The reference line, stretched to cover the current line too.
    pub line: RefLine,
    /// Signed offset moving the current line onto the reference.
    pub distance: f64,
}

/// Current rectangles after snapping and the guides to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapOutcome {
    pub rects: Vec<RefRect>,
    pub guides: Vec<RefLine>,
    /// Correction applied to the current rectangles.
    pub offset: Vec2,
}

fn rect_lines(rect: &RefRect, centers: bool, resize: Option<HandlePosition>) -> Vec<RefLine> {
    let b = &rect.bbox;
    let mut lines = Vec::with_capacity(6);
    let (h, v) = match resize {
        Some(handle) => (handle.horizontal_sign(), handle.vertical_sign()),
        None => (0.0, 0.0),
    };
    let all = resize.is_none();
    if all || v < 0.0 {
        lines.push(RefLine::horizontal(format!("{}-top", rect.key), b.y, b.x, b.right()));
    }
    if all || v > 0.0 {
        lines.push(RefLine::horizontal(format!("{}-bottom", rect.key), b.bottom(), b.x, b.right()));
    }
    if all || h < 0.0 {
        lines.push(RefLine::vertical(format!("{}-left", rect.key), b.x, b.y, b.bottom()));
    }
    if all || h > 0.0 {
        lines.push(RefLine::vertical(format!("{}-right", rect.key), b.right(), b.y, b.bottom()));
    }
    if centers {
        let c = b.center();
        lines.push(RefLine::horizontal(format!("{}-middle", rect.key), c.y, b.x, b.right()));
        lines.push(RefLine::vertical(format!("{}-center", rect.key), c.x, b.y, b.bottom()));
    }
    lines
}

/// Reference geometry plus the rectangles currently being dragged.
#[derive(Debug, Clone, Default)]
pub struct RefLines {
    ref_rects: Vec<RefRect>,
    ref_lines: Vec<RefLine>,
    current: Vec<RefRect>,
}

impl RefLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rectangles, replacing any with the same key.
    pub fn add_ref_rects(&mut self, rects: impl IntoIterator<Item = RefRect>) {
        for rect in rects {
            self.ref_rects.retain(|r| r.key != rect.key);
            self.ref_rects.push(rect);
        }
    }

    pub fn set_ref_rects(&mut self, rects: Vec<RefRect>) {
        self.ref_rects = rects;
    }

    pub fn remove_ref_rects(&mut self, keys: &[&str]) {
        self.ref_rects.retain(|r| !keys.contains(&r.key.as_str()));
    }

    /// Add free-standing guide lines. Rejects the whole batch if any line is not axis-aligned.
    pub fn add_ref_lines(&mut self, lines: Vec<RefLine>) -> bool {
        if !lines.iter().all(RefLine::is_valid) {
            log::warn!("ignoring reference lines that are not axis-aligned");
            return false;
        }
        for line in lines {
            self.ref_lines.retain(|l| l.key != line.key);
            self.ref_lines.push(line);
        }
        true
    }

    pub fn remove_ref_lines(&mut self, keys: &[&str]) {
        self.ref_lines.retain(|l| !keys.contains(&l.key.as_str()));
    }

    pub fn set_current(&mut self, rects: Vec<RefRect>) {
        self.current = rects;
    }

    pub fn current(&self) -> &[RefRect] {
        &self.current
    }

    fn reference_lines(&self, centers: bool) -> Vec<RefLine> {
        let excluded = |key: &str| self.current.iter().any(|r| r.key == key);
        self.ref_rects
            .iter()
            .filter(|r| !excluded(&r.key))
            .flat_map(|r| rect_lines(r, centers, None))
            .chain(self.ref_lines.iter().cloned())
            .collect()
    }

    /// Reference lines within `distance` of a current line, closest first.
    ///
    /// While resizing only the first current rectangle and the edges moved by
    /// `resize` take part; while moving every edge and center does.
    pub fn match_lines(&self, distance: f64, resize: Option<HandlePosition>) -> Vec<MatchedLine> {
        let moving = resize.is_none();
        let current: Vec<RefLine> = match resize {
            Some(_) => self
                .current
                .first()
                .map(|r| rect_lines(r, false, resize))
                .unwrap_or_default(),
            None => self.current.iter().flat_map(|r| rect_lines(r, true, None)).collect(),
        };
        let references = self.reference_lines(moving);

        let mut matched: Vec<MatchedLine> = Vec::new();
        let mut matched_keys: HashSet<&str> = HashSet::new();
        for cur in &current {
            for reference in &references {
                if cur.orientation != reference.orientation {
                    continue;
                }
                let d = reference.position() - cur.position();
                if d.abs() >= distance || matched_keys.contains(reference.key.as_str()) {
                    continue;
                }
                let line = match reference.orientation {
                    LineOrientation::Horizontal => {
                        let x1 = cur.start.x.min(cur.end.x).min(reference.start.x).min(reference.end.x);
                        let x2 = cur.start.x.max(cur.end.x).max(reference.start.x).max(reference.end.x);
                        RefLine::horizontal(reference.key.clone(), reference.position(), x1, x2)
                    }
                    LineOrientation::Vertical => {
                        let y1 = cur.start.y.min(cur.end.y).min(reference.start.y).min(reference.end.y);
                        let y2 = cur.start.y.max(cur.end.y).max(reference.start.y).max(reference.end.y);
                        RefLine::vertical(reference.key.clone(), reference.position(), y1, y2)
                    }
                };
                matched_keys.insert(&reference.key);
                matched.push(MatchedLine { line, distance: d });
            }
        }
        matched.sort_by(|a, b| a.distance.abs().total_cmp(&b.distance.abs()));
        matched
    }

    /// Current rectangles pulled onto the nearest vertical and horizontal references.
    ///
    /// Without `snap` (or with a zero tolerance) the rectangles come back unchanged.
    pub fn update_current(&self, snap: bool, distance: f64, resize: Option<HandlePosition>) -> SnapOutcome {
        if !snap || distance <= 0.0 {
            return SnapOutcome {
                rects: self.current.clone(),
                ..SnapOutcome::default()
            };
        }
        let matched = self.match_lines(distance, resize);
        let best = |orientation: LineOrientation| {
            matched
                .iter()
                .find(|m| m.line.orientation == orientation)
                .map(|m| m.distance)
        };
        let dx = best(LineOrientation::Vertical);
        let dy = best(LineOrientation::Horizontal);

        let rects = self
            .current
            .iter()
            .map(|rect| {
                let mut bbox = rect.bbox;
                if let Some(dx) = dx {
                    match resize {
                        Some(handle) if handle.horizontal_sign() < 0.0 => {
                            let right = bbox.right();
                            bbox.x = (bbox.x + dx).min(right - MIN_BBOX_SIZE);
                            bbox.width = right - bbox.x;
                        }
                        Some(_) => bbox.width = (bbox.width + dx).max(MIN_BBOX_SIZE),
                        None => bbox.x += dx,
                    }
                }
                if let Some(dy) = dy {
                    match resize {
                        Some(handle) if handle.vertical_sign() < 0.0 => {
                            let bottom = bbox.bottom();
                            bbox.y = (bbox.y + dy).min(bottom - MIN_BBOX_SIZE);
                            bbox.height = bottom - bbox.y;
                        }
                        Some(_) => bbox.height = (bbox.height + dy).max(MIN_BBOX_SIZE),
                        None => bbox.y += dy,
                    }
                }
                RefRect::new(rect.key.clone(), bbox)
            })
            .collect();

        let guides = matched
            .iter()
            .filter(|m| match m.line.orientation {
                LineOrientation::Vertical => dx.is_some_and(|d| (d - m.distance).abs() < 1e-9),
                LineOrientation::Horizontal => dy.is_some_and(|d| (d - m.distance).abs() < 1e-9),
            })
            .map(|m| m.line.clone())
            .collect();

        SnapOutcome {
            rects,
            guides,
            offset: Vec2::new(dx.unwrap_or(0.0), dy.unwrap_or(0.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(current: BBox) -> RefLines {
        let mut lines = RefLines::new();
        lines.add_ref_rects([
            RefRect::new("a", BBox::new(0.0, 0.0, 100.0, 100.0)),
            RefRect::new("b", BBox::new(300.0, 200.0, 50.0, 50.0)),
        ]);
        lines.set_current(vec![RefRect::new("cur", current)]);
        lines
    }

    #[test]
    fn test_move_snaps_to_nearest_edge() {
        let lines = engine(BBox::new(103.0, 150.0, 40.0, 40.0));
        let outcome = lines.update_current(true, 5.0, None);
        // left edge 103 pulled onto a's right edge at 100
        assert_eq!(outcome.rects[0].bbox, BBox::new(100.0, 150.0, 40.0, 40.0));
        assert_eq!(outcome.offset, Vec2::new(-3.0, 0.0));
        assert_eq!(outcome.guides.len(), 1);
        assert_eq!(outcome.guides[0].key, "a-right");
        assert_eq!(outcome.guides[0].start, Point::new(100.0, 0.0));
        assert_eq!(outcome.guides[0].end, Point::new(100.0, 190.0));
    }

    #[test]
    fn test_centers_align_when_moving() {
        let lines = engine(BBox::new(200.0, 28.0, 40.0, 40.0));
        let outcome = lines.update_current(true, 5.0, None);
        // middle 48 pulled onto a's middle at 50
        assert!((outcome.rects[0].bbox.y - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_snap_is_identity() {
        let lines = engine(BBox::new(103.0, 150.0, 40.0, 40.0));
        let outcome = lines.update_current(false, 5.0, None);
        assert_eq!(outcome.rects, lines.current());
        assert!(outcome.guides.is_empty());
    }

    #[test]
    fn test_resize_moves_only_dragged_edges() {
        let lines = engine(BBox::new(200.0, 100.0, 97.0, 50.0));
        let outcome = lines.update_current(true, 5.0, Some(HandlePosition::Right));
        assert_eq!(outcome.rects[0].bbox, BBox::new(200.0, 100.0, 100.0, 50.0));

        let lines = engine(BBox::new(103.0, 120.0, 50.0, 50.0));
        let outcome = lines.update_current(true, 5.0, Some(HandlePosition::TopLeft));
        assert_eq!(outcome.rects[0].bbox, BBox::new(100.0, 120.0, 53.0, 50.0));
    }

    #[test]
    fn test_matches_sorted_by_absolute_distance() {
        let lines = engine(BBox::new(104.0, 150.0, 194.0, 40.0));
        let matched = lines.match_lines(5.0, None);
        let vertical: Vec<_> = matched
            .iter()
            .filter(|m| m.line.orientation == LineOrientation::Vertical)
            .map(|m| m.distance)
            .collect();
        // right edge 298 is 2 from b's left edge, left edge 104 is 4 from a's right
        assert_eq!(vertical, [2.0, -4.0]);
    }

    #[test]
    fn test_reference_line_matched_once() {
        let mut lines = engine(BBox::new(103.0, 150.0, 40.0, 40.0));
        lines.set_current(vec![
            RefRect::new("c1", BBox::new(103.0, 150.0, 40.0, 40.0)),
            RefRect::new("c2", BBox::new(101.0, 300.0, 40.0, 40.0)),
        ]);
        let matched = lines.match_lines(5.0, None);
        let right: Vec<_> = matched.iter().filter(|m| m.line.key == "a-right").collect();
        assert_eq!(right.len(), 1);
        assert_eq!(right[0].distance, -3.0);
    }

    #[test]
    fn test_invalid_lines_rejected() {
        let mut lines = RefLines::new();
        let bad = RefLine {
            key: "x".into(),
            orientation: LineOrientation::Vertical,
            start: Point::new(0.0, 0.0),
            end: Point::new(1.0, 10.0),
        };
        assert!(!lines.add_ref_lines(vec![bad]));
        assert!(lines.add_ref_lines(vec![RefLine::vertical("g", 10.0, 0.0, 100.0)]));
    }
}
