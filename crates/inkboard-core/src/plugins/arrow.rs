//! Arrow behavior.

use super::common::{escape_xml, svg_group};
use super::{ElementBehavior, RenderContext};
use crate::config::BoardConfig;
use crate::elements::{BoardElement, ConnectId, ConnectPoint, ElementKind, ElementType, Marker};
use crate::geometry::{BBox, is_point_in_stroke, polyline_intersects_rect};
use crate::selection::SelectArea;
use kurbo::Point;

pub struct ArrowBehavior;

impl ElementBehavior for ArrowBehavior {
    fn element_type(&self) -> ElementType {
        ElementType::Arrow
    }

    /// Stroke hit test with a minimum band so thin arrows stay easy to pick.
    fn is_hit(&self, element: &BoardElement, point: Point, config: &BoardConfig) -> bool {
        let Some(arrow) = element.as_arrow() else {
            return false;
        };
        let width = arrow.stroke_width.max(2.0 * config.arrow_hit_padding);
        is_point_in_stroke(&arrow.to_path(), width, point)
    }

    /// Arrows with a bound end only move by following what they are bound to.
    fn move_element(&self, element: &BoardElement, dx: f64, dy: f64) -> Option<BoardElement> {
        if element.as_arrow()?.is_bound() {
            return None;
        }
        let mut moved = element.clone();
        moved.translate(dx, dy);
        Some(moved)
    }

    fn is_element_selected(&self, element: &BoardElement, area: &SelectArea, config: &BoardConfig) -> bool {
        let Some(arrow) = element.as_arrow() else {
            return false;
        };
        let rect = area.to_bbox().inflate(config.arrow_hit_padding);
        polyline_intersects_rect(&arrow.route(), &rect)
    }

    fn connect_points(&self, _element: &BoardElement) -> Vec<ConnectPoint> {
        Vec::new()
    }

    fn connect_extend_points(&self, _element: &BoardElement, _extend: f64) -> Vec<ConnectPoint> {
        Vec::new()
    }

    fn arrow_bind_point(&self, _element: &BoardElement, _connect_id: ConnectId) -> Option<Point> {
        None
    }

    fn is_resizable(&self) -> bool {
        false
    }

    fn resize(&self, element: &BoardElement, _bbox: BBox) -> BoardElement {
        element.clone()
    }

    fn render(&self, element: &BoardElement, _children: &str, _ctx: &RenderContext<'_>) -> Option<String> {
        let ElementKind::Arrow(arrow) = &element.kind else {
            return None;
        };
        let marker_id = format!("arrow-head-{}", escape_xml(&element.id));
        let mut body = String::new();
        let uses_marker = arrow.source.marker == Marker::Arrow || arrow.target.marker == Marker::Arrow;
        if uses_marker {
            body.push_str(&format!(
                r#"<defs><marker id="{}" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="6" markerHeight="6" orient="auto-start-reverse"><path d="M0,0 L10,5 L0,10 z" fill="{}"/></marker></defs>"#,
                marker_id,
                escape_xml(&arrow.stroke)
            ));
        }
        let mut attrs = format!(
            r#"fill="none" stroke="{}" stroke-width="{}""#,
            escape_xml(&arrow.stroke),
            arrow.stroke_width
        );
        if arrow.source.marker == Marker::Arrow {
            attrs.push_str(&format!(r#" marker-start="url(#{})""#, marker_id));
        }
        if arrow.target.marker == Marker::Arrow {
            attrs.push_str(&format!(r#" marker-end="url(#{})""#, marker_id));
        }
        body.push_str(&format!(r#"<path d="{}" {}/>"#, arrow.svg_path(), attrs));
        Some(svg_group(&element.id, "arrow", &body))
    }
}
