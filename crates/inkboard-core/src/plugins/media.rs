//! Behaviors for geometry shapes and embedded media. All use the default
//! rectangle behavior and differ only in rendering.

use super::common::{escape_xml, svg_group, svg_rect};
use super::{ElementBehavior, RenderContext};
use crate::elements::{BoardElement, ElementKind, ElementType};

pub struct GeometryBehavior;

impl ElementBehavior for GeometryBehavior {
    fn element_type(&self) -> ElementType {
        ElementType::Geometry
    }

    fn render(&self, element: &BoardElement, _children: &str, _ctx: &RenderContext<'_>) -> Option<String> {
        let ElementKind::Geometry(shape) = &element.kind else {
            return None;
        };
        let fill = shape.fill.as_deref().unwrap_or("none");
        let stroke = shape.stroke.as_deref().unwrap_or("#1f1f1f");
        let attrs = format!(
            r#"fill="{}" stroke="{}" stroke-width="{}""#,
            escape_xml(fill),
            escape_xml(stroke),
            shape.stroke_width
        );
        let body = match shape.scaled_path() {
            Some(d) => format!(
                r#"<path transform="translate({} {})" d="{}" {}/>"#,
                shape.x, shape.y, d, attrs
            ),
            None => svg_rect(&shape.bbox(), &attrs),
        };
        Some(svg_group(&element.id, "geometry", &body))
    }
}

pub struct ImageBehavior;

impl ElementBehavior for ImageBehavior {
    fn element_type(&self) -> ElementType {
        ElementType::Image
    }

    fn render(&self, element: &BoardElement, _children: &str, _ctx: &RenderContext<'_>) -> Option<String> {
        let ElementKind::Image(image) = &element.kind else {
            return None;
        };
        let body = format!(
            r#"<image x="{}" y="{}" width="{}" height="{}" href="{}"/>"#,
            image.x,
            image.y,
            image.width,
            image.height,
            escape_xml(&image.src)
        );
        Some(svg_group(&element.id, "image", &body))
    }
}

pub struct VideoBehavior;

impl ElementBehavior for VideoBehavior {
    fn element_type(&self) -> ElementType {
        ElementType::Video
    }

    fn render(&self, element: &BoardElement, _children: &str, _ctx: &RenderContext<'_>) -> Option<String> {
        let ElementKind::Video(video) = &element.kind else {
            return None;
        };
        let body = format!(
            r#"<foreignObject x="{}" y="{}" width="{}" height="{}"><video xmlns="http://www.w3.org/1999/xhtml" src="{}" controls="controls"/></foreignObject>"#,
            video.x,
            video.y,
            video.width,
            video.height,
            escape_xml(&video.src)
        );
        Some(svg_group(&element.id, "video", &body))
    }
}

pub struct WebviewBehavior;

impl ElementBehavior for WebviewBehavior {
    fn element_type(&self) -> ElementType {
        ElementType::Webview
    }

    fn render(&self, element: &BoardElement, _children: &str, _ctx: &RenderContext<'_>) -> Option<String> {
        let ElementKind::Webview(view) = &element.kind else {
            return None;
        };
        let body = format!(
            r#"<foreignObject x="{}" y="{}" width="{}" height="{}"><iframe xmlns="http://www.w3.org/1999/xhtml" src="{}"/></foreignObject>"#,
            view.x,
            view.y,
            view.width,
            view.height,
            escape_xml(&view.url)
        );
        Some(svg_group(&element.id, "webview", &body))
    }
}
