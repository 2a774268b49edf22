//! Helpers shared by the rectangle-based behaviors.

use crate::error::BoardResult;
use crate::geometry::BBox;
use crate::operation::Transaction;
use crate::tree;

/// Grow the frame that owns `element_id` so all its children fit again.
pub fn expand_parent_frame(tx: &mut Transaction, element_id: &str) -> BoardResult<()> {
    let Some(parent) = tree::parent_of(tx.children(), element_id).cloned() else {
        return Ok(());
    };
    let Some(frame) = parent.as_frame() else {
        return Ok(());
    };
    let bounds = frame.expanded_bounds(&frame.children);
    if bounds == frame.bbox() {
        return Ok(());
    }
    let mut updated = (*parent).clone();
    updated.set_bbox(bounds);
    tx.set_element(&updated)
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn svg_rect(bbox: &BBox, attrs: &str) -> String {
    format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" {}/>"#,
        bbox.x, bbox.y, bbox.width, bbox.height, attrs
    )
}

/// `<g>` wrapper tagging a fragment with its element id and kind.
pub(crate) fn svg_group(id: &str, kind: &str, body: &str) -> String {
    format!(
        r#"<g data-id="{}" data-kind="{}">{}</g>"#,
        escape_xml(id),
        kind,
        body
    )
}
