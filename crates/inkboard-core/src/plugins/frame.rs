//! Frame behavior and containment.

use super::common::{escape_xml, svg_group, svg_rect};
use super::{ElementBehavior, Registry, RenderContext};
use crate::elements::{BoardElement, ElementKind, ElementType, Frame, Node};
use crate::error::{BoardError, BoardResult};
use crate::operation::Transaction;

/// Re-evaluate which elements belong to frame `frame_id`.
///
/// Children that no longer satisfy the containment policy move to the end of
/// the top level; top-level elements that now satisfy it move into the frame.
/// Each move is a `remove_node`/`insert_node` pair pushed onto `tx`.
pub fn recompute_frame_containment(tx: &mut Transaction, frame_id: &str) -> BoardResult<()> {
    let node = tx
        .find(frame_id)
        .cloned()
        .ok_or_else(|| BoardError::ElementNotFound(frame_id.to_string()))?;
    let Some(frame) = node.as_frame() else {
        return Ok(());
    };

    let evicted: Vec<Node> = frame
        .children
        .iter()
        .filter(|child| !frame.contains_bbox(&child.bbox()))
        .cloned()
        .collect();
    for child in evicted {
        let removed = tx.remove(&child.id)?;
        let end = vec![tx.children().len()];
        tx.insert(end, removed)?;
        log::debug!("evicted {} from frame {}", child.id, frame_id);
    }

    let promoted: Vec<Node> = tx
        .children()
        .iter()
        .filter(|n| n.id != frame_id && Frame::can_nest(n) && frame.contains_bbox(&n.bbox()))
        .cloned()
        .collect();
    for candidate in promoted {
        let removed = tx.remove(&candidate.id)?;
        let mut path = tx
            .path_of(frame_id)
            .ok_or_else(|| BoardError::ElementNotFound(frame_id.to_string()))?;
        let len = tx.find(frame_id).map(|f| f.children().len()).unwrap_or_default();
        path.push(len);
        tx.insert(path, removed)?;
        log::debug!("moved {} into frame {}", candidate.id, frame_id);
    }
    Ok(())
}

/// Shrink or grow an auto-resizing frame to wrap its children.
pub(crate) fn fit_frame(tx: &mut Transaction, frame_id: &str) -> BoardResult<()> {
    let Some(node) = tx.find(frame_id).cloned() else {
        return Ok(());
    };
    let Some(frame) = node.as_frame() else {
        return Ok(());
    };
    if !frame.auto_resize || frame.children.is_empty() {
        return Ok(());
    }
    let bounds = frame.fit_bounds(&frame.children);
    let mut updated = (*node).clone();
    updated.set_bbox(bounds);
    tx.set_element(&updated)
}

pub struct FrameBehavior;

impl ElementBehavior for FrameBehavior {
    fn element_type(&self) -> ElementType {
        ElementType::Frame
    }

    /// A frame moves together with everything inside it.
    fn move_element(&self, element: &BoardElement, dx: f64, dy: f64) -> Option<BoardElement> {
        let mut moved = element.clone();
        moved.translate_deep(dx, dy);
        Some(moved)
    }

    fn on_resize_end(&self, element_id: &str, tx: &mut Transaction, _registry: &Registry) -> BoardResult<()> {
        recompute_frame_containment(tx, element_id)?;
        fit_frame(tx, element_id)
    }

    fn render(&self, element: &BoardElement, children: &str, _ctx: &RenderContext<'_>) -> Option<String> {
        let ElementKind::Frame(frame) = &element.kind else {
            return None;
        };
        let background = svg_rect(
            &frame.bbox(),
            &format!(
                r#"rx="{}" fill="{}" stroke="{}" stroke-width="{}""#,
                frame.border_radius,
                escape_xml(&frame.background_color),
                escape_xml(&frame.border_color),
                frame.border_width
            ),
        );
        let title = format!(
            r#"<text x="{}" y="{}" font-size="12">{}</text>"#,
            frame.x,
            frame.y - 6.0,
            escape_xml(&frame.title)
        );
        Some(svg_group(
            &element.id,
            "frame",
            &format!("{}{}{}", background, title, children),
        ))
    }
}
