//! Rich text and card behaviors.
//!
//! A manual resize pins the block's size; until then the editor's laid-out
//! size flows back through [`crate::transforms::editor_size_change`].

use super::common::{escape_xml, svg_group};
use super::{ElementBehavior, RenderContext};
use crate::collab::{CardStore, CollabError};
use crate::elements::{BoardElement, ElementKind, ElementType};
use crate::geometry::BBox;
use serde_json::Value;

/// Concatenated text leaves of an editor document.
pub fn plain_text(content: &Value) -> String {
    fn collect(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Array(items) => items.iter().for_each(|item| collect(item, out)),
            Value::Object(map) => {
                if let Some(Value::String(text)) = map.get("text") {
                    out.push(text.clone());
                }
                if let Some(children) = map.get("children") {
                    collect(children, out);
                }
            }
            _ => {}
        }
    }
    let mut parts = Vec::new();
    collect(content, &mut parts);
    parts.concat()
}

fn text_block(bbox: &BBox, id: &str, kind: &str, body: &str, background: Option<&str>) -> String {
    let background = background.unwrap_or("transparent");
    let inner = format!(
        r#"<foreignObject x="{}" y="{}" width="{}" height="{}"><div xmlns="http://www.w3.org/1999/xhtml" style="background:{}">{}</div></foreignObject>"#,
        bbox.x,
        bbox.y,
        bbox.width,
        bbox.height,
        escape_xml(background),
        body
    );
    svg_group(id, kind, &inner)
}

fn render_content(content: &Value, ctx: &RenderContext<'_>) -> String {
    match ctx.content_renderer {
        Some(renderer) => renderer.render(content, ctx.readonly),
        None => escape_xml(&plain_text(content)),
    }
}

pub struct RichTextBehavior;

impl RichTextBehavior {
    /// The element sized to its laid-out content, or `None` when unchanged
    /// or after a manual resize.
    pub fn editor_size_change(element: &BoardElement, width: f64, height: f64) -> Option<BoardElement> {
        let mut updated = element.clone();
        let changed = match &mut updated.kind {
            ElementKind::RichText(text) => text.apply_natural_size(width, height),
            ElementKind::Card(card) => card.apply_natural_size(width, height),
            _ => false,
        };
        changed.then_some(updated)
    }

    pub fn content_change(element: &BoardElement, content: Value) -> Option<BoardElement> {
        let mut updated = element.clone();
        match &mut updated.kind {
            ElementKind::RichText(text) if text.content != content => text.content = content,
            _ => return None,
        }
        Some(updated)
    }

    /// Clears the focus-on-mount flag set for freshly created blocks.
    pub fn remove_auto_focus(element: &BoardElement) -> Option<BoardElement> {
        let mut updated = element.clone();
        match &mut updated.kind {
            ElementKind::RichText(text) if text.auto_focus => text.auto_focus = false,
            _ => return None,
        }
        Some(updated)
    }
}

impl ElementBehavior for RichTextBehavior {
    fn element_type(&self) -> ElementType {
        ElementType::RichText
    }

    fn resize(&self, element: &BoardElement, bbox: BBox) -> BoardElement {
        let mut resized = element.clone();
        match &mut resized.kind {
            ElementKind::RichText(text) => text.resize_manually(bbox),
            _ => resized.set_bbox(bbox),
        }
        resized
    }

    fn render(&self, element: &BoardElement, _children: &str, ctx: &RenderContext<'_>) -> Option<String> {
        let ElementKind::RichText(text) = &element.kind else {
            return None;
        };
        let body = render_content(&text.content, &RenderContext {
            readonly: ctx.readonly || text.readonly,
            ..*ctx
        });
        Some(text_block(&text.bbox(), &element.id, "richtext", &body, text.background.as_deref()))
    }
}

pub struct CardBehavior;

impl CardBehavior {
    /// Write edited card content back to the store. The element itself is unchanged.
    pub fn content_change(element: &BoardElement, content: Value, store: &dyn CardStore) -> Result<(), CollabError> {
        match &element.kind {
            ElementKind::Card(card) => store.update_card(&card.card_id, content),
            _ => Ok(()),
        }
    }
}

impl ElementBehavior for CardBehavior {
    fn element_type(&self) -> ElementType {
        ElementType::Card
    }

    fn resize(&self, element: &BoardElement, bbox: BBox) -> BoardElement {
        let mut resized = element.clone();
        match &mut resized.kind {
            ElementKind::Card(card) => card.resize_manually(bbox),
            _ => resized.set_bbox(bbox),
        }
        resized
    }

    fn render(&self, element: &BoardElement, _children: &str, ctx: &RenderContext<'_>) -> Option<String> {
        let ElementKind::Card(card) = &element.kind else {
            return None;
        };
        let content = ctx.card_store.and_then(|store| store.get_card_by_id(&card.card_id));
        let body = match content {
            Some(content) => render_content(&content, &RenderContext {
                readonly: ctx.readonly || card.readonly,
                ..*ctx
            }),
            None => {
                log::debug!("card {} not resolved, rendering empty", card.card_id);
                String::new()
            }
        };
        Some(text_block(&card.bbox(), &element.id, "card", &body, card.background.as_deref()))
    }
}
