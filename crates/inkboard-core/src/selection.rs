//! Selection state and resize handles.

use crate::elements::Node;
use crate::geometry::{BBox, Handle, HandlePosition, bounding_box, handles_for};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// In-progress lasso rectangle between the drag start and the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectArea {
    pub anchor: Point,
    pub focus: Point,
}

impl SelectArea {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn to_bbox(&self) -> BBox {
        BBox::from_points(self.anchor, self.focus)
    }
}

/// Current selection.
///
/// `selected_elements` are snapshots taken when the selection was last set;
/// they go stale when the tree changes until the next selection update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub select_area: Option<SelectArea>,
    pub selected_elements: Vec<Node>,
}

impl Selection {
    pub fn of(elements: Vec<Node>) -> Self {
        Self {
            select_area: None,
            selected_elements: elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected_elements.is_empty()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_elements.iter().any(|e| e.id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.selected_elements.iter().map(|e| e.id.clone()).collect()
    }

    /// Selected elements that get resize handles (everything but arrows).
    pub fn resizable(&self) -> impl Iterator<Item = &Node> {
        self.selected_elements.iter().filter(|e| !e.is_arrow())
    }

    /// Box the resize handles surround: the union of the resizable elements.
    pub fn handle_bbox(&self) -> Option<BBox> {
        bounding_box(self.resizable().map(|e| e.bbox()))
    }

    pub fn handles(&self) -> Option<[Handle; 8]> {
        self.handle_bbox().map(|bbox| handles_for(&bbox))
    }

    /// The handle under `point`, if any. `tolerance` is in document units.
    pub fn hit_handle(&self, point: Point, tolerance: f64) -> Option<HandlePosition> {
        self.handles()?
            .into_iter()
            .find(|h| h.hit_test(point, tolerance))
            .map(|h| h.kind)
    }
}
