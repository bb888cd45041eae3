use foundation::Coordinate;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::record::{MarkerId, MarkerRecord};
use crate::viewport::Viewport;

/// Renderer-side identity of one drawn marker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerHandle(pub u64);

/// Lifecycle of a category layer.
///
/// `Unloaded → Hidden → Visible`, then `Visible ⇄ Hidden`. A show request
/// arriving before the records leaves the layer in `Loading` until they do.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerState {
    Unloaded,
    Loading,
    Hidden,
    Visible,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMarker {
    pub handle: MarkerHandle,
    pub id: MarkerId,
    pub label: String,
    pub coordinate: Coordinate,
}

/// Instruction for the renderer produced by a layer transition.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    AddMarker {
        handle: MarkerHandle,
        category: Category,
        coordinate: Coordinate,
        /// Popup text bound to the marker.
        popup: String,
    },
    RemoveMarker {
        handle: MarkerHandle,
        category: Category,
    },
}

/// Monotonic marker handle source shared by all layers of one map.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    next: u64,
}

impl HandleAllocator {
    pub fn next(&mut self) -> MarkerHandle {
        let handle = MarkerHandle(self.next);
        self.next = self.next.wrapping_add(1);
        handle
    }
}

/// One togglable group of records and the markers currently drawn for it.
///
/// State is derived from two facts only: whether records are loaded and the
/// latest requested visibility.
#[derive(Debug, Clone)]
pub struct CategoryLayer {
    category: Category,
    records: Option<Vec<MarkerRecord>>,
    requested_visible: bool,
    rendered: Vec<RenderedMarker>,
}

impl CategoryLayer {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            records: None,
            requested_visible: false,
            rendered: Vec::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn state(&self) -> LayerState {
        match (self.records.is_some(), self.requested_visible) {
            (false, false) => LayerState::Unloaded,
            (false, true) => LayerState::Loading,
            (true, false) => LayerState::Hidden,
            (true, true) => LayerState::Visible,
        }
    }

    pub fn is_requested_visible(&self) -> bool {
        self.requested_visible
    }

    pub fn has_records(&self) -> bool {
        self.records.is_some()
    }

    pub fn records(&self) -> &[MarkerRecord] {
        self.records.as_deref().unwrap_or_default()
    }

    pub fn rendered(&self) -> &[RenderedMarker] {
        &self.rendered
    }

    /// Record the latest visibility request. Returns `false` if it matches the previous one.
    pub fn request(&mut self, visible: bool) -> bool {
        if self.requested_visible == visible {
            return false;
        }
        self.requested_visible = visible;
        true
    }

    /// Take `records` only if none are loaded yet.
    pub fn adopt_records(&mut self, records: Vec<MarkerRecord>) -> bool {
        if self.records.is_some() {
            return false;
        }
        self.records = Some(records);
        true
    }

    pub fn replace_records(&mut self, records: Vec<MarkerRecord>) {
        self.records = Some(records);
    }

    /// Remove every drawn marker.
    pub fn clear(&mut self, out: &mut Vec<RenderCommand>) {
        let category = self.category;
        out.extend(
            self.rendered
                .drain(..)
                .map(|m| RenderCommand::RemoveMarker {
                    handle: m.handle,
                    category,
                }),
        );
    }

    /// Redraw from scratch: clear, then add every record inside `viewport`.
    ///
    /// Records without a coordinate are skipped. Does nothing beyond the
    /// clear unless the layer is `Visible`.
    pub fn refresh(
        &mut self,
        viewport: &Viewport,
        handles: &mut HandleAllocator,
        out: &mut Vec<RenderCommand>,
    ) {
        self.clear(out);
        if self.state() != LayerState::Visible {
            return;
        }

        let category = self.category;
        let Some(records) = self.records.as_ref() else {
            return;
        };
        for record in records {
            let Some(coordinate) = record.coordinate else {
                continue;
            };
            if !viewport.contains(&coordinate) {
                continue;
            }
            let handle = handles.next();
            out.push(RenderCommand::AddMarker {
                handle,
                category,
                coordinate,
                popup: record.label.clone(),
            });
            self.rendered.push(RenderedMarker {
                handle,
                id: record.id.clone(),
                label: record.label.clone(),
                coordinate,
            });
        }
    }
}
