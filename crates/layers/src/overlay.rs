use std::collections::BTreeMap;

use crate::category::Category;
use crate::layer::{
    CategoryLayer, HandleAllocator, LayerState, MarkerHandle, RenderCommand, RenderedMarker,
};
use crate::record::MarkerRecord;
use crate::viewport::Viewport;

/// Per-map layer bookkeeping.
///
/// Every mutation returns the render commands that bring the renderer in line
/// with the new state. Visible layers are recomputed from scratch whenever
/// the viewport or their visibility changes.
///
/// Ordering contract:
/// - Commands for different categories are emitted in `Category` order.
/// - Within a category, removals precede additions.
#[derive(Debug, Default)]
pub struct MapOverlay {
    viewport: Option<Viewport>,
    layers: BTreeMap<Category, CategoryLayer>,
    handles: HandleAllocator,
}

impl MapOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn layer(&self, category: Category) -> Option<&CategoryLayer> {
        self.layers.get(&category)
    }

    pub fn layer_state(&self, category: Category) -> LayerState {
        self.layers
            .get(&category)
            .map_or(LayerState::Unloaded, CategoryLayer::state)
    }

    pub fn rendered(&self, category: Category) -> &[RenderedMarker] {
        self.layers
            .get(&category)
            .map(CategoryLayer::rendered)
            .unwrap_or_default()
    }

    pub fn rendered_count(&self, category: Category) -> usize {
        self.rendered(category).len()
    }

    pub fn total_rendered(&self) -> usize {
        self.layers.values().map(|l| l.rendered().len()).sum()
    }

    pub fn find_marker(&self, handle: MarkerHandle) -> Option<(Category, &RenderedMarker)> {
        self.layers.values().find_map(|layer| {
            layer
                .rendered()
                .iter()
                .find(|m| m.handle == handle)
                .map(|m| (layer.category(), m))
        })
    }

    /// Request a category's visibility.
    ///
    /// Repeating the previous request is a no-op. `data` is only taken when
    /// the category has no records yet; a show request without records parks
    /// the layer in `Loading` until [`MapOverlay::supply_records`].
    pub fn set_layer_visible(
        &mut self,
        category: Category,
        visible: bool,
        data: Option<Vec<MarkerRecord>>,
    ) -> Vec<RenderCommand> {
        let mut out = Vec::new();
        let viewport = self.viewport;
        let layer = self
            .layers
            .entry(category)
            .or_insert_with(|| CategoryLayer::new(category));

        let adopted = data.is_some_and(|records| layer.adopt_records(records));
        let changed = layer.request(visible);
        if !changed && !adopted {
            return out;
        }

        if !visible {
            layer.clear(&mut out);
            return out;
        }
        if let Some(vp) = viewport {
            layer.refresh(&vp, &mut self.handles, &mut out);
        }
        out
    }

    /// Deliver a category's records, replacing any previous set.
    ///
    /// The latest visibility request decides whether anything is drawn.
    pub fn supply_records(
        &mut self,
        category: Category,
        records: Vec<MarkerRecord>,
    ) -> Vec<RenderCommand> {
        let mut out = Vec::new();
        let viewport = self.viewport;
        let layer = self
            .layers
            .entry(category)
            .or_insert_with(|| CategoryLayer::new(category));
        layer.replace_records(records);

        match viewport {
            Some(vp) if layer.state() == LayerState::Visible => {
                layer.refresh(&vp, &mut self.handles, &mut out);
            }
            _ => layer.clear(&mut out),
        }
        out
    }

    /// Move the map and recompute every visible layer for the new extent.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Vec<RenderCommand> {
        self.viewport = Some(viewport);
        let mut out = Vec::new();
        for layer in self.layers.values_mut() {
            if layer.state() == LayerState::Visible {
                layer.refresh(&viewport, &mut self.handles, &mut out);
            }
        }
        out
    }

    /// Categories currently requested visible, in `Category` order.
    pub fn requested_visible(&self) -> Vec<Category> {
        self.layers
            .values()
            .filter(|l| l.is_requested_visible())
            .map(CategoryLayer::category)
            .collect()
    }
}
