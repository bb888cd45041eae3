//! In-memory map surface.
//!
//! Keeps the drawn scene in a shared [`SceneProbe`] so hosts, tools and tests
//! can inspect what a real renderer would show.

use std::collections::BTreeMap;
use std::sync::Arc;

use foundation::Coordinate;
use layers::symbology::{MarkerStyle, style_for};
use layers::{Category, MarkerHandle, Viewport};
use parking_lot::RwLock;
use tracing::debug;

use crate::config::{OverlayConfig, TileLayerConfig};
use crate::surface::{MapControl, MapSurface, SurfaceMarker};

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnMarker {
    pub category: Category,
    pub coordinate: Coordinate,
    pub popup: String,
    pub style: MarkerStyle,
}

#[derive(Debug, Default)]
struct Scene {
    tile_url: Option<String>,
    viewport: Option<Viewport>,
    controls: Vec<MapControl>,
    user_marker: Option<Coordinate>,
    markers: BTreeMap<MarkerHandle, DrawnMarker>,
    maps_created: u32,
}

/// Read-only view of a [`HeadlessSurface`]'s scene.
#[derive(Debug, Clone, Default)]
pub struct SceneProbe {
    scene: Arc<RwLock<Scene>>,
}

impl SceneProbe {
    pub fn maps_created(&self) -> u32 {
        self.scene.read().maps_created
    }

    pub fn tile_url(&self) -> Option<String> {
        self.scene.read().tile_url.clone()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.scene.read().viewport
    }

    pub fn controls(&self) -> Vec<MapControl> {
        self.scene.read().controls.clone()
    }

    pub fn user_marker(&self) -> Option<Coordinate> {
        self.scene.read().user_marker
    }

    pub fn marker_count(&self) -> usize {
        self.scene.read().markers.len()
    }

    pub fn count_for(&self, category: Category) -> usize {
        self.scene
            .read()
            .markers
            .values()
            .filter(|m| m.category == category)
            .count()
    }

    /// Drawn markers of one category, ordered by handle.
    pub fn markers_for(&self, category: Category) -> Vec<(MarkerHandle, DrawnMarker)> {
        self.scene
            .read()
            .markers
            .iter()
            .filter(|(_, m)| m.category == category)
            .map(|(h, m)| (*h, m.clone()))
            .collect()
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<DrawnMarker> {
        self.scene.read().markers.get(&handle).cloned()
    }
}

#[derive(Debug)]
pub struct HeadlessSurface {
    width_px: u32,
    height_px: u32,
    max_zoom: f64,
    scene: Arc<RwLock<Scene>>,
}

impl HeadlessSurface {
    pub fn new(width_px: u32, height_px: u32, max_zoom: f64) -> Self {
        Self {
            width_px,
            height_px,
            max_zoom,
            scene: Arc::default(),
        }
    }

    pub fn from_config(config: &OverlayConfig) -> Self {
        Self::new(
            config.surface_width_px,
            config.surface_height_px,
            config.max_zoom,
        )
    }

    pub fn probe(&self) -> SceneProbe {
        SceneProbe {
            scene: Arc::clone(&self.scene),
        }
    }

    fn viewport_for(&self, center: Coordinate, zoom: f64) -> Viewport {
        let zoom = zoom.clamp(0.0, self.max_zoom);
        Viewport::around(center, zoom, self.width_px, self.height_px)
    }
}

impl MapSurface for HeadlessSurface {
    fn create_map(&mut self, center: Coordinate, zoom: f64, tiles: &TileLayerConfig) -> Viewport {
        let viewport = self.viewport_for(center, zoom);
        let mut scene = self.scene.write();
        scene.maps_created += 1;
        scene.tile_url = Some(tiles.url_template.clone());
        scene.viewport = Some(viewport);
        debug!("headless map created at {center}, z{}", viewport.zoom);
        viewport
    }

    fn set_view(&mut self, center: Coordinate, zoom: f64) -> Viewport {
        let viewport = self.viewport_for(center, zoom);
        self.scene.write().viewport = Some(viewport);
        viewport
    }

    fn add_control(&mut self, control: MapControl) {
        self.scene.write().controls.push(control);
    }

    fn place_user_marker(&mut self, coordinate: Coordinate) {
        self.scene.write().user_marker = Some(coordinate);
    }

    fn add_marker(&mut self, marker: SurfaceMarker) {
        let drawn = DrawnMarker {
            category: marker.category,
            coordinate: marker.coordinate,
            popup: marker.popup,
            style: style_for(marker.category),
        };
        self.scene.write().markers.insert(marker.handle, drawn);
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.scene.write().markers.remove(&handle);
    }
}
