use foundation::Coordinate;
use layers::{Category, MarkerHandle, RenderCommand, Viewport};
use serde::{Deserialize, Serialize};

use crate::config::TileLayerConfig;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// On-map widget.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MapControl {
    Zoom { position: ControlPosition },
    /// Button that posts a recenter request back to the engine.
    Recenter { position: ControlPosition },
}

/// Marker as handed to a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMarker {
    pub handle: MarkerHandle,
    pub category: Category,
    pub coordinate: Coordinate,
    pub popup: String,
}

/// Drawing backend driven by the engine.
///
/// Implementations own no overlay state: every marker they show was added by
/// the engine and is removed by handle.
pub trait MapSurface: Send + 'static {
    /// Create the base map with its tile layer and return the initial extent.
    fn create_map(&mut self, center: Coordinate, zoom: f64, tiles: &TileLayerConfig) -> Viewport;

    /// Move the map and return the resulting extent.
    fn set_view(&mut self, center: Coordinate, zoom: f64) -> Viewport;

    fn add_control(&mut self, control: MapControl);

    /// Place or move the device-position marker.
    fn place_user_marker(&mut self, coordinate: Coordinate);

    fn add_marker(&mut self, marker: SurfaceMarker);

    fn remove_marker(&mut self, handle: MarkerHandle);
}

/// Replay overlay render commands onto a surface, in order.
pub fn apply_commands<S: MapSurface + ?Sized>(surface: &mut S, commands: Vec<RenderCommand>) {
    for command in commands {
        match command {
            RenderCommand::AddMarker {
                handle,
                category,
                coordinate,
                popup,
            } => surface.add_marker(SurfaceMarker {
                handle,
                category,
                coordinate,
                popup,
            }),
            RenderCommand::RemoveMarker { handle, .. } => surface.remove_marker(handle),
        }
    }
}
