//! Message types for the host ⇄ renderer bridge.
//!
//! This crate defines the wire format for:
//! - Commands from the host UI to the map renderer
//! - Gestures reported by the map surface itself (pan/zoom settle, marker tap)
//! - Events from the renderer back to the host
//!
//! Messages are JSON objects tagged by `"type"`. The format is internal to the
//! app; it has no compatibility promise towards other systems.

use std::collections::BTreeMap;

use foundation::Coordinate;
use layers::{Category, LayerState, MarkerHandle, MarkerId, MarkerRecord, Viewport};
use serde::{Deserialize, Serialize};

/// Message delivered to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// Create the map centered on the device location. Valid once.
    Initialize { center: Coordinate },

    /// Show or hide one category, optionally carrying its records.
    SetLayerVisible {
        category: Category,
        visible: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Vec<MarkerRecord>>,
    },

    /// Batch visibility update, applied in category order.
    ToggleLayers { layers: BTreeMap<Category, bool> },

    /// Records for a category (bundled at startup or fetched later).
    Dataset {
        category: Category,
        records: Vec<MarkerRecord>,
    },

    /// Latest device location; moves the user marker.
    UpdateLocation { location: Coordinate },

    /// Re-center on the last known device location at the default zoom.
    Recenter,

    /// Surface gesture: the map stopped moving.
    ViewportSettled { viewport: Viewport },

    /// Surface gesture: a marker was tapped.
    MarkerTapped { handle: MarkerHandle },

    /// Answered with [`RendererEvent::Pong`] once every earlier message is applied.
    Ping { seq: u64 },
}

/// Message delivered to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RendererEvent {
    /// Base map and controls are up. Sent once per map.
    MapReady { viewport: Viewport },

    /// A category's layer changed.
    LayerStatus {
        category: Category,
        state: LayerState,
        rendered: usize,
    },

    /// The user tapped a marker; hosts navigate to the detail view.
    MarkerSelected {
        category: Category,
        id: MarkerId,
        label: String,
        coordinate: Coordinate,
    },

    /// The visible extent changed.
    ViewportChanged { viewport: Viewport },

    Pong { seq: u64 },

    /// Renderer-side problem reported for logging.
    Error { code: String, message: String },
}
