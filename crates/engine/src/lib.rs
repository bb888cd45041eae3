//! Map overlay engine: the renderer-side actor plus the host-side bridge.

pub mod config;
pub mod engine;
pub mod headless;
pub mod host;
pub mod surface;

pub use config::{ConfigError, OverlayConfig, TileLayerConfig};
pub use engine::{EngineError, EngineEvents, EngineHandle, MapOverlayEngine, spawn_engine};
pub use headless::{DrawnMarker, HeadlessSurface, SceneProbe};
pub use host::{HostBridge, HostError, LocationFilter, bootstrap};
pub use surface::{ControlPosition, MapControl, MapSurface, SurfaceMarker};
