//! Host side of the bridge.
//!
//! The host owns the toggle state the user sees. It cannot know when the
//! renderer is listening, so requests made before `mapReady` are buffered and
//! delivered once, as a single batch, when the renderer announces itself.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use foundation::Coordinate;
use layers::{Category, MarkerRecord};
use protocol::RendererEvent;
use providers::{LocationError, LocationProvider, acquire_location};
use tracing::{debug, info};

use crate::config::OverlayConfig;
use crate::engine::{EngineError, EngineHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// No device position; the map is never initialized.
    Location(LocationError),
    Engine(EngineError),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Location(e) => write!(f, "{e}"),
            HostError::Engine(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::Location(e) => Some(e),
            HostError::Engine(e) => Some(e),
        }
    }
}

impl From<LocationError> for HostError {
    fn from(e: LocationError) -> Self {
        Self::Location(e)
    }
}

impl From<EngineError> for HostError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

/// Acquire the device position and initialize the map there.
///
/// On a location failure nothing is sent to the engine.
pub async fn bootstrap(
    engine: &EngineHandle,
    provider: &dyn LocationProvider,
    timeout: Duration,
) -> Result<Coordinate, HostError> {
    let center = acquire_location(provider, timeout).await?;
    engine.initialize(center)?;
    Ok(center)
}

/// Decides which location fixes are worth forwarding to the renderer.
#[derive(Debug, Clone)]
pub struct LocationFilter {
    threshold_deg: f64,
    min_interval: Duration,
    last: Option<(Coordinate, Instant)>,
}

impl LocationFilter {
    pub fn new(threshold_deg: f64, min_interval: Duration) -> Self {
        Self {
            threshold_deg,
            min_interval,
            last: None,
        }
    }

    pub fn from_config(config: &OverlayConfig) -> Self {
        Self::new(config.location_threshold_deg, config.location_min_interval())
    }

    /// Treat `coord` as already forwarded at `now`.
    pub fn seed(&mut self, coord: Coordinate, now: Instant) {
        self.last = Some((coord, now));
    }

    /// Returns `true` and remembers the fix if it moved far enough, late enough.
    pub fn accept(&mut self, coord: Coordinate, now: Instant) -> bool {
        if let Some((prev, at)) = self.last {
            let moved = (coord.latitude() - prev.latitude()).abs() > self.threshold_deg
                || (coord.longitude() - prev.longitude()).abs() > self.threshold_deg;
            if !moved || now.saturating_duration_since(at) < self.min_interval {
                return false;
            }
        }
        self.last = Some((coord, now));
        true
    }
}

pub struct HostBridge {
    engine: EngineHandle,
    desired: BTreeMap<Category, bool>,
    ready: bool,
    location: LocationFilter,
}

impl HostBridge {
    pub fn new(engine: EngineHandle, config: &OverlayConfig) -> Self {
        Self {
            engine,
            desired: BTreeMap::new(),
            ready: false,
            location: LocationFilter::from_config(config),
        }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Latest requested visibility per category.
    pub fn desired(&self) -> &BTreeMap<Category, bool> {
        &self.desired
    }

    pub async fn bootstrap(
        &mut self,
        provider: &dyn LocationProvider,
        timeout: Duration,
    ) -> Result<Coordinate, HostError> {
        let center = bootstrap(&self.engine, provider, timeout).await?;
        self.location.seed(center, Instant::now());
        Ok(center)
    }

    /// Record a toggle; forwarded now if the renderer is ready, else at `mapReady`.
    pub fn set_layer_visible(
        &mut self,
        category: Category,
        visible: bool,
    ) -> Result<(), HostError> {
        self.desired.insert(category, visible);
        if self.ready {
            self.engine.set_layer_visible(category, visible, None)?;
        } else {
            debug!(%category, visible, "renderer not ready, buffering toggle");
        }
        Ok(())
    }

    /// Master switch over every category, buffered like single toggles.
    pub fn set_all_visible(&mut self, visible: bool) -> Result<(), HostError> {
        self.desired.extend(Category::ALL.map(|c| (c, visible)));
        if self.ready {
            self.engine.show_all(visible)?;
        } else {
            debug!(visible, "renderer not ready, buffering show-all");
        }
        Ok(())
    }

    /// Forward a category's records. The engine applies them whenever they arrive.
    pub fn deliver_dataset(
        &self,
        category: Category,
        records: Vec<MarkerRecord>,
    ) -> Result<(), HostError> {
        Ok(self.engine.dataset(category, records)?)
    }

    /// Replace favorites and set their visibility in one step.
    pub fn update_favorites(
        &mut self,
        favorites: Vec<MarkerRecord>,
        show: bool,
    ) -> Result<(), HostError> {
        self.deliver_dataset(Category::Favorite, favorites)?;
        self.set_layer_visible(Category::Favorite, show)
    }

    pub fn location_fix(&mut self, coord: Coordinate) -> Result<bool, HostError> {
        self.location_fix_at(coord, Instant::now())
    }

    /// Forward a fix if the filter lets it through. Returns whether it was sent.
    pub fn location_fix_at(&mut self, coord: Coordinate, now: Instant) -> Result<bool, HostError> {
        if !self.ready || !self.location.accept(coord, now) {
            return Ok(false);
        }
        self.engine.update_location(coord)?;
        Ok(true)
    }

    pub fn recenter(&self) -> Result<(), HostError> {
        Ok(self.engine.recenter()?)
    }

    /// Feed a renderer event through the bridge.
    ///
    /// The first `mapReady` flushes buffered toggles as one `toggleLayers`
    /// message. Later `mapReady` events are ignored.
    pub fn observe(&mut self, event: &RendererEvent) -> Result<(), HostError> {
        if !matches!(event, RendererEvent::MapReady { .. }) || self.ready {
            return Ok(());
        }
        self.ready = true;
        info!(
            layers = self.desired.len(),
            "renderer ready, delivering initial toggles"
        );
        self.engine
            .toggle_layers(self.desired.iter().map(|(c, v)| (*c, *v)))?;
        Ok(())
    }
}
