//! The renderer-side actor.
//!
//! [`MapOverlayEngine`] owns the map surface and the overlay state. It is
//! reachable only through its inbox port: every host operation and every
//! surface gesture arrives there as JSON text and is applied in send order.
//! Outcomes travel back on a second port as [`RendererEvent`]s.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use foundation::Coordinate;
use layers::{Category, LayerState, MapOverlay, MarkerHandle, MarkerRecord, RenderCommand, Viewport};
use protocol::{HostMessage, RendererEvent};
use runtime::{PortError, PortReceiver, PortSender, port};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::OverlayConfig;
use crate::surface::{ControlPosition, MapControl, MapSurface, apply_commands};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine task has stopped.
    Closed,
    Encode(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Closed => write!(f, "map engine is no longer running"),
            EngineError::Encode(msg) => write!(f, "failed to encode engine message: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<PortError> for EngineError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::Closed => EngineError::Closed,
            PortError::Encode(msg) => EngineError::Encode(msg),
        }
    }
}

type LayerSnapshot = Vec<(Category, LayerState, usize)>;

pub struct MapOverlayEngine<S> {
    config: OverlayConfig,
    surface: S,
    overlay: MapOverlay,
    events: PortSender<RendererEvent>,
    initialized: bool,
    last_location: Option<Coordinate>,
}

impl<S: MapSurface> MapOverlayEngine<S> {
    pub fn new(config: OverlayConfig, surface: S, events: PortSender<RendererEvent>) -> Self {
        Self {
            config,
            surface,
            overlay: MapOverlay::new(),
            events,
            initialized: false,
            last_location: None,
        }
    }

    pub fn overlay(&self) -> &MapOverlay {
        &self.overlay
    }

    /// Apply messages until every inbox sender is dropped.
    pub async fn run(mut self, mut inbox: PortReceiver<HostMessage>) {
        info!("map overlay engine started");
        while let Some(message) = inbox.recv().await {
            self.handle(message);
        }
        info!(dropped = inbox.dropped(), "map overlay engine stopped");
    }

    /// Apply one message and report every layer it changed.
    pub fn handle(&mut self, message: HostMessage) {
        let before = self.snapshot();
        match message {
            HostMessage::Initialize { center } => self.initialize(center),
            HostMessage::SetLayerVisible {
                category,
                visible,
                data,
            } => self.set_layer_visible(category, visible, data),
            HostMessage::ToggleLayers { layers } => {
                for (category, visible) in layers {
                    self.set_layer_visible(category, visible, None);
                }
            }
            HostMessage::Dataset { category, records } => {
                debug!(%category, records = records.len(), "dataset received");
                let commands = self.overlay.supply_records(category, records);
                self.render(commands);
            }
            HostMessage::UpdateLocation { location } => {
                self.last_location = Some(location);
                if self.initialized {
                    self.surface.place_user_marker(location);
                }
            }
            HostMessage::Recenter => self.recenter(),
            HostMessage::ViewportSettled { viewport } => {
                if self.require_map("viewportSettled") {
                    self.apply_viewport(viewport);
                }
            }
            HostMessage::MarkerTapped { handle } => self.marker_tapped(handle),
            HostMessage::Ping { seq } => self.emit(RendererEvent::Pong { seq }),
        }
        self.report_changes(&before);
    }

    fn initialize(&mut self, center: Coordinate) {
        if self.initialized {
            warn!("map already initialized, ignoring initialize at {center}");
            return;
        }

        let viewport = self
            .surface
            .create_map(center, self.config.default_zoom, &self.config.tiles);
        self.surface.add_control(MapControl::Zoom {
            position: ControlPosition::BottomRight,
        });
        self.surface.add_control(MapControl::Recenter {
            position: ControlPosition::BottomLeft,
        });

        // A fix that arrived before the map was up wins over the bootstrap center.
        let location = *self.last_location.get_or_insert(center);
        self.surface.place_user_marker(location);

        let commands = self.overlay.set_viewport(viewport);
        self.render(commands);
        self.initialized = true;
        info!("map ready at {center}, z{}", viewport.zoom);
        self.emit(RendererEvent::MapReady { viewport });
    }

    fn set_layer_visible(
        &mut self,
        category: Category,
        visible: bool,
        data: Option<Vec<MarkerRecord>>,
    ) {
        let commands = self.overlay.set_layer_visible(category, visible, data);
        self.render(commands);
    }

    fn recenter(&mut self) {
        if !self.require_map("recenter") {
            return;
        }
        let Some(location) = self.last_location else {
            return;
        };
        let viewport = self.surface.set_view(location, self.config.default_zoom);
        self.apply_viewport(viewport);
    }

    fn apply_viewport(&mut self, viewport: Viewport) {
        let commands = self.overlay.set_viewport(viewport);
        self.render(commands);
        self.emit(RendererEvent::ViewportChanged { viewport });
    }

    fn marker_tapped(&mut self, handle: MarkerHandle) {
        // Taps can race with a refresh that already removed the marker.
        let Some((category, marker)) = self.overlay.find_marker(handle) else {
            debug!(handle = handle.0, "tap on a marker that is no longer drawn");
            return;
        };
        let event = RendererEvent::MarkerSelected {
            category,
            id: marker.id.clone(),
            label: marker.label.clone(),
            coordinate: marker.coordinate,
        };
        self.emit(event);
    }

    fn require_map(&mut self, operation: &str) -> bool {
        if self.initialized {
            return true;
        }
        warn!("{operation} before the map was initialized");
        self.emit(RendererEvent::Error {
            code: "not_ready".to_string(),
            message: format!("{operation} requires an initialized map"),
        });
        false
    }

    fn render(&mut self, commands: Vec<RenderCommand>) {
        if !commands.is_empty() {
            debug!(commands = commands.len(), "applying render commands");
        }
        apply_commands(&mut self.surface, commands);
    }

    fn snapshot(&self) -> LayerSnapshot {
        Category::ALL
            .iter()
            .map(|&c| (c, self.overlay.layer_state(c), self.overlay.rendered_count(c)))
            .collect()
    }

    fn report_changes(&mut self, before: &LayerSnapshot) {
        let after = self.snapshot();
        for (old, new) in before.iter().zip(after) {
            if *old != new {
                let (category, state, rendered) = new;
                self.emit(RendererEvent::LayerStatus {
                    category,
                    state,
                    rendered,
                });
            }
        }
    }

    fn emit(&self, event: RendererEvent) {
        if let Err(e) = self.events.post(&event) {
            debug!("event not delivered: {e}");
        }
    }
}

/// Host-side sender for the engine inbox.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    inbox: PortSender<HostMessage>,
    next_seq: Arc<AtomicU64>,
}

impl EngineHandle {
    pub fn new(inbox: PortSender<HostMessage>) -> Self {
        Self {
            inbox,
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn send(&self, message: &HostMessage) -> Result<(), EngineError> {
        Ok(self.inbox.post(message)?)
    }

    /// Post raw JSON, as a WebView bridge would.
    pub fn post_text(&self, text: impl Into<String>) -> Result<(), EngineError> {
        Ok(self.inbox.post_text(text)?)
    }

    pub fn initialize(&self, center: Coordinate) -> Result<(), EngineError> {
        self.send(&HostMessage::Initialize { center })
    }

    pub fn set_layer_visible(
        &self,
        category: Category,
        visible: bool,
        data: Option<Vec<MarkerRecord>>,
    ) -> Result<(), EngineError> {
        self.send(&HostMessage::SetLayerVisible {
            category,
            visible,
            data,
        })
    }

    pub fn toggle_layers(
        &self,
        layers: impl IntoIterator<Item = (Category, bool)>,
    ) -> Result<(), EngineError> {
        self.send(&HostMessage::ToggleLayers {
            layers: layers.into_iter().collect(),
        })
    }

    /// Show or hide every category in one batch.
    pub fn show_all(&self, visible: bool) -> Result<(), EngineError> {
        self.toggle_layers(Category::ALL.map(|c| (c, visible)))
    }

    pub fn dataset(
        &self,
        category: Category,
        records: Vec<MarkerRecord>,
    ) -> Result<(), EngineError> {
        self.send(&HostMessage::Dataset { category, records })
    }

    pub fn update_location(&self, location: Coordinate) -> Result<(), EngineError> {
        self.send(&HostMessage::UpdateLocation { location })
    }

    pub fn recenter(&self) -> Result<(), EngineError> {
        self.send(&HostMessage::Recenter)
    }

    pub fn viewport_settled(&self, viewport: Viewport) -> Result<(), EngineError> {
        self.send(&HostMessage::ViewportSettled { viewport })
    }

    pub fn marker_tapped(&self, handle: MarkerHandle) -> Result<(), EngineError> {
        self.send(&HostMessage::MarkerTapped { handle })
    }

    /// Post a barrier and return its sequence number.
    pub fn ping(&self) -> Result<u64, EngineError> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.send(&HostMessage::Ping { seq })?;
        Ok(seq)
    }

    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }
}

/// Host-side receiver for renderer events.
#[derive(Debug)]
pub struct EngineEvents {
    rx: PortReceiver<RendererEvent>,
}

impl EngineEvents {
    pub fn new(rx: PortReceiver<RendererEvent>) -> Self {
        Self { rx }
    }

    pub async fn recv(&mut self) -> Option<RendererEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<RendererEvent> {
        self.rx.try_recv()
    }

    /// Wait until every message posted on `engine` so far has been applied.
    ///
    /// Returns the events emitted in the meantime, in order.
    pub async fn sync(&mut self, engine: &EngineHandle) -> Result<Vec<RendererEvent>, EngineError> {
        let seq = engine.ping()?;
        let mut seen = Vec::new();
        while let Some(event) = self.rx.recv().await {
            if matches!(event, RendererEvent::Pong { seq: got } if got == seq) {
                return Ok(seen);
            }
            seen.push(event);
        }
        Err(EngineError::Closed)
    }
}

/// Start an engine task driving `surface`.
pub fn spawn_engine<S: MapSurface>(
    config: OverlayConfig,
    surface: S,
) -> (EngineHandle, EngineEvents, JoinHandle<()>) {
    let (inbox_tx, inbox_rx) = port::<HostMessage>("renderer-inbox");
    let (events_tx, events_rx) = port::<RendererEvent>("host-events");
    let engine = MapOverlayEngine::new(config, surface, events_tx);
    let task = tokio::spawn(engine.run(inbox_rx));
    (EngineHandle::new(inbox_tx), EngineEvents::new(events_rx), task)
}

#[cfg(test)]
mod tests {
    use super::{EngineEvents, EngineHandle, spawn_engine};
    use crate::config::OverlayConfig;
    use crate::headless::{HeadlessSurface, SceneProbe};
    use crate::surface::{ControlPosition, MapControl};
    use foundation::Coordinate;
    use layers::{Category, LayerState, MarkerRecord, Viewport};
    use pretty_assertions::assert_eq;
    use protocol::RendererEvent;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn rest_stops() -> Vec<MarkerRecord> {
        [
            (37.500, 127.030),
            (37.510, 127.040),
            (37.490, 127.020),
            (35.160, 129.060),
            (35.170, 129.050),
            (36.350, 127.380),
            (35.870, 128.600),
            (33.500, 126.530),
            (38.200, 128.590),
            (34.810, 126.390),
        ]
        .iter()
        .enumerate()
        .map(|(i, (lat, lon))| {
            MarkerRecord::new(format!("rs-{i}"), format!("Rest stop {i}"), c(*lat, *lon))
        })
        .collect()
    }

    fn start() -> (EngineHandle, EngineEvents, SceneProbe) {
        let config = OverlayConfig::default();
        let surface = HeadlessSurface::from_config(&config);
        let probe = surface.probe();
        let (engine, events, _task) = spawn_engine(config, surface);
        (engine, events, probe)
    }

    fn statuses(events: &[RendererEvent]) -> Vec<(Category, LayerState, usize)> {
        events
            .iter()
            .filter_map(|e| match e {
                RendererEvent::LayerStatus {
                    category,
                    state,
                    rendered,
                } => Some((*category, *state, *rendered)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn initialize_builds_the_map_once() {
        let (engine, mut events, probe) = start();
        engine.initialize(c(37.50, 127.03)).unwrap();
        engine.initialize(c(35.0, 129.0)).unwrap();
        let seen = events.sync(&engine).await.unwrap();

        let ready: Vec<_> = seen
            .iter()
            .filter(|e| matches!(e, RendererEvent::MapReady { .. }))
            .collect();
        assert_eq!(ready.len(), 1);
        assert_eq!(probe.maps_created(), 1);
        assert_eq!(probe.user_marker(), Some(c(37.50, 127.03)));
        assert_eq!(
            probe.controls(),
            vec![
                MapControl::Zoom {
                    position: ControlPosition::BottomRight
                },
                MapControl::Recenter {
                    position: ControlPosition::BottomLeft
                },
            ]
        );
        assert_eq!(probe.viewport().map(|v| v.zoom), Some(13.0));
    }

    #[tokio::test]
    async fn rest_stop_toggle_and_pan_scenario() {
        let (engine, mut events, probe) = start();
        engine.initialize(c(37.50, 127.03)).unwrap();
        engine.dataset(Category::RestStop, rest_stops()).unwrap();
        engine.set_layer_visible(Category::RestStop, true, None).unwrap();
        events.sync(&engine).await.unwrap();
        assert_eq!(probe.count_for(Category::RestStop), 3);

        engine.set_layer_visible(Category::RestStop, false, None).unwrap();
        events.sync(&engine).await.unwrap();
        assert_eq!(probe.marker_count(), 0);

        let busan = Viewport::around(c(35.165, 129.055), 13.0, 1080, 1920);
        engine.viewport_settled(busan).unwrap();
        events.sync(&engine).await.unwrap();
        assert_eq!(probe.marker_count(), 0);

        engine.set_layer_visible(Category::RestStop, true, None).unwrap();
        let seen = events.sync(&engine).await.unwrap();
        assert_eq!(probe.count_for(Category::RestStop), 2);
        assert_eq!(
            statuses(&seen),
            vec![(Category::RestStop, LayerState::Visible, 2)]
        );
    }

    #[tokio::test]
    async fn repeated_show_emits_nothing() {
        let (engine, mut events, probe) = start();
        engine.initialize(c(37.50, 127.03)).unwrap();
        engine
            .set_layer_visible(Category::RestStop, true, Some(rest_stops()))
            .unwrap();
        events.sync(&engine).await.unwrap();
        let before = probe.markers_for(Category::RestStop);

        engine
            .set_layer_visible(Category::RestStop, true, Some(rest_stops()))
            .unwrap();
        let seen = events.sync(&engine).await.unwrap();
        assert!(seen.is_empty());
        assert_eq!(probe.markers_for(Category::RestStop), before);
    }

    #[tokio::test]
    async fn spring_water_shows_once_data_arrives() {
        let (engine, mut events, probe) = start();
        engine.initialize(c(37.50, 127.03)).unwrap();
        engine.set_layer_visible(Category::SpringWater, true, None).unwrap();
        let seen = events.sync(&engine).await.unwrap();
        assert_eq!(
            statuses(&seen),
            vec![(Category::SpringWater, LayerState::Loading, 0)]
        );

        let springs = vec![
            MarkerRecord::new("sw-1", "Spring 1", c(37.501, 127.031)),
            MarkerRecord::new("sw-2", "Spring 2", c(37.502, 127.032)),
            MarkerRecord::without_coordinate("sw-3", "Spring 3"),
        ];
        engine.dataset(Category::SpringWater, springs).unwrap();
        let seen = events.sync(&engine).await.unwrap();
        assert_eq!(
            statuses(&seen),
            vec![(Category::SpringWater, LayerState::Visible, 2)]
        );
        assert_eq!(probe.count_for(Category::SpringWater), 2);
    }

    #[tokio::test]
    async fn late_data_after_hide_is_kept_but_not_drawn() {
        let (engine, mut events, probe) = start();
        engine.initialize(c(37.50, 127.03)).unwrap();
        engine.set_layer_visible(Category::SpringWater, true, None).unwrap();
        engine.set_layer_visible(Category::SpringWater, false, None).unwrap();
        engine
            .dataset(
                Category::SpringWater,
                vec![MarkerRecord::new("sw-1", "Spring 1", c(37.501, 127.031))],
            )
            .unwrap();
        events.sync(&engine).await.unwrap();
        assert_eq!(probe.marker_count(), 0);

        engine.set_layer_visible(Category::SpringWater, true, None).unwrap();
        events.sync(&engine).await.unwrap();
        assert_eq!(probe.count_for(Category::SpringWater), 1);
    }

    #[tokio::test]
    async fn malformed_messages_do_not_disturb_the_engine() {
        let (engine, mut events, probe) = start();
        engine.initialize(c(37.50, 127.03)).unwrap();
        engine.post_text("{\"type\": \"setLayerVisible\", \"category\":").unwrap();
        engine.post_text(r#"{"type":"launchRockets"}"#).unwrap();
        engine
            .post_text(r#"{"type":"setLayerVisible","category":"restStop","visible":true}"#)
            .unwrap();
        engine.dataset(Category::RestStop, rest_stops()).unwrap();
        events.sync(&engine).await.unwrap();
        assert_eq!(probe.count_for(Category::RestStop), 3);
    }

    #[tokio::test]
    async fn requests_before_initialize_apply_when_map_is_ready() {
        let (engine, mut events, probe) = start();
        engine.dataset(Category::RestStop, rest_stops()).unwrap();
        engine.set_layer_visible(Category::RestStop, true, None).unwrap();
        events.sync(&engine).await.unwrap();
        assert_eq!(probe.marker_count(), 0);

        engine.initialize(c(37.50, 127.03)).unwrap();
        let seen = events.sync(&engine).await.unwrap();
        assert!(matches!(seen.first(), Some(RendererEvent::MapReady { .. })));
        assert_eq!(probe.count_for(Category::RestStop), 3);
    }

    #[tokio::test]
    async fn recenter_returns_to_last_location_and_keeps_layers() {
        let (engine, mut events, probe) = start();
        engine.initialize(c(35.165, 129.055)).unwrap();
        engine
            .set_layer_visible(Category::RestStop, true, Some(rest_stops()))
            .unwrap();
        engine.update_location(c(37.50, 127.03)).unwrap();
        events.sync(&engine).await.unwrap();
        assert_eq!(probe.count_for(Category::RestStop), 2);
        assert_eq!(probe.user_marker(), Some(c(37.50, 127.03)));

        engine.recenter().unwrap();
        let seen = events.sync(&engine).await.unwrap();
        let viewport = probe.viewport().unwrap();
        assert_eq!(viewport.center, c(37.50, 127.03));
        assert_eq!(viewport.zoom, 13.0);
        assert!(seen.contains(&RendererEvent::ViewportChanged { viewport }));
        assert_eq!(probe.count_for(Category::RestStop), 3);
    }

    #[tokio::test]
    async fn recenter_before_initialize_reports_not_ready() {
        let (engine, mut events, _probe) = start();
        engine.recenter().unwrap();
        let seen = events.sync(&engine).await.unwrap();
        assert!(matches!(
            seen.as_slice(),
            [RendererEvent::Error { code, .. }] if code == "not_ready"
        ));
    }

    #[tokio::test]
    async fn marker_tap_selects_record() {
        let (engine, mut events, probe) = start();
        engine.initialize(c(37.50, 127.03)).unwrap();
        engine
            .set_layer_visible(Category::RestStop, true, Some(rest_stops()))
            .unwrap();
        events.sync(&engine).await.unwrap();

        let (handle, drawn) = probe.markers_for(Category::RestStop).remove(0);
        engine.marker_tapped(handle).unwrap();
        let seen = events.sync(&engine).await.unwrap();
        assert_eq!(
            seen,
            vec![RendererEvent::MarkerSelected {
                category: Category::RestStop,
                id: "rs-0".into(),
                label: drawn.popup.clone(),
                coordinate: drawn.coordinate,
            }]
        );
    }

    #[tokio::test]
    async fn toggle_layers_batch_applies_each_category() {
        let (engine, mut events, probe) = start();
        engine.initialize(c(37.50, 127.03)).unwrap();
        engine.dataset(Category::RestStop, rest_stops()).unwrap();
        engine
            .dataset(
                Category::Wifi,
                vec![MarkerRecord::new("w-1", "Free wifi", c(37.505, 127.035))],
            )
            .unwrap();
        engine
            .toggle_layers([(Category::RestStop, true), (Category::Wifi, true)])
            .unwrap();
        events.sync(&engine).await.unwrap();
        assert_eq!(probe.count_for(Category::RestStop), 3);
        assert_eq!(probe.count_for(Category::Wifi), 1);
    }
}
