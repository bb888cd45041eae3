use std::env;
use std::path::PathBuf;

use clap::Parser;
use engine::{HeadlessSurface, HostBridge, OverlayConfig, spawn_engine};
use foundation::Coordinate;
use layers::{Category, Viewport};
use protocol::RendererEvent;
use providers::{
    BundledDataset, DEFAULT_SPRING_WATER_URL, FixedLocation, SpringWaterSource, load_or_empty,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive the map overlay engine against a headless surface")]
struct Args {
    /// JSON file with overlay settings (defaults apply to missing keys)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device latitude (default: OVERLAY_LAT or the configured fallback)
    #[arg(long)]
    lat: Option<f64>,

    /// Device longitude (default: OVERLAY_LON or the configured fallback)
    #[arg(long)]
    lon: Option<f64>,

    /// Categories to show, e.g. rest-stop,beach,spring-water
    #[arg(long, value_delimiter = ',')]
    show: Vec<Category>,

    /// Pan the map to lat,lon after the initial render
    #[arg(long, value_parser = parse_coordinate)]
    pan: Option<Coordinate>,

    /// Directory holding <category>.json datasets
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Full spring-water request URL (default: built from SPRING_WATER_SERVICE_KEY)
    #[arg(long)]
    spring_water_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config =
        OverlayConfig::load_with_overrides(args.config.as_deref(), |key| env::var(key).ok())?;

    let device = Coordinate::new(
        args.lat
            .unwrap_or_else(|| env_var_f64("OVERLAY_LAT", config.fallback_location.latitude())),
        args.lon
            .unwrap_or_else(|| env_var_f64("OVERLAY_LON", config.fallback_location.longitude())),
    )?;
    let data_dir = args.data_dir.clone().unwrap_or_else(|| {
        env::var("OVERLAY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets")))
    });

    let surface = HeadlessSurface::from_config(&config);
    let probe = surface.probe();
    let (engine, mut events, engine_task) = spawn_engine(config.clone(), surface);
    let mut bridge = HostBridge::new(engine.clone(), &config);

    for category in Category::ALL.into_iter().filter(|c| !c.is_async()) {
        let path = data_dir.join(format!("{category}.json"));
        if !path.exists() {
            continue;
        }
        let outcome = load_or_empty(&BundledDataset::from_file(category, path)).await;
        bridge.deliver_dataset(category, outcome.records)?;
    }

    for category in &args.show {
        bridge.set_layer_visible(*category, true)?;
    }

    if let Err(e) = bridge
        .bootstrap(&FixedLocation(device), config.location_timeout())
        .await
    {
        error!("cannot start the map: {e}");
        return Err(e.into());
    }

    while let Some(event) = events.recv().await {
        bridge.observe(&event)?;
        if bridge.is_ready() {
            break;
        }
    }
    log_events(events.sync(&engine).await?);

    if let Some(source) = spring_water_source(args.spring_water_url.clone()) {
        let deliver = engine.clone();
        let fetch = tokio::spawn(async move {
            let outcome = load_or_empty(&source).await;
            deliver.dataset(Category::SpringWater, outcome.records)
        });
        fetch.await??;
        log_events(events.sync(&engine).await?);
    } else if args.show.contains(&Category::SpringWater) {
        warn!("spring water requested but no service key or URL configured");
    }

    if let Some(pan) = args.pan {
        let viewport = Viewport::around(
            pan,
            config.default_zoom,
            config.surface_width_px,
            config.surface_height_px,
        );
        engine.viewport_settled(viewport)?;
        log_events(events.sync(&engine).await?);
    }

    if let Some(viewport) = probe.viewport() {
        println!(
            "viewport center {} z{} bounds [{:.4}, {:.4}, {:.4}, {:.4}]",
            viewport.center,
            viewport.zoom,
            viewport.bounds.south,
            viewport.bounds.west,
            viewport.bounds.north,
            viewport.bounds.east
        );
    }
    for (category, visible) in bridge.desired() {
        println!(
            "{:<26} {:<7} {} markers",
            category.label(),
            if *visible { "shown" } else { "hidden" },
            probe.count_for(*category)
        );
    }

    drop(bridge);
    drop(engine);
    engine_task.await?;
    Ok(())
}

fn spring_water_source(url: Option<String>) -> Option<SpringWaterSource> {
    let client = reqwest::Client::new();
    if let Some(url) = url.or_else(|| env::var("SPRING_WATER_URL").ok()) {
        return Some(SpringWaterSource::new(client, url));
    }
    let key = env::var("SPRING_WATER_SERVICE_KEY").ok()?;
    Some(SpringWaterSource::with_service_key(
        client,
        DEFAULT_SPRING_WATER_URL,
        &key,
    ))
}

fn log_events(events: Vec<RendererEvent>) {
    for event in events {
        match event {
            RendererEvent::MapReady { viewport } => {
                info!("map ready at {}, z{}", viewport.center, viewport.zoom)
            }
            RendererEvent::LayerStatus {
                category,
                state,
                rendered,
            } => info!(%category, ?state, rendered, "layer status"),
            RendererEvent::ViewportChanged { viewport } => {
                info!("viewport moved to {}", viewport.center)
            }
            RendererEvent::Error { code, message } => warn!(%code, "renderer error: {message}"),
            RendererEvent::MarkerSelected { .. } | RendererEvent::Pong { .. } => {}
        }
    }
}

fn parse_coordinate(text: &str) -> Result<Coordinate, String> {
    let (lat, lon) = text
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lon, got '{text}'"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("bad longitude: {e}"))?;
    Coordinate::new(lat, lon).map_err(|e| e.to_string())
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
