use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use foundation::Coordinate;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {e}"),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Base raster tile layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayerConfig {
    /// `{s}`, `{z}`, `{x}`, `{y}` and `{r}` are substituted by the renderer.
    pub url_template: String,
    pub attribution: String,
    pub subdomains: String,
}

impl Default for TileLayerConfig {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}{r}.png"
                .to_string(),
            attribution: "&copy; OpenStreetMap contributors &copy; CARTO".to_string(),
            subdomains: "abcd".to_string(),
        }
    }
}

/// Configuration for the map overlay engine and its host bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Zoom used when the map is created and on recenter.
    pub default_zoom: f64,

    /// Highest zoom the surface allows.
    pub max_zoom: f64,

    pub tiles: TileLayerConfig,

    /// Surface size used by the headless renderer to derive viewports.
    pub surface_width_px: u32,
    pub surface_height_px: u32,

    /// Map center when no device location is known.
    pub fallback_location: Coordinate,

    /// Minimum movement (degrees, either axis) before a fix is forwarded.
    pub location_threshold_deg: f64,

    /// Minimum interval between forwarded fixes (ms).
    pub location_min_interval_ms: u64,

    /// How long to wait for the first fix at startup (ms).
    pub location_timeout_ms: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            default_zoom: 13.0,
            max_zoom: 19.0,
            tiles: TileLayerConfig::default(),
            surface_width_px: 1080,
            surface_height_px: 1920,
            fallback_location: Coordinate::SEOUL,
            location_threshold_deg: 0.05,
            location_min_interval_ms: 1000,
            location_timeout_ms: 15_000,
        }
    }
}

impl OverlayConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config = Self::parse(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }

    /// Read the optional file, apply `OVERLAY_ZOOM`, `OVERLAY_WIDTH` and
    /// `OVERLAY_HEIGHT` from `env`, then validate the result.
    ///
    /// Values that do not parse are ignored.
    pub fn load_with_overrides(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::parse(&std::fs::read_to_string(path).map_err(ConfigError::Io)?)?,
            None => Self::default(),
        };
        override_from(&env, "OVERLAY_ZOOM", &mut config.default_zoom);
        override_from(&env, "OVERLAY_WIDTH", &mut config.surface_width_px);
        override_from(&env, "OVERLAY_HEIGHT", &mut config.surface_height_px);
        config.validate()?;
        Ok(config)
    }

    fn parse(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Parse)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }

    pub fn location_min_interval(&self) -> Duration {
        Duration::from_millis(self.location_min_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=self.max_zoom).contains(&self.default_zoom) {
            return Err(ConfigError::Invalid(format!(
                "default_zoom {} outside [0, {}]",
                self.default_zoom, self.max_zoom
            )));
        }
        if self.surface_width_px == 0 || self.surface_height_px == 0 {
            return Err(ConfigError::Invalid("surface size must be non-zero".to_string()));
        }
        if self.location_threshold_deg.is_nan() || self.location_threshold_deg < 0.0 {
            return Err(ConfigError::Invalid(
                "location_threshold_deg must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn override_from<T: FromStr>(env: impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
    if let Some(value) = env(key).and_then(|v| v.trim().parse().ok()) {
        *slot = value;
    }
}
