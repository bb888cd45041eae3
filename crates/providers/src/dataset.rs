use layers::{Category, MarkerRecord};
use tracing::{info, warn};

use crate::BoxFuture;

/// Error type for dataset loading.
#[derive(Debug)]
pub enum DatasetError {
    Io(std::io::Error),
    Http(reqwest::Error),
    Xml(quick_xml::Error),
    Json(serde_json::Error),
    /// The payload parsed but did not have the expected shape.
    Format(String),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Io(e) => write!(f, "dataset read failed: {e}"),
            DatasetError::Http(e) => write!(f, "dataset request failed: {e}"),
            DatasetError::Xml(e) => write!(f, "dataset XML parse error: {e}"),
            DatasetError::Json(e) => write!(f, "dataset JSON parse error: {e}"),
            DatasetError::Format(msg) => write!(f, "unexpected dataset format: {msg}"),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Io(e) => Some(e),
            DatasetError::Http(e) => Some(e),
            DatasetError::Xml(e) => Some(e),
            DatasetError::Json(e) => Some(e),
            DatasetError::Format(_) => None,
        }
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<reqwest::Error> for DatasetError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<quick_xml::Error> for DatasetError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Trait for marker dataset providers.
///
/// Implementations must be `Send + Sync` for use across async tasks.
pub trait DatasetSource: Send + Sync {
    /// Category every returned record belongs to.
    fn category(&self) -> Category;

    /// Load the full record set.
    fn load(&self) -> BoxFuture<'_, Result<Vec<MarkerRecord>, DatasetError>>;
}

/// Result of [`load_or_empty`]: the records to show plus the failure, if any.
#[derive(Debug)]
pub struct DatasetOutcome {
    pub category: Category,
    pub records: Vec<MarkerRecord>,
    pub error: Option<DatasetError>,
}

impl DatasetOutcome {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Load a dataset, degrading any failure to an empty record list.
///
/// The error is logged and kept on the outcome so callers that care can
/// surface it; callers that do not simply use `records`.
pub async fn load_or_empty(source: &dyn DatasetSource) -> DatasetOutcome {
    let category = source.category();
    match source.load().await {
        Ok(records) => {
            let usable = records.iter().filter(|r| r.coordinate.is_some()).count();
            info!(
                %category,
                total = records.len(),
                usable,
                "dataset loaded"
            );
            DatasetOutcome {
                category,
                records,
                error: None,
            }
        }
        Err(err) => {
            warn!(%category, "dataset unavailable, showing an empty layer: {err}");
            DatasetOutcome {
                category,
                records: Vec::new(),
                error: Some(err),
            }
        }
    }
}
