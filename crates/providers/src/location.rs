use std::time::Duration;

use foundation::Coordinate;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::BoxFuture;

#[derive(Debug, Clone, PartialEq)]
pub enum LocationError {
    PermissionDenied,
    Timeout(Duration),
    /// Hardware or platform failure, with the platform's reason.
    Unavailable(String),
}

impl std::fmt::Display for LocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationError::PermissionDenied => write!(f, "location permission was denied"),
            LocationError::Timeout(after) => {
                write!(f, "no location fix after {} ms", after.as_millis())
            }
            LocationError::Unavailable(reason) => write!(f, "location unavailable: {reason}"),
        }
    }
}

impl std::error::Error for LocationError {}

/// Source of the device position.
pub trait LocationProvider: Send + Sync {
    /// Resolve the current position. May wait for a first fix.
    fn current_coordinate(&self) -> BoxFuture<'_, Result<Coordinate, LocationError>>;
}

/// Always reports the same coordinate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FixedLocation(pub Coordinate);

impl LocationProvider for FixedLocation {
    fn current_coordinate(&self) -> BoxFuture<'_, Result<Coordinate, LocationError>> {
        let coord = self.0;
        Box::pin(async move { Ok(coord) })
    }
}

type Fix = Option<Result<Coordinate, LocationError>>;

/// Publishing half of a [`WatchedLocation`]; platform callbacks push fixes here.
#[derive(Debug)]
pub struct LocationFeed {
    tx: watch::Sender<Fix>,
}

impl LocationFeed {
    pub fn publish(&self, coord: Coordinate) {
        self.tx.send_replace(Some(Ok(coord)));
    }

    pub fn fail(&self, error: LocationError) {
        self.tx.send_replace(Some(Err(error)));
    }
}

/// Streaming provider: resolves with the latest fix, waiting for the first one.
#[derive(Debug, Clone)]
pub struct WatchedLocation {
    rx: watch::Receiver<Fix>,
}

impl WatchedLocation {
    pub fn channel() -> (LocationFeed, WatchedLocation) {
        let (tx, rx) = watch::channel(None);
        (LocationFeed { tx }, WatchedLocation { rx })
    }

    /// Latest fix without waiting.
    pub fn latest(&self) -> Option<Result<Coordinate, LocationError>> {
        self.rx.borrow().clone()
    }
}

impl LocationProvider for WatchedLocation {
    fn current_coordinate(&self) -> BoxFuture<'_, Result<Coordinate, LocationError>> {
        let mut rx = self.rx.clone();
        Box::pin(async move {
            let fix = rx
                .wait_for(Option::is_some)
                .await
                .map_err(|_| LocationError::Unavailable("location feed closed".to_string()))?;
            match fix.clone() {
                Some(result) => result,
                None => Err(LocationError::Unavailable("no fix".to_string())),
            }
        })
    }
}

/// Ask `provider` for a position, giving up after `timeout`.
pub async fn acquire_location(
    provider: &dyn LocationProvider,
    timeout: Duration,
) -> Result<Coordinate, LocationError> {
    match tokio::time::timeout(timeout, provider.current_coordinate()).await {
        Ok(Ok(coord)) => {
            debug!("location fix {coord}");
            Ok(coord)
        }
        Ok(Err(err)) => {
            warn!("location request failed: {err}");
            Err(err)
        }
        Err(_) => {
            warn!("location request timed out after {timeout:?}");
            Err(LocationError::Timeout(timeout))
        }
    }
}
