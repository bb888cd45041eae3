//! Data collaborators of the map overlay.
//!
//! - Location: where the device is (permission-gated, possibly slow)
//! - Datasets: per-category marker records, bundled or fetched
//!
//! Both seams are object-safe traits returning boxed futures so hosts can
//! swap implementations at runtime.

use std::future::Future;
use std::pin::Pin;

pub mod bundled;
pub mod dataset;
pub mod location;
pub mod spring_water;

pub use bundled::*;
pub use dataset::*;
pub use location::*;
pub use spring_water::*;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
