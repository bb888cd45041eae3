pub mod bounds;
pub mod coord;
pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use coord::*;
