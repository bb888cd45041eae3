pub mod category;
pub mod layer;
pub mod overlay;
pub mod record;
pub mod symbology;
pub mod viewport;

pub use category::*;
pub use layer::*;
pub use overlay::*;
pub use record::*;
pub use viewport::*;
