pub mod detection;
pub mod zone;

pub use detection::{BoundingBox, Detection};
pub use zone::{Polygon, Zone, ZoneError, ZoneId, ZoneMap};
