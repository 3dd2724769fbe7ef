pub mod bounds;
pub mod point_in_polygon;
pub mod scaling;

pub use bounds::Bounds;
pub use point_in_polygon::{Position, point_in_polygon};
pub use scaling::FrameScaler;
