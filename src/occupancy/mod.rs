pub mod classifier;
pub mod engine;
pub mod filter;
pub mod report;

pub use classifier::{ZoneVerdict, assign, assign_zone, classify_frame};
pub use engine::{FrameOutcome, OccupancyEngine, ZoneAssignment};
pub use filter::{Candidate, DEFAULT_VEHICLE_LABEL, DetectionFilter, FilterOutcome};
pub use report::{DEFAULT_LOW_THRESHOLD, FrameReport, StatusLevel, report};
