pub mod labels;
pub mod log;

pub use labels::{LabelVocabulary, UNKNOWN_LABEL};
pub use log::{DetectionLogError, FrameDetections, parse_detection_log, read_detection_log};
