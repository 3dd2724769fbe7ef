pub mod console;
pub mod jsonl;

use anyhow::Result;
use serde::Serialize;

use crate::domain::ZoneId;
use crate::occupancy::{FrameOutcome, FrameReport};

pub use console::ConsoleSink;
pub use jsonl::JsonLinesSink;

/// Consumer of per-frame results
pub trait ReportSink {
    fn write_frame(&mut self, record: &FrameRecord) -> Result<()>;

    /// Flush anything buffered; called once after the last frame
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Serializable view of one processed frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    pub frame: u64,
    #[serde(flatten)]
    pub report: FrameReport,
    pub occupied_zones: Vec<ZoneId>,
    pub skipped: usize,
}

impl FrameRecord {
    pub fn new(frame: u64, outcome: &FrameOutcome) -> Self {
        Self {
            frame,
            report: outcome.report,
            occupied_zones: outcome.verdict.occupied_zones(),
            skipped: outcome.skipped,
        }
    }
}
