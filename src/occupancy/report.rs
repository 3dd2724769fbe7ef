use std::fmt;

use serde::Serialize;

use super::classifier::ZoneVerdict;
use crate::domain::ZoneMap;

/// Availability at or below this count is reported as low
pub const DEFAULT_LOW_THRESHOLD: usize = 6;

/// Display-facing availability level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Low,
    Normal,
}

impl StatusLevel {
    pub fn from_available(available: usize, low_threshold: usize) -> Self {
        if available <= low_threshold {
            StatusLevel::Low
        } else {
            StatusLevel::Normal
        }
    }

    /// Color used when rendering the available count
    pub fn color(self) -> &'static str {
        match self {
            StatusLevel::Low => "red",
            StatusLevel::Normal => "green",
        }
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLevel::Low => write!(f, "low"),
            StatusLevel::Normal => write!(f, "normal"),
        }
    }
}

/// Availability summary for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameReport {
    pub total_zones: usize,
    pub occupied_count: usize,
    pub available_count: usize,
    pub status_level: StatusLevel,
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Available Parking Lots: {}", self.available_count)
    }
}

/// Aggregate a verdict into counts and a status level
///
/// Only the first `zone_map.len()` verdict entries are counted, so
/// `occupied_count + available_count == total_zones` holds even for a
/// verdict built against a different map.
pub fn report(zone_map: &ZoneMap, verdict: &ZoneVerdict, low_threshold: usize) -> FrameReport {
    let total_zones = zone_map.len();
    let occupied_count = verdict
        .iter()
        .take(total_zones)
        .filter(|&(_, occupied)| occupied)
        .count();
    let available_count = total_zones - occupied_count;

    FrameReport {
        total_zones,
        occupied_count,
        available_count,
        status_level: StatusLevel::from_available(available_count, low_threshold),
    }
}
