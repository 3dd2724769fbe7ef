//! Frame-by-frame occupancy pipeline
//!
//! [`OccupancyEngine`] bundles the zone map with the filter, scaler and
//! threshold and turns one frame's detections into a [`FrameOutcome`]. It holds
//! no per-frame state, so the same engine can be shared across threads.

use std::borrow::Cow;
use std::thread;

use geo::Coord;
use tracing::debug;

use super::classifier::{ZoneVerdict, assign};
use super::filter::DetectionFilter;
use super::report::{DEFAULT_LOW_THRESHOLD, FrameReport, report};
use crate::domain::{Detection, ZoneId, ZoneMap};
use crate::geometry::FrameScaler;

/// A detection that claimed a zone this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneAssignment {
    /// Index into the frame's detection list
    pub detection_index: usize,
    pub zone_id: ZoneId,
    /// Box center in zone-frame coordinates
    pub point: Coord<f64>,
}

/// Everything derived from one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub report: FrameReport,
    pub verdict: ZoneVerdict,
    pub assignments: Vec<ZoneAssignment>,
    /// Relevant detections dropped for malformed boxes
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct OccupancyEngine {
    zones: ZoneMap,
    filter: DetectionFilter,
    scaler: FrameScaler,
    low_threshold: usize,
}

impl OccupancyEngine {
    /// Engine with the default car filter, no scaling and the default threshold
    pub fn new(zones: ZoneMap) -> Self {
        Self {
            zones,
            filter: DetectionFilter::default(),
            scaler: FrameScaler::identity(),
            low_threshold: DEFAULT_LOW_THRESHOLD,
        }
    }

    pub fn with_filter(mut self, filter: DetectionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_scaler(mut self, scaler: FrameScaler) -> Self {
        self.scaler = scaler;
        self
    }

    pub fn with_low_threshold(mut self, low_threshold: usize) -> Self {
        self.low_threshold = low_threshold;
        self
    }

    pub fn zones(&self) -> &ZoneMap {
        &self.zones
    }

    pub fn filter(&self) -> &DetectionFilter {
        &self.filter
    }

    pub fn low_threshold(&self) -> usize {
        self.low_threshold
    }

    /// Classify one frame
    pub fn process(&self, detections: &[Detection]) -> FrameOutcome {
        let detections: Cow<'_, [Detection]> = if self.scaler.is_identity() {
            Cow::Borrowed(detections)
        } else {
            Cow::Owned(
                detections
                    .iter()
                    .map(|d| Detection {
                        bbox: self.scaler.scale_box(&d.bbox),
                        ..d.clone()
                    })
                    .collect(),
            )
        };

        let filtered = self.filter.filter(&detections);
        let zone_ids = assign(&self.zones, &filtered.candidates);
        let verdict = ZoneVerdict::from_assignments(self.zones.len(), &zone_ids);

        let assignments: Vec<ZoneAssignment> = filtered
            .candidates
            .iter()
            .zip(&zone_ids)
            .filter_map(|(candidate, zone_id)| {
                zone_id.map(|zone_id| ZoneAssignment {
                    detection_index: candidate.index,
                    zone_id,
                    point: candidate.point,
                })
            })
            .collect();

        let report = report(&self.zones, &verdict, self.low_threshold);
        debug!(
            detections = detections.len(),
            candidates = filtered.candidates.len(),
            skipped = filtered.skipped,
            occupied = report.occupied_count,
            available = report.available_count,
            "frame classified"
        );

        FrameOutcome {
            report,
            verdict,
            assignments,
            skipped: filtered.skipped,
        }
    }

    /// Classify recorded frames on up to `workers` threads
    ///
    /// Each worker takes a contiguous chunk. Results keep input order and are
    /// identical to calling [`process`](Self::process) on each frame in turn.
    pub fn process_batch<F>(&self, frames: &[F], workers: usize) -> Vec<FrameOutcome>
    where
        F: AsRef<[Detection]> + Sync,
    {
        let workers = workers.max(1);
        if workers == 1 || frames.len() < 2 {
            return frames.iter().map(|f| self.process(f.as_ref())).collect();
        }

        let chunk_size = frames.len().div_ceil(workers);

        thread::scope(|scope| {
            let handles: Vec<_> = frames
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|f| self.process(f.as_ref()))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|h| match h.join() {
                    Ok(outcomes) => outcomes,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoundingBox;
    use crate::occupancy::StatusLevel;
    use geo::coord;

    fn unit_square_engine() -> OccupancyEngine {
        let zones = ZoneMap::from_polygons(vec![vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 10.0, y: 0.0 },
            coord! { x: 10.0, y: 10.0 },
            coord! { x: 0.0, y: 10.0 },
        ]])
        .unwrap();
        OccupancyEngine::new(zones)
    }

    fn car(x1: f64, y1: f64, x2: f64, y2: f64) -> Detection {
        Detection::new(BoundingBox::new(x1, y1, x2, y2), "car", 0.7)
    }

    #[test]
    fn test_unit_square_scenario() {
        let engine = unit_square_engine();

        let inside = engine.process(&[car(2.0, 2.0, 4.0, 4.0)]);
        assert!(inside.verdict.is_occupied(0));
        assert_eq!(inside.report.occupied_count, 1);
        assert_eq!(inside.report.available_count, 0);
        assert_eq!(inside.skipped, 0);
        assert_eq!(
            inside.assignments,
            vec![ZoneAssignment {
                detection_index: 0,
                zone_id: 0,
                point: coord! { x: 3.0, y: 3.0 },
            }]
        );

        let outside = engine.process(&[car(20.0, 20.0, 22.0, 22.0)]);
        assert!(!outside.verdict.is_occupied(0));
        assert_eq!(outside.report.available_count, 1);
        assert!(outside.assignments.is_empty());

        let malformed = engine.process(&[car(5.0, 5.0, 3.0, 3.0)]);
        assert!(!malformed.verdict.is_occupied(0));
        assert_eq!(malformed.skipped, 1);
        assert_eq!(malformed.report.available_count, 1);
    }

    #[test]
    fn test_same_input_same_report() {
        let engine = unit_square_engine();
        let detections = vec![car(2.0, 2.0, 4.0, 4.0), car(5.0, 5.0, 3.0, 3.0)];

        let first = engine.process(&detections);
        let second = engine.process(&detections);

        assert_eq!(first, second);
    }

    #[test]
    fn test_bad_frame_does_not_leak() {
        let engine = unit_square_engine();
        let _ = engine.process(&[car(5.0, 5.0, 3.0, 3.0), car(2.0, 2.0, 4.0, 4.0)]);
        let next = engine.process(&[]);

        assert_eq!(next.skipped, 0);
        assert_eq!(next.report.occupied_count, 0);
    }

    #[test]
    fn test_scaler_maps_into_zone_frame() {
        // Detector ran at double resolution; center (6, 6) maps to (3, 3)
        let engine = unit_square_engine()
            .with_scaler(FrameScaler::new((2040, 1000), (1020, 500)).unwrap());
        let outcome = engine.process(&[car(4.0, 4.0, 8.0, 8.0), car(30.0, 30.0, 34.0, 34.0)]);

        assert!(outcome.verdict.is_occupied(0));
        assert_eq!(outcome.assignments.len(), 1);
        assert_eq!(outcome.assignments[0].point, coord! { x: 3.0, y: 3.0 });
    }

    #[test]
    fn test_custom_labels_and_threshold() {
        let engine = unit_square_engine()
            .with_filter(DetectionFilter::new(["truck"]))
            .with_low_threshold(0);

        let car_only = engine.process(&[car(2.0, 2.0, 4.0, 4.0)]);
        assert_eq!(car_only.report.available_count, 1);
        assert_eq!(car_only.report.status_level, StatusLevel::Normal);

        let truck = Detection::new(BoundingBox::new(2.0, 2.0, 4.0, 4.0), "truck", 0.5);
        let with_truck = engine.process(&[truck]);
        assert_eq!(with_truck.report.available_count, 0);
        assert_eq!(with_truck.report.status_level, StatusLevel::Low);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let engine = unit_square_engine();
        let frames: Vec<Vec<Detection>> = (0..23)
            .map(|i| {
                let offset = (i % 4) as f64 * 6.0;
                vec![car(offset, offset, offset + 2.0, offset + 2.0)]
            })
            .collect();

        let sequential: Vec<FrameOutcome> = frames.iter().map(|f| engine.process(f)).collect();
        for workers in [0, 1, 2, 4, 7, 64] {
            assert_eq!(engine.process_batch(&frames, workers), sequential);
        }
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OccupancyEngine>();
        assert_send_sync::<ZoneMap>();
    }
}
