//! Selects the detections that can occupy a parking zone
//!
//! A detection is kept when its label is allowed and its box is well formed.
//! Each kept detection is reduced to the center of its box.

use std::collections::BTreeSet;

use geo::Coord;
use tracing::debug;

use crate::domain::Detection;

/// Label the detector uses for passenger cars
pub const DEFAULT_VEHICLE_LABEL: &str = "car";

/// A relevant detection and the point that stands in for it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    /// Position of the detection in the frame's detection list
    pub index: usize,
    pub detection: &'a Detection,
    pub point: Coord<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome<'a> {
    pub candidates: Vec<Candidate<'a>>,
    /// Relevant detections dropped because their box was malformed
    pub skipped: usize,
}

/// Label-based detection filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionFilter {
    allowed: BTreeSet<String>,
}

impl DetectionFilter {
    /// Create a filter accepting exactly the given labels
    ///
    /// Labels are trimmed; empty labels are ignored.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = labels
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn allows(&self, label: &str) -> bool {
        self.allowed.contains(label.trim())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    /// Keep relevant, well-formed detections and compute their center points
    pub fn filter<'a>(&self, detections: &'a [Detection]) -> FilterOutcome<'a> {
        let mut outcome = FilterOutcome::default();

        for (index, detection) in detections.iter().enumerate() {
            if !self.allows(&detection.label) {
                continue;
            }

            if !detection.bbox.is_valid() {
                debug!(
                    index,
                    label = %detection.label,
                    confidence = detection.confidence,
                    bbox = ?detection.bbox,
                    "skipping malformed detection"
                );
                outcome.skipped += 1;
                continue;
            }

            outcome.candidates.push(Candidate {
                index,
                detection,
                point: detection.bbox.center(),
            });
        }

        outcome
    }
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self::new([DEFAULT_VEHICLE_LABEL])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoundingBox;
    use geo::coord;

    fn det(x1: f64, y1: f64, x2: f64, y2: f64, label: &str) -> Detection {
        Detection::new(BoundingBox::new(x1, y1, x2, y2), label, 0.9)
    }

    #[test]
    fn test_default_keeps_cars_only() {
        let detections = vec![
            det(2.0, 2.0, 4.0, 4.0, "car"),
            det(2.0, 2.0, 4.0, 4.0, "person"),
            det(10.0, 10.0, 20.0, 30.0, "car"),
        ];

        let outcome = DetectionFilter::default().filter(&detections);

        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.candidates[0].index, 0);
        assert_eq!(outcome.candidates[0].point, coord! { x: 3.0, y: 3.0 });
        assert_eq!(outcome.candidates[1].index, 2);
        assert_eq!(outcome.candidates[1].point, coord! { x: 15.0, y: 20.0 });
    }

    #[test]
    fn test_malformed_box_is_counted() {
        let detections = vec![det(5.0, 5.0, 3.0, 3.0, "car")];

        let outcome = DetectionFilter::default().filter(&detections);

        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_malformed_irrelevant_box_is_ignored() {
        let detections = vec![det(5.0, 5.0, 3.0, 3.0, "bicycle")];

        let outcome = DetectionFilter::default().filter(&detections);

        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_label_match_is_exact() {
        let filter = DetectionFilter::new(["car", " truck "]);
        assert!(filter.allows("car"));
        assert!(filter.allows("truck"));
        assert!(!filter.allows("sports car"));
        assert!(!filter.allows("Car"));
        assert_eq!(filter.labels().collect::<Vec<_>>(), vec!["car", "truck"]);
    }

    #[test]
    fn test_empty_label_set_keeps_nothing() {
        let filter = DetectionFilter::new(Vec::<String>::new());
        let detections = vec![det(2.0, 2.0, 4.0, 4.0, "car")];
        assert!(filter.filter(&detections).candidates.is_empty());
    }
}
