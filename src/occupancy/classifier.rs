//! Per-frame zone assignment
//!
//! Every candidate point is tested against zones in id order and claims the
//! first zone that covers it. Overlapping zones therefore resolve to the
//! lowest id, and a single vehicle never marks two zones.

use geo::Coord;

use super::filter::Candidate;
use crate::domain::{ZoneId, ZoneMap};

/// Occupied/free flag for every zone of one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneVerdict {
    occupied: Vec<bool>,
}

impl ZoneVerdict {
    /// All zones free
    pub fn free(zone_count: usize) -> Self {
        Self {
            occupied: vec![false; zone_count],
        }
    }

    /// Build a verdict from per-candidate assignments
    ///
    /// Assignments pointing past `zone_count` are ignored.
    pub fn from_assignments(zone_count: usize, assignments: &[Option<ZoneId>]) -> Self {
        let mut verdict = Self::free(zone_count);
        for zone_id in assignments.iter().flatten() {
            verdict.mark(*zone_id);
        }
        verdict
    }

    fn mark(&mut self, zone_id: ZoneId) {
        if let Some(slot) = self.occupied.get_mut(zone_id) {
            *slot = true;
        }
    }

    pub fn is_occupied(&self, zone_id: ZoneId) -> bool {
        self.occupied.get(zone_id).copied().unwrap_or(false)
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|&&o| o).count()
    }

    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    /// Ids of occupied zones in ascending order
    pub fn occupied_zones(&self) -> Vec<ZoneId> {
        self.iter()
            .filter_map(|(id, occupied)| occupied.then_some(id))
            .collect()
    }

    /// (zone_id, occupied) pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, bool)> + '_ {
        self.occupied.iter().copied().enumerate()
    }
}

/// First zone, in id order, that contains or touches `point`
pub fn assign_zone(zone_map: &ZoneMap, point: Coord<f64>) -> Option<ZoneId> {
    zone_map
        .iter()
        .find(|zone| zone.polygon.classify(point).is_covered())
        .map(|zone| zone.id)
}

/// Zone assigned to each candidate, in candidate order
pub fn assign(zone_map: &ZoneMap, candidates: &[Candidate<'_>]) -> Vec<Option<ZoneId>> {
    candidates
        .iter()
        .map(|c| assign_zone(zone_map, c.point))
        .collect()
}

/// Decide which zones are occupied in one frame
pub fn classify_frame(zone_map: &ZoneMap, candidates: &[Candidate<'_>]) -> ZoneVerdict {
    ZoneVerdict::from_assignments(zone_map.len(), &assign(zone_map, candidates))
}
