//! Parking zones and the immutable zone map
//!
//! A [`ZoneMap`] is built once from configuration and only read afterwards.
//! Construction validates every polygon so that classification never has to
//! deal with degenerate input.

use geo::{Coord, LineString};
use thiserror::Error;
use tracing::{info, warn};

use crate::geometry::point_in_polygon::classify_ring;
use crate::geometry::{Bounds, Position};

/// Stable zone index, 0..N-1 in configuration order
pub type ZoneId = usize;

#[derive(Debug, Error, PartialEq)]
pub enum ZoneError {
    #[error("{} has {vertices} vertices, at least 3 are required", describe_zone(.zone_id))]
    InvalidPolygon {
        zone_id: Option<ZoneId>,
        vertices: usize,
    },
    #[error("{} has a non-finite vertex", describe_zone(.zone_id))]
    NonFiniteVertex { zone_id: Option<ZoneId> },
}

fn describe_zone(zone_id: &Option<ZoneId>) -> String {
    match zone_id {
        Some(id) => format!("zone {}", id),
        None => "polygon".to_string(),
    }
}

/// Closed polygon in frame pixels, validated to have at least 3 vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Coord<f64>>,
    bounds: Bounds,
}

impl Polygon {
    pub fn new(vertices: Vec<Coord<f64>>) -> Result<Self, ZoneError> {
        if vertices.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return Err(ZoneError::NonFiniteVertex { zone_id: None });
        }

        let bounds = match Bounds::from_points(&vertices) {
            Some(bounds) if vertices.len() >= 3 => bounds,
            _ => {
                return Err(ZoneError::InvalidPolygon {
                    zone_id: None,
                    vertices: vertices.len(),
                });
            }
        };

        Ok(Self { vertices, bounds })
    }

    /// Locate a point relative to this polygon
    pub fn classify(&self, point: Coord<f64>) -> Position {
        if !self.bounds.contains(point) {
            return Position::Outside;
        }
        classify_ring(&self.vertices, point)
    }

    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.vertices
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Convert to a `geo` polygon, e.g. for drawing overlays
    pub fn to_geo(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(LineString::from(self.vertices.clone()), vec![])
    }
}

/// A single named parking space
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub polygon: Polygon,
}

/// Ordered, immutable set of parking zones
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneMap {
    zones: Vec<Zone>,
}

impl ZoneMap {
    /// Build a zone map from (name, vertices) pairs
    ///
    /// Zone ids follow input order. Any invalid zone rejects the whole map.
    pub fn new<I>(zones: I) -> Result<Self, ZoneError>
    where
        I: IntoIterator<Item = (String, Vec<Coord<f64>>)>,
    {
        let mut built = Vec::new();

        for (id, (name, vertices)) in zones.into_iter().enumerate() {
            let polygon = Polygon::new(vertices).map_err(|e| match e {
                ZoneError::InvalidPolygon { vertices, .. } => ZoneError::InvalidPolygon {
                    zone_id: Some(id),
                    vertices,
                },
                ZoneError::NonFiniteVertex { .. } => {
                    ZoneError::NonFiniteVertex { zone_id: Some(id) }
                }
            })?;

            built.push(Zone { id, name, polygon });
        }

        if built.is_empty() {
            warn!("zone map is empty, every frame will report 0 available");
        } else {
            info!(zones = built.len(), "zone map ready");
        }

        Ok(Self { zones: built })
    }

    /// Build a zone map from bare vertex lists, naming zones "Zone 1", "Zone 2", ...
    pub fn from_polygons<I>(polygons: I) -> Result<Self, ZoneError>
    where
        I: IntoIterator<Item = Vec<Coord<f64>>>,
    {
        Self::new(
            polygons
                .into_iter()
                .enumerate()
                .map(|(i, vertices)| (default_zone_name(i), vertices)),
        )
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(id)
    }

    /// Zones in id order
    pub fn iter(&self) -> std::slice::Iter<'_, Zone> {
        self.zones.iter()
    }
}

impl<'a> IntoIterator for &'a ZoneMap {
    type Item = &'a Zone;
    type IntoIter = std::slice::Iter<'a, Zone>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter()
    }
}

pub fn default_zone_name(index: usize) -> String {
    format!("Zone {}", index + 1)
}
