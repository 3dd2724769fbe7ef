//! Ray-casting point-in-polygon test
//!
//! Casts a horizontal ray from the query point toward +x and counts how many
//! polygon edges it crosses. An odd count means the point is inside.
//!
//! Edges are treated as half-open in y (`(a.y > p.y) != (b.y > p.y)`), so a ray
//! passing exactly through a shared vertex is counted once, never twice.
//! Points lying on an edge or a vertex are reported as [`Position::OnBoundary`]
//! before any parity is considered.

use geo::Coord;

use crate::domain::ZoneError;

/// Where a point lies relative to a polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Inside,
    OnBoundary,
    Outside,
}

impl Position {
    /// Inside and on-boundary both count as occupying a zone
    pub fn is_covered(self) -> bool {
        matches!(self, Position::Inside | Position::OnBoundary)
    }
}

/// Classify `point` against a closed ring of vertices
///
/// The ring is closed implicitly: the last vertex connects back to the first.
///
/// # Errors
/// * `ZoneError::InvalidPolygon` if fewer than 3 vertices are given
pub fn point_in_polygon(vertices: &[Coord<f64>], point: Coord<f64>) -> Result<Position, ZoneError> {
    if vertices.len() < 3 {
        return Err(ZoneError::InvalidPolygon {
            zone_id: None,
            vertices: vertices.len(),
        });
    }

    Ok(classify_ring(vertices, point))
}

/// Ray-casting core; callers must guarantee at least 3 vertices
pub(crate) fn classify_ring(vertices: &[Coord<f64>], point: Coord<f64>) -> Position {
    let mut inside = false;
    let n = vertices.len();

    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];

        if on_segment(a, b, point) {
            return Position::OnBoundary;
        }

        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
    }

    if inside {
        Position::Inside
    } else {
        Position::Outside
    }
}

/// True if `p` lies on the closed segment `a`-`b`
fn on_segment(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross != 0.0 {
        return false;
    }

    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
