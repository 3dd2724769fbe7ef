use geo::{Coord, coord};

/// Axis-aligned box in frame pixels: (x1, y1) top-left, (x2, y2) bottom-right
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// A box is well formed when its corners are finite and ordered
    pub fn is_valid(&self) -> bool {
        let finite = self.x1.is_finite()
            && self.y1.is_finite()
            && self.x2.is_finite()
            && self.y2.is_finite();
        finite && self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Geometric center of the box
    ///
    /// Halves before adding so finite corners always give a finite center.
    pub fn center(&self) -> Coord<f64> {
        coord! {
            x: self.x1 / 2.0 + self.x2 / 2.0,
            y: self.y1 / 2.0 + self.y2 / 2.0,
        }
    }
}

/// One object reported by the detector for a single frame
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub label: String,
    /// Kept for logging only; classification ignores it
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            label: label.into(),
            confidence,
        }
    }
}
