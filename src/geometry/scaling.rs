use crate::domain::BoundingBox;

/// Maps detection boxes from the detector's input resolution into the frame
/// the zone polygons were drawn on
///
/// The feed is resized without preserving aspect ratio, so x and y scale
/// independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameScaler {
    scale_x: f64,
    scale_y: f64,
}

impl FrameScaler {
    /// Create a scaler from source size to target size (both in pixels)
    ///
    /// Returns `None` if any source or target dimension is zero.
    pub fn new(source: (u32, u32), target: (u32, u32)) -> Option<Self> {
        let (sw, sh) = source;
        let (tw, th) = target;
        if sw == 0 || sh == 0 || tw == 0 || th == 0 {
            return None;
        }

        Some(Self {
            scale_x: tw as f64 / sw as f64,
            scale_y: th as f64 / sh as f64,
        })
    }

    /// Scaler that leaves coordinates untouched
    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.scale_x == 1.0 && self.scale_y == 1.0
    }

    /// Scale a single point
    pub fn scale(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale_x, y * self.scale_y)
    }

    /// Scale a bounding box corner by corner
    pub fn scale_box(&self, bbox: &BoundingBox) -> BoundingBox {
        let (x1, y1) = self.scale(bbox.x1, bbox.y1);
        let (x2, y2) = self.scale(bbox.x2, bbox.y2);
        BoundingBox { x1, y1, x2, y2 }
    }

    /// Get the (x, y) scale factors
    pub fn factors(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }
}

impl Default for FrameScaler {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_from_hd_source() {
        let scaler = FrameScaler::new((1920, 1080), (1020, 500)).unwrap();
        let (sx, sy) = scaler.factors();
        assert!((sx - 1020.0 / 1920.0).abs() < 1e-12);
        assert!((sy - 500.0 / 1080.0).abs() < 1e-12);

        let (x, y) = scaler.scale(1920.0, 1080.0);
        assert!((x - 1020.0).abs() < 1e-9);
        assert!((y - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_box() {
        let scaler = FrameScaler::new((200, 100), (100, 100)).unwrap();
        let scaled = scaler.scale_box(&BoundingBox::new(20.0, 10.0, 40.0, 30.0));
        assert_eq!(scaled, BoundingBox::new(10.0, 10.0, 20.0, 30.0));
    }

    #[test]
    fn test_zero_source_rejected() {
        assert!(FrameScaler::new((0, 500), (1020, 500)).is_none());
    }

    #[test]
    fn test_zero_target_rejected() {
        assert!(FrameScaler::new((1920, 1080), (0, 0)).is_none());
        assert!(FrameScaler::new((1920, 1080), (1020, 0)).is_none());
    }

    #[test]
    fn test_identity() {
        let scaler = FrameScaler::new((1020, 500), (1020, 500)).unwrap();
        assert!(scaler.is_identity());
        assert_eq!(scaler, FrameScaler::default());
    }
}
