//! Planar geometry for zone containment.
//!
//! Two coordinate spaces are in play and they are separate types:
//!
//! - `PixelPoint`: origin top-left, units are pixels of the current frame.
//!   Detections arrive in this space.
//! - `NormPoint`: each axis in `[0, 1]`, independent of frame resolution.
//!   Zones are authored and stored in this space.
//!
//! Converting between them always goes through a `FrameSize`. The containment
//! test is generic over the space, but the polygon and the test point must
//! share it:
//!
//! ```compile_fail
//! use zone_guard::geometry::{contains, NormPoint, PixelPoint};
//!
//! let square = [
//!     NormPoint::new(0.0, 0.0),
//!     NormPoint::new(1.0, 0.0),
//!     NormPoint::new(1.0, 1.0),
//! ];
//! // A pixel-space foot point cannot be tested against a normalized zone.
//! let _ = contains(&square, PixelPoint::new(320.0, 240.0));
//! ```

use std::fmt;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Normalization divides by both axes, so neither may be zero.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(anyhow!(
                "frame size must be non-zero, got {}x{}",
                self.width,
                self.height
            ));
        }
        Ok(())
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Point in pixel space of a specific frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Convert into normalized space: `(x / width, y / height)`.
    pub fn normalize(self, size: FrameSize) -> NormPoint {
        NormPoint {
            x: self.x / size.width as f32,
            y: self.y / size.height as f32,
        }
    }
}

/// Point in resolution-independent normalized space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormPoint {
    pub x: f32,
    pub y: f32,
}

impl NormPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_pixel(self, size: FrameSize) -> PixelPoint {
        PixelPoint {
            x: self.x * size.width as f32,
            y: self.y * size.height as f32,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn in_unit_square(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// A point in some coordinate space. Implemented by both point types so the
/// ray caster is written once.
pub trait Planar: Copy {
    fn x(&self) -> f32;
    fn y(&self) -> f32;
}

impl Planar for PixelPoint {
    fn x(&self) -> f32 {
        self.x
    }

    fn y(&self) -> f32 {
        self.y
    }
}

impl Planar for NormPoint {
    fn x(&self) -> f32 {
        self.x
    }

    fn y(&self) -> f32 {
        self.y
    }
}

/// Precondition violations for polygon geometry.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryError {
    TooFewPoints { found: usize },
    ZeroArea,
    OutOfBounds { x: f32, y: f32 },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::TooFewPoints { found } => write!(
                f,
                "invalid geometry: polygon needs at least 3 distinct points, found {}",
                found
            ),
            GeometryError::ZeroArea => write!(f, "invalid geometry: polygon has zero area"),
            GeometryError::OutOfBounds { x, y } => write!(
                f,
                "invalid geometry: point ({}, {}) is outside normalized space",
                x, y
            ),
        }
    }
}

impl std::error::Error for GeometryError {}

/// Even-odd ray casting. The polygon is treated as closed (last point joins
/// the first), so an explicitly closed ring gives the same answer.
///
/// Points exactly on an edge may land on either side; the result is only
/// guaranteed to be consistent for identical inputs.
pub fn contains<P: Planar>(polygon: &[P], point: P) -> Result<bool, GeometryError> {
    if polygon.len() < 3 {
        return Err(GeometryError::TooFewPoints {
            found: polygon.len(),
        });
    }

    let (x, y) = (point.x(), point.y());
    let mut inside = false;
    for (i, p1) in polygon.iter().enumerate() {
        let p2 = &polygon[(i + 1) % polygon.len()];
        let (y1, y2) = (p1.y(), p2.y());
        if y1 == y2 {
            continue;
        }
        if y > y1.min(y2) && y <= y1.max(y2) {
            let x_cross = p1.x() + (y - y1) * (p2.x() - p1.x()) / (y2 - y1);
            if x <= x_cross {
                inside = !inside;
            }
        }
    }
    Ok(inside)
}

/// Number of pairwise-distinct vertices (exact comparison).
pub fn distinct_point_count<P: Planar>(points: &[P]) -> usize {
    let mut distinct: Vec<(f32, f32)> = Vec::with_capacity(points.len());
    for p in points {
        let xy = (p.x(), p.y());
        if !distinct.contains(&xy) {
            distinct.push(xy);
        }
    }
    distinct.len()
}

/// Unsigned shoelace area.
pub fn polygon_area<P: Planar>(points: &[P]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f32 = points
        .iter()
        .enumerate()
        .map(|(i, p1)| {
            let p2 = &points[(i + 1) % points.len()];
            p1.x() * p2.y() - p2.x() * p1.y()
        })
        .sum();
    twice.abs() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<NormPoint> {
        vec![
            NormPoint::new(0.0, 0.0),
            NormPoint::new(1.0, 0.0),
            NormPoint::new(1.0, 1.0),
            NormPoint::new(0.0, 1.0),
        ]
    }

    #[test]
    fn unit_square_contains_center() {
        assert_eq!(contains(&unit_square(), NormPoint::new(0.5, 0.5)), Ok(true));
    }

    #[test]
    fn unit_square_rejects_far_point() {
        assert_eq!(contains(&unit_square(), NormPoint::new(5.0, -3.0)), Ok(false));
        assert_eq!(contains(&unit_square(), NormPoint::new(-0.1, 0.5)), Ok(false));
        assert_eq!(contains(&unit_square(), NormPoint::new(1.1, 0.5)), Ok(false));
    }

    #[test]
    fn explicitly_closed_ring_matches_open_ring() {
        let mut closed = unit_square();
        closed.push(closed[0]);
        for probe in [
            NormPoint::new(0.5, 0.5),
            NormPoint::new(0.01, 0.99),
            NormPoint::new(1.5, 0.5),
            NormPoint::new(0.5, -0.2),
        ] {
            assert_eq!(contains(&closed, probe), contains(&unit_square(), probe));
        }
    }

    #[test]
    fn concave_notch_is_outside() {
        // U shape opening upwards; the notch is x in (0.4, 0.6), y < 0.6.
        let u = [
            PixelPoint::new(0.0, 0.0),
            PixelPoint::new(40.0, 0.0),
            PixelPoint::new(40.0, 60.0),
            PixelPoint::new(60.0, 60.0),
            PixelPoint::new(60.0, 0.0),
            PixelPoint::new(100.0, 0.0),
            PixelPoint::new(100.0, 100.0),
            PixelPoint::new(0.0, 100.0),
        ];
        assert_eq!(contains(&u, PixelPoint::new(50.0, 30.0)), Ok(false));
        assert_eq!(contains(&u, PixelPoint::new(20.0, 30.0)), Ok(true));
        assert_eq!(contains(&u, PixelPoint::new(50.0, 80.0)), Ok(true));
    }

    #[test]
    fn triangle_containment() {
        let tri = [
            NormPoint::new(0.1, 0.9),
            NormPoint::new(0.5, 0.1),
            NormPoint::new(0.9, 0.9),
        ];
        assert_eq!(contains(&tri, NormPoint::new(0.5, 0.6)), Ok(true));
        assert_eq!(contains(&tri, NormPoint::new(0.15, 0.2)), Ok(false));
    }

    #[test]
    fn edge_points_are_consistent() {
        let square = unit_square();
        let on_edge = NormPoint::new(1.0, 0.5);
        let first = contains(&square, on_edge);
        assert_eq!(first, contains(&square, on_edge));
    }

    #[test]
    fn too_few_points_is_an_error() {
        let line = [NormPoint::new(0.0, 0.0), NormPoint::new(1.0, 1.0)];
        assert_eq!(
            contains(&line, NormPoint::new(0.5, 0.5)),
            Err(GeometryError::TooFewPoints { found: 2 })
        );
        assert_eq!(
            contains::<NormPoint>(&[], NormPoint::new(0.5, 0.5)),
            Err(GeometryError::TooFewPoints { found: 0 })
        );
    }

    #[test]
    fn normalize_and_back() {
        let size = FrameSize::new(640, 480);
        let n = PixelPoint::new(320.0, 240.0).normalize(size);
        assert_eq!(n, NormPoint::new(0.5, 0.5));
        assert_eq!(n.to_pixel(size), PixelPoint::new(320.0, 240.0));
    }

    #[test]
    fn zero_frame_size_is_rejected() {
        assert!(FrameSize::new(0, 480).validate().is_err());
        assert!(FrameSize::new(640, 0).validate().is_err());
        assert!(FrameSize::new(640, 480).validate().is_ok());
    }

    #[test]
    fn distinct_count_ignores_closing_vertex() {
        let mut ring = unit_square();
        ring.push(ring[0]);
        assert_eq!(ring.len(), 5);
        assert_eq!(distinct_point_count(&ring), 4);
    }

    #[test]
    fn shoelace_area() {
        assert!((polygon_area(&unit_square()) - 1.0).abs() < 1e-6);
        let collinear = [
            NormPoint::new(0.0, 0.0),
            NormPoint::new(0.5, 0.5),
            NormPoint::new(1.0, 1.0),
        ];
        assert_eq!(polygon_area(&collinear), 0.0);
    }
}
