//! The geometry kernel adapter: a thin, pure facade over a pluggable
//! [`GeometryProvider`]. The rest of the crate (item, NFP kernel, placer,
//! selectors) is generic over this trait and never talks to `geo` or
//! `geo-clipper` directly, per the "template-backend indirection → trait"
//! guidance this crate is built against.

mod geo_provider;

pub use geo_provider::GeoProvider;

use crate::error::GeomErr;
use crate::units::Point;

/// An ordered cyclic sequence of points. By convention the outer contour of
/// a [`Polygon`] is clockwise and hole contours are counter-clockwise; both
/// are explicitly closed (first point repeated as the last).
pub type Contour = Vec<Point>;

/// A simple polygon plus zero or more holes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Polygon {
    pub contour: Contour,
    pub holes: Vec<Contour>,
}

impl Polygon {
    pub fn new(contour: Contour) -> Self {
        Self {
            contour,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(contour: Contour, holes: Vec<Contour>) -> Self {
        Self { contour, holes }
    }

    /// All rings, contour first.
    pub fn rings(&self) -> impl Iterator<Item = &Contour> {
        std::iter::once(&self.contour).chain(self.holes.iter())
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn min_corner(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn max_corner(&self) -> (f64, f64) {
        (self.x + self.width, self.y + self.height)
    }

    /// Union of two bounding boxes.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let (ax0, ay0) = self.min_corner();
        let (ax1, ay1) = self.max_corner();
        let (bx0, by0) = other.min_corner();
        let (bx1, by1) = other.max_corner();
        let x0 = ax0.min(bx0);
        let y0 = ay0.min(by0);
        let x1 = ax1.max(bx1);
        let y1 = ay1.max(by1);
        Bounds {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    pub fn contains(&self, other: &Bounds) -> bool {
        let (ox0, oy0) = other.min_corner();
        let (ox1, oy1) = other.max_corner();
        let (x0, y0) = self.min_corner();
        let (x1, y1) = self.max_corner();
        ox0 >= x0 && oy0 >= y0 && ox1 <= x1 && oy1 <= y1
    }
}

/// Capability set required from a geometry backend. All operations are pure
/// functions of their (immutable) inputs save `translate`/`rotate`, which
/// mutate the polygon passed to them in place.
pub trait GeometryProvider: Sync {
    /// Signed area (contour area minus hole area).
    fn area(&self, polygon: &Polygon) -> f64;

    /// Bounding box of a single polygon. `None` if the contour has fewer
    /// than three vertices.
    fn bounding_box(&self, polygon: &Polygon) -> Option<Bounds>;

    /// Bounding box of a pile of polygons.
    fn bounding_box_multi(&self, polygons: &[Polygon]) -> Option<Bounds>;

    /// Convex hull of a pile of polygons, as a single closed contour.
    fn convex_hull(&self, polygons: &[Polygon]) -> Contour;

    /// Strict containment of `b` inside `a`, honoring `a`'s holes.
    fn contains(&self, a: &Polygon, b: &Polygon) -> bool;

    /// Whether a single point lies inside a polygon (honoring holes).
    fn contains_point(&self, polygon: &Polygon, point: Point) -> bool;

    /// Polygon union; deterministic ordering of the resulting pieces.
    fn merge(&self, polygons: &[Polygon]) -> Result<Vec<Polygon>, GeomErr>;

    /// Translate a polygon in place.
    fn translate(&self, polygon: &mut Polygon, delta: Point);

    /// Rotate a polygon in place around the origin, angle in radians.
    fn rotate(&self, polygon: &mut Polygon, angle: f64);

    /// Simplicity, orientation and closure check.
    fn validate(&self, polygon: &Polygon) -> (bool, String);

    /// Offset every ring of a polygon outward (positive) or inward
    /// (negative) by `delta` internal units.
    fn offset(&self, polygon: &Polygon, delta: f64) -> Result<Polygon, GeomErr>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_union_covers_both() {
        let a = Bounds {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        let b = Bounds {
            x: 5.0,
            y: 5.0,
            width: 10.0,
            height: 10.0,
        };
        let u = a.union(&b);
        assert_eq!(u.x, 0.0);
        assert_eq!(u.y, 0.0);
        assert_eq!(u.width, 15.0);
        assert_eq!(u.height, 15.0);
    }

    #[test]
    fn bounds_contains_checks_all_corners() {
        let outer = Bounds {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        let inner = Bounds {
            x: 2.0,
            y: 2.0,
            width: 4.0,
            height: 4.0,
        };
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }
}
