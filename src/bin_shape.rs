//! Bin shapes. The placer dispatches on bin kind for in-bounds and overfit
//! tests (see [`crate::placer`]).

use crate::geometry::{Bounds, GeometryProvider, Polygon};
use crate::units::Point;

#[derive(Debug, Clone)]
pub enum Bin {
    Rectangle { width: i64, height: i64 },
    Circle { center: Point, radius: i64 },
    Polygon(Polygon),
}

impl Bin {
    /// A rectangular bin anchored at the origin.
    pub fn rectangle(width: i64, height: i64) -> Self {
        Bin::Rectangle { width, height }
    }

    pub fn circle(center: Point, radius: i64) -> Self {
        Bin::Circle { center, radius }
    }

    pub fn polygon(polygon: Polygon) -> Self {
        Bin::Polygon(polygon)
    }

    /// The bin rendered as a polygon, for the geometry provider calls that
    /// need one regardless of bin kind (rectangles and circles are
    /// approximated; circles with a 64-gon).
    pub fn as_polygon(&self) -> Polygon {
        match self {
            Bin::Rectangle { width, height } => Polygon::new(vec![
                Point::new(0, 0),
                Point::new(*width, 0),
                Point::new(*width, *height),
                Point::new(0, *height),
                Point::new(0, 0),
            ]),
            Bin::Circle { center, radius } => {
                const SEGMENTS: usize = 64;
                let mut pts: Vec<Point> = (0..=SEGMENTS)
                    .map(|i| {
                        let theta = (i % SEGMENTS) as f64 * std::f64::consts::TAU / SEGMENTS as f64;
                        Point::from_f64(
                            center.x as f64 + *radius as f64 * theta.cos(),
                            center.y as f64 + *radius as f64 * theta.sin(),
                        )
                    })
                    .collect();
                if pts.first() != pts.last() {
                    pts.push(pts[0]);
                }
                Polygon::new(pts)
            }
            Bin::Polygon(p) => p.clone(),
        }
    }

    pub fn bounding_box(&self, geo: &dyn GeometryProvider) -> Bounds {
        match self {
            Bin::Rectangle { width, height } => Bounds {
                x: 0.0,
                y: 0.0,
                width: *width as f64,
                height: *height as f64,
            },
            Bin::Circle { center, radius } => Bounds {
                x: (center.x - radius) as f64,
                y: (center.y - radius) as f64,
                width: (2 * radius) as f64,
                height: (2 * radius) as f64,
            },
            Bin::Polygon(p) => geo
                .bounding_box(p)
                .expect("bin polygon must have at least 3 vertices"),
        }
    }

    pub fn area(&self, geo: &dyn GeometryProvider) -> f64 {
        match self {
            Bin::Rectangle { width, height } => (*width as f64) * (*height as f64),
            Bin::Circle { radius, .. } => std::f64::consts::PI * (*radius as f64).powi(2),
            Bin::Polygon(p) => geo.area(p).abs(),
        }
    }

    /// Strict containment: for rectangle/polygon bins, the shape must lie
    /// inside the bin polygon; for circle bins, every vertex must lie
    /// within the disk.
    pub fn contains(&self, geo: &dyn GeometryProvider, shape: &Polygon) -> bool {
        match self {
            Bin::Rectangle { .. } | Bin::Polygon(_) => geo.contains(&self.as_polygon(), shape),
            Bin::Circle { center, radius } => shape.contour.iter().all(|p| {
                let dx = (p.x - center.x) as f64;
                let dy = (p.y - center.y) as f64;
                (dx * dx + dy * dy).sqrt() <= *radius as f64
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoProvider;

    #[test]
    fn rectangle_area_matches_width_times_height() {
        let bin = Bin::rectangle(100, 50);
        let geo = GeoProvider;
        assert_eq!(bin.area(&geo), 5000.0);
    }

    #[test]
    fn circle_contains_vertices_within_radius() {
        let bin = Bin::circle(Point::new(0, 0), 10);
        let geo = GeoProvider;
        let inside = Polygon::new(vec![
            Point::new(-1, -1),
            Point::new(1, -1),
            Point::new(1, 1),
            Point::new(-1, 1),
            Point::new(-1, -1),
        ]);
        assert!(bin.contains(&geo, &inside));

        let outside = Polygon::new(vec![
            Point::new(-20, -20),
            Point::new(20, -20),
            Point::new(20, 20),
            Point::new(-20, 20),
            Point::new(-20, -20),
        ]);
        assert!(!bin.contains(&geo, &outside));
    }

    #[test]
    fn rectangle_contains_interior_shape() {
        let bin = Bin::rectangle(100, 100);
        let geo = GeoProvider;
        let inner = Polygon::new(vec![
            Point::new(10, 10),
            Point::new(20, 10),
            Point::new(20, 20),
            Point::new(10, 20),
            Point::new(10, 10),
        ]);
        assert!(bin.contains(&geo, &inner));
    }
}
