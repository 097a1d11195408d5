//! Default [`GeometryProvider`] backed by the `geo` and `geo-clipper` crates,
//! the same geometry stack the teacher CLI already depends on.

use geo::{Area, BoundingRect, Contains, ConvexHull, Rotate};
use geo_clipper::{Clipper, EndType, JoinType};
use geo_types::{Coord, LineString, MultiPolygon, Point as GeoPoint};

use super::{Bounds, Contour, GeometryProvider, Polygon};
use crate::error::GeomErr;
use crate::units::Point;

/// Precision factor handed to Clipper; matches the teacher's convention for
/// translating between floating-point coordinates and Clipper's internal
/// fixed-point integers.
pub const CLIPPER_SCALE: f64 = 10_000_000.0;

fn to_linestring(points: &[Point]) -> LineString<f64> {
    points
        .iter()
        .map(|p| Coord {
            x: p.x as f64,
            y: p.y as f64,
        })
        .collect()
}

fn from_linestring(ls: &LineString<f64>) -> Contour {
    ls.coords().map(|c| Point::from_f64(c.x, c.y)).collect()
}

fn to_geo_polygon(polygon: &Polygon) -> geo::Polygon<f64> {
    let exterior = to_linestring(&polygon.contour);
    let interiors = polygon.holes.iter().map(|h| to_linestring(h)).collect();
    geo::Polygon::new(exterior, interiors)
}

fn from_geo_polygon(p: &geo::Polygon<f64>) -> Polygon {
    Polygon {
        contour: from_linestring(p.exterior()),
        holes: p.interiors().iter().map(from_linestring).collect(),
    }
}

fn from_geo_multipolygon(mp: &MultiPolygon<f64>) -> Vec<Polygon> {
    mp.0.iter().map(from_geo_polygon).collect()
}

fn to_geo_multipolygon(polygons: &[Polygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(polygons.iter().map(to_geo_polygon).collect())
}

/// Whether any ring of the polygon has fewer than four vertices (a closed
/// triangle is the smallest offsettable ring).
fn has_undersized_ring(polygon: &Polygon) -> bool {
    polygon.rings().any(|r| r.len() < 4)
}

/// `geo`/`geo-clipper` backed geometry provider. Stateless; safe to share.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoProvider;

impl GeometryProvider for GeoProvider {
    fn area(&self, polygon: &Polygon) -> f64 {
        to_geo_polygon(polygon).signed_area()
    }

    fn bounding_box(&self, polygon: &Polygon) -> Option<Bounds> {
        if polygon.contour.len() < 3 {
            return None;
        }
        let rect = to_geo_polygon(polygon).bounding_rect()?;
        Some(Bounds {
            x: rect.min().x,
            y: rect.min().y,
            width: rect.width(),
            height: rect.height(),
        })
    }

    fn bounding_box_multi(&self, polygons: &[Polygon]) -> Option<Bounds> {
        polygons
            .iter()
            .filter_map(|p| self.bounding_box(p))
            .reduce(|a, b| a.union(&b))
    }

    fn convex_hull(&self, polygons: &[Polygon]) -> Contour {
        let mp = to_geo_multipolygon(polygons);
        let hull = mp.convex_hull();
        from_linestring(hull.exterior())
    }

    fn contains(&self, a: &Polygon, b: &Polygon) -> bool {
        to_geo_polygon(a).contains(&to_geo_polygon(b))
    }

    fn contains_point(&self, polygon: &Polygon, point: Point) -> bool {
        let (x, y) = point.to_f64();
        to_geo_polygon(polygon).contains(&GeoPoint::new(x, y))
    }

    fn merge(&self, polygons: &[Polygon]) -> Result<Vec<Polygon>, GeomErr> {
        if polygons.is_empty() {
            return Ok(Vec::new());
        }
        let mut acc = to_geo_multipolygon(&polygons[0..1]);
        for p in &polygons[1..] {
            let next = MultiPolygon::new(vec![to_geo_polygon(p)]);
            acc = acc.union(&next, CLIPPER_SCALE);
        }
        if acc.0.is_empty() && !polygons.is_empty() {
            return Err(GeomErr::Merge);
        }
        Ok(from_geo_multipolygon(&acc))
    }

    fn translate(&self, polygon: &mut Polygon, delta: Point) {
        for ring in std::iter::once(&mut polygon.contour).chain(polygon.holes.iter_mut()) {
            for p in ring.iter_mut() {
                *p = *p + delta;
            }
        }
    }

    fn rotate(&self, polygon: &mut Polygon, angle: f64) {
        let degrees = angle.to_degrees();
        let geo_poly = to_geo_polygon(polygon);
        let origin = GeoPoint::new(0.0, 0.0);
        let rotated = geo_poly.rotate_around_point(degrees, origin);
        *polygon = from_geo_polygon(&rotated);
    }

    fn validate(&self, polygon: &Polygon) -> (bool, String) {
        for (idx, ring) in polygon.rings().enumerate() {
            let name = if idx == 0 {
                "contour".to_string()
            } else {
                format!("hole[{}]", idx - 1)
            };
            if ring.len() < 4 {
                return (false, format!("{name} has fewer than 3 distinct vertices"));
            }
            if ring.first() != ring.last() {
                return (false, format!("{name} is not explicitly closed"));
            }
            if self_intersects(ring) {
                return (false, format!("{name} is not simple"));
            }
        }
        let contour_area = self.area(&Polygon::new(polygon.contour.clone()));
        if contour_area == 0.0 {
            return (false, "contour has zero area".to_string());
        }
        (true, String::new())
    }

    fn offset(&self, polygon: &Polygon, delta: f64) -> Result<Polygon, GeomErr> {
        if has_undersized_ring(polygon) {
            return Err(GeomErr::Offset);
        }
        let geo_poly = to_geo_polygon(polygon);
        let offset = geo_poly.offset(delta, JoinType::Miter(2.0), EndType::ClosedPolygon, CLIPPER_SCALE);
        offset
            .0
            .first()
            .map(from_geo_polygon)
            .ok_or(GeomErr::Offset)
    }
}

/// Naive O(n^2) segment-intersection test used by `validate`. Good enough
/// for the modestly sized polygons this crate deals with; not on any hot
/// path (the placer never calls `validate`).
fn self_intersects(ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 4 {
        return false;
    }
    let segs: Vec<(Point, Point)> = (0..n - 1).map(|i| (ring[i], ring[i + 1])).collect();
    for i in 0..segs.len() {
        for j in (i + 1)..segs.len() {
            if j == i + 1 || (i == 0 && j == segs.len() - 1) {
                continue; // adjacent segments share an endpoint, not a crossing
            }
            if segments_cross(segs[i], segs[j]) {
                return true;
            }
        }
    }
    false
}

fn segments_cross(a: (Point, Point), b: (Point, Point)) -> bool {
    fn orient(p: Point, q: Point, r: Point) -> i64 {
        (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
    }
    let (a1, a2) = a;
    let (b1, b2) = b;
    let o1 = orient(a1, a2, b1).signum();
    let o2 = orient(a1, a2, b2).signum();
    let o3 = orient(b1, b2, a1).signum();
    let o4 = orient(b1, b2, a2).signum();
    o1 != o2 && o3 != o4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: i64, y: i64, s: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(x, y),
            Point::new(x + s, y),
            Point::new(x + s, y + s),
            Point::new(x, y + s),
            Point::new(x, y),
        ])
    }

    #[test]
    fn area_of_unit_square() {
        let provider = GeoProvider;
        let area = provider.area(&square(0, 0, 10));
        assert!((area.abs() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn bounding_box_matches_square() {
        let provider = GeoProvider;
        let bb = provider.bounding_box(&square(0, 0, 10)).unwrap();
        assert_eq!(bb.width, 10.0);
        assert_eq!(bb.height, 10.0);
    }

    #[test]
    fn translate_shifts_every_ring() {
        let provider = GeoProvider;
        let mut poly = square(0, 0, 10);
        provider.translate(&mut poly, Point::new(5, 5));
        assert_eq!(poly.contour[0], Point::new(5, 5));
    }

    #[test]
    fn merge_overlapping_squares_reduces_count() {
        let provider = GeoProvider;
        let a = square(0, 0, 10);
        let b = square(5, 5, 10);
        let merged = provider.merge(&[a, b]).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn offset_rejects_degenerate_ring() {
        let provider = GeoProvider;
        let tiny = Polygon::new(vec![Point::new(0, 0), Point::new(1, 0), Point::new(0, 0)]);
        assert!(matches!(provider.offset(&tiny, 100.0), Err(GeomErr::Offset)));
    }

    #[test]
    fn self_intersecting_bowtie_is_invalid() {
        let bowtie = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(10, 10),
            Point::new(10, 0),
            Point::new(0, 10),
            Point::new(0, 0),
        ]);
        let provider = GeoProvider;
        let (valid, _) = provider.validate(&bowtie);
        assert!(!valid);
    }
}
