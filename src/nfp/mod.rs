//! No-fit-polygon construction.
//!
//! The NFP of a stationary shape and an orbiting shape is the locus that the
//! orbiter's reference vertex traces as it slides around the stationary
//! shape while touching it without overlap. For convex inputs this has a
//! closed form (`convex_nfp`, below); concave and holed inputs fall back to
//! the convex hull of each operand, which is a conservative, always-defined
//! NFP but one that can tuck two concave shapes less tightly than the exact
//! NFP would.

use log::trace;

use crate::error::GeomErr;
use crate::geometry::{Contour, GeometryProvider, Polygon};
use crate::units::Point;

/// How exact the NFP construction between a pair of shapes should be.
/// `ConvexOnly` is the only level with a closed-form construction; the rest
/// fall back to the convex-hull approximation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NfpLevel {
    ConvexOnly,
    OneConvex,
    BothConcave,
    WithHoles,
}

/// Vertices of `contour` with the closing duplicate dropped.
fn open_ring(contour: &Contour) -> Vec<Point> {
    let mut pts = contour.clone();
    if pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    pts
}

fn edge_vectors(open: &[Point]) -> Vec<Point> {
    let n = open.len();
    (0..n).map(|i| open[(i + 1) % n] - open[i]).collect()
}

fn angle_to_x_axis(v: Point) -> f64 {
    (v.y as f64).atan2(v.x as f64)
}

/// Signed polygon area (shoelace formula) of an open ring, used only to
/// reject degenerate (collinear) inputs before they reach the edge-merge
/// construction.
fn ring_area(open: &[Point]) -> f64 {
    let n = open.len();
    let mut acc = 0i64;
    for i in 0..n {
        let (x0, y0) = (open[i].x, open[i].y);
        let (x1, y1) = (open[(i + 1) % n].x, open[(i + 1) % n].y);
        acc += x0 * y1 - x1 * y0;
    }
    acc as f64 / 2.0
}

/// Fewer than three distinct vertices or zero area: the contour can't bound
/// a region, so no NFP can be built against it.
fn is_degenerate(contour: &Contour) -> bool {
    let open = open_ring(contour);
    open.len() < 3 || ring_area(&open) == 0.0
}

fn leftmost_bottom(points: &[Point]) -> Point {
    *points
        .iter()
        .min_by_key(|p| p.y_then_x())
        .expect("non-empty contour")
}

fn rightmost_top(points: &[Point]) -> Point {
    *points
        .iter()
        .max_by_key(|p| p.y_then_x())
        .expect("non-empty contour")
}

/// Closed-form NFP of two convex, hole-free contours: the edges of the
/// stationary shape and the reverse-wound orbiter are merged by descending
/// angle to the x-axis and chained tail-to-head, the standard edge-merge
/// construction for a Minkowski-sum-based NFP of two convex polygons.
fn convex_nfp(stationary: &[Point], orbiter: &[Point]) -> Contour {
    let a = open_ring(&stationary.to_vec());
    let mut b = open_ring(&orbiter.to_vec());
    b.reverse();

    let mut edges: Vec<Point> = Vec::with_capacity(a.len() + b.len());
    edges.extend(edge_vectors(&a));
    edges.extend(edge_vectors(&b));
    edges.sort_by(|p, q| {
        angle_to_x_axis(*q)
            .partial_cmp(&angle_to_x_axis(*p))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let start = leftmost_bottom(&a) + rightmost_top(&b);
    let mut result = Vec::with_capacity(edges.len() + 1);
    let mut cursor = start;
    result.push(cursor);
    for e in &edges {
        cursor = cursor + *e;
        result.push(cursor);
    }
    if result.first() != result.last() {
        let first = result[0];
        result.push(first);
    }
    result
}

/// Slide the freshly built NFP so that the orbiter's current touch point on
/// the stationary shape is respected: the orbiter's rightmost-top vertex,
/// carried by the same delta that aligns the stationary shape's
/// rightmost-top vertex with the orbiter's leftmost-bottom vertex, must land
/// on the NFP's own rightmost-top vertex.
pub fn correct_nfp_position(nfp: &mut Contour, stationary: &Polygon, orbiter: &Polygon) {
    let touch_sh = rightmost_top(&stationary.contour);
    let touch_other = leftmost_bottom(&orbiter.contour);
    let dtouch = touch_sh - touch_other;
    let top_other = rightmost_top(&orbiter.contour) + dtouch;
    let dnfp = top_other - rightmost_top(nfp);
    for p in nfp.iter_mut() {
        *p = *p + dnfp;
    }
}

/// Compute the no-fit-polygon(s) of `orbiter` sliding around `stationary`.
/// `ConvexOnly` requires hole-free convex inputs and returns the exact NFP;
/// every other level substitutes the convex hull of each input, which is
/// always defined but may overestimate the occupied region for concave or
/// holed shapes.
pub fn compute_nfp(
    stationary: &Polygon,
    orbiter: &Polygon,
    level: NfpLevel,
    geo: &dyn GeometryProvider,
) -> Result<Vec<Polygon>, GeomErr> {
    match level {
        NfpLevel::ConvexOnly => {
            if !stationary.holes.is_empty() || !orbiter.holes.is_empty() {
                return Err(GeomErr::Nfp);
            }
            if is_degenerate(&stationary.contour) || is_degenerate(&orbiter.contour) {
                return Err(GeomErr::Nfp);
            }
            let contour = convex_nfp(&stationary.contour, &orbiter.contour);
            Ok(vec![Polygon::new(contour)])
        }
        NfpLevel::OneConvex | NfpLevel::BothConcave | NfpLevel::WithHoles => {
            if is_degenerate(&stationary.contour) || is_degenerate(&orbiter.contour) {
                return Err(GeomErr::Nfp);
            }
            trace!("nfp level {level:?}: falling back to convex-hull NFP, losing tightness");
            let stat_hull = geo.convex_hull(std::slice::from_ref(stationary));
            let orb_hull = geo.convex_hull(std::slice::from_ref(orbiter));
            let contour = convex_nfp(&stat_hull, &orb_hull);
            Ok(vec![Polygon::new(contour)])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoProvider;

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
    fn convex_nfp_of_two_squares_is_a_square_of_summed_size() {
        let a = square(0, 0, 10);
        let b = square(0, 0, 4);
        let geo = GeoProvider;
        let nfp = compute_nfp(&a, &b, NfpLevel::ConvexOnly, &geo).unwrap();
        assert_eq!(nfp.len(), 1);
        let area = geo.area(&nfp[0]).abs();
        // NFP of an AxA square and a BxB square is an (A+B)x(A+B) square.
        assert!((area - 196.0).abs() < 1e-6, "area was {area}");
    }

    #[test]
    fn convex_only_rejects_holed_input() {
        let mut a = square(0, 0, 10);
        a.holes.push(square(2, 2, 1).contour);
        let b = square(0, 0, 4);
        let geo = GeoProvider;
        let err = compute_nfp(&a, &b, NfpLevel::ConvexOnly, &geo).unwrap_err();
        assert!(matches!(err, GeomErr::Nfp));
    }

    #[test]
    fn convex_only_rejects_degenerate_stationary_contour() {
        let degenerate = Polygon::new(vec![Point::new(0, 0), Point::new(10, 0), Point::new(0, 0)]);
        let b = square(0, 0, 4);
        let geo = GeoProvider;
        let err = compute_nfp(&degenerate, &b, NfpLevel::ConvexOnly, &geo).unwrap_err();
        assert!(matches!(err, GeomErr::Nfp));
    }

    #[test]
    fn convex_only_rejects_collinear_contour() {
        let collinear = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(5, 0),
            Point::new(10, 0),
            Point::new(0, 0),
        ]);
        let b = square(0, 0, 4);
        let geo = GeoProvider;
        let err = compute_nfp(&collinear, &b, NfpLevel::ConvexOnly, &geo).unwrap_err();
        assert!(matches!(err, GeomErr::Nfp));
    }

    #[test]
    fn concave_level_falls_back_to_convex_hull_nfp() {
        let a = square(0, 0, 10);
        let b = square(0, 0, 4);
        let geo = GeoProvider;
        let nfp = compute_nfp(&a, &b, NfpLevel::BothConcave, &geo).unwrap();
        assert_eq!(nfp.len(), 1);
    }

    #[test]
    fn correct_nfp_position_aligns_touch_points() {
        let a = square(0, 0, 10);
        let b = square(0, 0, 4);
        let mut nfp = convex_nfp(&a.contour, &b.contour);
        correct_nfp_position(&mut nfp, &a, &b);
        let top_other = rightmost_top(&b.contour) + (rightmost_top(&a.contour) - leftmost_bottom(&b.contour));
        assert_eq!(rightmost_top(&nfp), top_other);
    }
}
