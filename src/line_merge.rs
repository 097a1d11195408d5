//! Reassembles parsed vector-file fragments into closed polygons: an SVG or
//! DXF source frequently draws a part's outline as a handful of disconnected
//! `line`/`polyline`/arc entities rather than one closed path. Closed shapes
//! pass straight through; duplicate edges (a boundary two adjacent parts
//! both draw) are deduplicated, and the remaining open edges are chained
//! tip-to-tail back into rings.

use std::collections::HashMap;

use crate::geometry::Polygon;
use crate::units::Point;

/// A shape as parsed, before it is known whether it stands alone (`closed`)
/// or needs stitching to its neighbors.
pub struct RawShape {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl RawShape {
    pub fn closed(points: Vec<Point>) -> Self {
        Self { points, closed: true }
    }

    pub fn open(points: Vec<Point>) -> Self {
        Self { points, closed: false }
    }
}

/// Dedup edges drawn twice across the open fragments.
fn dedup_edges(shapes: &[RawShape]) -> Vec<(Point, Point)> {
    let mut edges: HashMap<((i64, i64), (i64, i64)), (Point, Point)> = HashMap::new();
    for shape in shapes {
        if shape.points.len() < 2 {
            continue;
        }
        for window in shape.points.windows(2) {
            let (a, b) = (window[0], window[1]);
            let ka = (a.x, a.y);
            let kb = (b.x, b.y);
            let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
            edges.entry(key).or_insert((a, b));
        }
    }
    edges.into_values().collect()
}

/// Chain open edges tip-to-tail into closed rings by shared endpoints.
/// Edges that never close back up are dropped: a dangling fragment cannot
/// become a nestable item.
fn chain_into_rings(mut edges: Vec<(Point, Point)>) -> Vec<Vec<Point>> {
    let mut rings = Vec::new();
    while let Some((a, b)) = edges.pop() {
        let mut ring = vec![a, b];
        loop {
            let tail = *ring.last().unwrap();
            if tail == ring[0] {
                break;
            }
            let Some(pos) = edges.iter().position(|&(p, q)| p == tail || q == tail) else {
                break;
            };
            let (p, q) = edges.remove(pos);
            ring.push(if p == tail { q } else { p });
        }
        if ring.len() >= 4 && *ring.last().unwrap() == ring[0] {
            rings.push(ring);
        }
    }
    rings
}

/// Merge a set of closed and open shapes parsed from a vector file into a
/// final list of closed, nestable polygons.
pub fn merge_lines(shapes: Vec<RawShape>) -> Vec<Polygon> {
    let mut closed = Vec::new();
    let mut open = Vec::new();
    for shape in shapes {
        if shape.closed {
            closed.push(shape.points);
        } else {
            open.push(shape);
        }
    }

    let deduped = dedup_edges(&open);
    let mut rings = chain_into_rings(deduped);
    rings.append(&mut closed);

    rings
        .into_iter()
        .filter_map(|mut pts| {
            if pts.first() != pts.last() {
                pts.push(pts[0]);
            }
            if pts.len() >= 4 { Some(Polygon::new(pts)) } else { None }
        })
        .collect()
}
