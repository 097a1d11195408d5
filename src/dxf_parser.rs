//! Parses DXF drawings into the crate's own [`Polygon`](crate::geometry::Polygon)
//! type, gated behind the `dxf` feature. Curved entities (`ARC`, `CIRCLE`,
//! `ELLIPSE`, bulged polyline segments) are approximated with 32-segment
//! polylines, matching the tessellation used for SVG `circle`/`ellipse`.

#[cfg(feature = "dxf")]
use dxf::{entities::EntityType, Drawing};
use std::path::Path;

use crate::geometry::Polygon;
#[cfg(feature = "dxf")]
use crate::line_merge::{self, RawShape};
#[cfg(feature = "dxf")]
use crate::units::{Point, SCALE};

#[cfg(feature = "dxf")]
fn to_internal(x: f64, y: f64) -> Point {
    Point::new((x * SCALE as f64).round() as i64, (y * SCALE as f64).round() as i64)
}

#[cfg(feature = "dxf")]
fn approximate_arc(cx: f64, cy: f64, r: f64, start: f64, end: f64, segments: usize) -> Vec<Point> {
    let step = (end - start) / segments as f64;
    (0..=segments)
        .map(|i| {
            let a = start + step * i as f64;
            to_internal(cx + r * a.cos(), cy + r * a.sin())
        })
        .collect()
}

#[cfg(feature = "dxf")]
fn approximate_ellipse(
    center: &dxf::Point,
    major: &dxf::Vector,
    normal: &dxf::Vector,
    ratio: f64,
    start: f64,
    end: f64,
    segments: usize,
) -> Vec<Point> {
    let major_len = (major.x * major.x + major.y * major.y + major.z * major.z).sqrt();
    if major_len == 0.0 {
        return Vec::new();
    }
    let (ux, uy, uz) = (major.x / major_len, major.y / major_len, major.z / major_len);
    let (nx, ny, nz) = (normal.x, normal.y, normal.z);
    let (mut vx, mut vy, mut vz) = (ny * uz - nz * uy, nz * ux - nx * uz, nx * uy - ny * ux);
    let v_len = (vx * vx + vy * vy + vz * vz).sqrt();
    if v_len != 0.0 {
        vx /= v_len;
        vy /= v_len;
        vz /= v_len;
    }
    let _ = vz; // only the planar (x, y) projection is needed

    let a = major_len;
    let b = a * ratio;
    let step = (end - start) / segments as f64;
    (0..=segments)
        .map(|i| {
            let t = start + step * i as f64;
            let (cos_t, sin_t) = (t.cos(), t.sin());
            let x = center.x + a * ux * cos_t + b * vx * sin_t;
            let y = center.y + a * uy * cos_t + b * vy * sin_t;
            to_internal(x, y)
        })
        .collect()
}

#[cfg(feature = "dxf")]
fn approximate_bulge(p1: Point, p2: Point, bulge: f64, segments: usize) -> Vec<Point> {
    if segments == 0 {
        return vec![p1, p2];
    }
    let dx = (p2.x - p1.x) as f64;
    let dy = (p2.y - p1.y) as f64;
    let chord = (dx * dx + dy * dy).sqrt();
    if chord == 0.0 {
        return vec![p1];
    }
    let theta = 4.0 * bulge.atan();
    let r = chord / (2.0 * (theta / 2.0).sin());
    let (mx, my) = ((p1.x + p2.x) as f64 / 2.0, (p1.y + p2.y) as f64 / 2.0);
    let d = (r * r - (chord / 2.0).powi(2)).abs().sqrt();
    let sign = bulge.signum();
    let (ux, uy) = (-dy / chord, dx / chord);
    let cx = mx + sign * ux * d;
    let cy = my + sign * uy * d;
    let mut start_ang = (p1.y as f64 - cy).atan2(p1.x as f64 - cx);
    let mut end_ang = (p2.y as f64 - cy).atan2(p2.x as f64 - cx);
    if sign > 0.0 && end_ang < start_ang {
        end_ang += std::f64::consts::TAU;
    } else if sign < 0.0 && end_ang > start_ang {
        end_ang -= std::f64::consts::TAU;
    }
    let step = (end_ang - start_ang) / segments as f64;
    (0..=segments)
        .map(|i| {
            let a = start_ang + step * i as f64;
            to_internal(cx + r * a.cos(), cy + r * a.sin())
        })
        .collect()
}

#[cfg(feature = "dxf")]
fn polyline_shape(points: Vec<Point>, bulges: Vec<f64>, closed: bool) -> RawShape {
    let mut pts = Vec::new();
    let n = points.len();
    for i in 0..n {
        let curr = points[i];
        let next_idx = if i + 1 < n {
            i + 1
        } else if closed {
            0
        } else {
            pts.push(curr);
            continue;
        };
        let next = points[next_idx];
        let bulge = bulges[i];
        if bulge.abs() > f64::EPSILON {
            let theta = 4.0 * bulge.atan();
            let segs = ((theta.abs() / std::f64::consts::TAU) * 32.0).ceil().max(1.0) as usize;
            let arc = approximate_bulge(curr, next, bulge, segs);
            if pts.last().map_or(true, |&p| p != curr) {
                pts.push(curr);
            }
            pts.extend_from_slice(&arc[1..]);
        } else {
            pts.push(curr);
        }
    }
    if !closed {
        if let Some(&last) = points.last() {
            pts.push(last);
        }
    }
    RawShape { points: pts, closed }
}

/// Parse a DXF file into polygons, in internal units. Disconnected
/// `LINE`/`ARC` entities are stitched back into closed rings via
/// [`line_merge`].
#[cfg(feature = "dxf")]
pub fn polygons_from_file(path: &Path) -> anyhow::Result<Vec<Polygon>> {
    let drawing = Drawing::load_file(path)?;
    let mut shapes = Vec::new();

    for e in drawing.entities() {
        match &e.specific {
            EntityType::Line(line) => {
                shapes.push(RawShape::open(vec![
                    to_internal(line.p1.x, line.p1.y),
                    to_internal(line.p2.x, line.p2.y),
                ]));
            }
            EntityType::LwPolyline(poly) => {
                if !poly.vertices.is_empty() {
                    let points = poly.vertices.iter().map(|v| to_internal(v.x, v.y)).collect();
                    let bulges = poly.vertices.iter().map(|v| v.bulge).collect();
                    shapes.push(polyline_shape(points, bulges, poly.is_closed()));
                }
            }
            EntityType::Polyline(poly) => {
                let verts: Vec<_> = poly.vertices().collect();
                if !verts.is_empty() {
                    let points = verts.iter().map(|v| to_internal(v.location.x, v.location.y)).collect();
                    let bulges = verts.iter().map(|v| v.bulge).collect();
                    shapes.push(polyline_shape(points, bulges, poly.is_closed()));
                }
            }
            EntityType::Circle(c) => {
                let segments = 32;
                let mut pts: Vec<Point> = (0..segments)
                    .map(|i| {
                        let theta = i as f64 * std::f64::consts::TAU / segments as f64;
                        to_internal(c.center.x + c.radius * theta.cos(), c.center.y + c.radius * theta.sin())
                    })
                    .collect();
                pts.push(pts[0]);
                shapes.push(RawShape::closed(pts));
            }
            EntityType::Arc(arc) => {
                let mut end = arc.end_angle - arc.start_angle;
                if end <= 0.0 {
                    end += 360.0;
                }
                let segs = ((end / 360.0) * 32.0).ceil().max(1.0) as usize;
                let pts = approximate_arc(
                    arc.center.x,
                    arc.center.y,
                    arc.radius,
                    arc.start_angle.to_radians(),
                    (arc.start_angle + end).to_radians(),
                    segs,
                );
                shapes.push(RawShape::open(pts));
            }
            EntityType::Ellipse(el) => {
                let mut end = el.end_parameter - el.start_parameter;
                if end <= 0.0 {
                    end += std::f64::consts::TAU;
                }
                let segs = ((end / std::f64::consts::TAU) * 32.0).ceil().max(1.0) as usize;
                let pts = approximate_ellipse(
                    &el.center,
                    &el.major_axis,
                    &el.normal,
                    el.minor_axis_ratio,
                    el.start_parameter,
                    el.start_parameter + end,
                    segs,
                );
                shapes.push(RawShape::open(pts));
            }
            _ => {}
        }
    }

    Ok(line_merge::merge_lines(shapes))
}

#[cfg(not(feature = "dxf"))]
pub fn polygons_from_file(_path: &Path) -> anyhow::Result<Vec<Polygon>> {
    Err(anyhow::anyhow!("DXF support not enabled (build with --features dxf)"))
}

#[cfg(all(test, feature = "dxf"))]
mod tests {
    use super::*;

    #[test]
    fn approximate_arc_starts_and_ends_on_the_circle() {
        let pts = approximate_arc(0.0, 0.0, 10.0, 0.0, std::f64::consts::FRAC_PI_2, 8);
        assert_eq!(pts.len(), 9);
        assert_eq!(pts[0], to_internal(10.0, 0.0));
    }
}
