//! Parses SVG documents into the crate's own [`Polygon`](crate::geometry::Polygon)
//! type, in internal (millimeter-scaled) units. Only closed shapes become
//! nestable items; open paths, polylines and bare `<line>` elements are
//! skipped, since the core has no notion of a non-polygonal item.

use roxmltree::{Document, Node};
use std::fs;
use std::path::Path;

use crate::geometry::Polygon;
use crate::line_merge::{self, RawShape};
use crate::units::{Point, SCALE};

/// Simple 2D affine transformation matrix `[a, b, c, d, e, f]`.
#[derive(Clone, Copy, Debug)]
struct Transform([f64; 6]);

impl Transform {
    fn identity() -> Self {
        Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0])
    }

    fn multiply(&self, other: &Self) -> Self {
        let m1 = self.0;
        let m2 = other.0;
        Self([
            m1[0] * m2[0] + m1[2] * m2[1],
            m1[1] * m2[0] + m1[3] * m2[1],
            m1[0] * m2[2] + m1[2] * m2[3],
            m1[1] * m2[2] + m1[3] * m2[3],
            m1[0] * m2[4] + m1[2] * m2[5] + m1[4],
            m1[1] * m2[4] + m1[3] * m2[5] + m1[5],
        ])
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let m = self.0;
        (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
    }
}

fn parse_transform(value: &str) -> Transform {
    use std::str::FromStr;
    let mut result = Transform::identity();
    for token in value.split(|c| c == ')' || c == ',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("translate(") {
            let mut nums = rest.split_whitespace();
            let tx = nums.next().and_then(|v| f64::from_str(v).ok()).unwrap_or(0.0);
            let ty = nums.next().and_then(|v| f64::from_str(v).ok()).unwrap_or(0.0);
            result = result.multiply(&Transform([1.0, 0.0, 0.0, 1.0, tx, ty]));
        } else if let Some(rest) = trimmed.strip_prefix("scale(") {
            let mut nums = rest.split_whitespace();
            let sx = nums.next().and_then(|v| f64::from_str(v).ok()).unwrap_or(1.0);
            let sy = nums.next().and_then(|v| f64::from_str(v).ok()).unwrap_or(sx);
            result = result.multiply(&Transform([sx, 0.0, 0.0, sy, 0.0, 0.0]));
        } else if let Some(rest) = trimmed.strip_prefix("rotate(") {
            let nums: Vec<_> = rest.split_whitespace().collect();
            if let Ok(angle) = f64::from_str(nums.first().unwrap_or(&"0")) {
                let (sx, sy) = if nums.len() == 3 {
                    (
                        nums.get(1).and_then(|v| f64::from_str(v).ok()).unwrap_or(0.0),
                        nums.get(2).and_then(|v| f64::from_str(v).ok()).unwrap_or(0.0),
                    )
                } else {
                    (0.0, 0.0)
                };
                let rad = angle.to_radians();
                let (cos, sin) = (rad.cos(), rad.sin());
                let rotation = Transform([cos, sin, -sin, cos, 0.0, 0.0]);
                let pre = Transform([1.0, 0.0, 0.0, 1.0, sx, sy]);
                let post = Transform([1.0, 0.0, 0.0, 1.0, -sx, -sy]);
                result = result.multiply(&pre).multiply(&rotation).multiply(&post);
            }
        } else if let Some(rest) = trimmed.strip_prefix("matrix(") {
            let nums: Vec<_> = rest.split_whitespace().collect();
            if nums.len() >= 6 {
                if let (Ok(a), Ok(b), Ok(c), Ok(d), Ok(e), Ok(f)) = (
                    f64::from_str(nums[0]),
                    f64::from_str(nums[1]),
                    f64::from_str(nums[2]),
                    f64::from_str(nums[3]),
                    f64::from_str(nums[4]),
                    f64::from_str(nums[5]),
                ) {
                    result = result.multiply(&Transform([a, b, c, d, e, f]));
                }
            }
        }
    }
    result
}

fn to_internal(x: f64, y: f64) -> Point {
    Point::new((x * SCALE as f64).round() as i64, (y * SCALE as f64).round() as i64)
}

/// Parse an SVG file into polygons, in internal units.
pub fn polygons_from_file(path: &Path) -> anyhow::Result<Vec<Polygon>> {
    let data = fs::read_to_string(path)?;
    polygons_from_str(&data)
}

/// Parse an SVG document into polygons, in internal units. Closed elements
/// (`rect`/`circle`/`ellipse`/`polygon`, closed `path` subpaths) become
/// items directly; open elements (`polyline`, `line`, open `path`
/// subpaths) are handed to [`line_merge`] in case they stitch into a ring.
pub fn polygons_from_str(data: &str) -> anyhow::Result<Vec<Polygon>> {
    let doc = Document::parse(data)?;
    let root = doc.root_element();
    let mut shapes = Vec::new();
    extract_node_shapes(root, Transform::identity(), &mut shapes);
    Ok(line_merge::merge_lines(shapes))
}

fn extract_node_shapes(node: Node, transform: Transform, output: &mut Vec<RawShape>) {
    let node_transform = node.attribute("transform").map(parse_transform).unwrap_or(Transform::identity());
    let transform = transform.multiply(&node_transform);

    match node.tag_name().name() {
        "path" => {
            if let Some(d) = node.attribute("d") {
                for (closed, pts) in svg_path_parser::parse(d) {
                    let mapped = pts
                        .into_iter()
                        .map(|(x, y)| {
                            let (x, y) = transform.apply(x, y);
                            to_internal(x, y)
                        })
                        .collect();
                    output.push(RawShape { points: mapped, closed });
                }
            }
        }
        "polygon" => {
            if let Some(points_str) = node.attribute("points") {
                output.push(RawShape::closed(parse_point_pairs(points_str, transform)));
            }
        }
        "polyline" => {
            if let Some(points_str) = node.attribute("points") {
                output.push(RawShape::open(parse_point_pairs(points_str, transform)));
            }
        }
        "line" => {
            let x1 = attr_f64(node, "x1", 0.0);
            let y1 = attr_f64(node, "y1", 0.0);
            let x2 = attr_f64(node, "x2", 0.0);
            let y2 = attr_f64(node, "y2", 0.0);
            let pts = [(x1, y1), (x2, y2)]
                .iter()
                .map(|&(px, py)| {
                    let (px, py) = transform.apply(px, py);
                    to_internal(px, py)
                })
                .collect();
            output.push(RawShape::open(pts));
        }
        "rect" => {
            let x = attr_f64(node, "x", 0.0);
            let y = attr_f64(node, "y", 0.0);
            let w = attr_f64(node, "width", 0.0);
            let h = attr_f64(node, "height", 0.0);
            let ring = [(x, y), (x + w, y), (x + w, y + h), (x, y + h), (x, y)]
                .iter()
                .map(|&(px, py)| {
                    let (px, py) = transform.apply(px, py);
                    to_internal(px, py)
                })
                .collect();
            output.push(RawShape::closed(ring));
        }
        "circle" => {
            let cx = attr_f64(node, "cx", 0.0);
            let cy = attr_f64(node, "cy", 0.0);
            let r = attr_f64(node, "r", 0.0);
            output.push(RawShape::closed(ellipse_ring(cx, cy, r, r, transform)));
        }
        "ellipse" => {
            let cx = attr_f64(node, "cx", 0.0);
            let cy = attr_f64(node, "cy", 0.0);
            let rx = attr_f64(node, "rx", 0.0);
            let ry = attr_f64(node, "ry", 0.0);
            output.push(RawShape::closed(ellipse_ring(cx, cy, rx, ry, transform)));
        }
        _ => {}
    }

    for child in node.children().filter(|n| n.is_element()) {
        extract_node_shapes(child, transform, output);
    }
}

fn attr_f64(node: Node, name: &str, default: f64) -> f64 {
    node.attribute(name).and_then(|v| v.parse::<f64>().ok()).unwrap_or(default)
}

fn parse_point_pairs(points_str: &str, transform: Transform) -> Vec<Point> {
    let mut pts = Vec::new();
    for pair in points_str.split_whitespace() {
        let mut nums = pair.split(',');
        if let (Some(x), Some(y)) = (nums.next(), nums.next()) {
            if let (Ok(x), Ok(y)) = (x.parse::<f64>(), y.parse::<f64>()) {
                let (x, y) = transform.apply(x, y);
                pts.push(to_internal(x, y));
            }
        }
    }
    pts
}

fn ellipse_ring(cx: f64, cy: f64, rx: f64, ry: f64, transform: Transform) -> Vec<Point> {
    const SEGMENTS: usize = 32;
    let mut pts: Vec<Point> = (0..SEGMENTS)
        .map(|i| {
            let theta = i as f64 * std::f64::consts::TAU / SEGMENTS as f64;
            let (x, y) = (cx + rx * theta.cos(), cy + ry * theta.sin());
            let (x, y) = transform.apply(x, y);
            to_internal(x, y)
        })
        .collect();
    pts.push(pts[0]);
    pts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_rect() {
        let svg = r#"<svg><rect x="0" y="0" width="10" height="10"/></svg>"#;
        let polys = polygons_from_str(svg).unwrap();
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].contour.len(), 5);
        assert_eq!(polys[0].contour[0], polys[0].contour[4]);
    }

    #[test]
    fn parse_applies_translate() {
        let svg = r#"<svg><g transform="translate(5,5)"><rect x="0" y="0" width="1" height="1"/></g></svg>"#;
        let polys = polygons_from_str(svg).unwrap();
        assert_eq!(polys[0].contour[0], to_internal(5.0, 5.0));
    }

    #[test]
    fn open_polyline_is_skipped() {
        let svg = r#"<svg><polyline points="0,0 1,1 2,0"/></svg>"#;
        let polys = polygons_from_str(svg).unwrap();
        assert!(polys.is_empty());
    }
}
