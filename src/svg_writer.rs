//! Renders a [`PackGroup`] back to SVG, one `<svg>` document per bin. Not
//! part of the core contract (`spec.md` §1 lists rendering as an external
//! collaborator); exists so the CLI has something to write to disk.

use std::fmt::Write as _;

use crate::geometry::GeometryProvider;
use crate::selector::PackedBin;
use crate::units::SCALE;

/// Renders each packed bin as a standalone SVG document, item outlines
/// drawn in placed position. Coordinates are converted back from internal
/// units to millimetres.
pub fn render(bins: &[PackedBin], geo: &dyn GeometryProvider) -> Vec<String> {
    bins.iter().map(|bin| render_bin(bin, geo)).collect()
}

fn render_bin(packed: &PackedBin, geo: &dyn GeometryProvider) -> String {
    let bbox = packed.bin.bounding_box(geo);
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
        bbox.x / SCALE as f64,
        bbox.y / SCALE as f64,
        bbox.width / SCALE as f64,
        bbox.height / SCALE as f64,
    );
    let _ = writeln!(
        out,
        r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="black"/>"#,
        bbox.x / SCALE as f64,
        bbox.y / SCALE as f64,
        bbox.width / SCALE as f64,
        bbox.height / SCALE as f64,
    );
    for item in &packed.items {
        let shape = item.transformed_shape(geo);
        let points: Vec<String> = shape
            .contour
            .iter()
            .map(|p| format!("{},{}", p.x as f64 / SCALE as f64, p.y as f64 / SCALE as f64))
            .collect();
        let _ = writeln!(out, r#"  <polygon points="{}" fill="lightgrey" stroke="black"/>"#, points.join(" "));
    }
    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin_shape::Bin;
    use crate::geometry::{GeoProvider, Polygon};
    use crate::item::Item;
    use crate::units::Point;

    #[test]
    fn renders_one_svg_document_per_bin() {
        let geo = GeoProvider;
        let square = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(10_000_000, 0),
            Point::new(10_000_000, 10_000_000),
            Point::new(0, 10_000_000),
            Point::new(0, 0),
        ]);
        let bins = vec![PackedBin {
            bin: Bin::rectangle(100_000_000, 100_000_000),
            items: vec![Item::new(0, square, &geo)],
        }];
        let rendered = render(&bins, &geo);
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].contains("<svg"));
        assert!(rendered[0].contains("polygon points"));
    }
}
