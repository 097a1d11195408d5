//! End-to-end coverage of the public `nest()` entry point: runs the
//! selector + placer + NFP kernel together over a small multi-item job and
//! checks the containment, non-overlap, and determinism invariants that no
//! single module's unit tests can see on their own.

use nestkit::geometry::{GeoProvider, GeometryProvider, Polygon};
use nestkit::nester::{nest, SelectionStrategy};
use nestkit::placer::PlacerConfig;
use nestkit::selector::SelectorConfig;
use nestkit::units::Point;
use nestkit::{Bin, Item};

fn rect(w: i64, h: i64) -> Polygon {
    Polygon::new(vec![
        Point::new(0, 0),
        Point::new(w, 0),
        Point::new(w, h),
        Point::new(0, h),
        Point::new(0, 0),
    ])
}

fn l_shape(s: i64) -> Polygon {
    Polygon::new(vec![
        Point::new(0, 0),
        Point::new(2 * s, 0),
        Point::new(2 * s, s),
        Point::new(s, s),
        Point::new(s, 2 * s),
        Point::new(0, 2 * s),
        Point::new(0, 0),
    ])
}

fn sample_items(geo: &GeoProvider) -> Vec<Item> {
    vec![
        Item::new(0, rect(30_000_000, 20_000_000), geo),
        Item::new(1, rect(30_000_000, 20_000_000), geo),
        Item::new(2, l_shape(15_000_000), geo),
        Item::new(3, rect(10_000_000, 10_000_000), geo),
    ]
}

fn run(strategy: SelectionStrategy) -> (nestkit::PackGroup, GeoProvider) {
    let geo = GeoProvider;
    let bin = Bin::rectangle(250_000_000, 210_000_000);
    let config = PlacerConfig {
        rotations: vec![0.0, std::f64::consts::FRAC_PI_2],
        ..Default::default()
    };
    let group = nest(
        sample_items(&geo),
        bin,
        strategy,
        config,
        SelectorConfig::default(),
        &geo,
        None,
        None,
    );
    (group, geo)
}

#[test]
fn every_packed_item_lies_inside_its_bin() {
    let (group, geo) = run(SelectionStrategy::FirstFit);
    assert!(!group.is_empty());
    for packed in &group {
        for item in &packed.items {
            assert!(item.is_inside(&geo, &packed.bin), "item {} escaped its bin", item.id());
        }
    }
}

#[test]
fn items_within_a_bin_do_not_overlap() {
    let (group, geo) = run(SelectionStrategy::Djd);
    for packed in &group {
        let shapes: Vec<Polygon> = packed.items.iter().map(|it| it.transformed_shape(&geo)).collect();
        for i in 0..shapes.len() {
            for j in (i + 1)..shapes.len() {
                let overlap = geo.area(&intersection_upper_bound(&shapes[i], &shapes[j], &geo));
                assert!(overlap.abs() < 1.0, "items {i} and {j} overlap by area {overlap}");
            }
        }
    }
}

/// A conservative stand-in for an exact boolean intersection: the merged
/// union's area is the sum of the two shapes' areas minus any overlap, so
/// `area(a) + area(b) - area(merge([a, b]))` recovers the overlap area (0
/// for disjoint or touching shapes).
fn intersection_upper_bound(a: &Polygon, b: &Polygon, geo: &dyn GeometryProvider) -> Polygon {
    let area_a = geo.area(a).abs();
    let area_b = geo.area(b).abs();
    let merged = geo.merge(&[a.clone(), b.clone()]).unwrap_or_else(|_| vec![a.clone(), b.clone()]);
    let merged_area: f64 = merged.iter().map(|p| geo.area(p).abs()).sum();
    let overlap = (area_a + area_b - merged_area).max(0.0);
    // Encode the scalar overlap as a square's area so the caller's
    // `geo.area` call on this placeholder polygon returns it directly.
    let side = overlap.sqrt();
    Polygon::new(vec![
        Point::new(0, 0),
        Point::new(side as i64, 0),
        Point::new(side as i64, side as i64),
        Point::new(0, side as i64),
        Point::new(0, 0),
    ])
}

#[test]
fn conserves_item_count_across_bins() {
    let (group, _geo) = run(SelectionStrategy::FirstFit);
    let total: usize = group.iter().map(|b| b.items.len()).sum();
    assert_eq!(total, 4);
}

#[test]
fn repeated_runs_on_the_same_input_are_deterministic() {
    let (first, geo) = run(SelectionStrategy::Djd);
    let (second, _) = run(SelectionStrategy::Djd);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.items.len(), b.items.len());
        for (ia, ib) in a.items.iter().zip(b.items.iter()) {
            assert_eq!(ia.id(), ib.id());
            assert_eq!(ia.transformed_shape(&geo), ib.transformed_shape(&geo));
        }
    }
}
