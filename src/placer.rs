//! The NFP placer: decides where (and whether) the next item fits in one
//! bin, by 1-D minimization over the pile's no-fit-polygon boundary across a
//! configured set of rotations.

use std::sync::Arc;

use log::trace;

use crate::bin_shape::Bin;
use crate::edge_cache::EdgeCache;
use crate::geometry::{Bounds, GeometryProvider, Polygon};
use crate::item::Item;
use crate::minimizer::{LocalMinimizer, PatternSearchMinimizer, StopCriteria};
use crate::nfp::{NfpLevel, compute_nfp, correct_nfp_position};
use crate::parallel::{Policy, parallel_for_each};
use crate::units::Point;

/// Final (or starting) corner/center used to align a pile within its bin.
/// `None` means "leave the pile wherever it was placed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Center,
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
    None,
}

pub type ObjectiveFn = dyn Fn(&Polygon, &dyn GeometryProvider) -> f64 + Send + Sync;
pub type BeforePackingFn = dyn Fn(&[Polygon], &[Item], &[Item]) + Send + Sync;

/// Placer configuration; the defaults mirror the reference implementation's
/// `NfpPConfig`.
#[derive(Clone)]
pub struct PlacerConfig {
    pub rotations: Vec<f64>,
    pub alignment: Alignment,
    pub starting_point: Alignment,
    pub objective_function: Option<Arc<ObjectiveFn>>,
    pub accuracy: f64,
    pub explore_holes: bool,
    pub parallel: bool,
    pub before_packing: Option<Arc<BeforePackingFn>>,
    pub nfp_level: NfpLevel,
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            rotations: vec![0.0],
            alignment: Alignment::Center,
            starting_point: Alignment::Center,
            objective_function: None,
            accuracy: 0.65,
            explore_holes: false,
            parallel: true,
            before_packing: None,
            nfp_level: NfpLevel::ConvexOnly,
        }
    }
}

/// Outcome of a single `try_pack` call.
#[derive(Debug, Clone, Copy)]
pub enum PlaceOutcome {
    Placed { translation: Point, rotation: f64 },
    Overfit { miss: f64 },
}

struct BestCandidate {
    score: f64,
    translation: Point,
    rotation: f64,
}

/// Drives placement for a single bin. Owns the committed pile; other bins
/// get their own placer instance.
pub struct NfpPlacer<'g> {
    bin: Bin,
    config: PlacerConfig,
    geo: &'g dyn GeometryProvider,
    pile: Vec<Item>,
}

impl<'g> NfpPlacer<'g> {
    pub fn new(bin: Bin, config: PlacerConfig, geo: &'g dyn GeometryProvider) -> Self {
        Self {
            bin,
            config,
            geo,
            pile: Vec::new(),
        }
    }

    pub fn bin(&self) -> &Bin {
        &self.bin
    }

    pub fn config(&self) -> &PlacerConfig {
        &self.config
    }

    pub fn pile(&self) -> &[Item] {
        &self.pile
    }

    pub fn is_empty(&self) -> bool {
        self.pile.is_empty()
    }

    /// Discard every item committed to the pile after `len` were placed.
    /// Used by selectors that provisionally pack several items (pairs,
    /// triplets) and must undo the attempt on failure.
    pub fn rollback_to(&mut self, len: usize) {
        self.pile.truncate(len);
    }

    /// Attempt to place `candidate` in this bin. `remaining` is passed
    /// through unchanged to `before_packing`, for objective functions that
    /// want look-ahead context.
    pub fn try_pack(&mut self, candidate: &Item, remaining: &[Item]) -> PlaceOutcome {
        if self.pile.is_empty() {
            return self.place_initial(candidate);
        }

        let pile_polys: Vec<Polygon> = self
            .pile
            .iter()
            .map(|it| it.transformed_shape(self.geo))
            .collect();
        let merged_pile = self.geo.merge(&pile_polys).unwrap_or_else(|_| pile_polys.clone());
        let pile_bbox = self.geo.bounding_box_multi(&merged_pile);

        if let Some(cb) = &self.config.before_packing {
            cb(&merged_pile, &self.pile, remaining);
        }

        let bin = self.bin.clone();
        let alignment = self.config.alignment;
        let accuracy = self.config.accuracy;
        let explore_holes = self.config.explore_holes;
        let policy = Policy::for_config(self.config.parallel);
        let objective_fn = self.config.objective_function.clone();

        let mut best: Option<BestCandidate> = None;
        let mut best_overfit = f64::INFINITY;

        for &rotation in &self.config.rotations {
            let mut rotated_raw = candidate.raw_shape().clone();
            self.geo.rotate(&mut rotated_raw, rotation);
            let ref_vertex = *rotated_raw
                .contour
                .iter()
                .max_by_key(|p| p.y_then_x())
                .expect("item has a non-empty contour");

            let mut nfps: Vec<Polygon> = Vec::with_capacity(self.pile.len());
            let mut nfp_failed = false;
            for pile_item in &self.pile {
                let stationary = pile_item.transformed_shape(self.geo);
                match compute_nfp(&stationary, &rotated_raw, self.config.nfp_level, self.geo) {
                    Ok(mut polys) => {
                        for p in polys.iter_mut() {
                            correct_nfp_position(&mut p.contour, &stationary, &rotated_raw);
                        }
                        nfps.extend(polys);
                    }
                    Err(_) => {
                        nfp_failed = true;
                        break;
                    }
                }
            }
            if nfp_failed {
                trace!("rotation {rotation:.4}: nfp construction failed against pile, skipping");
                continue;
            }

            let merged_nfp = match self.geo.merge(&nfps) {
                Ok(m) => m,
                Err(_) => {
                    trace!("rotation {rotation:.4}: nfp merge failed, skipping");
                    continue;
                }
            };

            for (contour_idx, nfp_poly) in merged_nfp.iter().enumerate() {
                let mut boundaries: Vec<EdgeCache> = vec![EdgeCache::new(&nfp_poly.contour)];
                if explore_holes {
                    boundaries.extend(nfp_poly.holes.iter().map(|h| EdgeCache::new(h)));
                }

                for cache in &boundaries {
                    let corners = cache.corners(accuracy);
                    let stop = StopCriteria::for_accuracy(accuracy);
                    let minimizer = PatternSearchMinimizer;
                    let geo = self.geo;
                    let rotated_raw = &rotated_raw;
                    let objective_fn = objective_fn.clone();
                    let bin_ref = &bin;

                    let results: Vec<(f64, f64)> = parallel_for_each(
                        &corners,
                        move |&t0, _| {
                            let objective_fn = objective_fn.clone();
                            let mut score = |t: f64| -> f64 {
                                let target = cache.coords(t);
                                let shape = translate_to(rotated_raw, ref_vertex, target, geo);
                                match &objective_fn {
                                    Some(f) => f(&shape, geo),
                                    None => default_objective(
                                        &shape,
                                        pile_bbox,
                                        bin_ref,
                                        geo,
                                        alignment,
                                    ),
                                }
                            };
                            let result = minimizer.minimize(&mut score, t0, (0.0, 1.0), stop);
                            (result.x, result.score)
                        },
                        policy,
                    );

                    for (t, score) in results {
                        let target = cache.coords(t);
                        let shape = translate_to(rotated_raw, ref_vertex, target, self.geo);
                        let feasible = is_feasible(&shape, &merged_pile, &bin, self.geo);
                        if feasible {
                            let translation = target - ref_vertex;
                            let improves = match &best {
                                Some(b) => score < b.score,
                                None => true,
                            };
                            if improves {
                                best = Some(BestCandidate {
                                    score,
                                    translation,
                                    rotation,
                                });
                            }
                        } else {
                            let bbox = self
                                .geo
                                .bounding_box(&shape)
                                .unwrap_or(Bounds { x: 0.0, y: 0.0, width: 0.0, height: 0.0 });
                            let miss = overfit(&bin, bbox, self.geo);
                            if miss < best_overfit {
                                best_overfit = miss;
                            }
                        }
                    }
                }

                let _ = contour_idx;
            }
        }

        match best {
            Some(b) => {
                let mut item = candidate.clone();
                item.set_pose(b.translation, b.rotation);
                self.pile.push(item);
                PlaceOutcome::Placed {
                    translation: b.translation,
                    rotation: b.rotation,
                }
            }
            None => PlaceOutcome::Overfit { miss: best_overfit },
        }
    }

    fn place_initial(&mut self, candidate: &Item) -> PlaceOutcome {
        let mut item = candidate.clone();
        let rotation = self.config.rotations.first().copied().unwrap_or(0.0);
        item.set_pose(Point::new(0, 0), rotation);

        let shape_bbox = item
            .bounding_box(self.geo);
        let bin_bbox = self.bin.bounding_box(self.geo);
        let target_min = aligned_min_corner(self.config.starting_point, shape_bbox, bin_bbox);
        let delta = target_min - Point::from_f64(shape_bbox.x, shape_bbox.y);
        item.translate(delta);

        let final_shape = item.transformed_shape(self.geo);
        let final_bbox = self
            .geo
            .bounding_box(&final_shape)
            .unwrap_or(Bounds { x: 0.0, y: 0.0, width: 0.0, height: 0.0 });
        let miss = overfit(&self.bin, final_bbox, self.geo);

        if miss <= 0.0 {
            let translation = item.translation();
            let rotation = item.rotation();
            self.pile.push(item);
            PlaceOutcome::Placed { translation, rotation }
        } else {
            trace!("initial placement misses bin by {miss:.4}");
            PlaceOutcome::Overfit { miss }
        }
    }

    /// Reset the pile, applying the configured final alignment beforehand.
    /// Returns the items that were in the pile, in placement order.
    pub fn clear_items(&mut self) -> Vec<Item> {
        if self.config.alignment != Alignment::None && !self.pile.is_empty() {
            let polys: Vec<Polygon> = self
                .pile
                .iter()
                .map(|it| it.transformed_shape(self.geo))
                .collect();
            if let Some(pile_bbox) = self.geo.bounding_box_multi(&polys) {
                let bin_bbox = self.bin.bounding_box(self.geo);
                let target_min = aligned_min_corner(self.config.alignment, pile_bbox, bin_bbox);
                let delta = target_min - Point::from_f64(pile_bbox.x, pile_bbox.y);
                for item in self.pile.iter_mut() {
                    item.translate(delta);
                }
            }
        }
        std::mem::take(&mut self.pile)
    }
}

fn translate_to(shape: &Polygon, from: Point, to: Point, geo: &dyn GeometryProvider) -> Polygon {
    let mut s = shape.clone();
    geo.translate(&mut s, to - from);
    s
}

/// The min corner (x, y) a shape's bbox should be translated to so that its
/// `alignment` corner/center coincides with the bin bbox's same corner.
fn aligned_min_corner(alignment: Alignment, shape_bbox: Bounds, bin_bbox: Bounds) -> Point {
    let (bx0, by0) = bin_bbox.min_corner();
    let (bx1, by1) = bin_bbox.max_corner();
    let (w, h) = (shape_bbox.width, shape_bbox.height);
    let (x, y) = match alignment {
        Alignment::Center => {
            let (cx, cy) = bin_bbox.center();
            (cx - w / 2.0, cy - h / 2.0)
        }
        Alignment::BottomLeft | Alignment::None => (bx0, by0),
        Alignment::BottomRight => (bx1 - w, by0),
        Alignment::TopLeft => (bx0, by1 - h),
        Alignment::TopRight => (bx1 - w, by1 - h),
    };
    Point::from_f64(x, y)
}

/// The default objective: distance of the item's bbox center from the bin's
/// bbox center, normalized by `sqrt(area(bin))`, plus an insideness penalty.
fn default_objective(
    shape: &Polygon,
    pile_bbox: Option<Bounds>,
    bin: &Bin,
    geo: &dyn GeometryProvider,
    alignment: Alignment,
) -> f64 {
    let ibb = match geo.bounding_box(shape) {
        Some(b) => b,
        None => return f64::INFINITY,
    };
    let bbb = bin.bounding_box(geo);
    let fullbb = match pile_bbox {
        Some(pbb) => pbb.union(&ibb),
        None => ibb,
    };
    let norm = bin.area(geo).sqrt().max(1e-9);

    let (icx, icy) = ibb.center();
    let (bcx, bcy) = bbb.center();
    let distance = ((icx - bcx).powi(2) + (icy - bcy).powi(2)).sqrt();

    let penalty = if alignment == Alignment::None {
        if bbb.contains(&fullbb) { 0.0 } else { norm }
    } else {
        overfit(bin, fullbb, geo).max(0.0).powi(2)
    };

    distance / norm + penalty
}

/// Whether `shape` placed alongside `pile_polys` still fits the bin, judged
/// by the convex hull of the combined pile (a cheap, conservative bound
/// checked before the exact non-overlap test, which the selector performs
/// by simply never intersecting NFP-derived positions).
fn is_feasible(shape: &Polygon, pile_polys: &[Polygon], bin: &Bin, geo: &dyn GeometryProvider) -> bool {
    let mut combined: Vec<Polygon> = pile_polys.to_vec();
    combined.push(shape.clone());
    let hull_contour = geo.convex_hull(&combined);
    let hull = Polygon::new(hull_contour);
    let hull_bbox = geo
        .bounding_box(&hull)
        .unwrap_or(Bounds { x: 0.0, y: 0.0, width: 0.0, height: 0.0 });
    overfit(bin, hull_bbox, geo) <= 0.0
}

/// A scalar "how badly does this bbox miss the bin" measure, dispatched on
/// bin kind. Negative or zero means it fits.
fn overfit(bin: &Bin, bbox: Bounds, geo: &dyn GeometryProvider) -> f64 {
    match bin {
        Bin::Rectangle { width, height } => {
            let over_w = (bbox.width - *width as f64).max(0.0);
            let over_h = (bbox.height - *height as f64).max(0.0);
            over_w + over_h
        }
        Bin::Circle { radius, .. } => {
            let diag = (bbox.width.powi(2) + bbox.height.powi(2)).sqrt();
            0.5 * diag - *radius as f64
        }
        Bin::Polygon(bin_poly) => {
            let (cx, cy) = bin.bounding_box(geo).center();
            let rect = Polygon::new(vec![
                Point::from_f64(cx - bbox.width / 2.0, cy - bbox.height / 2.0),
                Point::from_f64(cx + bbox.width / 2.0, cy - bbox.height / 2.0),
                Point::from_f64(cx + bbox.width / 2.0, cy + bbox.height / 2.0),
                Point::from_f64(cx - bbox.width / 2.0, cy + bbox.height / 2.0),
                Point::from_f64(cx - bbox.width / 2.0, cy - bbox.height / 2.0),
            ]);
            if geo.contains(bin_poly, &rect) { -1.0 } else { 1.0 }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoProvider;

    fn rect(w: i64, h: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(0, 0),
            Point::new(w, 0),
            Point::new(w, h),
            Point::new(0, h),
            Point::new(0, 0),
        ])
    }

    #[test]
    fn single_triangle_is_centered_in_an_empty_bin() {
        let geo = GeoProvider;
        let bin = Bin::rectangle(250_000_000, 210_000_000);
        let config = PlacerConfig {
            rotations: vec![0.0],
            ..Default::default()
        };
        let mut placer = NfpPlacer::new(bin, config, &geo);

        let triangle = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(0, 20_000_000),
            Point::new(10_000_000, 0),
            Point::new(0, 0),
        ]);
        let item = Item::new(0, triangle, &geo);

        match placer.try_pack(&item, &[]) {
            PlaceOutcome::Placed { translation, .. } => {
                assert!((translation.x - 120_000_000).abs() < 2_000_000);
                assert!((translation.y - 95_000_000).abs() < 2_000_000);
            }
            PlaceOutcome::Overfit { miss } => panic!("expected a fit, missed by {miss}"),
        }
    }

    #[test]
    fn oversize_item_overfits_an_empty_bin() {
        let geo = GeoProvider;
        let bin = Bin::rectangle(10_000_000, 10_000_000);
        let mut placer = NfpPlacer::new(bin, PlacerConfig::default(), &geo);
        let item = Item::new(0, rect(100_000_000, 100_000_000), &geo);
        match placer.try_pack(&item, &[]) {
            PlaceOutcome::Placed { .. } => panic!("an oversize item must not fit"),
            PlaceOutcome::Overfit { miss } => assert!(miss > 0.0),
        }
    }

    #[test]
    fn second_item_lands_disjoint_from_the_first() {
        let geo = GeoProvider;
        let bin = Bin::rectangle(250_000_000, 210_000_000);
        let config = PlacerConfig {
            rotations: vec![0.0, std::f64::consts::FRAC_PI_2],
            ..Default::default()
        };
        let mut placer = NfpPlacer::new(bin, config, &geo);

        let a = Item::new(0, rect(20_000_000, 10_000_000), &geo);
        let b = Item::new(1, rect(20_000_000, 10_000_000), &geo);

        let first = placer.try_pack(&a, &[]);
        assert!(matches!(first, PlaceOutcome::Placed { .. }));
        let second = placer.try_pack(&b, &[]);
        assert!(matches!(second, PlaceOutcome::Placed { .. }));

        let shapes: Vec<Polygon> = placer.pile().iter().map(|it| it.transformed_shape(&geo)).collect();
        let merged = geo.merge(&shapes).unwrap();
        // Two disjoint rectangles union into exactly two pieces (or one, if
        // they happen to touch and the clipper fuses the shared edge).
        assert!(merged.len() <= 2);
    }
}
