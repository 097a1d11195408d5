//! DJD (deepest-join-deepest, 1/2/3-group look-ahead) selection: pre-fill a
//! bin greedily, then widen a "waste" tolerance pass by pass until nothing
//! more fits even with slack, at which point a new bin is opened.

use std::collections::HashSet;

use log::{debug, info, trace};

use crate::bin_shape::Bin;
use crate::geometry::GeometryProvider;
use crate::item::Item;
use crate::placer::{NfpPlacer, PlaceOutcome, PlacerConfig};

use super::{PackGroup, PackedBin, RunHooks, SelectorConfig, new_placer, safety_pass, sort_by_descending_area};

/// Fraction of a bin's area greedily pre-filled before the waste loop takes
/// over (López-Camacho et al. 2013).
const INITIAL_FILL_PROPORTION: f64 = 1.0 / 3.0;

pub struct DjdSelector;

impl DjdSelector {
    pub fn run(
        items: Vec<Item>,
        bin_template: Bin,
        placer_config: PlacerConfig,
        selector_config: SelectorConfig,
        geo: &dyn GeometryProvider,
        mut hooks: RunHooks,
    ) -> PackGroup {
        let (mut pool, rejected) = safety_pass(items, &bin_template, geo);
        sort_by_descending_area(&mut pool);
        if rejected > 0 {
            debug!("djd: dropped {rejected} item(s) larger than the bin in the safety pass");
        }

        let bin_area = bin_template.area(geo);
        let mut result: PackGroup = Vec::new();

        while !pool.is_empty() {
            if hooks.cancelled() {
                break;
            }
            if let Some(max_bins) = selector_config.max_bins {
                if result.len() >= max_bins {
                    break;
                }
            }

            let mut placer = new_placer(&bin_template, &placer_config, &selector_config, geo);
            info!("djd: opening bin {}", result.len());
            let pool_len_before_bin = pool.len();
            let mut placed_area = 0.0f64;

            prefill(&mut placer, &mut pool, &mut placed_area, bin_area, &mut hooks);

            let mut waste = 0.0f64;
            let mut pair_cache: HashSet<(usize, usize)> = HashSet::new();
            let mut triplet_cache: HashSet<(usize, usize, usize)> = HashSet::new();

            while !pool.is_empty() && !hooks.cancelled() {
                let free_area = (bin_area - placed_area).max(0.0);

                let advanced = try_one_by_one(&mut placer, &mut pool, &mut placed_area, free_area, waste)
                    || try_groups_of_two(&mut placer, &mut pool, &mut placed_area, free_area, waste, &mut pair_cache)
                    || try_groups_of_three(&mut placer, &mut pool, &mut placed_area, free_area, waste, &mut triplet_cache);

                if advanced {
                    waste = 0.0;
                } else if waste < free_area {
                    waste += 0.1 * bin_area;
                    trace!("djd: stalled in bin {}, growing waste to {waste:.1}", result.len());
                } else {
                    break;
                }
            }

            result.push(PackedBin {
                bin: placer.bin().clone(),
                items: placer.clear_items(),
            });
            hooks.report(pool.len());

            if pool.len() == pool_len_before_bin {
                let dropped = pool.remove(0);
                debug!("djd: item {} does not fit even a fresh bin, dropping", dropped.id());
            }
        }

        result
    }
}

fn prefill(placer: &mut NfpPlacer, pool: &mut Vec<Item>, placed_area: &mut f64, bin_area: f64, hooks: &mut RunHooks) {
    let target = bin_area * INITIAL_FILL_PROPORTION;
    let mut i = 0;
    while i < pool.len() && *placed_area < target {
        if hooks.cancelled() {
            break;
        }
        let tail = tail_after(pool, i);
        match placer.try_pack(&pool[i], &tail) {
            PlaceOutcome::Placed { .. } => {
                *placed_area += pool[i].area();
                pool.remove(i);
            }
            PlaceOutcome::Overfit { .. } => i += 1,
        }
    }
}

fn tail_after(pool: &[Item], idx: usize) -> Vec<Item> {
    pool.iter()
        .enumerate()
        .filter(|(j, _)| *j != idx)
        .map(|(_, it)| it.clone())
        .collect()
}

fn try_one_by_one(placer: &mut NfpPlacer, pool: &mut Vec<Item>, placed_area: &mut f64, free_area: f64, waste: f64) -> bool {
    for i in 0..pool.len() {
        if free_area - pool[i].area() > waste {
            continue;
        }
        let tail = tail_after(pool, i);
        if let PlaceOutcome::Placed { .. } = placer.try_pack(&pool[i], &tail) {
            *placed_area += pool[i].area();
            pool.remove(i);
            return true;
        }
    }
    false
}

fn try_groups_of_two(
    placer: &mut NfpPlacer,
    pool: &mut Vec<Item>,
    placed_area: &mut f64,
    free_area: f64,
    waste: f64,
    cache: &mut HashSet<(usize, usize)>,
) -> bool {
    let n = pool.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let key = pair_key(pool[i].id(), pool[j].id());
            if cache.contains(&key) {
                continue;
            }
            let combined_area = pool[i].area() + pool[j].area();
            if free_area - combined_area > waste {
                continue;
            }

            let snapshot = placer.pile().len();
            let tail_i = tail_after(pool, i);
            let first_ok = matches!(placer.try_pack(&pool[i], &tail_i), PlaceOutcome::Placed { .. });
            let second_ok = first_ok
                && matches!(placer.try_pack(&pool[j], &tail_after(pool, j)), PlaceOutcome::Placed { .. });

            if first_ok && second_ok {
                *placed_area += combined_area;
                let (lo, hi) = if i < j { (i, j) } else { (j, i) };
                pool.remove(hi);
                pool.remove(lo);
                return true;
            }

            placer.rollback_to(snapshot);
            cache.insert(key);
        }
    }
    false
}

fn try_groups_of_three(
    placer: &mut NfpPlacer,
    pool: &mut Vec<Item>,
    placed_area: &mut f64,
    free_area: f64,
    waste: f64,
    cache: &mut HashSet<(usize, usize, usize)>,
) -> bool {
    let n = pool.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let key = triplet_key(pool[i].id(), pool[j].id(), pool[k].id());
                if cache.contains(&key) {
                    continue;
                }
                let combined_area = pool[i].area() + pool[j].area() + pool[k].area();
                if free_area - combined_area > waste {
                    continue;
                }

                if try_triplet_orderings(placer, pool, i, j, k) {
                    *placed_area += combined_area;
                    let mut idxs = [i, j, k];
                    idxs.sort_unstable_by(|a, b| b.cmp(a));
                    for idx in idxs {
                        pool.remove(idx);
                    }
                    return true;
                }
                cache.insert(key);
            }
        }
    }
    false
}

/// Try every permutation of the three candidate indices: the placer's NFP
/// search is order-sensitive, so rejecting a triplet on one arrival order
/// without trying the others would discard placements a different order
/// could have found.
fn try_triplet_orderings(placer: &mut NfpPlacer, pool: &[Item], i: usize, j: usize, k: usize) -> bool {
    let orderings = [[i, j, k], [i, k, j], [j, i, k], [j, k, i], [k, i, j], [k, j, i]];
    for ordering in orderings {
        let snapshot = placer.pile().len();
        let mut ok = true;
        for idx in ordering {
            let tail = tail_after(pool, idx);
            if !matches!(placer.try_pack(&pool[idx], &tail), PlaceOutcome::Placed { .. }) {
                ok = false;
                break;
            }
        }
        if ok {
            return true;
        }
        placer.rollback_to(snapshot);
    }
    false
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

fn triplet_key(a: usize, b: usize, c: usize) -> (usize, usize, usize) {
    let mut v = [a, b, c];
    v.sort_unstable();
    (v[0], v[1], v[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeoProvider, Polygon};
    use crate::units::Point;
    use crate::selector::first_fit::FirstFitSelector;

    fn rect(w: i64, h: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(0, 0),
            Point::new(w, 0),
            Point::new(w, h),
            Point::new(0, h),
            Point::new(0, 0),
        ])
    }

    fn catalog(geo: &GeoProvider) -> Vec<Item> {
        let mut items = Vec::new();
        let mut id = 0;
        for _ in 0..6 {
            items.push(Item::new(id, rect(20_000_000, 20_000_000), geo));
            id += 1;
        }
        for _ in 0..6 {
            items.push(Item::new(id, rect(40_000_000, 10_000_000), geo));
            id += 1;
        }
        items
    }

    #[test]
    fn djd_conserves_item_count() {
        let geo = GeoProvider;
        let bin = Bin::rectangle(100_000_000, 100_000_000);
        let config = PlacerConfig {
            rotations: vec![0.0, std::f64::consts::FRAC_PI_2],
            ..Default::default()
        };
        let items = catalog(&geo);
        let n = items.len();

        let group = DjdSelector::run(items, bin, config, SelectorConfig::default(), &geo, RunHooks::none());
        let total: usize = group.iter().map(|b| b.items.len()).sum();
        assert_eq!(total, n);
    }

    #[test]
    fn djd_uses_no_more_bins_than_first_fit() {
        let geo = GeoProvider;
        let bin = Bin::rectangle(100_000_000, 100_000_000);
        let config = PlacerConfig {
            rotations: vec![0.0, std::f64::consts::FRAC_PI_2],
            ..Default::default()
        };

        let djd_group = DjdSelector::run(
            catalog(&geo),
            bin.clone(),
            config.clone(),
            SelectorConfig::default(),
            &geo,
            RunHooks::none(),
        );
        let ff_group = FirstFitSelector::run(catalog(&geo), bin, config, SelectorConfig::default(), &geo, RunHooks::none());

        assert!(djd_group.len() <= ff_group.len());
    }
}
