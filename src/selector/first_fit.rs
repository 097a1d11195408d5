//! First-Fit selection: offer each item to already-open bins in order,
//! opening a new one only when none accept it.

use log::debug;

use crate::bin_shape::Bin;
use crate::geometry::GeometryProvider;
use crate::item::Item;
use crate::placer::{NfpPlacer, PlaceOutcome, PlacerConfig};

use super::{PackGroup, PackedBin, RunHooks, SelectorConfig, new_placer, safety_pass, sort_by_descending_area};

pub struct FirstFitSelector;

impl FirstFitSelector {
    pub fn run(
        items: Vec<Item>,
        bin_template: Bin,
        placer_config: PlacerConfig,
        selector_config: SelectorConfig,
        geo: &dyn GeometryProvider,
        mut hooks: RunHooks,
    ) -> PackGroup {
        let (mut items, rejected) = safety_pass(items, &bin_template, geo);
        sort_by_descending_area(&mut items);
        if rejected > 0 {
            debug!("first-fit: dropped {rejected} item(s) larger than the bin in the safety pass");
        }

        let mut placers: Vec<NfpPlacer> = Vec::new();
        let mut remaining = items.len();

        for idx in 0..items.len() {
            if hooks.cancelled() {
                break;
            }

            let tail: Vec<Item> = items[idx + 1..].to_vec();
            let mut placed_in_open_bin = false;

            for (bin_idx, placer) in placers.iter_mut().enumerate() {
                if hooks.cancelled() {
                    break;
                }
                if let PlaceOutcome::Placed { .. } = placer.try_pack(&items[idx], &tail) {
                    debug!("first-fit: item {} placed in bin {bin_idx}", items[idx].id());
                    placed_in_open_bin = true;
                    break;
                }
            }

            if !placed_in_open_bin {
                let mut placer = new_placer(&bin_template, &placer_config, &selector_config, geo);
                if let PlaceOutcome::Placed { .. } = placer.try_pack(&items[idx], &tail) {
                    debug!("first-fit: opened bin {} for item {}", placers.len(), items[idx].id());
                    placers.push(placer);
                    placed_in_open_bin = true;
                }
            }

            remaining -= 1;
            if placed_in_open_bin {
                hooks.report(remaining);
            }
        }

        placers
            .into_iter()
            .map(|mut p| PackedBin {
                bin: p.bin().clone(),
                items: p.clear_items(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeoProvider, Polygon};
    use crate::units::Point;

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
    fn repeated_squares_fill_multiple_bins() {
        let geo = GeoProvider;
        let bin = Bin::rectangle(50_000_000, 50_000_000);
        let config = PlacerConfig {
            rotations: vec![0.0, std::f64::consts::FRAC_PI_2],
            ..Default::default()
        };

        let items: Vec<Item> = (0..10)
            .map(|i| Item::new(i, rect(20_000_000, 20_000_000), &geo))
            .collect();

        let group = FirstFitSelector::run(
            items,
            bin,
            config,
            SelectorConfig::default(),
            &geo,
            RunHooks::none(),
        );

        let total: usize = group.iter().map(|b| b.items.len()).sum();
        assert_eq!(total, 10);
        assert!(group.len() >= 2);
    }

    #[test]
    fn oversize_item_is_dropped_and_no_bins_are_opened() {
        let geo = GeoProvider;
        let bin = Bin::rectangle(10_000_000, 10_000_000);
        let items = vec![Item::new(0, rect(100_000_000, 100_000_000), &geo)];
        let group = FirstFitSelector::run(
            items,
            bin,
            PlacerConfig::default(),
            SelectorConfig::default(),
            &geo,
            RunHooks::none(),
        );
        assert!(group.is_empty());
    }
}
