//! The top-level entry point: wires a selector, a placer configuration, and
//! a bin together over a set of items.

use crate::bin_shape::Bin;
use crate::geometry::GeometryProvider;
use crate::item::Item;
use crate::placer::PlacerConfig;
use crate::selector::{DjdSelector, FirstFitSelector, PackGroup, RunHooks, SelectorConfig};

/// Which packing-order heuristic drives the placer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    FirstFit,
    Djd,
}

/// `nest(items, bin, placer_config, selector_config, progress?, stop?) ->
/// PackGroup`, the core API surface named directly.
pub fn nest(
    items: Vec<Item>,
    bin: Bin,
    strategy: SelectionStrategy,
    placer_config: PlacerConfig,
    selector_config: SelectorConfig,
    geo: &dyn GeometryProvider,
    progress: Option<&mut dyn FnMut(usize)>,
    stop: Option<&dyn Fn() -> bool>,
) -> PackGroup {
    let hooks = RunHooks { progress, stop };
    match strategy {
        SelectionStrategy::FirstFit => {
            FirstFitSelector::run(items, bin, placer_config, selector_config, geo, hooks)
        }
        SelectionStrategy::Djd => DjdSelector::run(items, bin, placer_config, selector_config, geo, hooks),
    }
}

/// Applies the distance margin (a nonnegative offset) to every item's raw
/// polygon before placement, via the geometry adapter's offset operation.
/// Returns an error for the first item whose rings are too small to offset.
pub fn apply_distance_margin(
    items: &mut [Item],
    margin: f64,
    geo: &dyn GeometryProvider,
) -> Result<(), crate::error::GeomErr> {
    if margin <= 0.0 {
        return Ok(());
    }
    for item in items.iter_mut() {
        let offset = geo.offset(item.raw_shape(), margin)?;
        item.set_raw_shape(offset, geo);
    }
    Ok(())
}
