//! Packing-order selectors: heuristics that decide what order to offer items
//! to placers and when to open a new bin. Selectors are single-threaded; the
//! only parallelism in the system lives inside the placer's corner search.

mod djd;
mod first_fit;

pub use djd::DjdSelector;
pub use first_fit::FirstFitSelector;

use crate::bin_shape::Bin;
use crate::geometry::GeometryProvider;
use crate::item::Item;
use crate::placer::PlacerConfig;

/// A packed bin: its shape plus the items placed in it, in placement order.
pub struct PackedBin {
    pub bin: Bin,
    pub items: Vec<Item>,
}

/// Ordered list of packed bins. Insertion order reflects placement order.
pub type PackGroup = Vec<PackedBin>;

/// Selector-level knobs, independent of the placer's own configuration.
#[derive(Debug, Clone, Copy)]
pub struct SelectorConfig {
    pub allow_parallel: bool,
    /// DJD-only: stop opening new bins once this many are in use.
    pub max_bins: Option<usize>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            allow_parallel: true,
            max_bins: None,
        }
    }
}

/// Progress and cancellation hooks, polled by the selector between items and
/// between bins. Not called from the placer's parallel corner search.
pub struct RunHooks<'a> {
    pub progress: Option<&'a mut dyn FnMut(usize)>,
    pub stop: Option<&'a dyn Fn() -> bool>,
}

impl<'a> RunHooks<'a> {
    pub fn none() -> Self {
        Self {
            progress: None,
            stop: None,
        }
    }

    fn report(&mut self, remaining: usize) {
        if let Some(cb) = self.progress.as_mut() {
            cb(remaining);
        }
    }

    fn cancelled(&self) -> bool {
        self.stop.map(|f| f()).unwrap_or(false)
    }
}

/// Items whose individual area exceeds the bin's area can never be placed;
/// drop them up front rather than let every placer rediscover that.
pub(crate) fn safety_pass(
    items: Vec<Item>,
    bin_template: &Bin,
    geo: &dyn GeometryProvider,
) -> (Vec<Item>, usize) {
    let bin_area = bin_template.area(geo);
    let mut kept = Vec::with_capacity(items.len());
    let mut rejected = 0usize;
    for item in items {
        if item.area() <= bin_area {
            kept.push(item);
        } else {
            rejected += 1;
        }
    }
    (kept, rejected)
}

/// Sort items by descending area, breaking ties by original input order
/// (the sort is stable, so a plain key sort on negative area suffices).
pub(crate) fn sort_by_descending_area(items: &mut [Item]) {
    items.sort_by(|a, b| b.area().partial_cmp(&a.area()).unwrap_or(std::cmp::Ordering::Equal));
}

/// Shared entry point both selectors use to build a fresh placer for a new
/// bin. `selector_config.allow_parallel` is a run-wide override: it can
/// only turn the placer's own `parallel` flag off, never on.
pub(crate) fn new_placer<'g>(
    bin_template: &Bin,
    placer_config: &PlacerConfig,
    selector_config: &SelectorConfig,
    geo: &'g dyn GeometryProvider,
) -> crate::placer::NfpPlacer<'g> {
    let mut config = placer_config.clone();
    config.parallel = config.parallel && selector_config.allow_parallel;
    crate::placer::NfpPlacer::new(bin_template.clone(), config, geo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoProvider;

    #[test]
    fn allow_parallel_false_forces_placer_to_run_deferred_even_if_configured_on() {
        let geo = GeoProvider;
        let bin = Bin::rectangle(100, 100);
        let placer_config = PlacerConfig {
            parallel: true,
            ..Default::default()
        };
        let selector_config = SelectorConfig {
            allow_parallel: false,
            max_bins: None,
        };
        let placer = new_placer(&bin, &placer_config, &selector_config, &geo);
        assert!(!placer.config().parallel);
    }

    #[test]
    fn allow_parallel_true_leaves_placer_config_untouched() {
        let geo = GeoProvider;
        let bin = Bin::rectangle(100, 100);
        let placer_config = PlacerConfig {
            parallel: false,
            ..Default::default()
        };
        let selector_config = SelectorConfig::default();
        let placer = new_placer(&bin, &placer_config, &selector_config, &geo);
        assert!(!placer.config().parallel);
    }
}
