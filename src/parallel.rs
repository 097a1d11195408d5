//! A single indexed-parallel-for primitive. The selectors are always
//! single-threaded; all parallelism lives behind this one call, made inside
//! the placer's corner search.

use rayon::prelude::*;

/// Dispatch policy for [`parallel_for_each`], mirroring the `std::launch`
/// policy pair the reference implementation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Runs on the caller's thread, in order.
    Deferred,
    /// May run across the `rayon` global pool.
    Async,
}

impl Policy {
    pub fn for_config(parallel: bool) -> Self {
        if parallel { Policy::Async } else { Policy::Deferred }
    }
}

/// Apply `f` to every item in `items`, returning the results in input
/// order. Under [`Policy::Deferred`] this is a plain sequential map; under
/// [`Policy::Async`] it fans out across `rayon`'s pool.
pub fn parallel_for_each<T, R, F>(items: &[T], f: F, policy: Policy) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T, usize) -> R + Sync + Send,
{
    match policy {
        Policy::Deferred => items.iter().enumerate().map(|(i, t)| f(t, i)).collect(),
        Policy::Async => items
            .par_iter()
            .enumerate()
            .map(|(i, t)| f(t, i))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_and_async_produce_the_same_results() {
        let items: Vec<i32> = (0..50).collect();
        let deferred = parallel_for_each(&items, |x, _| x * 2, Policy::Deferred);
        let async_ = parallel_for_each(&items, |x, _| x * 2, Policy::Async);
        assert_eq!(deferred, async_);
    }
}
