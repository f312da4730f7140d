//! FILENAME: rollup-engine/src/parallel.rs
//! PURPOSE: Optional fan-out of independent work items over a rayon pool.
//! CONTEXT: Grouping sets and complement identities never share mutable
//! state, so they can be evaluated on any thread. Results always come back
//! in input order, which keeps parallel output identical to the sequential
//! path.

use crate::error::Result;

#[cfg(feature = "parallel")]
use rayon::ThreadPool;
#[cfg(feature = "parallel")]
use std::sync::OnceLock;

/// A crate-local pool instead of rayon's global one: if the global pool
/// fails to start, rayon panics on first use. When no pool can be built the
/// work runs on the calling thread.
#[cfg(feature = "parallel")]
static ROLLUP_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

#[cfg(feature = "parallel")]
fn desired_threads() -> usize {
    std::env::var("RAYON_NUM_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
}

#[cfg(feature = "parallel")]
fn build_pool() -> Option<ThreadPool> {
    let requested = desired_threads().max(1);
    let try_build = |n| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|i| format!("rollup-worker-{}", i))
            .build()
    };

    match try_build(requested) {
        Ok(pool) => Some(pool),
        Err(_) if requested > 1 => try_build(1).ok(),
        Err(_) => None,
    }
}

#[cfg(feature = "parallel")]
fn rollup_pool() -> Option<&'static ThreadPool> {
    ROLLUP_POOL.get_or_init(build_pool).as_ref()
}

#[cfg(feature = "parallel")]
fn map_on_pool<T, R, F>(items: &[T], f: &F) -> Option<Result<Vec<R>>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync,
{
    use rayon::prelude::*;

    let pool = rollup_pool()?;
    Some(pool.install(|| items.par_iter().map(f).collect()))
}

#[cfg(not(feature = "parallel"))]
fn map_on_pool<T, R, F>(_items: &[T], _f: &F) -> Option<Result<Vec<R>>>
where
    F: Fn(&T) -> Result<R>,
{
    None
}

/// Whether `parallel = true` can actually fan out in this build.
pub fn parallel_available() -> bool {
    cfg!(feature = "parallel")
}

/// Maps `f` over `items`, keeping input order in the output.
///
/// Runs on the pool when `parallel` is set, the `parallel` feature is built
/// and there is more than one item. The first error stops the map.
pub fn try_map_ordered<T, R, F>(parallel: bool, items: &[T], f: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync,
{
    if parallel && items.len() > 1 {
        if let Some(result) = map_on_pool(items, &f) {
            return result;
        }
    }
    items.iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RollupError;

    #[test]
    fn order_is_preserved() {
        let items: Vec<usize> = (0..200).collect();
        let doubled = try_map_ordered(true, &items, |&n| Ok(n * 2)).unwrap();
        assert_eq!(doubled, items.iter().map(|n| n * 2).collect::<Vec<_>>());

        let sequential = try_map_ordered(false, &items, |&n| Ok(n * 2)).unwrap();
        assert_eq!(doubled, sequential);
    }

    #[test]
    fn errors_propagate() {
        let items = vec![1, 2, 3];
        let result: Result<Vec<i32>> = try_map_ordered(true, &items, |&n| {
            if n == 2 {
                Err(RollupError::InvalidConfig("boom".to_string()))
            } else {
                Ok(n)
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn empty_input() {
        let items: Vec<u8> = Vec::new();
        assert!(try_map_ordered(true, &items, |&n| Ok(n)).unwrap().is_empty());
    }
}
