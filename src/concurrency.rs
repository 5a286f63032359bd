//! Concurrency helper: limit the number of input files processed in parallel.

use rayon::prelude::*;

/// Map `f` over `items` with at most `limit` calls in flight. Output order matches input.
pub fn map_files_limited<T, R, F>(items: &[T], limit: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Sync + Fn(&T) -> R,
{
    if limit <= 1 {
        return items.iter().map(&f).collect();
    }
    let mut out = Vec::with_capacity(items.len());
    for chunk in items.chunks(limit) {
        out.extend(chunk.par_iter().map(&f).collect::<Vec<_>>());
    }
    out
}
