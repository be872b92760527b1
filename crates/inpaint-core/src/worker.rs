//! Worker - Row-partitioned fork-join execution
//!
//! A [`Worker`] owns a rayon thread pool. The free functions in this module
//! take an optional worker: with `None` (or a single-threaded worker) the
//! callback runs once on the calling thread over the whole range, otherwise
//! the range is split into disjoint partitions processed in the pool. All
//! functions return only after every partition has finished.

use crate::error::{Error, Result};
use rayon::prelude::*;

/// Partitions created per pool thread, for load balancing.
const CHUNKS_PER_THREAD: usize = 3;

/// Environment variable read by [`Worker::from_env`].
pub const WORKER_THREADS_ENV: &str = "INPAINT_WORKER_THREADS";

/// Row-parallel executor backed by a rayon thread pool
pub struct Worker {
    pool: rayon::ThreadPool,
}

impl Worker {
    /// Create a worker with rayon's default thread count.
    pub fn new() -> Result<Self> {
        Self::build(0)
    }

    /// Create a worker with exactly `threads` threads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `threads` is zero.
    pub fn with_threads(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(Error::InvalidParameter("worker needs at least one thread".to_string()));
        }
        Self::build(threads)
    }

    /// Create a worker sized by `INPAINT_WORKER_THREADS`, falling back to
    /// the default thread count when the variable is unset or unusable.
    pub fn from_env() -> Result<Self> {
        match std::env::var(WORKER_THREADS_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            Some(threads) if threads > 0 => Self::with_threads(threads),
            _ => Self::new(),
        }
    }

    fn build(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("inpaint-worker-{index}"))
            .build()?;
        log::debug!("worker started with {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }

    /// Number of threads in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Rows per partition for `count` rows, never below `min_count`.
    fn partition_size(&self, count: usize, min_count: usize) -> usize {
        let parts = self.threads() * CHUNKS_PER_THREAD;
        count.div_ceil(parts).max(min_count).max(1)
    }

    fn splits(&self, count: usize, min_count: usize) -> bool {
        self.threads() > 1 && count > min_count.max(1)
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("threads", &self.threads())
            .finish()
    }
}

/// Run `function(first_row, number_rows)` over `[first, first + count)`.
///
/// `min_count` is the smallest partition worth handing to another thread.
pub fn execute<F>(worker: Option<&Worker>, first: u32, count: u32, min_count: u32, function: F)
where
    F: Fn(u32, u32) + Sync,
{
    if count == 0 {
        return;
    }
    match worker {
        Some(worker) if worker.splits(count as usize, min_count as usize) => {
            let size = worker.partition_size(count as usize, min_count as usize) as u32;
            let parts = count.div_ceil(size);
            log::trace!("execute: {count} rows in {parts} partitions of {size}");
            worker.pool.install(|| {
                (0..parts).into_par_iter().for_each(|part| {
                    let start = part * size;
                    function(first + start, size.min(count - start));
                })
            });
        }
        _ => function(first, count),
    }
}

/// Run `function(first_row, rows)` over disjoint row chunks of `data`.
///
/// `data` holds `rows` rows of `stride` elements; every chunk handed to
/// `function` starts at row `first_row` and holds whole rows.
///
/// # Panics
///
/// Panics if `data` holds fewer than `rows * stride` elements.
pub fn execute_rows_mut<T, F>(
    worker: Option<&Worker>,
    data: &mut [T],
    stride: usize,
    rows: u32,
    min_rows: u32,
    function: F,
) where
    T: Send,
    F: Fn(u32, &mut [T]) + Sync,
{
    if rows == 0 || stride == 0 {
        return;
    }
    let data = &mut data[..rows as usize * stride];
    match worker {
        Some(worker) if worker.splits(rows as usize, min_rows as usize) => {
            let size = worker.partition_size(rows as usize, min_rows as usize);
            worker.pool.install(|| {
                data.par_chunks_mut(size * stride)
                    .enumerate()
                    .for_each(|(part, chunk)| function((part * size) as u32, chunk))
            });
        }
        _ => function(0, data),
    }
}

/// Like [`execute_rows_mut`], for two buffers sharing the same row count.
///
/// Both chunks handed to `function` cover the same rows.
pub fn execute_rows_mut_pair<A, B, F>(
    worker: Option<&Worker>,
    (first, first_stride): (&mut [A], usize),
    (second, second_stride): (&mut [B], usize),
    rows: u32,
    min_rows: u32,
    function: F,
) where
    A: Send,
    B: Send,
    F: Fn(u32, &mut [A], &mut [B]) + Sync,
{
    if rows == 0 || first_stride == 0 || second_stride == 0 {
        return;
    }
    let first = &mut first[..rows as usize * first_stride];
    let second = &mut second[..rows as usize * second_stride];
    match worker {
        Some(worker) if worker.splits(rows as usize, min_rows as usize) => {
            let size = worker.partition_size(rows as usize, min_rows as usize);
            worker.pool.install(|| {
                first
                    .par_chunks_mut(size * first_stride)
                    .zip(second.par_chunks_mut(size * second_stride))
                    .enumerate()
                    .for_each(|(part, (a, b))| function((part * size) as u32, a, b))
            });
        }
        _ => function(0, first, second),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_execute_without_worker_single_call() {
        let calls = AtomicU32::new(0);
        execute(None, 3, 10, 1, |first, count| {
            assert_eq!((first, count), (3, 10));
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_execute_covers_every_row_once() {
        let worker = Worker::with_threads(4).unwrap();
        let hits: Vec<AtomicU32> = (0..101).map(|_| AtomicU32::new(0)).collect();
        execute(Some(&worker), 0, 101, 1, |first, count| {
            for row in first..first + count {
                hits[row as usize].fetch_add(1, Ordering::SeqCst);
            }
        });
        assert!(hits.iter().all(|h| h.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn test_execute_rows_mut_offsets() {
        let worker = Worker::with_threads(3).unwrap();
        let stride = 5;
        let mut data = vec![0u32; 37 * stride];
        execute_rows_mut(Some(&worker), &mut data, stride, 37, 2, |first, chunk| {
            for (i, row) in chunk.chunks_mut(stride).enumerate() {
                row.fill(first + i as u32);
            }
        });
        for (y, row) in data.chunks(stride).enumerate() {
            assert!(row.iter().all(|&v| v == y as u32));
        }
    }

    #[test]
    fn test_execute_rows_mut_pair_aligned() {
        let worker = Worker::with_threads(2).unwrap();
        let mut a = vec![0u8; 20 * 3];
        let mut b = vec![0i32; 20 * 7];
        execute_rows_mut_pair(
            Some(&worker),
            (&mut a, 3),
            (&mut b, 7),
            20,
            1,
            |first, ca, cb| {
                assert_eq!(ca.len() / 3, cb.len() / 7);
                ca.fill(first as u8);
                cb.fill(first as i32);
            },
        );
        for y in 0..20 {
            assert_eq!(a[y * 3] as i32, b[y * 7]);
        }
    }

    #[test]
    fn test_worker_zero_threads_rejected() {
        assert!(Worker::with_threads(0).is_err());
        let worker = Worker::with_threads(2).unwrap();
        assert_eq!(worker.threads(), 2);
    }
}
