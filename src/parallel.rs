//! Fork/join substrate for the transform passes.
//!
//! An index domain `[0, len)` is cut into contiguous chunks whose boundaries
//! are multiples of the merge granularity; each chunk runs to completion on
//! one worker of a rayon pool and the call joins before returning. Workers
//! write through a [`SharedSlice`]: the chunk layout of every stage keeps the
//! index sets touched by different chunks disjoint.

use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::fft::FftError;

#[cfg(feature = "std")]
use std::sync::OnceLock;

/// Default cache-residency budget of one chunk, in bytes.
pub const DEFAULT_BLOCK_BYTES: usize = 32 * 1024;

/// Default buffer size, in bytes, below which the automatic mode stays sequential.
pub const DEFAULT_PAR_THRESHOLD_BYTES: usize = 256 * 1024;

/// Process-wide defaults for the parallel substrate.
///
/// Read once from `RADIXFFT_THREADS`, `RADIXFFT_BLOCK_BYTES` and
/// `RADIXFFT_PAR_THRESHOLD` when `std` is available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParallelEnv {
    /// Upper bound on workers chosen by the automatic mode.
    pub threads: usize,
    /// Maximum bytes of samples handed to one chunk.
    pub block_bytes: usize,
    /// Minimum buffer size in bytes before the automatic mode forks.
    pub threshold_bytes: usize,
}

impl Default for ParallelEnv {
    fn default() -> Self {
        Self {
            threads: hardware_threads(),
            block_bytes: DEFAULT_BLOCK_BYTES,
            threshold_bytes: DEFAULT_PAR_THRESHOLD_BYTES,
        }
    }
}

#[cfg(feature = "std")]
static PARALLEL_ENV: OnceLock<ParallelEnv> = OnceLock::new();

#[cfg(feature = "std")]
impl ParallelEnv {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            threads: env_usize("RADIXFFT_THREADS", defaults.threads),
            block_bytes: env_usize("RADIXFFT_BLOCK_BYTES", defaults.block_bytes),
            threshold_bytes: env_usize("RADIXFFT_PAR_THRESHOLD", defaults.threshold_bytes),
        }
    }
}

#[cfg(feature = "std")]
fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(value) if value > 0 => value,
            _ => {
                fft_log!(
                    warn,
                    "ignoring {}={:?}: expected a positive integer, using {}",
                    name,
                    raw,
                    default
                );
                default
            }
        },
        Err(_) => default,
    }
}

/// Defaults for the substrate, resolved once per process.
pub fn parallel_env() -> ParallelEnv {
    #[cfg(feature = "std")]
    {
        *PARALLEL_ENV.get_or_init(ParallelEnv::from_env)
    }
    #[cfg(not(feature = "std"))]
    {
        ParallelEnv::default()
    }
}

/// Number of hardware threads, or 1 without `std`.
pub fn hardware_threads() -> usize {
    #[cfg(feature = "std")]
    {
        num_cpus::get().max(1)
    }
    #[cfg(not(feature = "std"))]
    {
        1
    }
}

/// Chunk length for a domain of `len` indices.
///
/// The result is a non-zero multiple of `granularity`, covers at most
/// `block_items` indices (rounded down to the granularity) and is small
/// enough to give every one of `workers` a chunk when the domain allows it.
pub fn chunk_len(len: usize, granularity: usize, block_items: usize, workers: usize) -> usize {
    let granularity = granularity.max(1);
    let per_worker = len.div_ceil(workers.max(1));
    let chunk = block_items.min(per_worker).max(granularity);
    chunk / granularity * granularity
}

/// Half-open ranges of at most `chunk` indices covering `[0, len)`.
pub fn chunk_ranges(len: usize, chunk: usize) -> Vec<(usize, usize)> {
    let chunk = chunk.max(1);
    let mut ranges = Vec::with_capacity(len.div_ceil(chunk));
    let mut from = 0;
    while from < len {
        let to = (from + chunk).min(len);
        ranges.push((from, to));
        from = to;
    }
    ranges
}

/// Run `f` over every chunk of `[0, len)` and join.
///
/// Chunks execute on `pool` when given, otherwise on the rayon global pool.
/// The first error reported by a chunk aborts the stage and is returned.
#[cfg(feature = "parallel")]
pub(crate) fn fork<F>(
    pool: Option<&rayon::ThreadPool>,
    len: usize,
    chunk: usize,
    f: F,
) -> Result<(), FftError>
where
    F: Fn(usize, usize) -> Result<(), FftError> + Sync + Send,
{
    use rayon::prelude::*;

    let ranges = chunk_ranges(len, chunk);
    if ranges.len() <= 1 {
        return ranges.iter().try_for_each(|&(from, to)| f(from, to));
    }
    let run = || ranges.par_iter().try_for_each(|&(from, to)| f(from, to));
    match pool {
        Some(pool) => pool.install(run),
        None => run(),
    }
}

/// Sequential stand-in used when the crate is built without `parallel`.
#[cfg(not(feature = "parallel"))]
pub(crate) fn fork<F>(len: usize, chunk: usize, f: F) -> Result<(), FftError>
where
    F: Fn(usize, usize) -> Result<(), FftError>,
{
    chunk_ranges(len, chunk)
        .iter()
        .try_for_each(|&(from, to)| f(from, to))
}

/// A mutable slice that several workers may write concurrently.
///
/// Callers guarantee that no two live references target the same index.
pub(crate) struct SharedSlice<'a, E> {
    ptr: *mut E,
    len: usize,
    _marker: PhantomData<&'a mut [E]>,
}

// SAFETY: the slice is only reachable through `get_mut`/`swap`, whose callers
// keep the per-worker index sets disjoint; `E: Send` lets elements be mutated
// from another thread.
unsafe impl<E: Send> Send for SharedSlice<'_, E> {}
unsafe impl<E: Send> Sync for SharedSlice<'_, E> {}

impl<'a, E> SharedSlice<'a, E> {
    pub(crate) fn new(slice: &'a mut [E]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// # Safety
    /// `index < len`, and no other reference to `index` may be alive.
    #[allow(clippy::mut_from_ref)]
    #[inline(always)]
    pub(crate) unsafe fn get_mut(&self, index: usize) -> &mut E {
        debug_assert!(index < self.len);
        unsafe { &mut *self.ptr.add(index) }
    }

    /// # Safety
    /// Both indices in bounds and not referenced by any other worker.
    #[inline(always)]
    pub(crate) unsafe fn swap(&self, a: usize, b: usize) {
        debug_assert!(a < self.len && b < self.len);
        unsafe { core::ptr::swap(self.ptr.add(a), self.ptr.add(b)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_chunk_ranges_cover_domain() {
        let ranges = chunk_ranges(10, 4);
        assert_eq!(ranges, vec![(0, 4), (4, 8), (8, 10)]);
        assert!(chunk_ranges(0, 4).is_empty());
    }

    #[test]
    fn test_chunk_len_alignment() {
        // Budget of 10 items rounds down to a multiple of 4.
        assert_eq!(chunk_len(1024, 4, 10, 1), 8);
        // Never below the granularity.
        assert_eq!(chunk_len(1024, 4, 1, 1), 4);
        // Enough chunks for every worker.
        assert_eq!(chunk_len(64, 2, 1 << 20, 4), 16);
    }

    #[test]
    fn test_shared_slice_disjoint_writes() {
        let mut data = vec![0usize; 16];
        {
            let shared = SharedSlice::new(&mut data);
            assert_eq!(shared.len(), 16);
            for i in 0..16 {
                unsafe { *shared.get_mut(i) = i * 2 };
            }
            unsafe { shared.swap(0, 15) };
        }
        assert_eq!(data[0], 30);
        assert_eq!(data[15], 0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_fork_surfaces_first_error() {
        let result = fork(None, 64, 8, |from, _to| {
            if from == 32 {
                Err(FftError::ShapeMismatch)
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err(FftError::ShapeMismatch));
    }

    #[test]
    fn test_env_defaults_are_positive() {
        let env = parallel_env();
        assert!(env.threads >= 1);
        assert!(env.block_bytes >= 1);
        assert!(env.threshold_bytes >= 1);
    }
}
