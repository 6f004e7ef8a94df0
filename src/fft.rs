//! Transform engine base shared by the complex, real and nested specializations.
//!
//! A transform runs in three stages over the largest power-of-two prefix of
//! the buffer (its *address size*):
//!
//! 1. bit-reversal permutation,
//! 2. a single radix-2 merge when the number of address bits is odd,
//! 3. radix-4 merges until the block size reaches the address size.
//!
//! Elements beyond the address size are discarded (set to zero). Every stage
//! is forked over the parallel substrate in chunks aligned to its merge
//! granularity, and the twiddle recurrence is anchored so that the result
//! does not depend on the number of workers.

use core::fmt;
use core::marker::PhantomData;

#[cfg(feature = "parallel")]
use alloc::sync::Arc;

use crate::num::Float;
use crate::parallel::{self, SharedSlice};
use crate::twiddle::{twiddle_mask, Twiddle, DEFAULT_TWIDDLE_BITS, MAX_TWIDDLE_BITS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftError {
    /// The buffer has no elements.
    EmptyInput,
    /// The buffer is shorter than the layout requires.
    BufferTooShort { needed: usize, actual: usize },
    /// Inner elements of a nested buffer differ in size.
    ShapeMismatch,
    /// A dedicated worker pool could not be created.
    WorkerPool,
}

impl fmt::Display for FftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FftError::EmptyInput => write!(f, "empty input buffer"),
            FftError::BufferTooShort { needed, actual } => {
                write!(f, "buffer too short: need {needed} elements, got {actual}")
            }
            FftError::ShapeMismatch => write!(f, "inner elements differ in size"),
            FftError::WorkerPool => write!(f, "failed to build worker pool"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FftError {}

/// Number of address bits of a buffer: `floor(log2(len))`, 0 for `len <= 1`.
pub fn address_bits_of(len: usize) -> u32 {
    if len <= 1 {
        0
    } else {
        usize::BITS - 1 - len.leading_zeros()
    }
}

/// Largest power of two not exceeding `len`, or 0 for an empty buffer.
pub fn address_size_of(len: usize) -> usize {
    if len == 0 {
        0
    } else {
        1 << address_bits_of(len)
    }
}

/// Tunables of an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FftConfig {
    /// Degree of parallelism: 0 picks automatically, 1 runs inline.
    pub parallel: usize,
    /// Recurrence steps between exact twiddle recomputations, as a power of two.
    pub twiddle_error_bits: u32,
    /// Cache budget of one parallel chunk, in bytes.
    pub block_bytes: usize,
}

impl Default for FftConfig {
    fn default() -> Self {
        Self {
            parallel: 0,
            twiddle_error_bits: DEFAULT_TWIDDLE_BITS,
            block_bytes: parallel::parallel_env().block_bytes,
        }
    }
}

/// In-place split-radix FFT engine over samples of type `T`.
///
/// The engine only holds configuration; transforms take `&self` and can run
/// concurrently on different buffers. Both directions are unnormalized.
#[derive(Clone, Debug)]
pub struct FftEngine<T: Float> {
    config: FftConfig,
    #[cfg(feature = "parallel")]
    pool: Option<Arc<rayon::ThreadPool>>,
    _marker: PhantomData<T>,
}

impl<T: Float> Default for FftEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> FftEngine<T> {
    pub fn new() -> Self {
        Self::with_config(FftConfig::default())
    }

    pub fn with_config(config: FftConfig) -> Self {
        let mut engine = Self {
            config,
            #[cfg(feature = "parallel")]
            pool: None,
            _marker: PhantomData,
        };
        engine.config.twiddle_error_bits = engine.config.twiddle_error_bits.min(MAX_TWIDDLE_BITS);
        engine.config.block_bytes = engine.config.block_bytes.max(1);
        engine
    }

    /// Run forked stages on `pool` instead of the rayon global pool.
    #[cfg(feature = "parallel")]
    pub fn with_pool(mut self, pool: Arc<rayon::ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Build a dedicated pool of `threads` workers and use it for every stage.
    ///
    /// `threads == 0` sizes the pool from the hardware, as rayon does. An
    /// engine in automatic mode switches to one worker per pool thread.
    #[cfg(feature = "parallel")]
    pub fn with_thread_pool(self, threads: usize) -> Result<Self, FftError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|_| FftError::WorkerPool)?;
        let pool_threads = pool.current_num_threads().max(1);
        let parallel = self.config.parallel;
        let mut engine = self.with_pool(Arc::new(pool));
        if parallel == 0 {
            engine.config.parallel = pool_threads;
        }
        Ok(engine)
    }

    pub fn config(&self) -> FftConfig {
        self.config
    }

    pub fn parallel(&self) -> usize {
        self.config.parallel
    }

    /// Set the degree of parallelism; 0 selects it from the buffer size.
    pub fn set_parallel(&mut self, parallel: usize) {
        self.config.parallel = parallel;
    }

    pub fn twiddle_error_bits(&self) -> u32 {
        self.config.twiddle_error_bits
    }

    /// Set the twiddle error bound. Negative values mean exact twiddles.
    pub fn set_twiddle_error_bits(&mut self, bits: i32) {
        self.config.twiddle_error_bits = bits.clamp(0, MAX_TWIDDLE_BITS as i32) as u32;
    }

    pub fn block_bytes(&self) -> usize {
        self.config.block_bytes
    }

    pub fn set_block_bytes(&mut self, bytes: usize) {
        self.config.block_bytes = bytes.max(1);
    }

    /// Same configuration and pool, but every stage runs inline.
    pub fn sequential(&self) -> Self {
        let mut child = self.clone();
        child.config.parallel = 1;
        child
    }

    /// Estimated rounding error of a complex transform of `len` samples, in bits.
    ///
    /// `log2(2 + 4·address_bits) + min(twiddle_bits, max(address_bits - 2, 0))`.
    pub fn error_bits_for(&self, len: usize) -> f64 {
        self.error_bits_with(len, 0)
    }

    /// As [`error_bits_for`](Self::error_bits_for) for a packed real buffer,
    /// counting the extra operations of the real unfolding pass.
    pub fn real_error_bits_for(&self, len: usize) -> f64 {
        self.error_bits_with(len, 4)
    }

    fn error_bits_with(&self, len: usize, extra_ops: u32) -> f64 {
        let bits = address_bits_of(len);
        let ops = 2 + 4 * bits + extra_ops;
        let twiddle = self.config.twiddle_error_bits.min(bits.saturating_sub(2));
        libm::log2(ops as f64) + twiddle as f64
    }

    /// Significant bits of `T` left after the estimated transform error.
    pub fn precision_bits_for(&self, len: usize) -> f64 {
        T::MANTISSA_DIGITS as f64 - self.error_bits_for(len)
    }

    pub fn real_precision_bits_for(&self, len: usize) -> f64 {
        T::MANTISSA_DIGITS as f64 - self.real_error_bits_for(len)
    }

    /// Ratio between the largest and the smallest resolvable magnitude.
    pub fn dynamic_range_for(&self, len: usize) -> f64 {
        libm::exp2(self.precision_bits_for(len))
    }

    pub fn dynamic_range_db_for(&self, len: usize) -> f64 {
        20.0 * libm::log10(self.dynamic_range_for(len))
    }

    pub fn real_dynamic_range_for(&self, len: usize) -> f64 {
        libm::exp2(self.real_precision_bits_for(len))
    }

    pub fn real_dynamic_range_db_for(&self, len: usize) -> f64 {
        20.0 * libm::log10(self.real_dynamic_range_for(len))
    }

    /// Capture the configuration for one call over `len` items of `item_bytes` each.
    pub(crate) fn plan(&self, len: usize, item_bytes: usize) -> Plan<'_> {
        let address_bits = address_bits_of(len);
        let address_size = address_size_of(len);
        let item_bytes = item_bytes.max(1);
        let workers = self.workers_for(address_size, item_bytes);
        let block_items = (self.config.block_bytes / item_bytes).max(1);
        fft_log!(
            trace,
            "plan: len={} address_bits={} workers={} block_items={}",
            len,
            address_bits,
            workers,
            block_items
        );
        Plan {
            address_bits,
            address_size,
            workers,
            block_items,
            mask: twiddle_mask(self.config.twiddle_error_bits),
            #[cfg(feature = "parallel")]
            pool: self.pool.as_deref(),
            _marker: PhantomData,
        }
    }

    #[cfg(feature = "parallel")]
    fn workers_for(&self, len: usize, item_bytes: usize) -> usize {
        let workers = match self.config.parallel {
            0 => {
                let env = parallel::parallel_env();
                let bytes = len.saturating_mul(item_bytes);
                if bytes < env.threshold_bytes {
                    1
                } else {
                    let threads = match &self.pool {
                        Some(pool) => pool.current_num_threads(),
                        None => rayon::current_num_threads(),
                    };
                    env.threads
                        .min(threads)
                        .min(bytes / self.config.block_bytes)
                        .max(1)
                }
            }
            n => n,
        };
        workers.min(len.max(1))
    }

    #[cfg(not(feature = "parallel"))]
    fn workers_for(&self, _len: usize, _item_bytes: usize) -> usize {
        1
    }
}

/// Direction and geometry of one merge pass.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Pass {
    /// log2 of the sub-transform length being merged.
    pub blkbit: u32,
    pub forward: bool,
    pub mask: usize,
}

impl Pass {
    pub(crate) fn blk(&self) -> usize {
        1 << self.blkbit
    }

    /// Twiddles `e^{∓2πi·j/(radix·blk)}` for this pass.
    pub(crate) fn twiddle<T: Float>(&self, radix: usize) -> Twiddle<T> {
        let span = (radix << self.blkbit) as f64;
        let sign = if self.forward { -1.0 } else { 1.0 };
        Twiddle::new(sign * 2.0 * core::f64::consts::PI / span, self.mask)
    }
}

/// Merge kernels for one element type.
///
/// `merge2` handles the indices `[from, to)` of a radix-2 pass (a multiple of
/// two wide), `merge4` those of a radix-4 pass (a multiple of four wide).
/// Chunk `[from, to)` owns the butterflies `from / radix .. to / radix`.
pub(crate) trait Butterflies<T: Float>: Sync {
    type Item: Send;

    fn item_bytes(&self, data: &[Self::Item]) -> usize;
    fn merge2(&self, data: &SharedSlice<'_, Self::Item>, from: usize, to: usize, pass: &Pass);
    fn merge4(&self, data: &SharedSlice<'_, Self::Item>, from: usize, to: usize, pass: &Pass);
    fn discard(&self, item: &mut Self::Item);
}

/// Configuration of one call, captured at entry.
pub(crate) struct Plan<'a> {
    pub address_bits: u32,
    pub address_size: usize,
    pub workers: usize,
    block_items: usize,
    pub mask: usize,
    #[cfg(feature = "parallel")]
    pool: Option<&'a rayon::ThreadPool>,
    _marker: PhantomData<&'a ()>,
}

impl Plan<'_> {
    /// Run `f` over `[0, len)` in chunks aligned to `granularity`.
    pub(crate) fn fork<F>(&self, len: usize, granularity: usize, f: F) -> Result<(), FftError>
    where
        F: Fn(usize, usize) -> Result<(), FftError> + Sync + Send,
    {
        if len == 0 {
            return Ok(());
        }
        if self.workers <= 1 {
            return f(0, len);
        }
        let chunk = parallel::chunk_len(len, granularity, self.block_items, self.workers);
        #[cfg(feature = "parallel")]
        {
            parallel::fork(self.pool, len, chunk, f)
        }
        #[cfg(not(feature = "parallel"))]
        {
            parallel::fork(len, chunk, f)
        }
    }

    /// Bit reversal, merge passes and tail discard over `data`.
    pub(crate) fn execute<T: Float, K: Butterflies<T>>(
        &self,
        kernel: &K,
        data: &mut [K::Item],
        forward: bool,
    ) -> Result<(), FftError> {
        let bits = self.address_bits;
        let (head, tail) = data.split_at_mut(self.address_size);
        {
            let shared = SharedSlice::new(head);
            let n = shared.len();
            if bits > 0 {
                self.fork(n, 1, |from, to| {
                    bit_reverse(&shared, from, to, bits);
                    Ok(())
                })?;
            }
            let mut blkbit = 0;
            if bits % 2 == 1 {
                let pass = Pass { blkbit, forward, mask: self.mask };
                self.fork(n, 2, |from, to| {
                    kernel.merge2(&shared, from, to, &pass);
                    Ok(())
                })?;
                blkbit += 1;
            }
            while blkbit + 2 <= bits {
                let pass = Pass { blkbit, forward, mask: self.mask };
                self.fork(n, 4, |from, to| {
                    kernel.merge4(&shared, from, to, &pass);
                    Ok(())
                })?;
                blkbit += 2;
            }
        }
        if !tail.is_empty() {
            fft_log!(
                debug,
                "discarding {} elements beyond address size {}",
                tail.len(),
                self.address_size
            );
            tail.iter_mut().for_each(|item| kernel.discard(item));
        }
        Ok(())
    }
}

impl<T: Float> FftEngine<T> {
    /// Transform `data` with `kernel`, truncating to the address size.
    pub(crate) fn run<K: Butterflies<T>>(
        &self,
        kernel: &K,
        data: &mut [K::Item],
        forward: bool,
    ) -> Result<(), FftError> {
        if data.is_empty() {
            return Err(FftError::EmptyInput);
        }
        let plan = self.plan(data.len(), kernel.item_bytes(data));
        plan.execute::<T, K>(kernel, data, forward)
    }
}

fn bit_reverse<E>(data: &SharedSlice<'_, E>, from: usize, to: usize, bits: u32) {
    let shift = usize::BITS - bits;
    for i in from..to {
        let j = i.reverse_bits() >> shift;
        if j > i {
            // SAFETY: the pair (i, j) is swapped only by the chunk owning its
            // smaller index.
            unsafe { data.swap(i, j) };
        }
    }
}
