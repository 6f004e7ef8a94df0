//! Twiddle factor recurrence with bounded error growth.
//!
//! Consecutive twiddles are produced by multiplying with a fixed step, and
//! the exact value is recomputed from `e^{i·theta·j}` whenever `j` is a
//! multiple of `mask + 1`. Every twiddle is therefore a pure function of its
//! index and the mask: a chunk that starts mid-way seeks from the preceding
//! anchor and reproduces the sequential values bit for bit.

use crate::num::{Complex, Float};

/// Largest accepted twiddle error setting, in recurrence bits.
pub const MAX_TWIDDLE_BITS: u32 = 24;

/// Default twiddle error setting: exact recomputation every 8 steps.
pub const DEFAULT_TWIDDLE_BITS: u32 = 3;

/// Recurrence mask for a twiddle error setting.
pub fn twiddle_mask(bits: u32) -> usize {
    (1usize << bits.min(MAX_TWIDDLE_BITS)) - 1
}

#[derive(Clone, Debug)]
pub(crate) struct Twiddle<T: Float> {
    theta: f64,
    step: Complex<T>,
    mask: usize,
    index: usize,
    current: Complex<T>,
}

impl<T: Float> Twiddle<T> {
    /// Twiddles `e^{i·theta·j}` for `j = 0, 1, ...`.
    pub(crate) fn new(theta: f64, mask: usize) -> Self {
        Self {
            theta,
            step: Complex::expi(T::from_f64(theta)),
            mask,
            index: 0,
            current: Complex::one(),
        }
    }

    fn exact(&self, index: usize) -> Complex<T> {
        if index == 0 {
            Complex::one()
        } else {
            Complex::expi(T::from_f64(self.theta * index as f64))
        }
    }

    fn seek(&mut self, index: usize) {
        let anchor = index & !self.mask;
        let mut w = self.exact(anchor);
        for _ in anchor..index {
            w = w * self.step;
        }
        self.current = w;
    }

    /// Twiddle for `index`; stepping forward by one reuses the recurrence.
    #[inline(always)]
    pub(crate) fn at(&mut self, index: usize) -> Complex<T> {
        if index != self.index {
            if index == self.index.wrapping_add(1) && index & self.mask != 0 {
                self.current = self.current * self.step;
            } else {
                self.seek(index);
            }
            self.index = index;
        }
        self.current
    }
}
