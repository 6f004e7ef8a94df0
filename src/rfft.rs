//! Real-input transforms over packed buffers.
//!
//! `N` real samples are transformed as `N/2` complex slots `x[2m] + i·x[2m+1]`
//! followed by an unfolding pass that separates the spectra of the even and
//! odd samples. The result stays in place, packed as
//!
//! ```text
//! plain:             [X0, X(N/2), Re X1, Im X1, ..., Re X(N/2-1), Im X(N/2-1)]
//! Nyquist-unrolled:  [X0, 0,      Re X1, Im X1, ..., Re X(N/2-1), Im X(N/2-1), X(N/2), 0]
//! ```
//!
//! The inverse unfolds first and then runs the inverse complex transform, so
//! `real_back(real_forward(x)) == (N/2)·x`.

use alloc::vec;
use alloc::vec::Vec;

use crate::complex::welch_segments;
use crate::fft::{address_size_of, FftEngine, FftError};
use crate::num::{as_complex_mut, Complex, Float};
use crate::parallel::SharedSlice;
use crate::twiddle::Twiddle;
use crate::window::hamming;

/// Real-input FFT with an in-place packed spectrum.
pub trait RealFftImpl<T: Float> {
    /// Forward (`true`) or inverse transform of a packed real buffer.
    fn real_transform(&self, data: &mut [T], forward: bool) -> Result<(), FftError>;

    /// Number of real samples transformed for a buffer of `len` values.
    fn real_size_of(&self, len: usize) -> usize;

    /// Buffer length holding the spectrum of `n` real samples.
    fn spectrum_len(&self, n: usize) -> usize;

    /// Add `|X_k|²` for `k = 0..=n/2` of a packed spectrum into `acc`.
    fn accumulate_power(&self, spectrum: &[T], n: usize, acc: &mut [T]);

    fn real_forward(&self, data: &mut [T]) -> Result<(), FftError> {
        self.real_transform(data, true)
    }

    fn real_back(&self, data: &mut [T]) -> Result<(), FftError> {
        self.real_transform(data, false)
    }

    /// Forward transform scaled by `2/N`.
    fn real_to_amplitude(&self, data: &mut [T]) -> Result<(), FftError> {
        self.real_transform(data, true)?;
        let n = self.real_size_of(data.len());
        let scale = T::from_f64(2.0 / n as f64);
        let used = self.spectrum_len(n).min(data.len());
        data[..used].iter_mut().for_each(|x| *x = *x * scale);
        Ok(())
    }

    /// Inverse of [`real_to_amplitude`](Self::real_to_amplitude).
    fn amplitude_to_real(&self, data: &mut [T]) -> Result<(), FftError> {
        self.real_transform(data, false)
    }

    /// Welch power spectrum of real `data`, `n/2 + 1` bins for the padded
    /// segment length `n`.
    fn average_real_power(&self, data: &[T], window: &[T]) -> Result<Vec<T>, FftError> {
        let segments = welch_segments(data.len(), window.len())?;
        let n = window.len().next_power_of_two().max(2);
        let mut power = vec![T::zero(); n / 2 + 1];
        let mut frame = vec![T::zero(); self.spectrum_len(n)];
        for &start in &segments {
            frame.iter_mut().for_each(|x| *x = T::zero());
            let end = (start + window.len()).min(data.len());
            for ((slot, x), w) in frame.iter_mut().zip(&data[start..end]).zip(window) {
                *slot = *x * *w;
            }
            self.real_transform(&mut frame, true)?;
            self.accumulate_power(&frame, n, &mut power);
        }
        let count = T::from_f64(1.0 / segments.len() as f64);
        power.iter_mut().for_each(|p| *p = *p * count);
        Ok(power)
    }

    fn average_real_power_hamming(&self, data: &[T], window_len: usize) -> Result<Vec<T>, FftError> {
        self.average_real_power(data, &hamming::<T>(window_len))
    }
}

fn accumulate_pairs<T: Float>(spectrum: &[T], n: usize, acc: &mut [T]) {
    for k in 1..n / 2 {
        let (re, im) = (spectrum[2 * k], spectrum[2 * k + 1]);
        acc[k] = acc[k] + re * re + im * im;
    }
}

impl<T: Float> RealFftImpl<T> for FftEngine<T> {
    fn real_transform(&self, data: &mut [T], forward: bool) -> Result<(), FftError> {
        if data.is_empty() {
            return Err(FftError::EmptyInput);
        }
        let n = address_size_of(data.len());
        let (head, tail) = data.split_at_mut(n);
        if !tail.is_empty() {
            fft_log!(debug, "real transform discarding {} samples beyond {}", tail.len(), n);
            tail.iter_mut().for_each(|x| *x = T::zero());
        }
        if n < 2 {
            return Ok(());
        }
        let slots = as_complex_mut(head);
        if forward {
            self.complex_transform(slots, true)?;
            load_real(self, slots, true)
        } else {
            load_real(self, slots, false)?;
            self.complex_transform(slots, false)
        }
    }

    fn real_size_of(&self, len: usize) -> usize {
        address_size_of(len)
    }

    fn spectrum_len(&self, n: usize) -> usize {
        n
    }

    fn accumulate_power(&self, spectrum: &[T], n: usize, acc: &mut [T]) {
        let (dc, nyquist) = (spectrum[0], spectrum[1]);
        acc[0] = acc[0] + dc * dc;
        acc[n / 2] = acc[n / 2] + nyquist * nyquist;
        accumulate_pairs(spectrum, n, acc);
    }
}

/// Separate the even/odd sample spectra held in `slots` (forward), or fold
/// a real spectrum back into them (inverse).
fn load_real<T: Float>(
    engine: &FftEngine<T>,
    slots: &mut [Complex<T>],
    forward: bool,
) -> Result<(), FftError> {
    let m = slots.len();
    let half = T::from_f64(0.5);
    let z0 = slots[0];
    slots[0] = if forward {
        Complex::new(z0.re + z0.im, z0.re - z0.im)
    } else {
        Complex::new((z0.re + z0.im) * half, (z0.re - z0.im) * half)
    };
    let plan = engine.plan(m, core::mem::size_of::<Complex<T>>());
    let sign = if forward { -1.0 } else { 1.0 };
    let theta = sign * 2.0 * core::f64::consts::PI / (2 * m) as f64;
    let mask = plan.mask;
    let shared = SharedSlice::new(slots);
    plan.fork(m / 2, 1, |from, to| {
        let mut tw = Twiddle::<T>::new(theta, mask);
        for k in from + 1..=to {
            let mk = m - k;
            let w = tw.at(k);
            // SAFETY: pair k owns exactly the slots k and m - k.
            let a = unsafe { *shared.get_mut(k) };
            let b = unsafe { *shared.get_mut(mk) }.conj();
            let e = (a + b).scale(half);
            let t = (w * (a - b).scale(half)).mul_i(false);
            let (lo, hi) = if forward { (e - t, e + t) } else { (e + t, e - t) };
            unsafe { *shared.get_mut(k) = lo };
            if mk != k {
                unsafe { *shared.get_mut(mk) = hi.conj() };
            }
        }
        Ok(())
    })
}

/// Real FFT that stores the Nyquist bin in two extra trailing slots, keeping
/// slot 1 free of the DC imaginary part.
///
/// A buffer of `L` values transforms `address_size_of(L - 2)` samples.
#[derive(Clone, Debug, Default)]
pub struct NyquistUnrolledFft<T: Float> {
    engine: FftEngine<T>,
}

impl<T: Float> NyquistUnrolledFft<T> {
    pub fn new() -> Self {
        Self::from(FftEngine::new())
    }

    pub fn engine(&self) -> &FftEngine<T> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FftEngine<T> {
        &mut self.engine
    }
}

impl<T: Float> From<FftEngine<T>> for NyquistUnrolledFft<T> {
    fn from(engine: FftEngine<T>) -> Self {
        Self { engine }
    }
}

impl<T: Float> RealFftImpl<T> for NyquistUnrolledFft<T> {
    fn real_transform(&self, data: &mut [T], forward: bool) -> Result<(), FftError> {
        if data.len() < 3 {
            return Err(if data.is_empty() {
                FftError::EmptyInput
            } else {
                FftError::BufferTooShort { needed: 3, actual: data.len() }
            });
        }
        let n = self.real_size_of(data.len());
        if n < 2 {
            data[n..].iter_mut().for_each(|x| *x = T::zero());
            return Ok(());
        }
        let extra = data.len() - n - 2;
        if extra > 0 {
            fft_log!(debug, "unrolled transform discarding {} slots beyond {}", extra, n + 2);
        }
        if forward {
            self.engine.real_transform(&mut data[..n], true)?;
            data[n] = data[1];
            data[1] = T::zero();
            data[n + 1..].iter_mut().for_each(|x| *x = T::zero());
            Ok(())
        } else {
            data[1] = data[n];
            data[n..].iter_mut().for_each(|x| *x = T::zero());
            self.engine.real_transform(&mut data[..n], false)
        }
    }

    fn real_size_of(&self, len: usize) -> usize {
        address_size_of(len.saturating_sub(2))
    }

    fn spectrum_len(&self, n: usize) -> usize {
        n + 2
    }

    fn accumulate_power(&self, spectrum: &[T], n: usize, acc: &mut [T]) {
        let (dc, nyquist) = (spectrum[0], spectrum[n]);
        acc[0] = acc[0] + dc * dc;
        acc[n / 2] = acc[n / 2] + nyquist * nyquist;
        accumulate_pairs(spectrum, n, acc);
    }
}
