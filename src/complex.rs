//! One-dimensional complex transforms.
//!
//! Both directions are unnormalized: a forward transform followed by an
//! inverse multiplies the signal by the address size. The amplitude helpers
//! apply the `2/N` normalization so that a unit cosine reads as a unit peak.

use alloc::borrow::Cow;
use alloc::vec;
use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::fft::{address_size_of, Butterflies, FftEngine, FftError, Pass};
use crate::num::{Complex, Float};
use crate::parallel::SharedSlice;
use crate::window::hamming;

pub(crate) struct ComplexKernel<T>(PhantomData<fn() -> T>);

impl<T> ComplexKernel<T> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Float> Butterflies<T> for ComplexKernel<T> {
    type Item = Complex<T>;

    fn item_bytes(&self, _data: &[Complex<T>]) -> usize {
        core::mem::size_of::<Complex<T>>()
    }

    fn merge2(&self, data: &SharedSlice<'_, Complex<T>>, from: usize, to: usize, pass: &Pass) {
        let blk = pass.blk();
        let mut tw = pass.twiddle::<T>(2);
        for k in from / 2..to / 2 {
            let j = k & (blk - 1);
            let i1 = ((k >> pass.blkbit) << (pass.blkbit + 1)) + j;
            let w = tw.at(j);
            // SAFETY: butterfly k is the only one touching i1 and i1 + blk.
            let (x1, x2) = unsafe { (data.get_mut(i1), data.get_mut(i1 + blk)) };
            let a = *x1;
            let b = *x2 * w;
            *x1 = a + b;
            *x2 = a - b;
        }
    }

    fn merge4(&self, data: &SharedSlice<'_, Complex<T>>, from: usize, to: usize, pass: &Pass) {
        let blk = pass.blk();
        let mut tw = pass.twiddle::<T>(4);
        for k in from / 4..to / 4 {
            let j = k & (blk - 1);
            let i0 = ((k >> pass.blkbit) << (pass.blkbit + 2)) + j;
            let w1 = tw.at(j);
            let w2 = w1 * w1;
            let w3 = w2 * w1;
            // SAFETY: butterfly k is the only one touching i0 + q·blk, q < 4.
            let (x0, x1, x2, x3) = unsafe {
                (
                    data.get_mut(i0),
                    data.get_mut(i0 + blk),
                    data.get_mut(i0 + 2 * blk),
                    data.get_mut(i0 + 3 * blk),
                )
            };
            // Bit-reversed quarters hold residues 0, 2, 1, 3.
            let a = *x0;
            let b = *x1 * w2;
            let c = *x2 * w1;
            let d = *x3 * w3;
            let s0 = a + b;
            let s1 = a - b;
            let s2 = c + d;
            let s3 = (c - d).mul_i(pass.forward);
            *x0 = s0 + s2;
            *x1 = s1 + s3;
            *x2 = s0 - s2;
            *x3 = s1 - s3;
        }
    }

    fn discard(&self, item: &mut Complex<T>) {
        *item = Complex::zero();
    }
}

/// `data` resized to exactly `n` elements.
///
/// Borrows when the length already matches; otherwise copies, truncating or
/// zero-filling the remainder.
pub fn get_padded<E: Clone + Default>(data: &[E], n: usize) -> Cow<'_, [E]> {
    if data.len() == n {
        return Cow::Borrowed(data);
    }
    let mut padded = Vec::with_capacity(n);
    padded.extend_from_slice(&data[..data.len().min(n)]);
    padded.resize(n, E::default());
    Cow::Owned(padded)
}

impl<T: Float> FftEngine<T> {
    /// In-place complex FFT of the address-size prefix of `data`.
    ///
    /// The forward direction uses `e^{-2πi·jk/N}`. Elements past the address
    /// size are set to zero.
    pub fn complex_transform(&self, data: &mut [Complex<T>], forward: bool) -> Result<(), FftError> {
        self.run(&ComplexKernel::new(), data, forward)
    }

    pub fn complex_forward(&self, data: &mut [Complex<T>]) -> Result<(), FftError> {
        self.complex_transform(data, true)
    }

    pub fn complex_back(&self, data: &mut [Complex<T>]) -> Result<(), FftError> {
        self.complex_transform(data, false)
    }

    /// Forward transform scaled by `2/N`.
    pub fn to_amplitudes(&self, data: &mut [Complex<T>]) -> Result<(), FftError> {
        self.complex_transform(data, true)?;
        let n = address_size_of(data.len());
        let scale = T::from_f64(2.0 / n as f64);
        data[..n].iter_mut().for_each(|x| *x = x.scale(scale));
        Ok(())
    }

    /// Inverse of [`to_amplitudes`](Self::to_amplitudes).
    pub fn from_amplitudes(&self, data: &mut [Complex<T>]) -> Result<(), FftError> {
        self.complex_transform(data, false)?;
        let half = T::from_f64(0.5);
        data.iter_mut().for_each(|x| *x = x.scale(half));
        Ok(())
    }

    /// Welch power spectrum of `data` with the given window weights.
    ///
    /// Segments of `window.len()` samples overlap by half; each is weighted,
    /// zero-padded to the next power of two `P` and transformed. The result
    /// holds the mean of `|X_k|²` over the segments for the `P` bins.
    pub fn average_power(&self, data: &[Complex<T>], window: &[T]) -> Result<Vec<T>, FftError> {
        let segments = welch_segments(data.len(), window.len())?;
        let size = window.len().next_power_of_two();
        let mut power = vec![T::zero(); size];
        let mut frame = vec![Complex::zero(); size];
        for &start in &segments {
            frame.iter_mut().for_each(|x| *x = Complex::zero());
            let end = (start + window.len()).min(data.len());
            for ((slot, x), w) in frame.iter_mut().zip(&data[start..end]).zip(window) {
                *slot = x.scale(*w);
            }
            self.complex_transform(&mut frame, true)?;
            for (p, x) in power.iter_mut().zip(&frame) {
                *p = *p + x.norm_sqr();
            }
        }
        let count = T::from_f64(1.0 / segments.len() as f64);
        power.iter_mut().for_each(|p| *p = *p * count);
        Ok(power)
    }

    /// [`average_power`](Self::average_power) with a Hamming window of `window_len` samples.
    pub fn average_power_hamming(
        &self,
        data: &[Complex<T>],
        window_len: usize,
    ) -> Result<Vec<T>, FftError> {
        self.average_power(data, &hamming::<T>(window_len))
    }
}

/// Start offsets of the half-overlapping segments of a Welch average.
pub(crate) fn welch_segments(len: usize, window_len: usize) -> Result<Vec<usize>, FftError> {
    if len == 0 || window_len == 0 {
        return Err(FftError::EmptyInput);
    }
    if len <= window_len {
        return Ok(vec![0]);
    }
    let step = (window_len / 2).max(1);
    Ok((0..=(len - window_len) / step).map(|s| s * step).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;
    use rand::{Rng, SeedableRng};

    fn naive_dft(input: &[Complex<f64>], forward: bool) -> Vec<Complex<f64>> {
        let n = input.len();
        let sign = if forward { -1.0 } else { 1.0 };
        (0..n)
            .map(|k| {
                input.iter().enumerate().fold(Complex::zero(), |acc, (j, x)| {
                    let theta = sign * 2.0 * PI * ((j * k) % n) as f64 / n as f64;
                    acc + *x * Complex::expi(theta)
                })
            })
            .collect()
    }

    fn random_signal(n: usize, seed: u64) -> Vec<Complex<f64>> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| Complex::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect()
    }

    #[test]
    fn test_matches_naive_dft() {
        let mut engine = FftEngine::<f64>::new();
        engine.set_parallel(1);
        for n in [1usize, 2, 4, 8, 16, 32, 128, 512] {
            for forward in [true, false] {
                let input = random_signal(n, n as u64);
                let expected = naive_dft(&input, forward);
                let mut data = input.clone();
                engine.complex_transform(&mut data, forward).unwrap();
                for (k, (a, b)) in data.iter().zip(&expected).enumerate() {
                    assert!((*a - *b).norm() < 1e-9, "n={n} k={k} forward={forward}");
                }
            }
        }
    }

    #[test]
    fn test_round_trip_scales_by_n() {
        let engine = FftEngine::<f64>::new();
        let input = random_signal(256, 7);
        let mut data = input.clone();
        engine.complex_forward(&mut data).unwrap();
        engine.complex_back(&mut data).unwrap();
        for (a, b) in data.iter().zip(&input) {
            assert!((a.scale(1.0 / 256.0) - *b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_amplitudes_round_trip() {
        let engine = FftEngine::<f64>::new();
        let input = random_signal(64, 3);
        let mut data = input.clone();
        engine.to_amplitudes(&mut data).unwrap();
        engine.from_amplitudes(&mut data).unwrap();
        for (a, b) in data.iter().zip(&input) {
            assert!((*a - *b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_unit_cosine_amplitude() {
        let engine = FftEngine::<f64>::new();
        let n = 32;
        let mut data: Vec<_> = (0..n)
            .map(|j| Complex::new((2.0 * PI * 3.0 * j as f64 / n as f64).cos(), 0.0))
            .collect();
        engine.to_amplitudes(&mut data).unwrap();
        assert!((data[3].norm() - 1.0).abs() < 1e-12);
        assert!((data[n - 3].norm() - 1.0).abs() < 1e-12);
        assert!(data[5].norm() < 1e-12);
    }

    #[test]
    fn test_truncates_and_zeroes_tail() {
        let engine = FftEngine::<f64>::new();
        let input = random_signal(12, 11);
        let mut data = input.clone();
        engine.complex_forward(&mut data).unwrap();
        let expected = naive_dft(&input[..8], true);
        for (a, b) in data[..8].iter().zip(&expected) {
            assert!((*a - *b).norm() < 1e-12);
        }
        assert!(data[8..].iter().all(|x| *x == Complex::zero()));
    }

    #[test]
    fn test_empty_input_rejected() {
        let engine = FftEngine::<f32>::new();
        let mut data: Vec<Complex<f32>> = Vec::new();
        assert_eq!(engine.complex_forward(&mut data), Err(FftError::EmptyInput));
    }

    #[test]
    fn test_get_padded() {
        let data = [Complex::new(1.0f32, 2.0); 3];
        assert!(matches!(get_padded(&data, 3), Cow::Borrowed(_)));
        let shorter = get_padded(&data, 2);
        assert!(matches!(shorter, Cow::Owned(_)));
        assert_eq!(shorter.len(), 2);
        let padded = get_padded(&data, 8);
        assert_eq!(padded.len(), 8);
        assert_eq!(padded[2], data[2]);
        assert_eq!(padded[7], Complex::zero());
    }

    #[test]
    fn test_average_power_of_tone() {
        let engine = FftEngine::<f64>::new();
        let data: Vec<_> = (0..256)
            .map(|j| Complex::expi(2.0 * PI * 4.0 * j as f64 / 32.0))
            .collect();
        let power = engine.average_power(&data, &[1.0; 32]).unwrap();
        assert_eq!(power.len(), 32);
        // Rectangular window: the whole segment energy lands in bin 4.
        assert!((power[4] - 1024.0).abs() < 1e-6);
        assert!(power.iter().enumerate().all(|(k, p)| k == 4 || *p < 1e-6));
        let hamming = engine.average_power_hamming(&data, 32).unwrap();
        let peak = (0..32)
            .max_by(|&a, &b| hamming[a].partial_cmp(&hamming[b]).unwrap())
            .unwrap();
        assert_eq!(peak, 4);
    }

    #[test]
    fn test_welch_segments() {
        assert_eq!(welch_segments(10, 16).unwrap(), vec![0]);
        assert_eq!(welch_segments(16, 8).unwrap(), vec![0, 4, 8]);
        assert_eq!(welch_segments(0, 8), Err(FftError::EmptyInput));
        assert_eq!(welch_segments(8, 0), Err(FftError::EmptyInput));
    }
}
