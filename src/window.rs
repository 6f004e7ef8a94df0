//! Periodic window functions for spectrum averaging.
//!
//! Each window of length `n` samples `w(i)` for `i = 0..n` over a full
//! period `2πi/n`, which is the form Welch averaging expects.

use alloc::vec::Vec;

use crate::num::Float;

fn periodic<T: Float>(len: usize, f: impl Fn(f64) -> f64) -> Vec<T> {
    let n = len as f64;
    (0..len)
        .map(|i| T::from_f64(f(2.0 * core::f64::consts::PI * i as f64 / n)))
        .collect()
}

/// Fill `out` with a Hann window.
pub fn hann_inplace<T: Float>(out: &mut [T]) {
    let w = hann::<T>(out.len());
    out.copy_from_slice(&w);
}

/// Generate a Hann window of length `len`.
pub fn hann<T: Float>(len: usize) -> Vec<T> {
    periodic(len, |x| 0.5 - 0.5 * libm::cos(x))
}

/// Generate a Hamming window of length `len`.
pub fn hamming<T: Float>(len: usize) -> Vec<T> {
    periodic(len, |x| 0.54 - 0.46 * libm::cos(x))
}

/// Generate a Blackman window of length `len`.
pub fn blackman<T: Float>(len: usize) -> Vec<T> {
    periodic(len, |x| 0.42 - 0.5 * libm::cos(x) + 0.08 * libm::cos(2.0 * x))
}

fn bessel0(x: f64) -> f64 {
    // Power series of I0(x); 20 terms suffice for beta < 20.
    let mut sum = 1.0;
    let y = x * x / 4.0;
    let mut t = y;
    let mut k = 1.0;
    for n in 1..20 {
        k *= n as f64;
        sum += t / (k * k);
        t *= y;
    }
    sum
}

/// Generate a symmetric Kaiser window of length `len` and shape `beta`.
pub fn kaiser<T: Float>(len: usize, beta: f64) -> Vec<T> {
    if len <= 1 {
        return alloc::vec![T::one(); len];
    }
    let denom = bessel0(beta);
    let m = (len - 1) as f64;
    (0..len)
        .map(|i| {
            let r = 2.0 * i as f64 / m - 1.0;
            T::from_f64(bessel0(beta * libm::sqrt(1.0 - r * r)) / denom)
        })
        .collect()
}
