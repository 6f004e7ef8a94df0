//! # radixfft - split-radix FFT engine
//!
//! In-place radix-2/4 Fast Fourier Transforms over power-of-two buffers:
//! complex signals, packed real signals and nested multi-dimensional data.
//!
//! ## Features
//!
//! - **Iterative split-radix schedule**: bit reversal, at most one radix-2
//!   pass, then radix-4 passes
//! - **Fork/join parallelism** on rayon, with results that do not depend on
//!   the number of workers
//! - **Error-bounded twiddles**: exact recomputation every `2^bits` steps and
//!   a precision estimate for any transform length
//! - **Real transforms** packed in place, with an optional unrolled Nyquist bin
//! - **Any number of dimensions** through the [`FftElement`] trait
//! - `no_std` + `alloc` compatible
//!
//! ## Cargo Features
//!
//! - `std` (default): hardware concurrency, environment defaults, `std::error::Error`
//! - `parallel` (default): rayon fork/join substrate
//! - `verbose-logging`: plan and truncation diagnostics through `log`
//!
//! ## Length contract
//!
//! Every transform works on the largest power of two not exceeding the
//! buffer length and zeroes the elements past it. Use [`get_padded`] to
//! zero-extend a buffer first.
//!
//! ## Example
//!
//! ```
//! use radixfft::{Complex64, FftEngine};
//!
//! let engine = FftEngine::<f64>::new();
//! let mut data = vec![Complex64::new(1.0, 0.0); 8];
//! engine.complex_forward(&mut data).unwrap();
//! assert!((data[0].re - 8.0).abs() < 1e-12);
//! engine.complex_back(&mut data).unwrap();
//! assert!((data[3].re - 8.0).abs() < 1e-12);
//! ```

#![no_std]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "verbose-logging")]
macro_rules! fft_log {
    ($level:ident, $($arg:tt)+) => {
        log::$level!($($arg)+)
    };
}

#[cfg(not(feature = "verbose-logging"))]
macro_rules! fft_log {
    ($level:ident, $($arg:tt)+) => {
        if false {
            let _ = core::format_args!($($arg)+);
        }
    };
}

/// Scalar and complex number types.
pub mod num;

/// Fork/join substrate and process-wide parallel defaults.
pub mod parallel;

pub mod twiddle;

/// Transform engine: configuration, pipeline and precision estimates.
pub mod fft;

/// One-dimensional complex transforms and power spectra.
pub mod complex;

/// Real-input transforms in packed layouts.
pub mod rfft;

pub mod window;

/// Multi-dimensional transforms over nested buffers.
pub mod ndfft;

pub use complex::get_padded;
pub use fft::{address_bits_of, address_size_of, FftConfig, FftEngine, FftError};
pub use ndfft::{FftElement, MultiFft, Nested};
pub use num::{Complex, Complex32, Complex64, Float};
pub use rfft::{NyquistUnrolledFft, RealFftImpl};
