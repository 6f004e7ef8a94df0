//! Scalar and complex number types shared by every transform.
//!
//! Trigonometry goes through `libm` on every target so that closed-form
//! twiddle recomputation yields the same bits with or without `std`.

// Minimal float trait for the generic engine (no_std, libm only)
pub trait Float:
    Copy
    + Clone
    + PartialEq
    + PartialOrd
    + core::fmt::Debug
    + core::ops::Add<Output = Self>
    + core::ops::Sub<Output = Self>
    + core::ops::Mul<Output = Self>
    + core::ops::Div<Output = Self>
    + core::ops::Neg<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Number of significant binary digits in the mantissa.
    const MANTISSA_DIGITS: u32;

    fn zero() -> Self;
    fn one() -> Self;
    fn from_f64(x: f64) -> Self;
    fn cos(self) -> Self;
    fn sin(self) -> Self;
    fn sin_cos(self) -> (Self, Self);
    fn sqrt(self) -> Self;
}

impl Float for f32 {
    const MANTISSA_DIGITS: u32 = f32::MANTISSA_DIGITS;

    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
    fn from_f64(x: f64) -> Self {
        x as f32
    }
    fn cos(self) -> Self {
        libm::cosf(self)
    }
    fn sin(self) -> Self {
        libm::sinf(self)
    }
    fn sin_cos(self) -> (Self, Self) {
        libm::sincosf(self)
    }
    fn sqrt(self) -> Self {
        libm::sqrtf(self)
    }
}

impl Float for f64 {
    const MANTISSA_DIGITS: u32 = f64::MANTISSA_DIGITS;

    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
    fn from_f64(x: f64) -> Self {
        x
    }
    fn cos(self) -> Self {
        libm::cos(self)
    }
    fn sin(self) -> Self {
        libm::sin(self)
    }
    fn sin_cos(self) -> (Self, Self) {
        libm::sincos(self)
    }
    fn sqrt(self) -> Self {
        libm::sqrt(self)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Complex<T: Float> {
    pub re: T,
    pub im: T,
}

impl<T: Float> Complex<T> {
    pub fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
    pub fn zero() -> Self {
        Self {
            re: T::zero(),
            im: T::zero(),
        }
    }
    pub fn one() -> Self {
        Self {
            re: T::one(),
            im: T::zero(),
        }
    }
    /// `e^{i·theta}`
    #[inline(always)]
    pub fn expi(theta: T) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self { re: cos, im: sin }
    }
    #[inline(always)]
    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }
    #[inline(always)]
    pub fn scale(self, factor: T) -> Self {
        Self {
            re: self.re * factor,
            im: self.im * factor,
        }
    }
    /// Multiply by `i`, or by `-i` when `negate` is set. Exact.
    #[inline(always)]
    pub fn mul_i(self, negate: bool) -> Self {
        if negate {
            Self {
                re: self.im,
                im: -self.re,
            }
        } else {
            Self {
                re: -self.im,
                im: self.re,
            }
        }
    }
    #[inline(always)]
    pub fn norm_sqr(self) -> T {
        self.re * self.re + self.im * self.im
    }
    #[inline(always)]
    pub fn norm(self) -> T {
        self.norm_sqr().sqrt()
    }
}

impl<T: Float> core::ops::Neg for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self {
            re: -self.re,
            im: -self.im,
        }
    }
}

impl<T: Float> core::ops::Add for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }
}

impl<T: Float> core::ops::Sub for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn sub(self, other: Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }
}

impl<T: Float> core::ops::Mul for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        Self {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }
}

impl<T: Float> core::ops::AddAssign for Complex<T> {
    #[inline(always)]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl<T: Float> core::ops::SubAssign for Complex<T> {
    #[inline(always)]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl<T: Float> core::ops::MulAssign for Complex<T> {
    #[inline(always)]
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

pub type Complex32 = Complex<f32>;
pub type Complex64 = Complex<f64>;

/// View an interleaved real buffer as complex slots `(data[2k], data[2k+1])`.
///
/// A trailing odd sample is not part of the view.
pub fn as_complex_mut<T: Float>(data: &mut [T]) -> &mut [Complex<T>] {
    let m = data.len() / 2;
    // SAFETY: `Complex<T>` is `repr(C)` with two `T` fields, so it has the size
    // of `[T; 2]` and the alignment of `T`; the view covers `2m <= len` values.
    unsafe { core::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut Complex<T>, m) }
}

/// View a complex buffer as its interleaved `re, im` components.
pub fn as_real_mut<T: Float>(data: &mut [Complex<T>]) -> &mut [T] {
    let n = data.len() * 2;
    // SAFETY: see `as_complex_mut`; the layouts are identical.
    unsafe { core::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut T, n) }
}
