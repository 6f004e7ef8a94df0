//! Multi-dimensional transforms over nested buffers.
//!
//! A buffer is a slice of *elements*, each of which is itself transformable:
//! a complex array (`Vec<Complex<T>>`), a packed real array (`Vec<T>`), or a
//! further dimension ([`Nested`]). A transform first transforms every element
//! along the inner dimensions, then merges across elements with the same
//! radix-2/4 schedule as a 1D transform, treating each element as a vector of
//! complex lanes. The inverse runs the two steps in reverse order.
//!
//! Round-trip factors multiply per dimension: a complex dimension of size `N`
//! contributes `N`, the innermost packed real dimension of `L` values `L/2`.
//!
//! # Real layout
//!
//! A real transform packs the innermost dimension as a 1D real transform
//! does: lane `k` of a row holds `X(.., k)` for `0 < k < N/2`, and lane 0
//! starts out holding the two real columns `X(.., 0)` and `X(.., N/2)`. After
//! each outer merge, lane 0 at outer indices `u` and `M - u` is unfolded so
//! it carries true bins instead of the two columns interleaved:
//!
//! ```text
//! u == 0 or u == M/2:  (X(u, 0), X(u, N/2))   both real, unfolded further out
//! 0 < u < M/2:         Re, Im of X(u, 0)
//! M/2 < u < M:         Re, Im of X(u, N/2)
//! ```
//!
//! With more dimensions the innermost outer index that is not `0` or `M/2`
//! picks the column; lane 0 stays a real pair only when every outer index is.

use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::fft::{address_size_of, Butterflies, FftEngine, FftError, Pass, Plan};
use crate::num::{as_complex_mut, as_real_mut, Complex, Float};
use crate::parallel::SharedSlice;
use crate::rfft::RealFftImpl;

/// Arithmetic and transforms the multi-dimensional merge needs from an element.
///
/// Binary operations assume both operands have the same shape.
pub trait FftElement<T: Float>: Clone + Send + Sync {
    /// Number of complex lanes.
    fn lanes(&self) -> usize;
    fn same_shape(&self, other: &Self) -> bool;
    fn clear(&mut self);
    fn copy_from(&mut self, other: &Self);
    fn add(&mut self, other: &Self);
    fn subtract(&mut self, other: &Self);
    /// Multiply every lane by `factor`.
    fn scale(&mut self, factor: Complex<T>);
    /// Multiply every lane by `i`, or `-i` when `negate` is set.
    fn mul_i(&mut self, negate: bool);
    fn complex_transform(&mut self, engine: &FftEngine<T>, forward: bool) -> Result<(), FftError>;
    fn real_transform(&mut self, engine: &FftEngine<T>, forward: bool) -> Result<(), FftError>;
    /// Check that a real transform can pack this element.
    fn validate_real(&self) -> Result<(), FftError>;
    /// Separate the two real columns packed in lane 0 of `self` (outer index
    /// `u`) and `mirror` (index `M - u`) after a forward merge, or recombine
    /// them before an inverse one.
    fn unfold_real(&mut self, mirror: &mut Self, forward: bool);
}

/// `(z, y)` are lane 0 at outer indices `u` and `M - u`. Forward yields the
/// first column's bin at `u` and the second column's bin at `M - u`.
fn unfold_lane<T: Float>(z: Complex<T>, y: Complex<T>, forward: bool) -> (Complex<T>, Complex<T>) {
    if forward {
        let half = T::from_f64(0.5);
        ((z + y.conj()).scale(half), (y - z.conj()).scale(half).mul_i(true))
    } else {
        (z + y.conj().mul_i(false), z.conj() + y.mul_i(false))
    }
}

impl<T: Float> FftElement<T> for Vec<Complex<T>> {
    fn lanes(&self) -> usize {
        self.len()
    }
    fn same_shape(&self, other: &Self) -> bool {
        self.len() == other.len()
    }
    fn clear(&mut self) {
        self.iter_mut().for_each(|x| *x = Complex::zero());
    }
    fn copy_from(&mut self, other: &Self) {
        self.copy_from_slice(other);
    }
    fn add(&mut self, other: &Self) {
        self.iter_mut().zip(other).for_each(|(a, b)| *a += *b);
    }
    fn subtract(&mut self, other: &Self) {
        self.iter_mut().zip(other).for_each(|(a, b)| *a -= *b);
    }
    fn scale(&mut self, factor: Complex<T>) {
        self.iter_mut().for_each(|x| *x *= factor);
    }
    fn mul_i(&mut self, negate: bool) {
        self.iter_mut().for_each(|x| *x = x.mul_i(negate));
    }
    fn complex_transform(&mut self, engine: &FftEngine<T>, forward: bool) -> Result<(), FftError> {
        engine.complex_transform(self, forward)
    }
    /// Transforms the interleaved components as `2·len` real samples.
    fn real_transform(&mut self, engine: &FftEngine<T>, forward: bool) -> Result<(), FftError> {
        engine.real_transform(as_real_mut(self), forward)
    }
    fn validate_real(&self) -> Result<(), FftError> {
        if self.is_empty() {
            return Err(FftError::EmptyInput);
        }
        Ok(())
    }
    fn unfold_real(&mut self, mirror: &mut Self, forward: bool) {
        if let (Some(z), Some(y)) = (self.first_mut(), mirror.first_mut()) {
            (*z, *y) = unfold_lane(*z, *y, forward);
        }
    }
}

/// Packed real array: lane `k` is `(self[2k], self[2k + 1])`.
impl<T: Float> FftElement<T> for Vec<T> {
    fn lanes(&self) -> usize {
        self.len().div_ceil(2)
    }
    fn same_shape(&self, other: &Self) -> bool {
        self.len() == other.len()
    }
    fn clear(&mut self) {
        self.iter_mut().for_each(|x| *x = T::zero());
    }
    fn copy_from(&mut self, other: &Self) {
        self.copy_from_slice(other);
    }
    fn add(&mut self, other: &Self) {
        self.iter_mut().zip(other).for_each(|(a, b)| *a = *a + *b);
    }
    fn subtract(&mut self, other: &Self) {
        self.iter_mut().zip(other).for_each(|(a, b)| *a = *a - *b);
    }
    fn scale(&mut self, factor: Complex<T>) {
        as_complex_mut(self).iter_mut().for_each(|x| *x *= factor);
        if self.len() % 2 == 1 {
            if let Some(last) = self.last_mut() {
                *last = *last * factor.re;
            }
        }
    }
    fn mul_i(&mut self, negate: bool) {
        as_complex_mut(self)
            .iter_mut()
            .for_each(|x| *x = x.mul_i(negate));
        if self.len() % 2 == 1 {
            if let Some(last) = self.last_mut() {
                *last = T::zero();
            }
        }
    }
    fn complex_transform(&mut self, engine: &FftEngine<T>, forward: bool) -> Result<(), FftError> {
        if self.len() % 2 == 1 {
            if let Some(last) = self.last_mut() {
                *last = T::zero();
            }
        }
        engine.complex_transform(as_complex_mut(self), forward)
    }
    fn real_transform(&mut self, engine: &FftEngine<T>, forward: bool) -> Result<(), FftError> {
        engine.real_transform(self, forward)
    }
    /// Lane 0 needs both the DC and the Nyquist slot.
    fn validate_real(&self) -> Result<(), FftError> {
        match self.len() {
            0 => Err(FftError::EmptyInput),
            1 => Err(FftError::BufferTooShort { needed: 2, actual: 1 }),
            _ => Ok(()),
        }
    }
    fn unfold_real(&mut self, mirror: &mut Self, forward: bool) {
        if let (Some(z), Some(y)) = (
            as_complex_mut(self).first_mut(),
            as_complex_mut(mirror).first_mut(),
        ) {
            (*z, *y) = unfold_lane(*z, *y, forward);
        }
    }
}

/// One more dimension: a transformable sequence of transformable elements.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Nested<E>(pub Vec<E>);

impl<E> From<Vec<E>> for Nested<E> {
    fn from(items: Vec<E>) -> Self {
        Self(items)
    }
}

impl<T: Float, E: FftElement<T>> FftElement<T> for Nested<E> {
    fn lanes(&self) -> usize {
        self.0.iter().map(|e| e.lanes()).sum()
    }
    fn same_shape(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a.same_shape(b))
    }
    fn clear(&mut self) {
        self.0.iter_mut().for_each(|e| e.clear());
    }
    fn copy_from(&mut self, other: &Self) {
        self.0.iter_mut().zip(&other.0).for_each(|(a, b)| a.copy_from(b));
    }
    fn add(&mut self, other: &Self) {
        self.0.iter_mut().zip(&other.0).for_each(|(a, b)| a.add(b));
    }
    fn subtract(&mut self, other: &Self) {
        self.0.iter_mut().zip(&other.0).for_each(|(a, b)| a.subtract(b));
    }
    fn scale(&mut self, factor: Complex<T>) {
        self.0.iter_mut().for_each(|e| e.scale(factor));
    }
    fn mul_i(&mut self, negate: bool) {
        self.0.iter_mut().for_each(|e| e.mul_i(negate));
    }
    fn complex_transform(&mut self, engine: &FftEngine<T>, forward: bool) -> Result<(), FftError> {
        transform_elements(engine, &mut self.0, forward, false)
    }
    fn real_transform(&mut self, engine: &FftEngine<T>, forward: bool) -> Result<(), FftError> {
        transform_elements(engine, &mut self.0, forward, true)
    }
    fn validate_real(&self) -> Result<(), FftError> {
        if self.0.is_empty() {
            return Err(FftError::EmptyInput);
        }
        self.0.iter().try_for_each(|e| e.validate_real())
    }
    /// Only the self-conjugate inner indices still hold two real columns.
    fn unfold_real(&mut self, mirror: &mut Self, forward: bool) {
        let m = address_size_of(self.0.len().min(mirror.0.len()));
        for u in self_conjugate(m) {
            self.0[u].unfold_real(&mut mirror.0[u], forward);
        }
    }
}

/// Indices `u` with `u == (m - u) mod m` in a dimension of size `m`.
fn self_conjugate(m: usize) -> impl Iterator<Item = usize> {
    let half = if m >= 2 { Some(m / 2) } else { None };
    (m > 0).then_some(0).into_iter().chain(half)
}

/// Merge kernel whose items are whole elements.
struct ElementKernel<T, E>(PhantomData<fn() -> (T, E)>);

impl<T: Float, E: FftElement<T>> Butterflies<T> for ElementKernel<T, E> {
    type Item = E;

    fn item_bytes(&self, data: &[E]) -> usize {
        let lanes = data.first().map_or(1, |e| e.lanes());
        lanes.max(1) * core::mem::size_of::<Complex<T>>()
    }

    fn merge2(&self, data: &SharedSlice<'_, E>, from: usize, to: usize, pass: &Pass) {
        let blk = pass.blk();
        let mut tw = pass.twiddle::<T>(2);
        let mut scratch: Option<E> = None;
        for k in from / 2..to / 2 {
            let j = k & (blk - 1);
            let i1 = ((k >> pass.blkbit) << (pass.blkbit + 1)) + j;
            let w = tw.at(j);
            // SAFETY: butterfly k is the only one touching i1 and i1 + blk.
            let (x1, x2) = unsafe { (data.get_mut(i1), data.get_mut(i1 + blk)) };
            let t = scratch.get_or_insert_with(|| x1.clone());
            x2.scale(w);
            sum_difference::<T, E>(x1, x2, t);
        }
    }

    fn merge4(&self, data: &SharedSlice<'_, E>, from: usize, to: usize, pass: &Pass) {
        let blk = pass.blk();
        let mut tw = pass.twiddle::<T>(4);
        let mut scratch: Option<E> = None;
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
            let t = scratch.get_or_insert_with(|| x0.clone());
            // Bit-reversed quarters hold residues 0, 2, 1, 3.
            x1.scale(w2);
            x2.scale(w1);
            x3.scale(w3);
            sum_difference::<T, E>(x0, x1, t);
            sum_difference::<T, E>(x2, x3, t);
            x3.mul_i(pass.forward);
            sum_difference::<T, E>(x0, x2, t);
            sum_difference::<T, E>(x1, x3, t);
        }
    }

    fn discard(&self, item: &mut E) {
        item.clear();
    }
}

/// `(a, b) <- (a + b, a - b)`, leaving stale data in `scratch`.
fn sum_difference<T: Float, E: FftElement<T>>(a: &mut E, b: &mut E, scratch: &mut E) {
    scratch.copy_from(a);
    a.add(b);
    scratch.subtract(b);
    core::mem::swap(b, scratch);
}

fn transform_one<T: Float, E: FftElement<T>>(
    element: &mut E,
    engine: &FftEngine<T>,
    forward: bool,
    real: bool,
) -> Result<(), FftError> {
    if real {
        element.real_transform(engine, forward)
    } else {
        element.complex_transform(engine, forward)
    }
}

/// Transform every element along the inner dimensions.
///
/// When the plan forks, elements are spread across workers and each runs with
/// a sequential child engine; otherwise each element gets the full engine.
fn transform_inner<T: Float, E: FftElement<T>>(
    engine: &FftEngine<T>,
    plan: &Plan<'_>,
    data: &mut [E],
    forward: bool,
    real: bool,
) -> Result<(), FftError> {
    if plan.workers > 1 && data.len() > 1 {
        fft_log!(
            debug,
            "inner transforms of {} elements across {} workers",
            data.len(),
            plan.workers
        );
        let child = engine.sequential();
        let n = data.len();
        let shared = SharedSlice::new(data);
        plan.fork(n, 1, |from, to| {
            (from..to).try_for_each(|i| {
                // SAFETY: each element index belongs to exactly one chunk.
                let element = unsafe { shared.get_mut(i) };
                transform_one(element, &child, forward, real)
            })
        })
    } else {
        data.iter_mut()
            .try_for_each(|element| transform_one(element, engine, forward, real))
    }
}

pub(crate) fn transform_elements<T: Float, E: FftElement<T>>(
    engine: &FftEngine<T>,
    data: &mut [E],
    forward: bool,
    real: bool,
) -> Result<(), FftError> {
    let first = data.first().ok_or(FftError::EmptyInput)?;
    if !data.iter().all(|e| e.same_shape(first)) {
        return Err(FftError::ShapeMismatch);
    }
    if real {
        first.validate_real()?;
    }
    let kernel = ElementKernel::<T, E>(PhantomData);
    let plan = engine.plan(data.len(), kernel.item_bytes(data));
    let n = plan.address_size;
    if forward {
        transform_inner(engine, &plan, &mut data[..n], forward, real)?;
        plan.execute::<T, _>(&kernel, data, forward)?;
        if real {
            unfold_outer(&plan, &mut data[..n], forward)?;
        }
        Ok(())
    } else {
        if real {
            unfold_outer(&plan, &mut data[..n], forward)?;
        }
        plan.execute::<T, _>(&kernel, data, forward)?;
        transform_inner(engine, &plan, &mut data[..n], forward, real)
    }
}

/// Unfold (or fold) lane 0 of every mirrored pair `(u, M - u)`, `0 < u < M/2`.
fn unfold_outer<T: Float, E: FftElement<T>>(
    plan: &Plan<'_>,
    data: &mut [E],
    forward: bool,
) -> Result<(), FftError> {
    let m = data.len();
    let shared = SharedSlice::new(data);
    plan.fork(m / 2, 1, |from, to| {
        for u in from.max(1)..to {
            // SAFETY: pair u owns exactly the elements u and m - u, u < m - u.
            let (z, y) = unsafe { (shared.get_mut(u), shared.get_mut(m - u)) };
            z.unfold_real(y, forward);
        }
        Ok(())
    })
}

/// Transforms over buffers of any [`FftElement`] type.
#[derive(Clone, Debug, Default)]
pub struct MultiFft<T: Float> {
    engine: FftEngine<T>,
}

impl<T: Float> From<FftEngine<T>> for MultiFft<T> {
    fn from(engine: FftEngine<T>) -> Self {
        Self { engine }
    }
}

impl<T: Float> MultiFft<T> {
    pub fn new() -> Self {
        Self::from(FftEngine::new())
    }

    pub fn engine(&self) -> &FftEngine<T> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FftEngine<T> {
        &mut self.engine
    }

    pub fn set_parallel(&mut self, parallel: usize) {
        self.engine.set_parallel(parallel);
    }

    pub fn set_twiddle_error_bits(&mut self, bits: i32) {
        self.engine.set_twiddle_error_bits(bits);
    }

    /// Complex transform along every dimension of `data`.
    pub fn complex_transform<E: FftElement<T>>(
        &self,
        data: &mut [E],
        forward: bool,
    ) -> Result<(), FftError> {
        transform_elements(&self.engine, data, forward, false)
    }

    pub fn complex_forward<E: FftElement<T>>(&self, data: &mut [E]) -> Result<(), FftError> {
        self.complex_transform(data, true)
    }

    pub fn complex_back<E: FftElement<T>>(&self, data: &mut [E]) -> Result<(), FftError> {
        self.complex_transform(data, false)
    }

    /// Real transform along the innermost dimension, complex along the others.
    pub fn real_transform<E: FftElement<T>>(
        &self,
        data: &mut [E],
        forward: bool,
    ) -> Result<(), FftError> {
        transform_elements(&self.engine, data, forward, true)
    }
}
