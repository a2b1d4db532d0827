//! src/scalar.rs
//!
//! The arithmetic capability set the batched interpreter is generic over:
//! `{+, -, *, /, elementary transcendentals, finite-test}`. Plain
//! evaluation monomorphizes over `f64`; coefficient optimization
//! monomorphizes over `crate::dual::Dual` to get a Jacobian out of the same
//! code path. Implementers on other scalar types (complex duals, `f32`,
//! interval arithmetic) only need to satisfy this trait.

use std::ops::{Add, Div, Mul, Sub};

pub trait Scalar:
    Clone + std::fmt::Debug + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> + Div<Output = Self>
{
    /// Embed a plain number with no sensitivity to any fitted parameter.
    /// Used for literal node values, raw dataset readings, and anywhere
    /// else a constant needs lifting into `Self`.
    fn from_constant(v: f64) -> Self;

    /// The scalar's plain numeric value, discarding any sensitivity
    /// information (e.g. a dual number's gradient row).
    fn to_f64(&self) -> f64;

    fn is_finite(&self) -> bool {
        self.to_f64().is_finite()
    }

    /// Produce a replacement value carrying the same "shape" as `self`
    /// (e.g. the same gradient length for a dual number) but the given
    /// plain value and zero sensitivity. Used by the non-finite
    /// sanitization pass in `crate::interpreter`.
    fn replace_with(&self, neutral: f64) -> Self;

    fn ln(&self) -> Self;
    fn exp(&self) -> Self;
    fn sin(&self) -> Self;
    fn cos(&self) -> Self;
    fn tan(&self) -> Self;
    fn sqrt(&self) -> Self;
    /// Signed cube root: must accept negative inputs and return a real
    /// value rather than NaN.
    fn cbrt(&self) -> Self;
    fn square(&self) -> Self;
}

impl Scalar for f64 {
    fn from_constant(v: f64) -> Self {
        v
    }

    fn to_f64(&self) -> f64 {
        *self
    }

    fn replace_with(&self, neutral: f64) -> Self {
        neutral
    }

    fn ln(&self) -> Self {
        f64::ln(*self)
    }

    fn exp(&self) -> Self {
        f64::exp(*self)
    }

    fn sin(&self) -> Self {
        f64::sin(*self)
    }

    fn cos(&self) -> Self {
        f64::cos(*self)
    }

    fn tan(&self) -> Self {
        f64::tan(*self)
    }

    fn sqrt(&self) -> Self {
        f64::sqrt(*self)
    }

    fn cbrt(&self) -> Self {
        // Rust's std cbrt is already signed: (-8.0).cbrt() == -2.0.
        f64::cbrt(*self)
    }

    fn square(&self) -> Self {
        self * self
    }
}
