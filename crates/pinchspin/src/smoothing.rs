//! Frame-over-frame exponential smoothing.
//!
//! Unlike a stateful filter, nothing here remembers the previous value: the caller passes in the
//! current (already smoothed) value and stores the returned one in its place.

use std::fmt;

use nalgebra::{Point3, Vector2, Vector3};

/// Linear interpolation between a current value and a target.
pub trait Lerp: Sized {
    /// Moves `self` a fraction `factor` of the way toward `target`.
    fn lerp_to(&self, target: &Self, factor: f32) -> Self;
}

/// `current + (target - current) * factor`.
#[inline]
pub fn lerp_scalar(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// Component-wise [`lerp_scalar`].
#[inline]
pub fn lerp_vector<const N: usize>(current: [f32; N], target: [f32; N], factor: f32) -> [f32; N] {
    let mut out = current;
    for (out, target) in out.iter_mut().zip(target) {
        *out = lerp_scalar(*out, target, factor);
    }
    out
}

impl Lerp for f32 {
    #[inline]
    fn lerp_to(&self, target: &Self, factor: f32) -> Self {
        lerp_scalar(*self, *target, factor)
    }
}

impl<const N: usize> Lerp for [f32; N] {
    #[inline]
    fn lerp_to(&self, target: &Self, factor: f32) -> Self {
        lerp_vector(*self, *target, factor)
    }
}

impl Lerp for Vector2<f32> {
    fn lerp_to(&self, target: &Self, factor: f32) -> Self {
        self.zip_map(target, |c, t| lerp_scalar(c, t, factor))
    }
}

impl Lerp for Vector3<f32> {
    fn lerp_to(&self, target: &Self, factor: f32) -> Self {
        self.zip_map(target, |c, t| lerp_scalar(c, t, factor))
    }
}

impl Lerp for Point3<f32> {
    fn lerp_to(&self, target: &Self, factor: f32) -> Self {
        Point3::from(self.coords.lerp_to(&target.coords, factor))
    }
}

/// A validated smoothing factor.
///
/// A factor of 1.0 jumps straight to the target; values closer to 0.0 follow it more slowly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothing {
    factor: f32,
}

impl Smoothing {
    /// Creates a smoothing step with the given factor.
    ///
    /// # Panics
    ///
    /// This method will panic if `factor` is not greater than 0.0 and at most 1.0.
    pub fn new(factor: f32) -> Self {
        assert!(
            factor > 0.0 && factor <= 1.0,
            "smoothing factor {factor} out of range"
        );
        Self { factor }
    }

    /// Like [`Smoothing::new`], but returns an error instead of panicking.
    pub fn try_new(factor: f32) -> Result<Self, InvalidFactor> {
        if factor > 0.0 && factor <= 1.0 {
            Ok(Self { factor })
        } else {
            Err(InvalidFactor { factor })
        }
    }

    #[inline]
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Performs one smoothing step from `current` toward `target`.
    #[inline]
    pub fn step<T: Lerp>(&self, current: &T, target: &T) -> T {
        current.lerp_to(target, self.factor)
    }

    /// Performs one smoothing step in place.
    #[inline]
    pub fn apply<T: Lerp>(&self, current: &mut T, target: &T) {
        *current = self.step(current, target);
    }
}

/// Error returned by [`Smoothing::try_new`] for factors outside of `(0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidFactor {
    pub factor: f32,
}

impl fmt::Display for InvalidFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "smoothing factor {} is not in range (0.0, 1.0]",
            self.factor
        )
    }
}

impl std::error::Error for InvalidFactor {}
