//! Bound transforms between internal (unconstrained) and external
//! (bounded) parameter space.
//!
//! Unconstrained solvers work on an internal coordinate `t ∈ ℝ`; the model
//! sees the external value `x`. The maps follow the MINPACK `leastsqbound`
//! convention:
//!
//! - two-sided `[lo, hi]`: `x = lo + (hi − lo)·(sin t + 1)/2`
//! - lower only `[lo, ∞)`: `x = lo − 1 + √(t² + 1)`
//! - upper only `(−∞, hi]`: `x = hi + 1 − √(t² + 1)`
//! - unbounded: `x = t`
//!
//! Every map is smooth and surjective onto the closed feasible interval, so
//! an optimum sitting on a bound is reached at a finite `t`.
//!
//! # Provided items
//! - [`BoundKind`]: classification of a `(min, max)` pair.
//! - [`to_external`], [`to_internal`], [`external_derivative`]: the map, its
//!   inverse, and `dx/dt` for the chain rule.
//! - [`BOUNDARY_NUDGE`]: internal offset applied when a start value sits
//!   exactly on a bound, where `dx/dt = 0`.

use std::f64::consts::FRAC_PI_2;

/// Internal offset used to move a start value off a bound.
///
/// At `x = lo` or `x = hi` the derivative `dx/dt` vanishes, so a gradient
/// solver started there would see a zero gradient in that coordinate.
pub const BOUNDARY_NUDGE: f64 = 1e-2;

/// Shape of the feasible interval of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundKind {
    Free,
    Lower(f64),
    Upper(f64),
    Both(f64, f64),
}

impl BoundKind {
    /// Classify a `(min, max)` pair, treating infinities as absent bounds.
    pub fn from_pair(min: f64, max: f64) -> Self {
        match (min.is_finite(), max.is_finite()) {
            (false, false) => BoundKind::Free,
            (true, false) => BoundKind::Lower(min),
            (false, true) => BoundKind::Upper(max),
            (true, true) => BoundKind::Both(min, max),
        }
    }
}

/// Map an internal coordinate to the external (bounded) value.
pub fn to_external(t: f64, kind: BoundKind) -> f64 {
    match kind {
        BoundKind::Free => t,
        BoundKind::Lower(lo) => lo - 1.0 + (t * t + 1.0).sqrt(),
        BoundKind::Upper(hi) => hi + 1.0 - (t * t + 1.0).sqrt(),
        BoundKind::Both(lo, hi) => lo + 0.5 * (hi - lo) * (t.sin() + 1.0),
    }
}

/// Map an external value to an internal coordinate.
///
/// Values outside the feasible interval are clamped onto it first. A value
/// exactly on a bound is moved [`BOUNDARY_NUDGE`] into the interior of
/// internal space so the start point has a usable gradient.
pub fn to_internal(x: f64, kind: BoundKind) -> f64 {
    match kind {
        BoundKind::Free => x,
        BoundKind::Lower(lo) => {
            let shifted = x.max(lo) - lo + 1.0;
            (shifted * shifted - 1.0).sqrt().max(BOUNDARY_NUDGE)
        }
        BoundKind::Upper(hi) => {
            let shifted = hi - x.min(hi) + 1.0;
            (shifted * shifted - 1.0).sqrt().max(BOUNDARY_NUDGE)
        }
        BoundKind::Both(lo, hi) => {
            if hi == lo {
                return 0.0;
            }
            let scaled = (2.0 * (x.clamp(lo, hi) - lo) / (hi - lo) - 1.0).clamp(-1.0, 1.0);
            scaled.asin().clamp(-FRAC_PI_2 + BOUNDARY_NUDGE, FRAC_PI_2 - BOUNDARY_NUDGE)
        }
    }
}

/// Derivative `dx/dt` of [`to_external`] at internal coordinate `t`.
pub fn external_derivative(t: f64, kind: BoundKind) -> f64 {
    match kind {
        BoundKind::Free => 1.0,
        BoundKind::Lower(_) => t / (t * t + 1.0).sqrt(),
        BoundKind::Upper(_) => -t / (t * t + 1.0).sqrt(),
        BoundKind::Both(lo, hi) => 0.5 * (hi - lo) * t.cos(),
    }
}
