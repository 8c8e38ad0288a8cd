//! numerical_stability — bound transforms and shared numeric tolerances.
//!
//! Purpose
//! -------
//! Collect the smooth changes of variables that let unconstrained `argmin`
//! solvers honor per-parameter bounds, together with the small tolerances
//! shared across the minimizer layer.
//!
//! Key behaviors
//! -------------
//! - Classify `(min, max)` pairs into [`BoundKind`] (free, lower, upper,
//!   two-sided).
//! - Map internal coordinates to feasible external values
//!   ([`to_external`]) and back ([`to_internal`]), nudging start values that
//!   sit exactly on a bound.
//! - Provide `dx/dt` ([`external_derivative`]) so gradients and jacobians can
//!   be carried between the two spaces by the chain rule.
//!
//! Invariants & assumptions
//! ------------------------
//! - Bounds are validated upstream (`min <= max`, no NaN); infinities denote
//!   absent bounds.
//! - `to_external` always returns a value inside the closed feasible
//!   interval.
//!
//! Conventions
//! -----------
//! - Pure functions on `f64`; no logging, allocation or global state.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] cover round trips on interior values,
//!   feasibility of the image, agreement of the derivative with central
//!   differences, and the boundary nudge.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    BOUNDARY_NUDGE, BoundKind, external_derivative, to_external, to_internal,
};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::transformations::{BoundKind, to_external, to_internal};
}
