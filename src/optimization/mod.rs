//! optimization — minimizer adapter, bound transforms, and unified error
//! surface.
//!
//! Purpose
//! -------
//! Provide one optimization layer for fitting named-parameter models:
//! callers describe an objective over named parameters, pick a method, and
//! obtain fitted parameters and diagnostics without touching backend solver
//! details.
//!
//! Key behaviors
//! -------------
//! - Expose the [`minimizer`] adapter: construction with capability checks,
//!   dispatch to BFGS / Nelder–Mead / bounded L-BFGS / SLSQP /
//!   Levenberg–Marquardt, and result normalization.
//! - Supply the change-of-variables primitives ([`numerical_stability`])
//!   that let unconstrained solvers honor per-parameter bounds.
//! - Normalize configuration issues, user-callable failures and backend
//!   solver errors into a single enum ([`errors::OptError`]) with a common
//!   result alias ([`errors::OptResult`]).
//!
//! Conventions
//! -----------
//! - Public entry points that can fail return `OptResult<T>`; callers never
//!   see raw `argmin` errors.
//! - This module emits `tracing` debug events for dispatch decisions and
//!   never installs a subscriber; verbose solver progress is opt-in through
//!   the `obs_slog` feature.
//!
//! Downstream usage
//! ----------------
//! - Front-ends typically import the curated surface via
//!   `optimization::prelude::*`, which forwards the submodule preludes and
//!   the core error types.

pub mod errors;
pub mod minimizer;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_minimizers::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::minimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
