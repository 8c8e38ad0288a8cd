//! minimizer::types — shared numeric aliases, callable signatures and
//! solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types, user-callable signatures and `argmin`
//! solver aliases used by the minimizer adapter so the rest of the code can
//! stay agnostic to `ndarray` and `argmin` generics.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for parameter vectors, gradients, residual
//!   jacobians and scalar costs (`Theta`, `Grad`, `Jac`, `Cost`).
//! - Define the boxed callable signatures accepted from users
//!   ([`ScalarFn`], [`VectorFn`], [`MatrixFn`], [`PositionalFn`],
//!   [`PositionalMatrixFn`]).
//! - Expose pre-wired BFGS / L-BFGS / Nelder–Mead aliases for the
//!   supported line searches.
//!
//! Invariants & assumptions
//! ------------------------
//! - All vectors and matrices are `ndarray` containers over `f64`.
//! - `Jac` is `m × n`: one row per residual, one column per parameter.
//! - The line-search aliases assume `argmin`'s three-parameter forms
//!   `(Param, Gradient, Float)` as of the pinned `argmin` version.
//!
//! Testing notes
//! -------------
//! - Type aliases and constants only; exercised by the surrounding modules.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    neldermead::NelderMead,
    quasinewton::{BFGS, LBFGS},
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

use crate::optimization::minimizer::params::NamedParams;

/// Parameter vector `θ`, ordered like the minimizer's parameter list.
pub type Theta = Array1<f64>;

/// Gradient vector `∇f(θ)`, matching the shape of `Theta`.
pub type Grad = Array1<f64>;

/// Residual vector `r(θ)` consumed by the least-squares path.
pub type Residuals = Array1<f64>;

/// Residual jacobian `∂r/∂θ`, `m × n`.
pub type Jac = Array2<f64>;

/// Dense square matrix (inverse Hessian, covariance).
pub type Hessian = Array2<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps `argmin` counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Default relative tolerance handed to every solver.
pub const DEFAULT_TOL: f64 = 1e-9;

// ---- User callables --------------------------------------------------------

/// Objective returning a scalar from named parameters.
pub type ScalarFn<'a> = Box<dyn Fn(&NamedParams<'_>) -> anyhow::Result<f64> + 'a>;

/// Objective returning a vector (residuals or gradient) from named parameters.
pub type VectorFn<'a> = Box<dyn Fn(&NamedParams<'_>) -> anyhow::Result<Array1<f64>> + 'a>;

/// Jacobian returning an `m × n` matrix from named parameters.
pub type MatrixFn<'a> = Box<dyn Fn(&NamedParams<'_>) -> anyhow::Result<Array2<f64>> + 'a>;

/// Constraint callable over `(data..., params...)`.
pub type PositionalFn<'a> = Box<dyn Fn(&[f64]) -> anyhow::Result<Array1<f64>> + 'a>;

/// Constraint jacobian over `(data..., params...)`.
pub type PositionalMatrixFn<'a> = Box<dyn Fn(&[f64]) -> anyhow::Result<Array2<f64>> + 'a>;

// ---- Solver aliases --------------------------------------------------------

/// Hager–Zhang line search specialized to this crate's numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// BFGS solver wired to the Hager–Zhang line search.
pub type BfgsHagerZhang = BFGS<HagerZhangLS, Cost>;

/// BFGS solver wired to the More–Thuente line search.
pub type BfgsMoreThuente = BFGS<MoreThuenteLS, Cost>;

/// Nelder–Mead simplex solver.
pub type NelderMeadSolver = NelderMead<Theta, Cost>;
