//! minimizer — named-parameter minimizer adapter over `argmin`.
//!
//! Purpose
//! -------
//! Turn an objective written against **named parameters** (plus optional
//! bounds, constraints and analytic derivatives) into a call against one of
//! a few numerical routines, and normalize what comes back into a single
//! [`MinimizeResult`]. The mathematics lives in `argmin`, `slsqp` and
//! `levenberg-marquardt`; this module is the glue: marshaling, bounds
//! plumbing, constraint translation and capability checks.
//!
//! Key behaviors
//! -------------
//! - [`Minimizer`] bundles a [`Method`], an ordered parameter list, an
//!   [`Objective`] and the optional [`Derivative`] / [`Constraint`]s.
//!   Requests a method cannot honor are rejected at construction.
//! - [`Minimizer::execute`] dispatches on the method:
//!   - `Bfgs` / `LBfgsB`: BFGS / L-BFGS ([`builders`]), bounds via the
//!     change of variables in [`crate::optimization::numerical_stability`];
//!   - `NelderMead`: simplex search;
//!   - `Slsqp`: sequential least squares programming ([`sqp`]) with
//!     native bounds;
//!   - `Minpack`: Levenberg–Marquardt ([`levenberg_marquardt`]).
//! - Missing derivatives are estimated by finite differences
//!   ([`finite_diff`]) inside the adapters ([`adapter`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - `popt` always has the length and order of the parameter list.
//! - Non-convergence is data (`converged`, `message`); only configuration
//!   problems and failing user callables are errors.
//! - All solver state is request-scoped: nothing outlives one `execute`.
//!
//! Conventions
//! -----------
//! - User callables return `anyhow::Result`; their errors come back as
//!   [`OptError::Callable`](crate::optimization::errors::OptError::Callable),
//!   downcastable to the user's own type.
//! - `ier` is the iteration count for general methods and the MINPACK
//!   status code for least squares (`1`–`8`, `0` when the solver aborted).
//!   `Slsqp` reports its objective-evaluation count.
//!
//! Testing notes
//! -------------
//! - Unit tests in each submodule cover marshaling, constraint translation,
//!   option validation, finite differences, the LM status mapping, the
//!   SLSQP constraint encoding and dispatch.
//! - `tests/integration_minimizers.rs` drives [`Minimizer`] end to end on
//!   small quadratic and residual problems.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod capabilities;
pub mod constraints;
pub mod finite_diff;
pub mod levenberg_marquardt;
pub mod params;
pub mod run;
pub mod sqp;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{Derivative, Minimizer, Objective};
pub use self::capabilities::{Capabilities, Method};
pub use self::constraints::{Constraint, ConstraintType, DataContext, Relation};
pub use self::params::{NamedParams, ParamLayout, Parameter};
pub use self::traits::{
    ConstrainedOptions, Diagnostics, LeastSquaresOptions, LineSearcher, MinimizeOptions,
    MinimizeResult, Tolerances,
};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, DEFAULT_TOL, FnEvalMap, Grad, Jac, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_minimizers::optimization::minimizer::prelude::*;
//
// to import the main minimizer surface in a single line.

pub mod prelude {
    pub use super::api::{Derivative, Minimizer, Objective};
    pub use super::capabilities::Method;
    pub use super::constraints::{Constraint, DataContext, Relation};
    pub use super::params::{NamedParams, Parameter};
    pub use super::traits::{LineSearcher, MinimizeOptions, MinimizeResult, Tolerances};
    pub use super::types::Theta;
}
