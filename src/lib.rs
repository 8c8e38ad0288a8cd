//! rust_minimizers — named-parameter minimization over `argmin`.
//!
//! Purpose
//! -------
//! Serve as the crate root. The crate adapts an objective written against
//! named parameters, with optional bounds, constraints and analytic
//! derivatives, to a small set of numerical routines and normalizes their
//! output into one result record.
//!
//! Key behaviors
//! -------------
//! - Re-export the [`optimization`] tree as the public crate surface.
//! - Keep all numerical work in library solvers: `argmin` for the general
//!   methods, `slsqp` for constrained problems and `levenberg-marquardt`
//!   for least squares.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use rust_minimizers::optimization::prelude::*;
//!
//! let params = vec![Parameter::new("a", 0.0)?, Parameter::new("b", 0.0)?];
//! let objective = Objective::scalar(|p: &NamedParams<'_>| -> anyhow::Result<f64> {
//!     Ok((p["a"] - 3.0).powi(2) + (p["b"] + 2.0).powi(2))
//! });
//! let minimizer = Minimizer::new(Method::Bfgs, params, objective)?;
//! let result = minimizer.execute(&MinimizeOptions::default())?;
//! println!("a = {:?}, converged = {}", result.get("a"), result.converged);
//! # Ok::<(), OptError>(())
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests live beside the code; end-to-end behavior is covered by
//!   `tests/integration_minimizers.rs`.

pub mod optimization;
