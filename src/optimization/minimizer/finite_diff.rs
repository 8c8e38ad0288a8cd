//! minimizer::finite_diff — finite-difference gradients and residual
//! jacobians with error capture.
//!
//! Purpose
//! -------
//! Estimate derivatives when the user did not supply a jacobian, without
//! losing errors raised by the objective while the difference stencil is
//! evaluated.
//!
//! Key behaviors
//! -------------
//! - [`fd_gradient`]: central differences via `finitediff`, falling back to
//!   forward differences only when the central estimate is not finite. A
//!   user error raised at any stencil point ends the estimate immediately.
//! - [`fd_jacobian`]: forward differences column by column for an `m × n`
//!   residual jacobian, reusing the residuals at the base point.
//!
//! Invariants & assumptions
//! ------------------------
//! - `finitediff` closures must return a bare `f64`; the first error raised
//!   inside them is parked in an [`ErrorSlot`] and the closure yields `NaN`.
//!   A parked error always wins over the numerical estimate, except a
//!   non-finite-value error, which only triggers the forward pass.
//! - Returned derivatives satisfy [`validate_grad`] / [`validate_jacobian`].
//!
//! Conventions
//! -----------
//! - Derivatives are taken with respect to whatever vector the caller
//!   passes in; adapters differentiate in the solver's internal space.
use std::cell::RefCell;

use finitediff::FiniteDiff;
use ndarray::Array2;

use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        types::{Grad, Jac, Residuals, Theta},
        validation::{validate_grad, validate_jacobian, validate_residuals},
    },
};

/// Relative step for forward-difference jacobian columns, `√ε`.
pub const FD_REL_STEP: f64 = 1.4901161193847656e-8;

/// Holds the first error raised inside a finite-difference closure.
#[derive(Debug, Default)]
pub(crate) struct ErrorSlot(RefCell<Option<OptError>>);

impl ErrorSlot {
    /// Keep `err` unless an earlier error is already parked.
    pub(crate) fn record(&self, err: OptError) {
        let mut slot = self.0.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    pub(crate) fn take(&self) -> Option<OptError> {
        self.0.borrow_mut().take()
    }

    pub(crate) fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }
}

/// Finite-difference gradient of a fallible scalar function.
///
/// Central differences are tried first. When the estimate is not finite
/// (a stencil point produced a non-finite value) the gradient is recomputed with
/// forward differences.
///
/// # Errors
/// - The first error raised by `func` that is not a non-finite-value error
///   ([`OptError::is_non_finite`]), e.g. [`OptError::Callable`], on either
///   pass.
/// - Any error raised by `func` on the forward-difference pass.
/// - [`OptError::InvalidGradient`] when the forward estimate is not finite.
pub fn fd_gradient<F>(theta: &Theta, func: &F) -> OptResult<Grad>
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    let slot = ErrorSlot::default();
    let guarded = |x: &Theta| -> f64 {
        func(x).unwrap_or_else(|err| {
            slot.record(err);
            f64::NAN
        })
    };
    let central = theta.central_diff(&guarded);
    match slot.take() {
        Some(err) if !err.is_non_finite() => return Err(err),
        Some(_) => {}
        None if validate_grad(&central, theta.len()).is_ok() => return Ok(central),
        None => {}
    }
    let forward = theta.forward_diff(&guarded);
    if let Some(err) = slot.take() {
        return Err(err);
    }
    validate_grad(&forward, theta.len())?;
    Ok(forward)
}

/// Forward-difference residual jacobian (`m × n`) at `theta`.
///
/// `fvec` must hold the residuals at `theta`; each column costs one extra
/// residual evaluation with step `FD_REL_STEP·|θ_j|` (or `FD_REL_STEP` when
/// `θ_j == 0`).
///
/// # Errors
/// - Any error raised by `func`.
/// - [`OptError::ResidualDimMismatch`] if a shifted point changes the residual length.
/// - [`OptError::InvalidJacobian`] for non-finite entries.
pub fn fd_jacobian<F>(theta: &Theta, fvec: &Residuals, func: &F) -> OptResult<Jac>
where
    F: Fn(&Theta) -> OptResult<Residuals>,
{
    let (m, n) = (fvec.len(), theta.len());
    let mut jac = Array2::<f64>::zeros((m, n));
    let mut shifted_theta = theta.clone();
    for j in 0..n {
        let step = match FD_REL_STEP * theta[j].abs() {
            h if h == 0.0 => FD_REL_STEP,
            h => h,
        };
        shifted_theta[j] = theta[j] + step;
        let shifted = func(&shifted_theta)?;
        validate_residuals(&shifted, Some(m))?;
        jac.column_mut(j).assign(&((&shifted - fvec) / step));
        shifted_theta[j] = theta[j];
    }
    validate_jacobian(&jac, m, n)?;
    Ok(jac)
}
