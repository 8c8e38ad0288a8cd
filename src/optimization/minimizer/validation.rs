//! Validation helpers for the minimizer adapter.
//!
//! This module centralizes the consistency checks used across the
//! minimizer interface:
//!
//! - **Option checks**: [`verify_tol`], [`verify_nonneg_tol`],
//!   [`verify_step_bound`] ensure numeric settings are finite and in range.
//! - **Derivative validation**: [`validate_grad`] and [`validate_jacobian`]
//!   enforce the expected shape and finite entries.
//! - **Objective outputs**: [`validate_value`] and [`validate_residuals`]
//!   reject non-finite objective results.
//! - **Parameter estimates**: [`validate_theta_hat`] ensures a best vector
//!   exists and contains only finite values.
//!
//! All helpers return domain-specific [`OptError`] variants so that checks
//! raised inside solver callbacks can be re-surfaced verbatim.
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::types::{Grad, Jac, Residuals, Theta},
};

/// Validate a strictly positive tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolerance`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol(name: &'static str, tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidTolerance { name, tol, reason: "Tolerance must be finite." });
    }
    if tol <= 0.0 {
        return Err(OptError::InvalidTolerance {
            name,
            tol,
            reason: "Tolerance must be positive.",
        });
    }
    Ok(())
}

/// Validate a tolerance where `0.0` disables the test (e.g. `gtol`).
///
/// # Errors
/// Returns [`OptError::InvalidTolerance`] if the value is non-finite or < 0.0.
pub fn verify_nonneg_tol(name: &'static str, tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidTolerance { name, tol, reason: "Tolerance must be finite." });
    }
    if tol < 0.0 {
        return Err(OptError::InvalidTolerance {
            name,
            tol,
            reason: "Tolerance must be non-negative.",
        });
    }
    Ok(())
}

/// Validate a step bound: finite and strictly positive.
///
/// # Errors
/// Returns [`OptError::InvalidStepBound`] otherwise.
pub fn verify_step_bound(value: f64) -> OptResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(OptError::InvalidStepBound {
            value,
            reason: "Step bound factor must be positive and finite.",
        });
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate a residual jacobian: shape `m × n`, all entries finite.
///
/// # Errors
/// - [`OptError::JacobianDimMismatch`] if the shape is not `(m, n)`.
/// - [`OptError::InvalidJacobian`] for the first non-finite entry.
pub fn validate_jacobian(jac: &Jac, m: usize, n: usize) -> OptResult<()> {
    if jac.dim() != (m, n) {
        return Err(OptError::JacobianDimMismatch { expected: (m, n), found: jac.dim() });
    }
    for ((row, col), &value) in jac.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidJacobian { row, col, value });
        }
    }
    Ok(())
}

/// Validate a residual vector against an expected length (if known) and
/// finiteness. An empty residual vector is always rejected.
///
/// # Errors
/// - [`OptError::ResidualDimMismatch`] for an empty vector or a length that
///   differs from `expected`.
/// - [`OptError::InvalidResidual`] for the first non-finite entry.
pub fn validate_residuals(fvec: &Residuals, expected: Option<usize>) -> OptResult<()> {
    let found = fvec.len();
    if found == 0 || expected.is_some_and(|m| m != found) {
        return Err(OptError::ResidualDimMismatch { expected: expected.unwrap_or(1), found });
    }
    for (index, &value) in fvec.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidResidual { index, value });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector.
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let t = theta_hat.ok_or(OptError::MissingThetaHat)?;
    for (index, &value) in t.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaHat {
                index,
                value,
                reason: "Parameter estimates must be finite.",
            });
        }
    }
    Ok(t)
}

/// Validate that a scalar objective value is finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn tolerances_must_be_finite_and_positive() {
        assert!(verify_tol("tol", 1e-8).is_ok());
        assert!(matches!(
            verify_tol("tol", 0.0),
            Err(OptError::InvalidTolerance { name: "tol", .. })
        ));
        assert!(verify_tol("tol", f64::NAN).is_err());
        assert!(verify_nonneg_tol("gtol", 0.0).is_ok());
        assert!(verify_nonneg_tol("gtol", -1.0).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Jacobian validation reports shape problems before entry problems.
    fn jacobian_validation_checks_shape_then_entries() {
        // Arrange
        let wrong_shape = array![[1.0, 2.0]];
        let non_finite = array![[1.0], [f64::INFINITY]];

        // Act
        let shape_err = validate_jacobian(&wrong_shape, 2, 1).unwrap_err();
        let entry_err = validate_jacobian(&non_finite, 2, 1).unwrap_err();

        // Assert
        assert!(matches!(
            shape_err,
            OptError::JacobianDimMismatch { expected: (2, 1), found: (1, 2) }
        ));
        assert!(matches!(entry_err, OptError::InvalidJacobian { row: 1, col: 0, .. }));
    }

    #[test]
    fn residuals_must_be_non_empty_stable_and_finite() {
        assert!(validate_residuals(&array![1.0, 2.0], Some(2)).is_ok());
        assert!(validate_residuals(&array![], None).is_err());
        assert!(matches!(
            validate_residuals(&array![1.0], Some(2)),
            Err(OptError::ResidualDimMismatch { expected: 2, found: 1 })
        ));
        assert!(matches!(
            validate_residuals(&array![0.0, f64::NAN], None),
            Err(OptError::InvalidResidual { index: 1, .. })
        ));
    }

    #[test]
    fn theta_hat_must_exist_and_be_finite() {
        assert!(matches!(validate_theta_hat(None), Err(OptError::MissingThetaHat)));
        assert!(validate_theta_hat(Some(array![1.0, f64::NAN])).is_err());
        assert_eq!(validate_theta_hat(Some(array![1.0])).unwrap(), array![1.0]);
    }

    #[test]
    fn gradient_validation_rejects_wrong_length() {
        assert!(matches!(
            validate_grad(&array![1.0], 2),
            Err(OptError::GradientDimMismatch { expected: 2, found: 1 })
        ));
        assert!(validate_value(f64::NEG_INFINITY).is_err());
    }
}
