//! Public configuration and result surface of the minimizer adapter.
//!
//! - [`MinimizeOptions`] and [`Tolerances`]: configuration shared by every
//!   method.
//! - [`LineSearcher`]: choice of line search used by BFGS / L-BFGS.
//! - [`LeastSquaresOptions`]: MINPACK-style stopping rules for the
//!   least-squares path.
//! - [`ConstrainedOptions`]: feasibility tolerance for the constrained path.
//! - [`MinimizeResult`] and [`Diagnostics`]: the normalized result returned
//!   by `Minimizer::execute`.
//!
//! Convention: every option struct validates in `new(...)` and offers a
//! `Default`; plain struct literals skip validation and are re-checked when
//! `execute` starts.
use std::{collections::HashMap, str::FromStr};

use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        types::{DEFAULT_LBFGS_MEM, DEFAULT_TOL, FnEvalMap, Hessian, Residuals, Theta},
        validation::{
            validate_theta_hat, validate_value, verify_nonneg_tol, verify_step_bound, verify_tol,
        },
    },
};

/// Choice of line search used inside the BFGS and L-BFGS solvers.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Convergence tolerance and iteration cap.
///
/// - `tol`: drives the gradient-norm and cost-change tests of (L-)BFGS and
///   the simplex standard-deviation test of Nelder–Mead.
/// - `max_iter`: hard cap on iterations; `None` means `max(1000, 200·n)`
///   for `n` parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol: f64,
    pub max_iter: Option<u64>,
}

impl Tolerances {
    /// Construct validated tolerances; `tol = None` uses `1e-9`.
    ///
    /// # Errors
    /// - [`OptError::InvalidTolerance`] for a non-finite or non-positive `tol`.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(tol: Option<f64>, max_iter: Option<u64>) -> OptResult<Self> {
        let tol = tol.unwrap_or(DEFAULT_TOL);
        verify_tol("tol", tol)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol, max_iter })
    }

    /// Iteration cap for a problem with `n` parameters.
    pub fn max_iter_for(&self, n: usize) -> u64 {
        self.max_iter.unwrap_or_else(|| (200 * n as u64).max(1000))
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tol: DEFAULT_TOL, max_iter: None }
    }
}

/// Stopping rules for the Levenberg–Marquardt path (MINPACK semantics).
///
/// - `ftol`: relative reduction of the sum of squares (status 1).
/// - `xtol`: relative change of the parameter vector (status 2).
/// - `gtol`: cosine between residuals and jacobian columns (status 4);
///   `0.0` disables the test.
/// - `factor`: bound on the first step, `factor·‖D·x₀‖` (MINPACK's
///   `factor`, default `100`).
/// - `max_fev`: residual-evaluation cap (status 5); `None` means `200·(n+1)`.
///   The solver counts its budget in multiples of `n + 1`, so the cap is
///   rounded up to the next such multiple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeastSquaresOptions {
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
    pub factor: f64,
    pub max_fev: Option<u64>,
}

impl LeastSquaresOptions {
    /// # Errors
    /// - [`OptError::InvalidTolerance`] for invalid `ftol`, `xtol`, `gtol`.
    /// - [`OptError::InvalidStepBound`] for a non-positive `factor`.
    /// - [`OptError::InvalidMaxIter`] for `max_fev == Some(0)`.
    pub fn new(
        ftol: f64, xtol: f64, gtol: f64, factor: f64, max_fev: Option<u64>,
    ) -> OptResult<Self> {
        let opts = Self { ftol, xtol, gtol, factor, max_fev };
        opts.validate()?;
        Ok(opts)
    }

    pub(crate) fn validate(&self) -> OptResult<()> {
        verify_tol("ftol", self.ftol)?;
        verify_tol("xtol", self.xtol)?;
        verify_nonneg_tol("gtol", self.gtol)?;
        verify_step_bound(self.factor)?;
        if self.max_fev == Some(0) {
            return Err(OptError::InvalidMaxIter {
                max_iter: 0,
                reason: "Maximum function evaluations must be greater than zero.",
            });
        }
        Ok(())
    }

    /// Evaluation cap for a problem with `n` parameters.
    pub fn max_fev_for(&self, n: usize) -> u64 {
        self.max_fev.unwrap_or(200 * (n as u64 + 1))
    }
}

impl Default for LeastSquaresOptions {
    fn default() -> Self {
        Self { ftol: 1.49012e-8, xtol: 1.49012e-8, gtol: 0.0, factor: 100.0, max_fev: None }
    }
}

/// Feasibility setting for the SLSQP path.
///
/// - `ctol`: largest constraint violation a point may carry and still count
///   as feasible. Equality constraints are handed to SLSQP as the band
///   `|c(x)| ≤ ctol/2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstrainedOptions {
    pub ctol: f64,
}

impl ConstrainedOptions {
    /// # Errors
    /// [`OptError::InvalidTolerance`] for a non-finite or non-positive `ctol`.
    pub fn new(ctol: f64) -> OptResult<Self> {
        let opts = Self { ctol };
        opts.validate()?;
        Ok(opts)
    }

    pub(crate) fn validate(&self) -> OptResult<()> {
        verify_tol("ctol", self.ctol)
    }
}

impl Default for ConstrainedOptions {
    fn default() -> Self {
        Self { ctol: 1e-8 }
    }
}

/// Options passed to `Minimizer::execute`.
///
/// Fields:
/// - `tols: Tolerances`: convergence tolerance and iteration cap.
/// - `line_searcher: LineSearcher`: line search for BFGS / L-BFGS.
/// - `lbfgs_mem: Option<usize>`: L-BFGS history size (default 7).
/// - `verbose: bool`: if `true`, attaches an observer (behind the
///   `obs_slog` feature) and prints progress.
/// - `least_squares`, `constrained`: method-family settings, ignored by the
///   other families.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub lbfgs_mem: Option<usize>,
    pub verbose: bool,
    pub least_squares: LeastSquaresOptions,
    pub constrained: ConstrainedOptions,
}

impl MinimizeOptions {
    /// # Errors
    /// [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, lbfgs_mem: Option<usize>, verbose: bool,
    ) -> OptResult<Self> {
        let opts = Self { tols, line_searcher, lbfgs_mem, verbose, ..Self::default() };
        opts.validate()?;
        Ok(opts)
    }

    pub fn with_least_squares(mut self, least_squares: LeastSquaresOptions) -> Self {
        self.least_squares = least_squares;
        self
    }

    pub fn with_constrained(mut self, constrained: ConstrainedOptions) -> Self {
        self.constrained = constrained;
        self
    }

    /// History size actually handed to L-BFGS.
    pub fn lbfgs_mem(&self) -> usize {
        self.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM)
    }

    /// Re-check every field; used at the start of `execute`.
    pub(crate) fn validate(&self) -> OptResult<()> {
        Tolerances::new(Some(self.tols.tol), self.tols.max_iter)?;
        if self.lbfgs_mem == Some(0) {
            return Err(OptError::InvalidLBFGSMem {
                mem: 0,
                reason: "L-BFGS memory must be greater than zero.",
            });
        }
        self.least_squares.validate()?;
        self.constrained.validate()
    }
}

impl Default for MinimizeOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::default(),
            line_searcher: LineSearcher::MoreThuente,
            lbfgs_mem: None,
            verbose: false,
            least_squares: LeastSquaresOptions::default(),
            constrained: ConstrainedOptions::default(),
        }
    }
}

/// Solver-specific pass-through diagnostics.
///
/// - `nfev` / `njev`: objective and derivative evaluations made by the
///   adapter (finite-difference evaluations included in `nfev`).
/// - `fn_evals`: raw `argmin` counters, e.g. `cost_count`, `gradient_count`.
/// - `fvec`: residual vector at the solution (least squares only).
/// - `grad_norm`: norm of the last available gradient, if any.
/// - `max_violation`: largest constraint violation at `popt`, constrained
///   path only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub nfev: u64,
    pub njev: u64,
    pub fn_evals: FnEvalMap,
    pub fvec: Option<Residuals>,
    pub grad_norm: Option<f64>,
    pub max_violation: Option<f64>,
}

/// Normalized result of one `execute` call.
///
/// - `popt`: best parameter vector, same length and order as the
///   minimizer's parameters.
/// - `value`: true objective at `popt` (sum of squared residuals for least
///   squares).
/// - `ier`: iteration count for general methods, MINPACK status code for
///   least squares, objective-evaluation count for SLSQP.
/// - `converged` / `message`: termination summary; non-convergence is data.
/// - `covariance`: always `None`. The slot is reserved for a results layer
///   that derives parameter uncertainties from the fit.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeResult {
    pub names: Vec<String>,
    pub popt: Theta,
    pub value: f64,
    pub ier: i64,
    pub message: String,
    pub converged: bool,
    pub iterations: usize,
    pub diagnostics: Diagnostics,
    pub covariance: Option<Hessian>,
}

impl MinimizeResult {
    /// Build a validated result from raw solver output.
    ///
    /// # Errors
    /// - [`OptError::MissingThetaHat`] / [`OptError::InvalidThetaHat`] for a
    ///   missing or non-finite best vector.
    /// - [`OptError::NonFiniteCost`] for a non-finite objective value.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        names: Vec<String>, popt: Option<Theta>, value: f64, ier: i64, message: String,
        converged: bool, iterations: u64, diagnostics: Diagnostics,
    ) -> OptResult<Self> {
        let popt = validate_theta_hat(popt)?;
        validate_value(value)?;
        Ok(Self {
            names,
            popt,
            value,
            ier,
            message,
            converged,
            iterations: iterations as usize,
            diagnostics,
            covariance: None,
        })
    }

    /// Best value of the named parameter.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names.iter().position(|n| n == name).map(|i| self.popt[i])
    }

    /// Best values keyed by parameter name.
    pub fn to_map(&self) -> HashMap<String, f64> {
        self.names.iter().cloned().zip(self.popt.iter().copied()).collect()
    }

    /// Objective evaluations made during the run.
    pub fn nfev(&self) -> u64 {
        self.diagnostics.nfev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn defaults_are_valid_and_documented_values() {
        let opts = MinimizeOptions::default();
        assert!(opts.validate().is_ok());
        assert_eq!(opts.tols.tol, 1e-9);
        assert_eq!(opts.lbfgs_mem(), 7);
        assert_eq!(opts.least_squares.gtol, 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Without an explicit cap the iteration budget scales with the
    // parameter count but never drops below 1000.
    fn max_iter_defaults_scale_with_dimension() {
        let tols = Tolerances::default();
        assert_eq!(tols.max_iter_for(2), 1000);
        assert_eq!(tols.max_iter_for(10), 2000);
        assert_eq!(Tolerances::new(None, Some(5)).unwrap().max_iter_for(10), 5);
        assert_eq!(LeastSquaresOptions::default().max_fev_for(1), 400);
    }

    #[test]
    fn invalid_settings_are_configuration_errors() {
        let errs = [
            Tolerances::new(Some(-1.0), None).unwrap_err(),
            Tolerances::new(None, Some(0)).unwrap_err(),
            LeastSquaresOptions::new(1e-8, 1e-8, 0.0, 0.0, None).unwrap_err(),
            LeastSquaresOptions::new(1e-8, 1e-8, -1.0, 100.0, None).unwrap_err(),
            ConstrainedOptions::new(0.0).unwrap_err(),
            MinimizeOptions::new(Tolerances::default(), LineSearcher::HagerZhang, Some(0), false)
                .unwrap_err(),
            "Wolfe".parse::<LineSearcher>().unwrap_err(),
        ];
        assert!(errs.iter().all(OptError::is_configuration));
    }

    #[test]
    // Purpose
    // -------
    // Results expose best values by name and reject non-finite estimates.
    fn result_is_validated_and_indexable_by_name() {
        // Arrange
        let names = vec!["a".to_string(), "b".to_string()];

        // Act
        let ok = MinimizeResult::new(
            names.clone(),
            Some(array![3.0, -2.0]),
            0.0,
            12,
            "converged".into(),
            true,
            12,
            Diagnostics::default(),
        )
        .unwrap();
        let bad = MinimizeResult::new(
            names,
            Some(array![f64::NAN, 0.0]),
            0.0,
            0,
            String::new(),
            false,
            0,
            Diagnostics::default(),
        );

        // Assert
        assert_eq!(ok.get("b"), Some(-2.0));
        assert_eq!(ok.get("c"), None);
        assert_eq!(ok.to_map()["a"], 3.0);
        assert!(matches!(bad, Err(OptError::InvalidThetaHat { index: 0, .. })));
    }
}
