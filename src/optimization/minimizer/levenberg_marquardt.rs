//! minimizer::levenberg_marquardt — nonlinear least squares through the
//! `levenberg-marquardt` crate, reported with MINPACK status codes.
//!
//! Purpose
//! -------
//! Minimize `‖r(t)‖²` for the residual adapter with the MINPACK `lmder`
//! port from the `levenberg-marquardt` crate and translate its
//! [`TerminationReason`] into the conventional `ier` codes.
//!
//! Key behaviors
//! -------------
//! - [`solve_least_squares`] runs the solver and returns the point with the
//!   smallest sum of squares, its residuals and the mapped status.
//! - Status codes: `1` relative reduction ≤ `ftol`, `2` relative step ≤
//!   `xtol`, `3` both, `4` gradient cosine ≤ `gtol` (this includes zero
//!   residuals), `5` evaluation budget exhausted, `6`–`8` `ftol`, `xtol` or
//!   `gtol` too small for further progress, `0` run aborted.
//!
//! Invariants & assumptions
//! ------------------------
//! - Only codes `1`–`4` count as converged.
//! - An error parked by the adapter wins over the solver's report, except a
//!   non-finite value once a finite point exists: that ends the run as
//!   non-converged data.
use levenberg_marquardt::{LevenbergMarquardt, TerminationReason};
use tracing::debug;

use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        adapter::ResidualAdapter,
        traits::LeastSquaresOptions,
        types::{Residuals, Theta},
    },
};

/// MINPACK-style termination status of a least-squares run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LmStatus {
    /// Relative reduction of the sum of squares at most `ftol`.
    Ftol,
    /// Relative change between iterates at most `xtol`.
    Xtol,
    /// `Ftol` and `Xtol` both hold.
    FtolXtol,
    /// Residuals orthogonal to the jacobian columns up to `gtol`.
    Gtol,
    /// Residual-evaluation budget exhausted.
    MaxFev,
    FtolTooSmall,
    XtolTooSmall,
    GtolTooSmall,
    /// The run stopped on a failed residual or jacobian evaluation.
    Aborted(&'static str),
}

impl LmStatus {
    pub fn from_termination(reason: &TerminationReason) -> Self {
        match reason {
            TerminationReason::Converged { ftol: true, xtol: true } => LmStatus::FtolXtol,
            TerminationReason::Converged { ftol: true, xtol: false } => LmStatus::Ftol,
            TerminationReason::Converged { .. } => LmStatus::Xtol,
            TerminationReason::ResidualsZero | TerminationReason::Orthogonal => LmStatus::Gtol,
            TerminationReason::LostPatience => LmStatus::MaxFev,
            TerminationReason::NoImprovementPossible("ftol") => LmStatus::FtolTooSmall,
            TerminationReason::NoImprovementPossible("xtol") => LmStatus::XtolTooSmall,
            TerminationReason::NoImprovementPossible(_) => LmStatus::GtolTooSmall,
            TerminationReason::User(what)
            | TerminationReason::Numerical(what)
            | TerminationReason::WrongDimensions(what) => LmStatus::Aborted(*what),
            TerminationReason::NoParameters => LmStatus::Aborted("parameters"),
            TerminationReason::NoResiduals => LmStatus::Aborted("residuals"),
        }
    }

    /// Integer status code (`ier`).
    pub fn code(self) -> i64 {
        match self {
            LmStatus::Aborted(_) => 0,
            LmStatus::Ftol => 1,
            LmStatus::Xtol => 2,
            LmStatus::FtolXtol => 3,
            LmStatus::Gtol => 4,
            LmStatus::MaxFev => 5,
            LmStatus::FtolTooSmall => 6,
            LmStatus::XtolTooSmall => 7,
            LmStatus::GtolTooSmall => 8,
        }
    }

    pub fn converged(self) -> bool {
        (1..=4).contains(&self.code())
    }

    pub fn message(self, opts: &LeastSquaresOptions, max_fev: u64) -> String {
        match self {
            LmStatus::Ftol => format!(
                "Both actual and predicted relative reductions in the sum of squares are at most {}",
                opts.ftol
            ),
            LmStatus::Xtol => {
                format!("The relative error between two consecutive iterates is at most {}", opts.xtol)
            }
            LmStatus::FtolXtol => format!(
                "Both actual and predicted relative reductions in the sum of squares are at most {} \
                 and the relative error between two consecutive iterates is at most {}",
                opts.ftol, opts.xtol
            ),
            LmStatus::Gtol => format!(
                "The cosine of the angle between the residuals and any column of the jacobian is \
                 at most {} in absolute value",
                opts.gtol
            ),
            LmStatus::MaxFev => {
                format!("Number of calls to the residual function has reached max_fev = {max_fev}")
            }
            LmStatus::FtolTooSmall => format!(
                "ftol = {} is too small. No further reduction in the sum of squares is possible",
                opts.ftol
            ),
            LmStatus::XtolTooSmall => format!(
                "xtol = {} is too small. No further improvement in the approximate solution is \
                 possible",
                opts.xtol
            ),
            LmStatus::GtolTooSmall => format!(
                "gtol = {} is too small. The residuals are orthogonal to the columns of the \
                 jacobian to machine precision",
                opts.gtol
            ),
            LmStatus::Aborted(what) => format!("Least-squares run aborted: invalid {what}"),
        }
    }
}

/// Outcome of one least-squares run, in internal coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresSolve {
    /// Point with the smallest sum of squares.
    pub t: Theta,
    /// Residuals at `t`.
    pub fvec: Residuals,
    pub status: LmStatus,
    pub message: String,
    /// Jacobian evaluations, one per outer iteration.
    pub iterations: u64,
    /// Residual evaluations counted by the solver.
    pub evaluations: u64,
}

/// Run `solver` on `adapter` from the adapter's current point.
///
/// `max_fev` is the cap the solver applies; it only appears in the status
/// message.
///
/// # Errors
/// - The first error parked by the adapter, e.g. [`OptError::Callable`]
///   or a jacobian shape error.
/// - A non-finite-value error when no finite point was ever evaluated.
/// - [`OptError::MissingThetaHat`] when the solver never evaluated the
///   residuals.
pub fn solve_least_squares(
    solver: &LevenbergMarquardt<f64>, adapter: ResidualAdapter<'_>, opts: &LeastSquaresOptions,
    max_fev: u64,
) -> OptResult<LeastSquaresSolve> {
    let (adapter, report) = solver.minimize(adapter);
    let status = LmStatus::from_termination(&report.termination);
    debug!(
        termination = ?report.termination,
        evaluations = report.number_of_evaluations,
        objective = report.objective_function,
        "levenberg-marquardt finished"
    );
    let mut message = status.message(opts, max_fev);
    let (t, fvec) = match (adapter.take_failure(), adapter.take_best()) {
        (Some(err), _) if !err.is_non_finite() => return Err(err),
        (Some(err), None) => return Err(err),
        (None, None) => return Err(OptError::MissingThetaHat),
        (Some(err), Some(best)) => {
            message = format!("{message}: {err}");
            best
        }
        (None, Some(best)) => best,
    };
    Ok(LeastSquaresSolve {
        t,
        fvec,
        status,
        message,
        iterations: adapter.iterations(),
        evaluations: report.number_of_evaluations as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::minimizer::{
        adapter::{EvalCounters, MatrixRef, VectorRef},
        builders::{build_levenberg_marquardt, lm_max_fev},
        params::{BoundTransform, NamedParams, ParamLayout, Parameter},
        types::Jac,
    };
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    const XS: [f64; 6] = [0.0, 0.5, 1.0, 1.5, 2.0, 3.0];

    fn layout(names: &[&str]) -> ParamLayout {
        ParamLayout::new(names.iter().map(|name| Parameter::new(*name, 0.0).unwrap()).collect())
            .unwrap()
    }

    /// Exponential decay `y = a·exp(−b·x)` sampled without noise.
    fn decay(p: &NamedParams<'_>) -> anyhow::Result<Residuals> {
        Ok(XS.iter().map(|x| p["a"] * (-p["b"] * x).exp() - 2.0 * (-0.7 * x).exp()).collect())
    }

    fn decay_jacobian(p: &NamedParams<'_>) -> anyhow::Result<Jac> {
        Ok(Array2::from_shape_fn((XS.len(), 2), |(i, j)| {
            let e = (-p["b"] * XS[i]).exp();
            if j == 0 { e } else { -p["a"] * XS[i] * e }
        }))
    }

    fn solve(
        layout: &ParamLayout, residuals: VectorRef<'_>, jacobian: Option<MatrixRef<'_>>,
        t0: Theta, opts: LeastSquaresOptions, counters: &EvalCounters,
    ) -> OptResult<LeastSquaresSolve> {
        let transform = BoundTransform::identity(layout.len());
        let n = layout.len();
        let solver = build_levenberg_marquardt(&opts, n)?;
        let adapter = ResidualAdapter::new(layout, residuals, jacobian, &transform, counters, t0);
        solve_least_squares(&solver, adapter, &opts, lm_max_fev(&opts, n))
    }

    #[test]
    // Purpose
    // -------
    // A single linear residual is solved to machine precision with a
    // converged MINPACK status.
    fn linear_residual_converges_to_root() {
        // Arrange
        let layout = layout(&["a"]);
        let counters = EvalCounters::default();
        let r = |p: &NamedParams<'_>| -> anyhow::Result<Residuals> { Ok(array![p["a"] - 5.0]) };

        // Act
        let solve =
            solve(&layout, &r, None, array![0.0], LeastSquaresOptions::default(), &counters).unwrap();

        // Assert
        assert_relative_eq!(solve.t[0], 5.0, epsilon = 1e-8);
        assert!(solve.status.converged(), "{}", solve.message);
        assert!((1..=4).contains(&solve.status.code()));
        assert!(solve.evaluations >= 2);
        assert!(solve.iterations >= 1);
    }

    #[test]
    // Purpose
    // -------
    // A nonlinear exponential fit with an analytic jacobian recovers the
    // generating parameters.
    fn exponential_decay_fit_recovers_parameters() {
        // Arrange
        let layout = layout(&["a", "b"]);
        let counters = EvalCounters::default();

        // Act
        let solve = solve(
            &layout,
            &decay,
            Some(&decay_jacobian),
            array![1.0, 0.1],
            LeastSquaresOptions::default(),
            &counters,
        )
        .unwrap();

        // Assert
        assert_relative_eq!(solve.t[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(solve.t[1], 0.7, epsilon = 1e-6);
        assert!(solve.status.converged(), "{}", solve.message);
        assert_eq!(counters.njev(), solve.iterations);
    }

    #[test]
    // Purpose
    // -------
    // Zero residuals at the start terminate immediately with status 4.
    fn exact_start_reports_gtol_status() {
        let layout = layout(&["a"]);
        let counters = EvalCounters::default();
        let r = |p: &NamedParams<'_>| -> anyhow::Result<Residuals> { Ok(array![p["a"] - 5.0]) };

        let solve =
            solve(&layout, &r, None, array![5.0], LeastSquaresOptions::default(), &counters).unwrap();

        assert_eq!(solve.status, LmStatus::Gtol);
        assert_eq!(solve.evaluations, 1);
        assert_eq!(counters.nfev(), 1);
        assert_eq!(solve.fvec, array![0.0]);
    }

    #[test]
    // Purpose
    // -------
    // A tiny evaluation budget ends the run with status 5, not converged.
    //
    // Given
    // -----
    // - `max_fev = 2` with two parameters: the budget rounds up to one
    //   multiple of `n + 1 = 3` evaluations.
    fn evaluation_budget_reports_status_five() {
        // Arrange
        let layout = layout(&["a", "b"]);
        let counters = EvalCounters::default();
        let opts = LeastSquaresOptions { max_fev: Some(2), ..LeastSquaresOptions::default() };

        // Act
        let solve =
            solve(&layout, &decay, Some(&decay_jacobian), array![1.0, 0.1], opts, &counters).unwrap();

        // Assert
        assert_eq!(solve.status.code(), 5);
        assert!(!solve.status.converged());
        assert_eq!(solve.evaluations, 3);
        assert!(solve.message.contains("max_fev = 3"));
    }

    #[test]
    // Purpose
    // -------
    // A user error ends the run and comes back unmodified.
    fn residual_failure_is_returned_as_callable_error() {
        // Arrange
        let layout = layout(&["a"]);
        let counters = EvalCounters::default();
        let r = |p: &NamedParams<'_>| -> anyhow::Result<Residuals> {
            if p["a"] > 1.0 {
                anyhow::bail!("model diverged");
            }
            Ok(array![p["a"] - 5.0])
        };

        // Act
        let err =
            solve(&layout, &r, None, array![0.0], LeastSquaresOptions::default(), &counters)
                .unwrap_err();

        // Assert
        assert!(err.is_callable());
        assert_eq!(err.to_string(), "model diverged");
    }

    #[test]
    // Purpose
    // -------
    // Every termination reason maps onto its MINPACK code.
    fn termination_reasons_map_to_minpack_codes() {
        let cases = [
            (TerminationReason::Converged { ftol: true, xtol: false }, 1),
            (TerminationReason::Converged { ftol: false, xtol: true }, 2),
            (TerminationReason::Converged { ftol: true, xtol: true }, 3),
            (TerminationReason::Orthogonal, 4),
            (TerminationReason::ResidualsZero, 4),
            (TerminationReason::LostPatience, 5),
            (TerminationReason::NoImprovementPossible("ftol"), 6),
            (TerminationReason::NoImprovementPossible("xtol"), 7),
            (TerminationReason::NoImprovementPossible("gtol"), 8),
            (TerminationReason::User("jacobian"), 0),
            (TerminationReason::Numerical("residuals norm"), 0),
        ];

        for (reason, code) in cases {
            assert_eq!(LmStatus::from_termination(&reason).code(), code, "{reason:?}");
        }
        assert_eq!(
            LmStatus::from_termination(&TerminationReason::User("jacobian")),
            LmStatus::Aborted("jacobian")
        );
    }
}
