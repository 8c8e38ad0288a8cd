//! Execution helper that runs an `argmin` solver on a minimizer problem and
//! returns a crate-friendly [`RunOutcome`].
//!
//! Every `argmin` backend (BFGS, L-BFGS, Nelder–Mead) goes through
//! [`run_solver`]. A [`ProgressSnapshot`] observer records the best
//! point after every iteration so that a run the backend aborts (line-search
//! breakdown, non-finite trial point) can still be reported as a
//! non-converged result instead of an error.
use std::sync::{Arc, Mutex};

use argmin::core::{
    Error, Executor, IterState, KV, Solver, State, TerminationReason, TerminationStatus,
    observers::{Observe, ObserverMode},
};
use argmin_math::ArgminL2Norm;
use tracing::debug;

use crate::optimization::{
    errors::{ErrorOrigin, OptResult},
    minimizer::types::{FnEvalMap, Grad, Theta},
};

/// Best point seen so far: `(param, cost, iteration)`.
type Snapshot = Option<(Theta, f64, u64)>;

/// Observer keeping the latest best point of a run.
#[derive(Debug, Clone, Default)]
pub struct ProgressSnapshot(Arc<Mutex<Snapshot>>);

impl ProgressSnapshot {
    pub fn latest(&self) -> Snapshot {
        self.0.lock().ok().and_then(|slot| slot.clone())
    }

    fn record<I>(&self, state: &I)
    where
        I: State<Param = Theta, Float = f64>,
    {
        let Some(best) = state.get_best_param() else {
            return;
        };
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some((best.clone(), state.get_best_cost(), state.get_iter()));
        }
    }
}

impl<I> Observe<I> for ProgressSnapshot
where
    I: State<Param = Theta, Float = f64>,
{
    fn observe_init(&mut self, _name: &str, state: &I, _kv: &KV) -> Result<(), Error> {
        self.record(state);
        Ok(())
    }

    fn observe_iter(&mut self, state: &I, _kv: &KV) -> Result<(), Error> {
        self.record(state);
        Ok(())
    }
}

/// Norm of whatever gradient type a solver state carries.
pub trait GradientNorm {
    fn gradient_norm(&self) -> Option<f64>;
}

impl GradientNorm for () {
    fn gradient_norm(&self) -> Option<f64> {
        None
    }
}

impl GradientNorm for Grad {
    fn gradient_norm(&self) -> Option<f64> {
        Some(self.l2_norm())
    }
}

/// Normalized output of one solver run, in the solver's (internal) space.
///
/// - `best_param`: `None` only when the backend aborted before any point was
///   accepted; callers fall back to the start point.
/// - `solver`: the solver after the run, `None` when the backend aborted.
#[derive(Debug)]
pub struct RunOutcome<S> {
    pub best_param: Option<Theta>,
    pub best_cost: f64,
    pub iterations: u64,
    pub converged: bool,
    pub message: String,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
    pub solver: Option<S>,
}

impl<S> RunOutcome<S> {
    /// Replace the solver, e.g. to erase its type once it has been read.
    pub fn map_solver<T>(self, f: impl FnOnce(S) -> T) -> RunOutcome<T> {
        RunOutcome {
            best_param: self.best_param,
            best_cost: self.best_cost,
            iterations: self.iterations,
            converged: self.converged,
            message: self.message,
            fn_evals: self.fn_evals,
            grad_norm: self.grad_norm,
            solver: self.solver.map(f),
        }
    }
}

/// `true` when `argmin` stopped because the solver's own test was met.
pub fn is_converged(status: &TerminationStatus) -> bool {
    matches!(
        status,
        TerminationStatus::Terminated(
            TerminationReason::SolverConverged | TerminationReason::TargetCostReached
        )
    )
}

/// Run an `argmin` solver from `t0` for at most `max_iter` iterations.
///
/// Wires up the problem, the solver, the start point, the iteration cap, the
/// progress snapshot and (behind the `obs_slog` feature, when `verbose`) a
/// terminal slog observer, then normalizes the final state.
///
/// # Errors
/// - User-callable failures and adapter contract violations raised inside
///   the problem, unmodified.
///
/// Backend failures are **not** errors: they produce a non-converged
/// outcome built from the last snapshot.
pub fn run_solver<O, S, G, J, H, R>(
    problem: O, solver: S, t0: Theta, max_iter: u64, verbose: bool,
) -> OptResult<RunOutcome<S>>
where
    S: Solver<O, IterState<Theta, G, J, H, R, f64>> + Clone,
    IterState<Theta, G, J, H, R, f64>: State<Param = Theta, Float = f64>,
    G: GradientNorm,
{
    run_solver_with(problem, solver, t0, max_iter, verbose, |state| state)
}

/// [`run_solver`] with an extra hook on the initial state, e.g. to seed the
/// inverse Hessian BFGS requires.
pub fn run_solver_with<O, S, G, J, H, R, P>(
    problem: O, solver: S, t0: Theta, max_iter: u64, verbose: bool, prepare: P,
) -> OptResult<RunOutcome<S>>
where
    S: Solver<O, IterState<Theta, G, J, H, R, f64>> + Clone,
    IterState<Theta, G, J, H, R, f64>: State<Param = Theta, Float = f64>,
    G: GradientNorm,
    P: FnOnce(IterState<Theta, G, J, H, R, f64>) -> IterState<Theta, G, J, H, R, f64>,
{
    let snapshot = ProgressSnapshot::default();
    let executor = Executor::new(problem, solver)
        .configure(|state| prepare(state.param(t0).max_iters(max_iter)))
        .add_observer(snapshot.clone(), ObserverMode::Always);
    #[cfg(feature = "obs_slog")]
    let executor = if verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor.add_observer(observer, ObserverMode::Always)
    } else {
        executor
    };
    #[cfg(not(feature = "obs_slog"))]
    let _ = verbose;

    let result = match executor.run() {
        Ok(result) => result,
        Err(err) => {
            let err = match ErrorOrigin::classify(err) {
                ErrorOrigin::Caller(err) => return Err(err),
                ErrorOrigin::Solver(err) => err,
            };
            debug!(error = %err, "backend aborted; reporting last snapshot");
            let latest = snapshot.latest();
            return Ok(RunOutcome {
                best_cost: latest.as_ref().map_or(f64::NAN, |(_, cost, _)| *cost),
                iterations: latest.as_ref().map_or(0, |(_, _, iter)| *iter),
                best_param: latest.map(|(param, _, _)| param),
                converged: false,
                message: err.to_string(),
                fn_evals: FnEvalMap::new(),
                grad_norm: None,
                solver: None,
            });
        }
    };

    let state = result.state();
    let termination = state.get_termination_status().clone();
    debug!(
        iterations = state.get_iter(),
        best_cost = state.get_best_cost(),
        status = %termination,
        "solver finished"
    );
    Ok(RunOutcome {
        best_param: state.get_best_param().cloned(),
        best_cost: state.get_best_cost(),
        iterations: state.get_iter(),
        converged: is_converged(&termination),
        message: termination.to_string(),
        fn_evals: state.get_func_counts().clone(),
        grad_norm: state.get_gradient().and_then(GradientNorm::gradient_norm),
        solver: Some(result.solver().clone()),
    })
}

/// One-time pre-iteration line for verbose runs: objective at the start
/// point and, if available, the gradient norm.
#[cfg(feature = "obs_slog")]
pub fn log_initial_state(value: f64, grad_norm: Option<f64>) {
    eprintln!(
        "init: f(x0) = {:.6}{}",
        value,
        grad_norm.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::{CallableFailure, OptError},
        minimizer::{
            builders::{build_lbfgs_more_thuente, build_nelder_mead},
            traits::MinimizeOptions,
        },
    };
    use approx::assert_relative_eq;
    use argmin::core::{CostFunction, Gradient};
    use ndarray::array;

    struct Bowl;

    impl CostFunction for Bowl {
        type Param = Theta;
        type Output = f64;

        fn cost(&self, x: &Theta) -> Result<f64, Error> {
            Ok((x[0] - 3.0).powi(2) + (x[1] + 2.0).powi(2))
        }
    }

    impl Gradient for Bowl {
        type Param = Theta;
        type Gradient = Grad;

        fn gradient(&self, x: &Theta) -> Result<Grad, Error> {
            Ok(array![2.0 * (x[0] - 3.0), 2.0 * (x[1] + 2.0)])
        }
    }

    struct Broken;

    impl CostFunction for Broken {
        type Param = Theta;
        type Output = f64;

        fn cost(&self, _: &Theta) -> Result<f64, Error> {
            Err(CallableFailure::wrap(anyhow::anyhow!("model exploded")))
        }
    }

    impl Gradient for Broken {
        type Param = Theta;
        type Gradient = Grad;

        fn gradient(&self, x: &Theta) -> Result<Grad, Error> {
            Ok(x.clone())
        }
    }

    #[test]
    // Purpose
    // -------
    // L-BFGS on a separable quadratic converges to the minimizer and
    // reports a gradient norm.
    fn lbfgs_run_converges_on_quadratic() {
        // Arrange
        let opts = MinimizeOptions::default();
        let solver = build_lbfgs_more_thuente(&opts).unwrap();

        // Act
        let out = run_solver(Bowl, solver, array![0.0, 0.0], 1000, false).unwrap();

        // Assert
        let best = out.best_param.unwrap();
        assert!(out.converged, "{}", out.message);
        assert_relative_eq!(best[0], 3.0, epsilon = 1e-6);
        assert_relative_eq!(best[1], -2.0, epsilon = 1e-6);
        assert!(out.grad_norm.is_some());
        assert!(out.solver.is_some());
    }

    #[test]
    // Purpose
    // -------
    // Hitting the iteration cap is reported as data, not as an error.
    //
    // Given
    // -----
    // - Nelder–Mead limited to a single iteration.
    //
    // Expect
    // ------
    // - `converged == false`, `iterations == 1`, a best point is available.
    fn iteration_cap_yields_non_converged_outcome() {
        // Arrange
        let x0 = array![0.0, 0.0];
        let solver = build_nelder_mead(&x0, &MinimizeOptions::default()).unwrap();

        // Act
        let out = run_solver(Bowl, solver, x0, 1, false).unwrap();

        // Assert
        assert!(!out.converged);
        assert_eq!(out.iterations, 1);
        assert!(out.best_param.is_some());
        assert!(out.grad_norm.is_none());
    }

    #[test]
    // Purpose
    // -------
    // A failing user callable propagates out of the runner unmodified.
    fn callable_failure_propagates() {
        // Arrange
        let solver = build_lbfgs_more_thuente(&MinimizeOptions::default()).unwrap();

        // Act
        let err = match run_solver(Broken, solver, array![1.0], 100, false) {
            Ok(out) => panic!("expected a callable failure, got: {}", out.message),
            Err(err) => err,
        };

        // Assert
        assert!(matches!(err, OptError::Callable(_)));
        assert_eq!(err.to_string(), "model exploded");
    }

    #[test]
    fn convergence_reasons_are_recognized() {
        let converged = TerminationStatus::Terminated(TerminationReason::SolverConverged);
        let capped = TerminationStatus::Terminated(TerminationReason::MaxItersReached);

        assert!(is_converged(&converged));
        assert!(!is_converged(&capped));
        assert!(!is_converged(&TerminationStatus::NotTerminated));
    }
}
