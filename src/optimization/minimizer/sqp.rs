//! minimizer::sqp — constrained minimization with the `slsqp` crate.
//!
//! Purpose
//! -------
//! Run Kraft's sequential least-squares quadratic programming method (the
//! `slsqp` crate, a port of NLopt's SLSQP) over external parameters, with
//! native bounds and `eq` / `ineq` constraints.
//!
//! Key behaviors
//! -------------
//! - The backend only knows inequalities `c(x) ≤ 0`. An `ineq` constraint
//!   `g(x) ≥ 0` is handed over as `−g(x) ≤ 0`; an `eq` constraint `c(x) = 0`
//!   as the band `±c(x) − ctol/2 ≤ 0`.
//! - Gradients come from the user's jacobian when present, otherwise from
//!   [`fd_gradient`].
//! - Every evaluated point is scored by its worst true violation (`|c|` for
//!   eq, `max(0, −g)` for ineq). The result is the lowest objective among
//!   points within `ctol`, or the least infeasible point when none is.
//! - The callbacks return a bare `f64`, so the first error is parked in an
//!   [`ErrorSlot`] and every later callback answers `NaN` until the backend
//!   stops.
//!
//! Invariants & assumptions
//! ------------------------
//! - `converged` requires a successful backend status and a reported point
//!   within `ctol`.
//! - Bounds go to the backend as given; infinite bounds are allowed.
use std::cell::{Cell, RefCell};

use slsqp::{FailStatus, Func, StopTols, SuccessStatus};
use tracing::debug;

use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        adapter::ArgMinAdapter,
        constraints::{ConstraintType, SolverConstraint},
        finite_diff::{ErrorSlot, fd_gradient},
        types::{Grad, Theta},
        validation::validate_value,
    },
};

/// Settings of one SLSQP run.
#[derive(Debug, Clone, PartialEq)]
pub struct SqpSettings {
    /// Initial point, inside `bounds`.
    pub x0: Theta,
    /// One `(min, max)` pair per parameter.
    pub bounds: Vec<(f64, f64)>,
    /// Relative objective change and absolute per-coordinate step at which
    /// a feasible major iteration stops.
    pub tol: f64,
    /// Largest violation a point may carry and still count as feasible.
    pub ctol: f64,
    /// Objective-evaluation cap.
    pub max_eval: u64,
}

/// Outcome of one SLSQP run, in external coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SqpSolve {
    pub x: Theta,
    pub value: f64,
    pub converged: bool,
    pub message: String,
    /// Objective evaluations made by the backend.
    pub evaluations: u64,
    /// Worst constraint violation at `x`.
    pub max_violation: f64,
}

/// One evaluated point.
#[derive(Debug, Clone, PartialEq)]
struct Trial {
    x: Theta,
    value: f64,
    violation: f64,
}

impl Trial {
    /// Feasible beats infeasible; feasible points compare by value,
    /// infeasible ones by violation.
    fn improves_on(&self, other: &Trial, ctol: f64) -> bool {
        match (self.violation <= ctol, other.violation <= ctol) {
            (true, true) => self.value < other.value,
            (true, false) => true,
            (false, true) => false,
            (false, false) => self.violation < other.violation,
        }
    }
}

/// Bookkeeping shared by the objective and constraint callbacks.
///
/// The backend evaluates the constraints right after the objective at the
/// same point, so the open trial collects violations until the next
/// objective call settles it.
#[derive(Debug, Default)]
struct SqpTrace {
    ctol: f64,
    open: RefCell<Option<Trial>>,
    best: RefCell<Option<Trial>>,
    evaluations: Cell<u64>,
    failure: ErrorSlot,
}

impl SqpTrace {
    fn new(ctol: f64) -> Self {
        Self { ctol, ..Self::default() }
    }

    fn begin(&self, x: Theta, value: f64) {
        self.settle();
        self.open.replace(Some(Trial { x, value, violation: 0.0 }));
    }

    fn violate(&self, x: &Theta, violation: f64) {
        if let Some(trial) = self.open.borrow_mut().as_mut() {
            if &trial.x == x {
                trial.violation = trial.violation.max(violation);
            }
        }
    }

    fn settle(&self) {
        let Some(trial) = self.open.borrow_mut().take() else {
            return;
        };
        let mut best = self.best.borrow_mut();
        if best.as_ref().is_none_or(|best| trial.improves_on(best, self.ctol)) {
            *best = Some(trial);
        }
    }

    fn finish(self) -> (Option<Trial>, Option<OptError>, u64) {
        self.settle();
        (self.best.into_inner(), self.failure.take(), self.evaluations.get())
    }
}

/// One backend inequality `sign·c(x) − shift ≤ 0` built from a user
/// constraint.
struct Side<'s, 'c> {
    constraint: &'s SolverConstraint<'c>,
    sign: f64,
    shift: f64,
}

impl<'s, 'c> Side<'s, 'c> {
    fn sides(constraints: &'s [SolverConstraint<'c>], ctol: f64) -> Vec<Self> {
        let mut sides = Vec::with_capacity(2 * constraints.len());
        for constraint in constraints {
            match constraint.kind() {
                ConstraintType::Ineq => sides.push(Side { constraint, sign: -1.0, shift: 0.0 }),
                ConstraintType::Eq => {
                    sides.push(Side { constraint, sign: 1.0, shift: 0.5 * ctol });
                    sides.push(Side { constraint, sign: -1.0, shift: 0.5 * ctol });
                }
            }
        }
        sides
    }

    /// Backend value at `x` and the true violation of the constraint.
    fn evaluate(&self, x: &Theta, grad: Option<&mut [f64]>) -> OptResult<(f64, f64)> {
        let value = self.constraint.fun(x)?;
        validate_value(value)?;
        if let Some(grad) = grad {
            let gradient = constraint_gradient(self.constraint, x)?;
            for (slot, d) in grad.iter_mut().zip(gradient.iter()) {
                *slot = self.sign * d;
            }
        }
        let violation = match self.constraint.kind() {
            ConstraintType::Eq => value.abs(),
            ConstraintType::Ineq => (-value).max(0.0),
        };
        Ok((self.sign * value - self.shift, violation))
    }
}

fn constraint_gradient(constraint: &SolverConstraint<'_>, x: &Theta) -> OptResult<Grad> {
    match constraint.jac(x) {
        Some(jac) => jac,
        None => fd_gradient(x, &|x: &Theta| constraint.fun(x)),
    }
}

fn objective_with_gradient(
    adapter: &ArgMinAdapter<'_>, x: &Theta, grad: Option<&mut [f64]>,
) -> OptResult<f64> {
    let value = adapter.internal_cost(x)?;
    if let Some(grad) = grad {
        let gradient = adapter.internal_gradient(x)?;
        grad.copy_from_slice(gradient.as_slice().ok_or(OptError::NonContiguousParams)?);
    }
    Ok(value)
}

/// Run SLSQP on `adapter` (identity transform, external coordinates).
///
/// # Errors
/// - The first error raised by the objective, its gradient or a
///   constraint, e.g. [`OptError::Callable`], unmodified.
/// - A non-finite-value error when no point was evaluated successfully.
/// - [`OptError::MissingThetaHat`] when the backend evaluated nothing.
pub fn solve_sqp(
    adapter: &ArgMinAdapter<'_>, constraints: &[SolverConstraint<'_>], settings: &SqpSettings,
) -> OptResult<SqpSolve> {
    let n = settings.x0.len();
    let trace = SqpTrace::new(settings.ctol);
    let sides = Side::sides(constraints, settings.ctol);

    let objective = |x: &[f64], grad: Option<&mut [f64]>, _: &mut ()| -> f64 {
        trace.evaluations.set(trace.evaluations.get() + 1);
        if trace.failure.is_set() {
            return f64::NAN;
        }
        let theta = Theta::from(x.to_vec());
        match objective_with_gradient(adapter, &theta, grad) {
            Ok(value) => {
                trace.begin(theta, value);
                value
            }
            Err(err) => {
                trace.failure.record(err);
                f64::NAN
            }
        }
    };
    let callbacks: Vec<_> = sides
        .iter()
        .map(|side| {
            let trace = &trace;
            move |x: &[f64], grad: Option<&mut [f64]>, _: &mut ()| -> f64 {
                if trace.failure.is_set() {
                    return f64::NAN;
                }
                let theta = Theta::from(x.to_vec());
                match side.evaluate(&theta, grad) {
                    Ok((value, violation)) => {
                        trace.violate(&theta, violation);
                        value
                    }
                    Err(err) => {
                        trace.failure.record(err);
                        f64::NAN
                    }
                }
            }
        })
        .collect();
    let cons: Vec<&dyn Func<()>> = callbacks.iter().map(|c| c as &dyn Func<()>).collect();
    let stop = StopTols {
        ftol_rel: settings.tol,
        ftol_abs: settings.tol,
        xtol_abs: vec![settings.tol; n],
        ..StopTols::default()
    };
    let x0 = settings.x0.to_vec();
    let outcome = slsqp::minimize(
        objective,
        &x0,
        &settings.bounds,
        &cons,
        (),
        settings.max_eval as usize,
        Some(stop),
    );
    let status = match &outcome {
        Ok((status, _, _)) => Ok(*status),
        Err((status, _, _)) => Err(*status),
    };
    drop(cons);
    drop(callbacks);

    let (best, failure, evaluations) = trace.finish();
    debug!(?status, evaluations, "slsqp finished");
    let (mut message, success) = describe(status, settings.max_eval);
    let best = match (failure, best) {
        (Some(err), _) if !err.is_non_finite() => return Err(err),
        (Some(err), None) => return Err(err),
        (None, None) => return Err(OptError::MissingThetaHat),
        (Some(err), Some(best)) => {
            message = format!("{message}: {err}");
            return Ok(SqpSolve {
                max_violation: best.violation,
                x: best.x,
                value: best.value,
                converged: false,
                message,
                evaluations,
            });
        }
        (None, Some(best)) => best,
    };
    let feasible = best.violation <= settings.ctol;
    if success && !feasible {
        message =
            format!("Constraint violation {:e} exceeds ctol = {:e}", best.violation, settings.ctol);
    }
    Ok(SqpSolve {
        converged: success && feasible,
        max_violation: best.violation,
        x: best.x,
        value: best.value,
        message,
        evaluations,
    })
}

/// Message for a backend status and whether it counts as success.
fn describe(status: Result<SuccessStatus, FailStatus>, max_eval: u64) -> (String, bool) {
    match status {
        Ok(SuccessStatus::Success) | Ok(SuccessStatus::StopValReached) => {
            ("Optimization terminated successfully".to_string(), true)
        }
        Ok(SuccessStatus::FtolReached) => {
            ("Optimization terminated successfully: objective change below tol".to_string(), true)
        }
        Ok(SuccessStatus::XtolReached) => {
            ("Optimization terminated successfully: step size below tol".to_string(), true)
        }
        Ok(SuccessStatus::MaxEvalReached) | Ok(SuccessStatus::MaxTimeReached) => {
            (format!("Maximum number of function evaluations ({max_eval}) reached"), false)
        }
        Err(FailStatus::RoundoffLimited) => {
            ("Positive directional derivative in line search (roundoff limited)".to_string(), false)
        }
        Err(FailStatus::InvalidArgs) => ("Invalid arguments passed to SLSQP".to_string(), false),
        Err(other) => (format!("SLSQP failed: {other:?}"), false),
    }
}
