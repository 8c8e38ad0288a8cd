//! Adapters that expose a minimizer's callables to the backend solvers.
//!
//! Solvers run in an *internal* coordinate space `t`; the user's callables
//! see *external* parameters `x = T(t)` through a [`NamedParams`] view. For
//! methods without bounds `T` is the identity.
//!
//! - [`ArgMinAdapter`]: scalar objective. Implements `argmin`'s
//!   `CostFunction` and `Gradient`; the SLSQP path calls the same
//!   evaluations directly.
//! - [`ResidualAdapter`]: residual-vector objective for the least-squares
//!   path. Implements `levenberg_marquardt::LeastSquaresProblem`.
//!
//! Without a user jacobian, derivatives are finite differences taken
//! directly in internal space, so every shifted point stays inside the bounds.
//! With a user jacobian the chain rule `∂/∂t = ∂/∂x · dx/dt` is applied.
//!
//! Errors from user callables leave the `argmin` adapter as
//! [`CallableFailure`](crate::optimization::errors::CallableFailure) so the
//! runner can propagate them unmodified. The least-squares trait has no
//! error channel, so [`ResidualAdapter`] parks the first error and answers
//! `None` until the run ends.
use std::cell::{Cell, RefCell};

use argmin::core::{CostFunction, Error, Gradient};
use levenberg_marquardt::LeastSquaresProblem;
use nalgebra::{DMatrix, DVector, Dyn, storage::Owned};
use ndarray::Axis;
use tracing::debug;

use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        finite_diff::{ErrorSlot, fd_gradient, fd_jacobian},
        params::{BoundTransform, NamedParams, ParamLayout},
        types::{Cost, Grad, Jac, Residuals, Theta},
        validation::{validate_grad, validate_jacobian, validate_residuals, validate_value},
    },
};

/// Borrowed scalar objective over named parameters.
pub type ScalarRef<'b> = &'b dyn Fn(&NamedParams<'_>) -> anyhow::Result<f64>;

/// Borrowed vector callable over named parameters (gradient or residuals).
pub type VectorRef<'b> = &'b dyn Fn(&NamedParams<'_>) -> anyhow::Result<ndarray::Array1<f64>>;

/// Borrowed matrix callable over named parameters (residual jacobian).
pub type MatrixRef<'b> = &'b dyn Fn(&NamedParams<'_>) -> anyhow::Result<ndarray::Array2<f64>>;

/// Request-scoped evaluation counters.
///
/// `nfev` counts objective evaluations (finite-difference evaluations included);
/// `njev` counts calls to a user jacobian.
#[derive(Debug, Default)]
pub struct EvalCounters {
    nfev: Cell<u64>,
    njev: Cell<u64>,
}

impl EvalCounters {
    pub fn nfev(&self) -> u64 {
        self.nfev.get()
    }

    pub fn njev(&self) -> u64 {
        self.njev.get()
    }

    fn bump_fev(&self) {
        self.nfev.set(self.nfev.get() + 1);
    }

    fn bump_jev(&self) {
        self.njev.set(self.njev.get() + 1);
    }
}

/// Scalar objective bridged to `CostFunction` / `Gradient`.
pub struct ArgMinAdapter<'b> {
    layout: &'b ParamLayout,
    objective: ScalarRef<'b>,
    jacobian: Option<VectorRef<'b>>,
    transform: &'b BoundTransform,
    counters: &'b EvalCounters,
}

impl<'b> ArgMinAdapter<'b> {
    pub fn new(
        layout: &'b ParamLayout, objective: ScalarRef<'b>, jacobian: Option<VectorRef<'b>>,
        transform: &'b BoundTransform, counters: &'b EvalCounters,
    ) -> Self {
        Self { layout, objective, jacobian, transform, counters }
    }

    /// Objective at external `x`.
    pub fn objective_at(&self, x: &Theta) -> OptResult<f64> {
        self.counters.bump_fev();
        let values = x.as_slice().ok_or(OptError::NonContiguousParams)?;
        let value = (self.objective)(&self.layout.named(values)).map_err(OptError::Callable)?;
        validate_value(value)?;
        Ok(value)
    }

    /// User gradient at external `x`, validated.
    fn user_gradient_at(&self, jacobian: VectorRef<'b>, x: &Theta) -> OptResult<Grad> {
        self.counters.bump_jev();
        let values = x.as_slice().ok_or(OptError::NonContiguousParams)?;
        let grad = jacobian(&self.layout.named(values)).map_err(OptError::Callable)?;
        validate_grad(&grad, x.len())?;
        Ok(grad)
    }

    /// Cost at internal `t`.
    pub(crate) fn internal_cost(&self, t: &Theta) -> OptResult<Cost> {
        self.objective_at(&self.transform.to_external(t))
    }

    /// Gradient at internal `t`: the user gradient through the chain rule,
    /// or finite differences of [`internal_cost`](Self::internal_cost).
    pub(crate) fn internal_gradient(&self, t: &Theta) -> OptResult<Grad> {
        let Some(jacobian) = self.jacobian else {
            return fd_gradient(t, &|t: &Theta| self.internal_cost(t));
        };
        let x = self.transform.to_external(t);
        let mut grad = self.user_gradient_at(jacobian, &x)?;
        if !self.transform.is_identity() {
            grad *= &self.transform.derivative(t);
        }
        Ok(grad)
    }
}

impl CostFunction for ArgMinAdapter<'_> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, t: &Self::Param) -> Result<Self::Output, Error> {
        self.internal_cost(t).map_err(OptError::into_argmin)
    }
}

impl Gradient for ArgMinAdapter<'_> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, t: &Self::Param) -> Result<Self::Gradient, Error> {
        self.internal_gradient(t).map_err(OptError::into_argmin)
    }
}

/// Residual objective bridged to `LeastSquaresProblem`.
///
/// Holds the solver's current internal point. The last evaluated
/// `(t, r(t))` pair is cached so a finite-difference jacobian at the
/// current iterate does not re-evaluate the base point, and the point with
/// the smallest sum of squares seen so far is kept for the result.
///
/// A non-finite residual at a trial point is answered with a `NaN` vector
/// once `m` is known, which makes the solver reject the step. Every other
/// error is parked and ends the run at the next callback.
pub struct ResidualAdapter<'b> {
    layout: &'b ParamLayout,
    residuals: VectorRef<'b>,
    jacobian: Option<MatrixRef<'b>>,
    transform: &'b BoundTransform,
    counters: &'b EvalCounters,
    t: Theta,
    m: Cell<Option<usize>>,
    last: RefCell<Option<(Theta, Residuals)>>,
    best: RefCell<Option<(Theta, Residuals)>>,
    jacobians: Cell<u64>,
    failure: ErrorSlot,
}

impl<'b> ResidualAdapter<'b> {
    pub fn new(
        layout: &'b ParamLayout, residuals: VectorRef<'b>, jacobian: Option<MatrixRef<'b>>,
        transform: &'b BoundTransform, counters: &'b EvalCounters, t0: Theta,
    ) -> Self {
        Self {
            layout,
            residuals,
            jacobian,
            transform,
            counters,
            t: t0,
            m: Cell::new(None),
            last: RefCell::new(None),
            best: RefCell::new(None),
            jacobians: Cell::new(0),
            failure: ErrorSlot::default(),
        }
    }

    /// Residuals at external `x`. The first call fixes `m`.
    pub fn residuals_at(&self, x: &Theta) -> OptResult<Residuals> {
        self.counters.bump_fev();
        let values = x.as_slice().ok_or(OptError::NonContiguousParams)?;
        let fvec = (self.residuals)(&self.layout.named(values)).map_err(OptError::Callable)?;
        validate_residuals(&fvec, self.m.get())?;
        self.m.set(Some(fvec.len()));
        Ok(fvec)
    }

    /// Residuals at internal `t`; updates the base-point cache and the best
    /// point.
    pub(crate) fn internal_residuals(&self, t: &Theta) -> OptResult<Residuals> {
        let fvec = self.residuals_at(&self.transform.to_external(t))?;
        self.last.replace(Some((t.clone(), fvec.clone())));
        let improves = self
            .best
            .borrow()
            .as_ref()
            .is_none_or(|(_, best)| fvec.dot(&fvec) < best.dot(best));
        if improves {
            self.best.replace(Some((t.clone(), fvec.clone())));
        }
        Ok(fvec)
    }

    /// `m × n` jacobian at internal `t`.
    pub(crate) fn internal_jacobian(&self, t: &Theta) -> OptResult<Jac> {
        let Some(jacobian) = self.jacobian else {
            let cached =
                self.last.borrow().as_ref().filter(|(last_t, _)| last_t == t).map(|(_, r)| r.clone());
            let fvec = match cached {
                Some(fvec) => fvec,
                None => self.internal_residuals(t)?,
            };
            return fd_jacobian(t, &fvec, &|shifted: &Theta| {
                self.residuals_at(&self.transform.to_external(shifted))
            });
        };
        let x = self.transform.to_external(t);
        self.counters.bump_jev();
        let values = x.as_slice().ok_or(OptError::NonContiguousParams)?;
        let mut jac = jacobian(&self.layout.named(values)).map_err(OptError::Callable)?;
        let m = match self.m.get() {
            Some(m) => m,
            None => self.internal_residuals(t)?.len(),
        };
        validate_jacobian(&jac, m, t.len())?;
        if !self.transform.is_identity() {
            let scale = self.transform.derivative(t);
            for mut row in jac.axis_iter_mut(Axis(0)) {
                row *= &scale;
            }
        }
        Ok(jac)
    }

    /// Jacobian evaluations requested by the solver, one per iteration.
    pub fn iterations(&self) -> u64 {
        self.jacobians.get()
    }

    /// First error parked during the run.
    pub(crate) fn take_failure(&self) -> Option<OptError> {
        self.failure.take()
    }

    /// Internal point with the smallest sum of squares, with its residuals.
    pub(crate) fn take_best(&self) -> Option<(Theta, Residuals)> {
        self.best.borrow_mut().take()
    }
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for ResidualAdapter<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, x: &DVector<f64>) {
        self.t = x.iter().copied().collect();
    }

    fn params(&self) -> DVector<f64> {
        DVector::from_iterator(self.t.len(), self.t.iter().copied())
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        if self.failure.is_set() {
            return None;
        }
        match self.internal_residuals(&self.t) {
            Ok(fvec) => Some(DVector::from_iterator(fvec.len(), fvec.into_iter())),
            Err(err) => match self.m.get() {
                Some(m) if err.is_non_finite() => {
                    debug!(error = %err, "non-finite residuals at trial point; step rejected");
                    Some(DVector::from_element(m, f64::NAN))
                }
                _ => {
                    self.failure.record(err);
                    None
                }
            },
        }
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        if self.failure.is_set() {
            return None;
        }
        self.jacobians.set(self.jacobians.get() + 1);
        match self.internal_jacobian(&self.t) {
            Ok(jac) => Some(DMatrix::from_fn(jac.nrows(), jac.ncols(), |i, j| jac[[i, j]])),
            Err(err) => {
                self.failure.record(err);
                None
            }
        }
    }
}
