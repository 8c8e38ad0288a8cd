//! High-level entry point: a [`Minimizer`] bundles an objective, its named
//! parameters and the optional jacobian / constraints, and dispatches
//! [`Minimizer::execute`] to the backend selected by its [`Method`].
//!
//! Dispatch:
//! - `Bfgs`, `LBfgsB`: BFGS / L-BFGS with the configured line search.
//! - `NelderMead`: simplex search.
//! - `Slsqp`: SLSQP from the `slsqp` crate, with native bounds.
//! - `Minpack`: Levenberg–Marquardt from the `levenberg-marquardt` crate on
//!   the residual vector.
//!
//! Capability checks (jacobian, constraints, objective shape) happen at
//! construction so an unsupported request never reaches a solver.
use ndarray::Array2;
use tracing::debug;

use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        adapter::{ArgMinAdapter, EvalCounters, MatrixRef, ResidualAdapter, ScalarRef, VectorRef},
        builders::{
            build_bfgs_hager_zhang, build_bfgs_more_thuente, build_lbfgs_hager_zhang,
            build_lbfgs_more_thuente, build_levenberg_marquardt, build_nelder_mead, lm_max_fev,
        },
        capabilities::Method,
        constraints::{Constraint, DataContext, constraint_type, translate_constraints},
        levenberg_marquardt::solve_least_squares,
        params::{BoundTransform, NamedParams, ParamLayout, Parameter},
        run::{RunOutcome, run_solver, run_solver_with},
        sqp::{SqpSettings, solve_sqp},
        traits::{Diagnostics, LineSearcher, MinimizeOptions, MinimizeResult},
        types::{FnEvalMap, MatrixFn, ScalarFn, Theta, VectorFn},
    },
};

/// The function being minimized.
///
/// `Scalar` for the general methods, `Residuals` (`r(θ)`, minimized as
/// `Σ rᵢ²`) for `Minpack`.
pub enum Objective<'a> {
    Scalar(ScalarFn<'a>),
    Residuals(VectorFn<'a>),
}

impl<'a> Objective<'a> {
    pub fn scalar<F>(f: F) -> Self
    where
        F: Fn(&NamedParams<'_>) -> anyhow::Result<f64> + 'a,
    {
        Objective::Scalar(Box::new(f))
    }

    pub fn residuals<F>(f: F) -> Self
    where
        F: Fn(&NamedParams<'_>) -> anyhow::Result<Theta> + 'a,
    {
        Objective::Residuals(Box::new(f))
    }

    fn is_residuals(&self) -> bool {
        matches!(self, Objective::Residuals(_))
    }
}

/// User-supplied derivative: a gradient vector for scalar objectives, an
/// `m × n` jacobian for residual objectives.
pub enum Derivative<'a> {
    Gradient(VectorFn<'a>),
    Matrix(MatrixFn<'a>),
}

impl<'a> Derivative<'a> {
    pub fn gradient<F>(f: F) -> Self
    where
        F: Fn(&NamedParams<'_>) -> anyhow::Result<Theta> + 'a,
    {
        Derivative::Gradient(Box::new(f))
    }

    pub fn matrix<F>(f: F) -> Self
    where
        F: Fn(&NamedParams<'_>) -> anyhow::Result<Array2<f64>> + 'a,
    {
        Derivative::Matrix(Box::new(f))
    }
}

/// One minimization request: method, parameters, objective and optional
/// capabilities.
pub struct Minimizer<'a> {
    method: Method,
    layout: ParamLayout,
    objective: Objective<'a>,
    jacobian: Option<Derivative<'a>>,
    constraints: Vec<Constraint<'a>>,
    data: DataContext,
}

impl<'a> Minimizer<'a> {
    /// # Errors
    /// - Parameter-list errors from [`ParamLayout::new`].
    /// - [`OptError::ShapeMismatch`] when the objective shape does not fit
    ///   the method (residuals for `Minpack`, scalar otherwise).
    pub fn new(method: Method, params: Vec<Parameter>, objective: Objective<'a>) -> OptResult<Self> {
        let layout = ParamLayout::new(params)?;
        match (method.is_least_squares(), objective.is_residuals()) {
            (true, false) => {
                return Err(OptError::ShapeMismatch {
                    method: method.name(),
                    expected: "a residual-vector objective",
                });
            }
            (false, true) => {
                return Err(OptError::ShapeMismatch {
                    method: method.name(),
                    expected: "a scalar objective",
                });
            }
            _ => {}
        }
        Ok(Self {
            method,
            layout,
            objective,
            jacobian: None,
            constraints: Vec::new(),
            data: DataContext::new(),
        })
    }

    /// Attach an analytic derivative.
    ///
    /// # Errors
    /// - [`OptError::UnsupportedCapability`] for `NelderMead`.
    /// - [`OptError::ShapeMismatch`] for a gradient on `Minpack` or a
    ///   matrix on a scalar method.
    pub fn with_jacobian(mut self, jacobian: Derivative<'a>) -> OptResult<Self> {
        if !self.method.accepts_jacobian() {
            return Err(OptError::UnsupportedCapability {
                method: self.method.name(),
                capability: "a jacobian",
            });
        }
        match (&jacobian, self.method.is_least_squares()) {
            (Derivative::Gradient(_), true) => {
                return Err(OptError::ShapeMismatch {
                    method: self.method.name(),
                    expected: "an m × n jacobian matrix",
                });
            }
            (Derivative::Matrix(_), false) => {
                return Err(OptError::ShapeMismatch {
                    method: self.method.name(),
                    expected: "a gradient vector",
                });
            }
            _ => {}
        }
        self.jacobian = Some(jacobian);
        Ok(self)
    }

    /// Attach constraints evaluated over `(data..., params...)`.
    ///
    /// # Errors
    /// - [`OptError::UnsupportedCapability`] unless the method is `Slsqp`.
    /// - [`OptError::UnsupportedConstraint`] for a relation other than `==`
    ///   or `>=`. No constraint is evaluated.
    pub fn with_constraints(
        mut self, constraints: Vec<Constraint<'a>>, data: DataContext,
    ) -> OptResult<Self> {
        if !self.method.is_constrained() {
            return Err(OptError::UnsupportedCapability {
                method: self.method.name(),
                capability: "constraints",
            });
        }
        for (index, constraint) in constraints.iter().enumerate() {
            constraint_type(constraint.relation(), index)?;
        }
        self.constraints = constraints;
        self.data = data;
        Ok(self)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn layout(&self) -> &ParamLayout {
        &self.layout
    }

    pub fn constraints(&self) -> &[Constraint<'a>] {
        &self.constraints
    }

    /// One `(min, max)` pair per parameter; absent bounds are infinities.
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.layout.bounds()
    }

    pub fn initial_guesses(&self) -> Theta {
        self.layout.initial_guesses()
    }

    /// Run the method's backend from the parameters' initial values.
    ///
    /// Non-convergence (iteration cap, line-search breakdown, evaluation
    /// budget) is reported in the result, never as an error.
    ///
    /// # Errors
    /// - Option validation errors.
    /// - [`OptError::Callable`] with the user's error, unmodified, when an
    ///   objective, jacobian or constraint fails.
    /// - Shape/dimension errors for derivatives or residuals that break
    ///   their contract.
    pub fn execute(&self, opts: &MinimizeOptions) -> OptResult<MinimizeResult> {
        opts.validate()?;
        debug!(method = %self.method, params = self.layout.len(), "minimizer dispatch");
        let counters = EvalCounters::default();
        match &self.objective {
            Objective::Residuals(residuals) => {
                self.execute_least_squares(&**residuals, opts, &self.transform(), &counters)
            }
            Objective::Scalar(objective) if self.method == Method::Slsqp => {
                self.execute_constrained(&**objective, opts, &counters)
            }
            Objective::Scalar(objective) => {
                self.execute_general(&**objective, opts, &self.transform(), &counters)
            }
        }
    }

    // ---- Dispatch ----

    /// Change of variables for the `argmin` and least-squares backends:
    /// the bound transform when the method honors bounds, else identity.
    fn transform(&self) -> BoundTransform {
        if self.method.is_bounded() {
            return BoundTransform::from_layout(&self.layout);
        }
        if self.layout.has_bounds() {
            debug!(method = %self.method, "method has no bound support; bounds ignored");
        }
        BoundTransform::identity(self.layout.len())
    }

    fn gradient_ref(&self) -> Option<VectorRef<'_>> {
        match &self.jacobian {
            Some(Derivative::Gradient(g)) => Some(&**g),
            _ => None,
        }
    }

    fn matrix_ref(&self) -> Option<MatrixRef<'_>> {
        match &self.jacobian {
            Some(Derivative::Matrix(j)) => Some(&**j),
            _ => None,
        }
    }

    fn names(&self) -> Vec<String> {
        self.layout.names().map(str::to_string).collect()
    }

    /// `Bfgs`, `LBfgsB`, `NelderMead`.
    fn execute_general(
        &self, objective: ScalarRef<'_>, opts: &MinimizeOptions, transform: &BoundTransform,
        counters: &EvalCounters,
    ) -> OptResult<MinimizeResult> {
        let x0 = self.layout.initial_guesses();
        let t0 = transform.to_internal(&x0);
        let adapter = || {
            ArgMinAdapter::new(&self.layout, objective, self.gradient_ref(), transform, counters)
        };
        #[cfg(feature = "obs_slog")]
        if opts.verbose {
            crate::optimization::minimizer::run::log_initial_state(
                adapter().objective_at(&x0)?,
                None,
            );
        }
        let max_iter = opts.tols.max_iter_for(self.layout.len());
        let out = match self.method {
            Method::NelderMead => {
                let solver = build_nelder_mead(&t0, opts)?;
                run_solver(adapter(), solver, t0.clone(), max_iter, opts.verbose)?
                    .map_solver(|_| ())
            }
            Method::Bfgs => run_bfgs(adapter(), t0.clone(), max_iter, opts)?,
            _ => run_lbfgs(adapter(), t0.clone(), max_iter, opts)?,
        };

        let reached = out.best_param.is_some() && out.best_cost.is_finite();
        let x = transform.to_external(&out.best_param.clone().unwrap_or(t0));
        let value = if reached { out.best_cost } else { adapter().objective_at(&x)? };
        let diagnostics = Diagnostics {
            nfev: counters.nfev(),
            njev: counters.njev(),
            fn_evals: out.fn_evals,
            grad_norm: out.grad_norm,
            ..Diagnostics::default()
        };
        MinimizeResult::new(
            self.names(),
            Some(x),
            value,
            out.iterations as i64,
            out.message,
            out.converged,
            out.iterations,
            diagnostics,
        )
    }

    /// `Slsqp`: SLSQP over external parameters. Bounds go to the backend
    /// as box constraints, so no change of variables is applied. Without
    /// constraints this is a bound-constrained SLSQP run.
    fn execute_constrained(
        &self, objective: ScalarRef<'_>, opts: &MinimizeOptions, counters: &EvalCounters,
    ) -> OptResult<MinimizeResult> {
        let n = self.layout.len();
        let translated = translate_constraints(&self.constraints, &self.data)?;
        let identity = BoundTransform::identity(n);
        let adapter =
            ArgMinAdapter::new(&self.layout, objective, self.gradient_ref(), &identity, counters);
        let settings = SqpSettings {
            x0: self.layout.initial_guesses(),
            bounds: self.layout.bounds(),
            tol: opts.tols.tol,
            ctol: opts.constrained.ctol,
            max_eval: opts.tols.max_iter_for(n),
        };
        #[cfg(feature = "obs_slog")]
        if opts.verbose {
            crate::optimization::minimizer::run::log_initial_state(
                adapter.objective_at(&settings.x0)?,
                None,
            );
        }
        let solve = solve_sqp(&adapter, &translated, &settings)?;

        let diagnostics = Diagnostics {
            nfev: counters.nfev(),
            njev: counters.njev(),
            fn_evals: FnEvalMap::from([("cost_count".to_string(), solve.evaluations)]),
            max_violation: Some(solve.max_violation),
            ..Diagnostics::default()
        };
        MinimizeResult::new(
            self.names(),
            Some(solve.x),
            solve.value,
            solve.evaluations as i64,
            solve.message,
            solve.converged,
            solve.evaluations,
            diagnostics,
        )
    }

    /// `Minpack`: Levenberg–Marquardt on the (bound-transformed) residuals.
    /// The run is capped by `least_squares.max_fev`, not by `tols.max_iter`.
    fn execute_least_squares(
        &self, residuals: VectorRef<'_>, opts: &MinimizeOptions, transform: &BoundTransform,
        counters: &EvalCounters,
    ) -> OptResult<MinimizeResult> {
        let n = self.layout.len();
        let x0 = self.layout.initial_guesses();
        let t0 = transform.to_internal(&x0);
        let jacobian = self.matrix_ref();
        let adapter =
            ResidualAdapter::new(&self.layout, residuals, jacobian, transform, counters, t0);
        #[cfg(feature = "obs_slog")]
        if opts.verbose {
            let fvec = adapter.residuals_at(&x0)?;
            crate::optimization::minimizer::run::log_initial_state(fvec.dot(&fvec), None);
        }
        let ls = &opts.least_squares;
        let solver = build_levenberg_marquardt(ls, n)?;
        let solve = solve_least_squares(&solver, adapter, ls, lm_max_fev(ls, n))?;

        let diagnostics = Diagnostics {
            nfev: counters.nfev(),
            njev: counters.njev(),
            fn_evals: FnEvalMap::from([
                ("residual_count".to_string(), solve.evaluations),
                ("jacobian_count".to_string(), solve.iterations),
            ]),
            fvec: Some(solve.fvec.clone()),
            ..Diagnostics::default()
        };
        MinimizeResult::new(
            self.names(),
            Some(transform.to_external(&solve.t)),
            solve.fvec.dot(&solve.fvec),
            solve.status.code(),
            solve.message,
            solve.status.converged(),
            solve.iterations,
            diagnostics,
        )
    }
}

impl std::fmt::Debug for Minimizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Minimizer")
            .field("method", &self.method)
            .field("layout", &self.layout)
            .field("has_jacobian", &self.jacobian.is_some())
            .field("constraints", &self.constraints)
            .field("data", &self.data)
            .finish()
    }
}

// ---- Helper Methods ----

fn run_lbfgs(
    problem: ArgMinAdapter<'_>, t0: Theta, max_iter: u64, opts: &MinimizeOptions,
) -> OptResult<RunOutcome<()>> {
    let out = match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_lbfgs_more_thuente(opts)?;
            run_solver(problem, solver, t0, max_iter, opts.verbose)?.map_solver(|_| ())
        }
        LineSearcher::HagerZhang => {
            let solver = build_lbfgs_hager_zhang(opts)?;
            run_solver(problem, solver, t0, max_iter, opts.verbose)?.map_solver(|_| ())
        }
    };
    Ok(out)
}

fn run_bfgs(
    problem: ArgMinAdapter<'_>, t0: Theta, max_iter: u64, opts: &MinimizeOptions,
) -> OptResult<RunOutcome<()>> {
    let identity = Array2::<f64>::eye(t0.len());
    let out = match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_bfgs_more_thuente(opts)?;
            run_solver_with(problem, solver, t0, max_iter, opts.verbose, |state| {
                state.inv_hessian(identity)
            })?
            .map_solver(|_| ())
        }
        LineSearcher::HagerZhang => {
            let solver = build_bfgs_hager_zhang(opts)?;
            run_solver_with(problem, solver, t0, max_iter, opts.verbose, |state| {
                state.inv_hessian(identity)
            })?
            .map_solver(|_| ())
        }
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::minimizer::constraints::Relation;
    use approx::assert_relative_eq;
    use ndarray::array;
    use std::cell::Cell;

    fn params() -> Vec<Parameter> {
        vec![Parameter::new("a", 0.0).unwrap(), Parameter::new("b", 0.0).unwrap()]
    }

    fn bowl(p: &NamedParams<'_>) -> anyhow::Result<f64> {
        Ok((p["a"] - 3.0).powi(2) + (p["b"] + 2.0).powi(2))
    }

    #[test]
    // Purpose
    // -------
    // A residual objective on a scalar method (and vice versa) is rejected
    // at construction.
    fn objective_shape_must_match_method() {
        // Act
        let scalar_on_minpack = Minimizer::new(Method::Minpack, params(), Objective::scalar(bowl));
        let residuals_on_bfgs = Minimizer::new(
            Method::Bfgs,
            params(),
            Objective::residuals(|p: &NamedParams<'_>| -> anyhow::Result<Theta> {
                Ok(array![p["a"]])
            }),
        );

        // Assert
        assert!(matches!(scalar_on_minpack, Err(OptError::ShapeMismatch { .. })));
        assert!(matches!(residuals_on_bfgs, Err(OptError::ShapeMismatch { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Capabilities a method lacks are configuration errors.
    //
    // Given
    // -----
    // - A Nelder–Mead minimizer given a gradient.
    // - A BFGS minimizer given constraints.
    //
    // Expect
    // ------
    // - `UnsupportedCapability` in both cases.
    fn missing_capabilities_are_rejected() {
        // Arrange
        let nm = Minimizer::new(Method::NelderMead, params(), Objective::scalar(bowl)).unwrap();
        let bfgs = Minimizer::new(Method::Bfgs, params(), Objective::scalar(bowl)).unwrap();

        // Act
        let jac_err = nm
            .with_jacobian(Derivative::gradient(|_: &NamedParams<'_>| -> anyhow::Result<Theta> {
                Ok(array![0.0, 0.0])
            }))
            .unwrap_err();
        let con_err = bfgs
            .with_constraints(vec![Constraint::eq(|x| Ok(array![x[0]]))], DataContext::new())
            .unwrap_err();

        // Assert
        assert!(matches!(jac_err, OptError::UnsupportedCapability { capability: "a jacobian", .. }));
        assert!(matches!(con_err, OptError::UnsupportedCapability { capability: "constraints", .. }));
        assert!(jac_err.is_configuration());
    }

    #[test]
    // Purpose
    // -------
    // An unsupported relation fails when constraints are attached, before
    // the constraint callable or the objective ever runs.
    fn unsupported_relation_fails_before_any_call() {
        // Arrange
        let calls = Cell::new(0);
        let minimizer = Minimizer::new(Method::Slsqp, params(), Objective::scalar(bowl)).unwrap();
        let constraint = Constraint::new(Relation::Lt, |x| {
            calls.set(calls.get() + 1);
            Ok(array![x[0]])
        });

        // Act
        let err = minimizer.with_constraints(vec![constraint], DataContext::new()).unwrap_err();

        // Assert
        assert!(matches!(err, OptError::UnsupportedConstraint { index: 0, .. }));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    // Purpose
    // -------
    // `bounds()` yields exactly one pair per parameter, infinities for
    // absent bounds.
    fn bounds_have_one_pair_per_parameter() {
        // Arrange
        let params = vec![
            Parameter::bounded("a", 0.5, Some(0.0), Some(1.0)).unwrap(),
            Parameter::new("b", 0.0).unwrap(),
        ];
        let minimizer = Minimizer::new(Method::LBfgsB, params, Objective::scalar(bowl)).unwrap();

        // Act
        let bounds = minimizer.bounds();

        // Assert
        assert_eq!(bounds, vec![(0.0, 1.0), (f64::NEG_INFINITY, f64::INFINITY)]);
    }

    #[test]
    // Purpose
    // -------
    // BFGS with an analytic gradient reaches the minimizer, reports the
    // iteration count in `ier` and counts jacobian calls.
    fn bfgs_with_gradient_reaches_minimum() {
        // Arrange
        let minimizer = Minimizer::new(Method::Bfgs, params(), Objective::scalar(bowl))
            .unwrap()
            .with_jacobian(Derivative::gradient(|p: &NamedParams<'_>| -> anyhow::Result<Theta> {
                Ok(array![2.0 * (p["a"] - 3.0), 2.0 * (p["b"] + 2.0)])
            }))
            .unwrap();

        // Act
        let res = minimizer.execute(&MinimizeOptions::default()).unwrap();

        // Assert
        assert!(res.converged, "{}", res.message);
        assert_relative_eq!(res.popt[0], 3.0, epsilon = 1e-6);
        assert_relative_eq!(res.popt[1], -2.0, epsilon = 1e-6);
        assert_eq!(res.ier, res.iterations as i64);
        assert!(res.diagnostics.njev >= 1);
    }

    #[test]
    // Purpose
    // -------
    // Bounds on a method without bound support are ignored rather than
    // rejected.
    fn bounds_are_ignored_without_bound_capability() {
        // Arrange
        let params = vec![
            Parameter::bounded("a", 0.5, Some(0.0), Some(1.0)).unwrap(),
            Parameter::new("b", 0.0).unwrap(),
        ];
        let minimizer = Minimizer::new(Method::NelderMead, params, Objective::scalar(bowl)).unwrap();

        // Act
        let res = minimizer.execute(&MinimizeOptions::default()).unwrap();

        // Assert
        assert_relative_eq!(res.popt[0], 3.0, epsilon = 1e-3);
    }

    #[test]
    // Purpose
    // -------
    // A user error raised while BFGS differentiates numerically reaches the
    // caller unmodified, instead of being absorbed into a NaN gradient.
    //
    // Given
    // -----
    // - The bowl from `(0, 0)` without a gradient, failing for `a < 0`. The
    //   central difference in `a` at the start evaluates `a = −h`.
    //
    // Expect
    // ------
    // - `OptError::Callable` carrying the user's message.
    fn bfgs_finite_difference_propagates_user_error() {
        // Arrange
        let minimizer = Minimizer::new(
            Method::Bfgs,
            params(),
            Objective::scalar(|p: &NamedParams<'_>| -> anyhow::Result<f64> {
                if p["a"] < 0.0 {
                    anyhow::bail!("a must be non-negative");
                }
                bowl(p)
            }),
        )
        .unwrap();

        // Act
        let err = minimizer.execute(&MinimizeOptions::default()).unwrap_err();

        // Assert
        assert!(err.is_callable(), "{err}");
        assert_eq!(err.to_string(), "a must be non-negative");
    }

    #[test]
    // Purpose
    // -------
    // `Slsqp` without constraints still honors bounds natively and reports
    // its evaluation count in `ier`.
    fn slsqp_without_constraints_respects_bounds() {
        // Arrange
        let params = vec![
            Parameter::bounded("a", 0.5, Some(0.0), Some(1.0)).unwrap(),
            Parameter::new("b", 0.0).unwrap(),
        ];
        let minimizer = Minimizer::new(Method::Slsqp, params, Objective::scalar(bowl)).unwrap();

        // Act
        let res = minimizer.execute(&MinimizeOptions::default()).unwrap();

        // Assert
        assert!(res.converged, "{}", res.message);
        assert_relative_eq!(res.popt[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(res.popt[1], -2.0, epsilon = 1e-5);
        assert_eq!(res.ier, res.iterations as i64);
        assert_eq!(res.diagnostics.max_violation, Some(0.0));
        assert!(res.covariance.is_none());
    }

    #[test]
    // Purpose
    // -------
    // The least-squares path reports SSR as `value`, the residual vector
    // and its solver counters, and leaves `covariance` empty.
    fn minpack_reports_residuals_without_covariance() {
        // Arrange
        let minimizer = Minimizer::new(
            Method::Minpack,
            vec![Parameter::new("a", 0.0).unwrap()],
            Objective::residuals(|p: &NamedParams<'_>| -> anyhow::Result<Theta> {
                Ok(array![p["a"] - 5.0, 2.0 * (p["a"] - 5.0)])
            }),
        )
        .unwrap();

        // Act
        let res = minimizer.execute(&MinimizeOptions::default()).unwrap();

        // Assert
        assert!(res.converged, "{}", res.message);
        assert!((1..=4).contains(&res.ier));
        assert_relative_eq!(res.popt[0], 5.0, epsilon = 1e-6);
        assert_relative_eq!(res.value, 0.0, epsilon = 1e-10);
        assert_eq!(res.diagnostics.fvec.as_ref().map(|r| r.len()), Some(2));
        assert!(res.diagnostics.fn_evals["residual_count"] >= 2);
        assert_eq!(res.diagnostics.fn_evals["jacobian_count"], res.iterations as u64);
        assert!(res.covariance.is_none());
    }
}
