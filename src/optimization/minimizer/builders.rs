//! minimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for every backend solver used by the
//! minimizer. These helpers hide `argmin`'s generic wiring and apply the
//! crate-level options (tolerance, memory size, least-squares stopping
//! rules) so that the dispatch code can request a configured solver without
//! touching `argmin`- or `levenberg-marquardt`-specific types.
//!
//! Key behaviors
//! -------------
//! - BFGS and L-BFGS with either Hager–Zhang or More–Thuente line search;
//!   `tol` is applied to both the gradient-norm and the cost-change tests.
//! - Nelder–Mead with the conventional initial simplex (see
//!   [`initial_simplex`]) and `tol` as the simplex standard-deviation
//!   tolerance.
//! - Levenberg–Marquardt from [`LeastSquaresOptions`]; the evaluation cap
//!   becomes the solver's patience, counted in multiples of `n + 1`.
//!
//! Conventions
//! -----------
//! - The builders do **not** set the initial parameter vector or
//!   `max_iters`; these are applied by the runner.
//! - Any tolerance `argmin` rejects is surfaced as an [`OptError`] via the
//!   crate's `From<argmin::core::Error>` conversion.
//!
//! [`OptError`]: crate::optimization::errors::OptError
use argmin::solver::quasinewton::{BFGS, LBFGS};
use levenberg_marquardt::LevenbergMarquardt;

use crate::optimization::{
    errors::OptResult,
    minimizer::{
        traits::{LeastSquaresOptions, MinimizeOptions},
        types::{
            BfgsHagerZhang, BfgsMoreThuente, Cost, Grad, HagerZhangLS, LbfgsHagerZhang,
            LbfgsMoreThuente, MoreThuenteLS, NelderMeadSolver, Theta,
        },
    },
};

/// Relative perturbation of each initial-simplex vertex.
pub const SIMPLEX_NONZERO_DELTA: f64 = 0.05;

/// Absolute perturbation used for coordinates that start at zero.
pub const SIMPLEX_ZERO_DELTA: f64 = 0.00025;

/// L-BFGS with Hager–Zhang line search.
pub fn build_lbfgs_hager_zhang(opts: &MinimizeOptions) -> OptResult<LbfgsHagerZhang> {
    let lbfgs = LbfgsHagerZhang::new(HagerZhangLS::new(), opts.lbfgs_mem());
    configure_lbfgs(lbfgs, opts)
}

/// L-BFGS with More–Thuente line search.
pub fn build_lbfgs_more_thuente(opts: &MinimizeOptions) -> OptResult<LbfgsMoreThuente> {
    let lbfgs = LbfgsMoreThuente::new(MoreThuenteLS::new(), opts.lbfgs_mem());
    configure_lbfgs(lbfgs, opts)
}

/// Apply `tol` to an L-BFGS solver, whatever its line search.
pub fn configure_lbfgs<L>(
    solver: LBFGS<L, Theta, Grad, Cost>, opts: &MinimizeOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    let tol = opts.tols.tol;
    Ok(solver.with_tolerance_grad(tol)?.with_tolerance_cost(tol)?)
}

/// BFGS with Hager–Zhang line search.
pub fn build_bfgs_hager_zhang(opts: &MinimizeOptions) -> OptResult<BfgsHagerZhang> {
    configure_bfgs(BFGS::new(HagerZhangLS::new()), opts)
}

/// BFGS with More–Thuente line search.
pub fn build_bfgs_more_thuente(opts: &MinimizeOptions) -> OptResult<BfgsMoreThuente> {
    configure_bfgs(BFGS::new(MoreThuenteLS::new()), opts)
}

/// Apply `tol` to a BFGS solver, whatever its line search.
pub fn configure_bfgs<L>(solver: BFGS<L, Cost>, opts: &MinimizeOptions) -> OptResult<BFGS<L, Cost>> {
    let tol = opts.tols.tol;
    Ok(solver.with_tolerance_grad(tol)?.with_tolerance_cost(tol)?)
}

/// Conventional Nelder–Mead starting simplex: `x0` plus one vertex per
/// coordinate, perturbed by 5% (or by `0.00025` when the coordinate is 0).
pub fn initial_simplex(x0: &Theta) -> Vec<Theta> {
    let mut vertices = Vec::with_capacity(x0.len() + 1);
    vertices.push(x0.clone());
    for i in 0..x0.len() {
        let mut vertex = x0.clone();
        vertex[i] = if x0[i] != 0.0 {
            (1.0 + SIMPLEX_NONZERO_DELTA) * x0[i]
        } else {
            SIMPLEX_ZERO_DELTA
        };
        vertices.push(vertex);
    }
    vertices
}

/// Nelder–Mead around `x0` with `tol` as the simplex standard-deviation
/// tolerance.
pub fn build_nelder_mead(x0: &Theta, opts: &MinimizeOptions) -> OptResult<NelderMeadSolver> {
    Ok(NelderMeadSolver::new(initial_simplex(x0)).with_sd_tolerance(opts.tols.tol)?)
}

/// Levenberg–Marquardt for `n` parameters, diagonal scaling on.
///
/// # Errors
/// Propagates [`LeastSquaresOptions`] validation errors; the solver's own
/// setters would panic on the same values.
pub fn build_levenberg_marquardt(
    opts: &LeastSquaresOptions, n: usize,
) -> OptResult<LevenbergMarquardt<f64>> {
    opts.validate()?;
    Ok(LevenbergMarquardt::new()
        .with_ftol(opts.ftol)
        .with_xtol(opts.xtol)
        .with_gtol(opts.gtol)
        .with_stepbound(opts.factor)
        .with_patience(lm_patience(opts, n))
        .with_scale_diag(true))
}

/// Evaluation cap in units of `n + 1`, rounded up.
pub fn lm_patience(opts: &LeastSquaresOptions, n: usize) -> usize {
    let per_unit = n as u64 + 1;
    opts.max_fev_for(n).div_ceil(per_unit).max(1) as usize
}

/// Residual-evaluation cap the solver actually applies.
pub fn lm_max_fev(opts: &LeastSquaresOptions, n: usize) -> u64 {
    lm_patience(opts, n) as u64 * (n as u64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::minimizer::traits::{LineSearcher, Tolerances};
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Every gradient-based builder accepts the default options for both
    // line searches.
    fn gradient_builders_accept_default_options() {
        // Arrange
        let opts = MinimizeOptions::default();
        let hz = MinimizeOptions::new(Tolerances::default(), LineSearcher::HagerZhang, Some(11), false)
            .expect("options should be valid");

        // Act / Assert
        assert!(build_lbfgs_more_thuente(&opts).is_ok());
        assert!(build_lbfgs_hager_zhang(&hz).is_ok());
        assert!(build_bfgs_more_thuente(&opts).is_ok());
        assert!(build_bfgs_hager_zhang(&hz).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // The simplex perturbs one coordinate per vertex: 5% when non-zero,
    // 0.00025 when zero.
    //
    // Given
    // -----
    // - `x0 = [2.0, 0.0]`.
    //
    // Expect
    // ------
    // - Vertices `[2, 0]`, `[2.1, 0]`, `[2, 0.00025]`.
    fn initial_simplex_uses_conventional_perturbations() {
        // Act
        let simplex = initial_simplex(&array![2.0, 0.0]);

        // Assert
        assert_eq!(simplex.len(), 3);
        assert_eq!(simplex[0], array![2.0, 0.0]);
        assert_eq!(simplex[1], array![2.1, 0.0]);
        assert_eq!(simplex[2], array![2.0, 0.00025]);
    }

    #[test]
    fn nelder_mead_and_levenberg_marquardt_build_from_defaults() {
        let opts = MinimizeOptions::default();
        let ls = opts.least_squares;

        assert!(build_nelder_mead(&array![1.0, 0.0], &opts).is_ok());
        let lm = build_levenberg_marquardt(&ls, 3).unwrap();
        let expected = LevenbergMarquardt::new()
            .with_ftol(ls.ftol)
            .with_xtol(ls.xtol)
            .with_gtol(0.0)
            .with_stepbound(100.0)
            .with_patience(200)
            .with_scale_diag(true);
        assert_eq!(lm, expected);
        assert_eq!(lm_max_fev(&ls, 3), 800);
    }

    #[test]
    // Purpose
    // -------
    // An explicit evaluation cap is rounded up to a whole number of
    // `n + 1` blocks, and invalid options never reach the solver's
    // panicking setters.
    fn levenberg_marquardt_budget_rounds_up_and_rejects_bad_options() {
        // Arrange
        let capped = LeastSquaresOptions { max_fev: Some(10), ..LeastSquaresOptions::default() };
        let bad = LeastSquaresOptions { factor: 0.0, ..LeastSquaresOptions::default() };

        // Act / Assert
        assert_eq!(lm_patience(&capped, 2), 4);
        assert_eq!(lm_max_fev(&capped, 2), 12);
        assert_eq!(lm_max_fev(&LeastSquaresOptions { max_fev: Some(1), ..capped }, 4), 5);
        assert!(build_levenberg_marquardt(&bad, 2).unwrap_err().is_configuration());
    }
}
