//! minimizer::constraints — user constraints and their solver-side form.
//!
//! Purpose
//! -------
//! Hold user constraints (a positional callable tagged with a comparison
//! [`Relation`], plus an optional jacobian) and translate them into
//! [`SolverConstraint`]s: `{ kind, fun, jac, args }` records the constrained
//! backend evaluates on trial parameter vectors.
//!
//! Key behaviors
//! -------------
//! - `==` translates to [`ConstraintType::Eq`], `>=` to
//!   [`ConstraintType::Ineq`] (feasible when the value is `≥ 0`).
//! - Any other relation fails in [`translate_constraints`] with
//!   [`OptError::UnsupportedConstraint`], before a solver is built.
//! - Evaluation calls the user callable on `(data..., params...)` and keeps
//!   the first output component; the jacobian contributes its first row.
//!
//! Invariants & assumptions
//! ------------------------
//! - Constraint jacobian rows have one entry per parameter, in layout order.
//! - The data context is fixed for the whole run.
use std::{fmt, str::FromStr};

use ndarray::Array1;

use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::types::{Grad, PositionalFn, PositionalMatrixFn, Theta},
};

/// Comparison a constraint expresses between its left-hand side and zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
    Ne,
}

impl Relation {
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Eq => "==",
            Relation::Ge => ">=",
            Relation::Le => "<=",
            Relation::Gt => ">",
            Relation::Lt => "<",
            Relation::Ne => "!=",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Relation {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "==" | "=" => Ok(Relation::Eq),
            ">=" => Ok(Relation::Ge),
            "<=" => Ok(Relation::Le),
            ">" => Ok(Relation::Gt),
            "<" => Ok(Relation::Lt),
            "!=" => Ok(Relation::Ne),
            _ => Err(OptError::InvalidRelation {
                symbol: s.to_string(),
                reason: "Valid relations are '==', '>=', '<=', '>', '<' and '!='.",
            }),
        }
    }
}

/// The two constraint kinds the constrained backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    /// `fun(x) == 0`
    Eq,
    /// `fun(x) >= 0`
    Ineq,
}

impl ConstraintType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintType::Eq => "eq",
            ConstraintType::Ineq => "ineq",
        }
    }
}

/// Map a relation onto the backend's constraint kind.
///
/// # Errors
/// [`OptError::UnsupportedConstraint`] for anything but `==` and `>=`.
pub fn constraint_type(relation: Relation, index: usize) -> OptResult<ConstraintType> {
    match relation {
        Relation::Eq => Ok(ConstraintType::Eq),
        Relation::Ge => Ok(ConstraintType::Ineq),
        other => {
            Err(OptError::UnsupportedConstraint { index, relation: other.symbol().to_string() })
        }
    }
}

/// A user constraint: `fun(data..., params...)[0] <relation> 0`.
pub struct Constraint<'a> {
    relation: Relation,
    fun: PositionalFn<'a>,
    jacobian: Option<PositionalMatrixFn<'a>>,
}

impl<'a> Constraint<'a> {
    pub fn new<F>(relation: Relation, fun: F) -> Self
    where
        F: Fn(&[f64]) -> anyhow::Result<Array1<f64>> + 'a,
    {
        Self { relation, fun: Box::new(fun), jacobian: None }
    }

    /// `fun(...) == 0`
    pub fn eq<F>(fun: F) -> Self
    where
        F: Fn(&[f64]) -> anyhow::Result<Array1<f64>> + 'a,
    {
        Self::new(Relation::Eq, fun)
    }

    /// `fun(...) >= 0`
    pub fn ge<F>(fun: F) -> Self
    where
        F: Fn(&[f64]) -> anyhow::Result<Array1<f64>> + 'a,
    {
        Self::new(Relation::Ge, fun)
    }

    /// Attach a jacobian; its first row must hold one entry per parameter.
    pub fn with_jacobian<J>(mut self, jacobian: J) -> Self
    where
        J: Fn(&[f64]) -> anyhow::Result<ndarray::Array2<f64>> + 'a,
    {
        self.jacobian = Some(Box::new(jacobian));
        self
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn has_jacobian(&self) -> bool {
        self.jacobian.is_some()
    }
}

impl fmt::Debug for Constraint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("relation", &self.relation)
            .field("has_jacobian", &self.jacobian.is_some())
            .finish()
    }
}

/// Ordered named data values prepended to every constraint evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataContext {
    names: Vec<String>,
    values: Vec<f64>,
}

impl DataContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named value; order of insertion is evaluation order.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.names.push(name.into());
        self.values.push(value);
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for DataContext {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        iter.into_iter().fold(DataContext::new(), |ctx, (name, value)| ctx.with(name, value))
    }
}

/// Solver-side constraint: `{ kind, fun, jac, args }`.
#[derive(Debug)]
pub struct SolverConstraint<'c> {
    index: usize,
    kind: ConstraintType,
    args: Vec<f64>,
    constraint: &'c Constraint<'c>,
}

impl<'c> SolverConstraint<'c> {
    pub fn kind(&self) -> ConstraintType {
        self.kind
    }

    /// Fixed data values passed ahead of the parameters.
    pub fn args(&self) -> &[f64] {
        &self.args
    }

    pub fn has_jac(&self) -> bool {
        self.constraint.has_jacobian()
    }

    /// Scalar constraint value at `params`.
    ///
    /// # Errors
    /// - [`OptError::Callable`] when the user callable fails.
    /// - [`OptError::EmptyConstraintOutput`] when it returns no components.
    pub fn fun(&self, params: &Theta) -> OptResult<f64> {
        let args = self.positional(params);
        let out = (self.constraint.fun)(&args).map_err(OptError::Callable)?;
        out.first().copied().ok_or(OptError::EmptyConstraintOutput { index: self.index })
    }

    /// First jacobian row at `params`, or `None` without a jacobian.
    ///
    /// # Errors
    /// - [`OptError::Callable`] when the user callable fails.
    /// - [`OptError::ConstraintJacobianMismatch`] when the row length is not
    ///   the parameter count.
    pub fn jac(&self, params: &Theta) -> Option<OptResult<Grad>> {
        let jacobian = self.constraint.jacobian.as_ref()?;
        let args = self.positional(params);
        let result = jacobian(&args).map_err(OptError::Callable).and_then(|jac| {
            let found = if jac.nrows() == 0 { 0 } else { jac.ncols() };
            if found != params.len() {
                return Err(OptError::ConstraintJacobianMismatch {
                    index: self.index,
                    expected: params.len(),
                    found,
                });
            }
            Ok(jac.row(0).to_owned())
        });
        Some(result)
    }

    fn positional(&self, params: &Theta) -> Vec<f64> {
        let mut args = Vec::with_capacity(self.args.len() + params.len());
        args.extend_from_slice(&self.args);
        args.extend(params.iter().copied());
        args
    }
}

/// Translate user constraints into solver constraints bound to `data`.
///
/// # Errors
/// [`OptError::UnsupportedConstraint`] for the first constraint whose
/// relation is neither `==` nor `>=`. No callable is invoked.
pub fn translate_constraints<'c>(
    constraints: &'c [Constraint<'c>], data: &DataContext,
) -> OptResult<Vec<SolverConstraint<'c>>> {
    constraints
        .iter()
        .enumerate()
        .map(|(index, constraint)| {
            Ok(SolverConstraint {
                index,
                kind: constraint_type(constraint.relation, index)?,
                args: data.values.clone(),
                constraint,
            })
        })
        .collect()
}
