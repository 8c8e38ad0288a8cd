//! optimization::errors — unified error surface for the minimizer adapter.
//!
//! Purpose
//! -------
//! Collect every failure the adapter can report into a single enum,
//! [`OptError`], with a shared result alias [`OptResult<T>`]. Three families
//! are kept apart:
//!
//! - **Configuration errors**: invalid parameters, options, unsupported
//!   constraint relations, or a capability the chosen method lacks. These are
//!   raised before any solver call (see [`OptError::is_configuration`]).
//! - **Callable failures**: errors returned by user objectives, jacobians or
//!   constraints. They are carried unmodified in [`OptError::Callable`].
//! - **Backend errors**: `argmin` errors that abort a run. The runner turns
//!   most of them into a non-converged result; the variants here exist for
//!   the remaining cases.
//!
//! Conventions
//! -----------
//! - User failures travel through `argmin` wrapped in [`CallableFailure`] so
//!   they can be told apart from solver errors on the way back out.
//! - Adapter errors raised inside solver callbacks (dimension mismatches,
//!   non-finite values) travel as `OptError` and are re-surfaced as-is.
use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug)]
pub enum OptError {
    // ---- Parameters ----
    /// Parameter names must be non-empty.
    EmptyParameterName,

    /// Parameter names must be unique within one minimizer.
    DuplicateParameter {
        name: String,
    },

    /// Initial value must be finite.
    InvalidInitialValue {
        name: String,
        value: f64,
    },

    /// Bounds must not be NaN and must satisfy `min <= max`.
    InvalidBounds {
        name: String,
        min: f64,
        max: f64,
        reason: &'static str,
    },

    /// A name lookup did not match any parameter.
    UnknownParameter {
        name: String,
    },

    /// A name-keyed value map did not provide every parameter.
    MissingParameter {
        name: String,
    },

    /// At least one parameter is required.
    NoParameters,

    // ---- Capabilities ----
    /// The method cannot use the supplied capability.
    UnsupportedCapability {
        method: &'static str,
        capability: &'static str,
    },

    /// Objective/jacobian shape does not match what the method expects.
    ShapeMismatch {
        method: &'static str,
        expected: &'static str,
    },

    /// Invalid method name.
    InvalidMethod {
        name: String,
        reason: &'static str,
    },

    // ---- Constraints ----
    /// Only equality and `>=` constraints can be handed to the solver.
    UnsupportedConstraint {
        index: usize,
        relation: String,
    },

    /// Invalid relation symbol.
    InvalidRelation {
        symbol: String,
        reason: &'static str,
    },

    /// A constraint callable returned an empty vector.
    EmptyConstraintOutput {
        index: usize,
    },

    /// Constraint jacobian row length differs from the parameter count.
    ConstraintJacobianMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    // ---- MinimizeOptions ----
    /// Tolerance needs to be positive and finite.
    InvalidTolerance {
        name: &'static str,
        tol: f64,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: u64,
        reason: &'static str,
    },

    /// Invalid line searcher name.
    InvalidLineSearch {
        name: String,
        reason: &'static str,
    },

    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem {
        mem: usize,
        reason: &'static str,
    },

    /// Step bound of the least-squares path is invalid.
    InvalidStepBound {
        value: f64,
        reason: &'static str,
    },

    // ---- Gradient / Jacobian ----
    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Residual jacobian does not have shape `m × n`.
    JacobianDimMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Residual jacobian entries need to be finite.
    InvalidJacobian {
        row: usize,
        col: usize,
        value: f64,
    },

    // ---- Objective ----
    /// Objective returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },

    /// Residual vector changed length between evaluations or is empty.
    ResidualDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Residual entries need to be finite.
    InvalidResidual {
        index: usize,
        value: f64,
    },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Theta hat is missing
    MissingThetaHat,

    // ---- User callables ----
    /// Error returned by a user objective, jacobian or constraint, untouched.
    Callable(anyhow::Error),

    // ---- Backend ----
    /// `argmin` reported a failure of its own.
    Backend {
        kind: BackendKind,
        text: String,
    },
    /// A parameter vector that is not laid out contiguously in memory.
    NonContiguousParams,
}

/// Category of a failure reported by `argmin` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    InvalidParameter,
    NotImplemented,
    NotInitialized,
    ConditionViolated,
    CheckpointNotFound,
    PotentialBug,
    Impossible,
    Other,
}

impl BackendKind {
    pub fn label(self) -> &'static str {
        match self {
            BackendKind::InvalidParameter => "invalid parameter",
            BackendKind::NotImplemented => "not implemented",
            BackendKind::NotInitialized => "not initialized",
            BackendKind::ConditionViolated => "condition violated",
            BackendKind::CheckpointNotFound => "checkpoint not found",
            BackendKind::PotentialBug => "potential bug",
            BackendKind::Impossible => "impossible state",
            BackendKind::Other => "other",
        }
    }
}

impl OptError {
    /// `true` for errors raised while validating a minimizer or its options,
    /// i.e. before any solver call.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OptError::EmptyParameterName
                | OptError::DuplicateParameter { .. }
                | OptError::InvalidInitialValue { .. }
                | OptError::InvalidBounds { .. }
                | OptError::UnknownParameter { .. }
                | OptError::MissingParameter { .. }
                | OptError::NoParameters
                | OptError::UnsupportedCapability { .. }
                | OptError::ShapeMismatch { .. }
                | OptError::InvalidMethod { .. }
                | OptError::UnsupportedConstraint { .. }
                | OptError::InvalidRelation { .. }
                | OptError::InvalidTolerance { .. }
                | OptError::InvalidMaxIter { .. }
                | OptError::InvalidLineSearch { .. }
                | OptError::InvalidLBFGSMem { .. }
                | OptError::InvalidStepBound { .. }
        )
    }

    /// `true` when the error came from a user-supplied callable.
    pub fn is_callable(&self) -> bool {
        matches!(self, OptError::Callable(_))
    }

    /// `true` for non-finite values produced while the solver evaluates a
    /// point. The run stops there and reports the last good state.
    pub fn is_non_finite(&self) -> bool {
        matches!(
            self,
            OptError::NonFiniteCost { .. }
                | OptError::InvalidGradient { .. }
                | OptError::InvalidResidual { .. }
                | OptError::InvalidJacobian { .. }
        )
    }

    /// Convert for transport through an `argmin` callback, keeping user
    /// failures distinguishable from adapter errors.
    pub(crate) fn into_argmin(self) -> Error {
        match self {
            OptError::Callable(inner) => CallableFailure::wrap(inner),
            other => Error::new(other),
        }
    }
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Parameters ----
            OptError::EmptyParameterName => write!(f, "Parameter names must be non-empty"),
            OptError::DuplicateParameter { name } => {
                write!(f, "Duplicate parameter name '{name}'")
            }
            OptError::InvalidInitialValue { name, value } => {
                write!(f, "Invalid initial value for '{name}': {value}, must be finite")
            }
            OptError::InvalidBounds { name, min, max, reason } => {
                write!(f, "Invalid bounds for '{name}': ({min}, {max}): {reason}")
            }
            OptError::UnknownParameter { name } => write!(f, "Unknown parameter '{name}'"),
            OptError::MissingParameter { name } => {
                write!(f, "No value provided for parameter '{name}'")
            }
            OptError::NoParameters => write!(f, "At least one parameter is required"),

            // ---- Capabilities ----
            OptError::UnsupportedCapability { method, capability } => {
                write!(f, "Method {method} does not support {capability}")
            }
            OptError::ShapeMismatch { method, expected } => {
                write!(f, "Method {method} expects {expected}")
            }
            OptError::InvalidMethod { name, reason } => {
                write!(f, "Invalid method '{name}': {reason}")
            }

            // ---- Constraints ----
            OptError::UnsupportedConstraint { index, relation } => {
                write!(
                    f,
                    "Constraint {index} uses relation '{relation}'; only '==' and '>=' are supported"
                )
            }
            OptError::InvalidRelation { symbol, reason } => {
                write!(f, "Invalid relation '{symbol}': {reason}")
            }
            OptError::EmptyConstraintOutput { index } => {
                write!(f, "Constraint {index} returned an empty vector")
            }
            OptError::ConstraintJacobianMismatch { index, expected, found } => {
                write!(
                    f,
                    "Constraint {index} jacobian row has length {found}, expected {expected}"
                )
            }

            // ---- MinimizeOptions ----
            OptError::InvalidTolerance { name, tol, reason } => {
                write!(f, "Invalid tolerance {name} = {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }
            OptError::InvalidStepBound { value, reason } => {
                write!(f, "Invalid step bound {value}: {reason}")
            }

            // ---- Gradient / Jacobian ----
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }
            OptError::JacobianDimMismatch { expected, found } => {
                write!(f, "Jacobian dimension mismatch: expected {expected:?}, found {found:?}")
            }
            OptError::InvalidJacobian { row, col, value } => {
                write!(f, "Invalid jacobian at ({row}, {col}): {value}, must be finite")
            }

            // ---- Objective ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }
            OptError::ResidualDimMismatch { expected, found } => {
                write!(f, "Residual dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidResidual { index, value } => {
                write!(f, "Invalid residual at index {index}: {value}, must be finite")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- User callables ----
            OptError::Callable(err) => write!(f, "{err}"),

            // ---- Backend ----
            OptError::Backend { kind, text } => {
                write!(f, "argmin backend failure ({}): {text}", kind.label())
            }
            OptError::NonContiguousParams => {
                write!(f, "Parameter vector is not contiguous in memory")
            }
        }
    }
}

/// Carrier for a user-callable error while it crosses the `argmin` boundary.
///
/// `argmin` callbacks return `argmin::core::Error`; wrapping the user's
/// `anyhow::Error` in this type lets [`From<Error> for OptError`] recover it
/// untouched instead of mistaking it for a solver failure.
#[derive(Debug)]
pub struct CallableFailure(pub anyhow::Error);

impl std::fmt::Display for CallableFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CallableFailure {}

impl CallableFailure {
    /// Wrap a user error for transport through an `argmin` callback.
    pub fn wrap(err: anyhow::Error) -> Error {
        Error::new(CallableFailure(err))
    }
}

/// Where an `argmin` error originated once it comes back out of a run.
#[derive(Debug)]
pub(crate) enum ErrorOrigin {
    /// A user callable or an adapter contract check failed; must propagate.
    Caller(OptError),
    /// The backend gave up (line search breakdown, violated condition) or
    /// stepped onto a point where the objective is not finite.
    Solver(OptError),
}

impl ErrorOrigin {
    /// Classify an `argmin` error.
    pub(crate) fn classify(err: Error) -> Self {
        let err = match err.downcast::<CallableFailure>() {
            Ok(CallableFailure(inner)) => return ErrorOrigin::Caller(OptError::Callable(inner)),
            Err(err) => err,
        };
        match err.downcast::<OptError>() {
            Ok(opt_err) if opt_err.is_non_finite() => ErrorOrigin::Solver(opt_err),
            Ok(opt_err) => ErrorOrigin::Caller(opt_err),
            Err(err) => ErrorOrigin::Solver(map_argmin_error(err)),
        }
    }
}

impl From<Error> for OptError {
    fn from(err: Error) -> Self {
        match ErrorOrigin::classify(err) {
            ErrorOrigin::Caller(err) | ErrorOrigin::Solver(err) => err,
        }
    }
}

fn map_argmin_error(err: Error) -> OptError {
    let native = match err.downcast::<ArgminError>() {
        Ok(native) => native,
        Err(err) => return OptError::Backend { kind: BackendKind::Other, text: err.to_string() },
    };
    let (kind, text) = match native {
        ArgminError::InvalidParameter { text } => (BackendKind::InvalidParameter, text),
        ArgminError::NotImplemented { text } => (BackendKind::NotImplemented, text),
        ArgminError::NotInitialized { text } => (BackendKind::NotInitialized, text),
        ArgminError::ConditionViolated { text } => (BackendKind::ConditionViolated, text),
        ArgminError::CheckpointNotFound { text } => (BackendKind::CheckpointNotFound, text),
        ArgminError::PotentialBug { text } => (BackendKind::PotentialBug, text),
        ArgminError::ImpossibleError { text } => (BackendKind::Impossible, text),
        other => (BackendKind::Other, other.to_string()),
    };
    OptError::Backend { kind, text }
}
