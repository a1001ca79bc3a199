//! optimization::errors — unified error surface for the optimizer layer.
//!
//! Purpose
//! -------
//! Collect every failure the optimizer layer can report (configuration
//! mistakes, factory lookups, precondition violations, evaluation-budget
//! refusals, numerical problems and argmin backend errors) into a single
//! [`OptError`] enum with the [`OptResult`] alias.
//!
//! Conventions
//! -----------
//! - Errors raised inside argmin callbacks travel through argmin as
//!   `argmin::core::Error` and are recovered intact by
//!   `From<argmin::core::Error> for OptError`.
//! - When the `python-bindings` feature is enabled, `OptError` converts into
//!   a Python exception (`KeyError` for lookups, `ValueError` otherwise).
use argmin::core::{ArgminError, Error};

#[cfg(feature = "python-bindings")]
use pyo3::{
    PyErr,
    exceptions::{PyKeyError, PyValueError},
};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// No gradient callable was supplied.
    GradientNotImplemented,

    /// A gradient-based optimizer was run without a gradient callable.
    GradientRequired {
        optimizer: &'static str,
    },

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

    // ---- OptimizerOptions ----
    /// Parameter-step tolerance needs to be positive and finite.
    InvalidTolX {
        tol: f64,
        reason: &'static str,
    },
    /// Function tolerance needs to be positive and finite.
    InvalidTolF {
        tol: f64,
        reason: &'static str,
    },
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    /// Evaluation budget needs to be a positive integer.
    InvalidMaxFEval {
        value: f64,
        reason: &'static str,
    },

    // ---- Factory ----
    /// No registered optimizer matches the requested name.
    UnknownOptimizer {
        name: String,
    },
    /// The requested name matches more than one registered optimizer.
    AmbiguousOptimizer {
        name: String,
        candidates: Vec<&'static str>,
    },

    // ---- Objective ----
    /// Cost function returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },
    /// The evaluation budget was spent; no further evaluations are allowed.
    EvaluationBudgetExhausted {
        max_f_eval: usize,
    },
    /// A caller-supplied callable failed (e.g. a Python exception).
    ObjectiveFailed {
        text: String,
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

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented, also returned by the default
    /// `Optimizer::optimize`.
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Finite Diffs ----
    /// Hessian matrix dimensions do not match parameter dimensions.
    HessianDimMismatch {
        expected: usize,
        found: (usize, usize),
    },

    /// Hessian values need to be finite.
    InvalidHessian {
        row: usize,
        col: usize,
        value: f64,
    },

    // ---- Fallback ----
    UnknownError,
}

impl OptError {
    /// True when argmin reported that its line search could not make
    /// progress (non-descent direction, bracketing failure, ...).
    pub fn is_line_search_failure(&self) -> bool {
        matches!(self, OptError::ConditionViolated { text } if text.contains("LineSearch"))
    }
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Gradient not implemented")
            }
            OptError::GradientRequired { optimizer } => {
                write!(f, "{optimizer} requires a combined objective and gradient function")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- OptimizerOptions ----
            OptError::InvalidTolX { tol, reason } => {
                write!(f, "Invalid parameter-step tolerance {tol}: {reason}")
            }
            OptError::InvalidTolF { tol, reason } => {
                write!(f, "Invalid function tolerance {tol}: {reason}")
            }
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxFEval { value, reason } => {
                write!(f, "Invalid maximum number of function evaluations {value}: {reason}")
            }

            // ---- Factory ----
            OptError::UnknownOptimizer { name } => {
                write!(f, "No optimizer was found matching the name: {name}")
            }
            OptError::AmbiguousOptimizer { name, candidates } => {
                write!(f, "Optimizer name '{name}' is ambiguous, it matches {candidates:?}")
            }

            // ---- Objective ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }
            OptError::EvaluationBudgetExhausted { max_f_eval } => {
                write!(f, "Maximum number of function evaluations ({max_f_eval}) reached")
            }
            OptError::ObjectiveFailed { text } => {
                write!(f, "Objective evaluation failed: {text}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Finite Diffs ----
            OptError::HessianDimMismatch { expected, found } => {
                write!(
                    f,
                    "Hessian dimension mismatch: expected ({expected}, {expected}), found {found:?}"
                )
            }
            OptError::InvalidHessian { row, col, value } => {
                write!(f, "Invalid Hessian at ({row}, {col}): {value}, must be finite")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Our own errors raised inside argmin callbacks come back first.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<OptError> for PyErr {
    fn from(err: OptError) -> PyErr {
        match err {
            OptError::UnknownOptimizer { .. } | OptError::AmbiguousOptimizer { .. } => {
                PyKeyError::new_err(err.to_string())
            }
            _ => PyValueError::new_err(format!("OptError: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Recovery of crate errors that travelled through argmin.
    // - Mapping of argmin's own error kinds.
    // - Line-search failure detection and lookup error messages.
    //
    // They intentionally DO NOT cover:
    // - The `From<OptError> for PyErr` conversion, which needs the Python C
    //   API and is exercised from Python.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure an `OptError` boxed into an argmin `Error` converts back to the
    // same variant instead of a generic backend error.
    fn opt_error_round_trips_through_argmin_error() {
        // Arrange
        let original = OptError::EvaluationBudgetExhausted { max_f_eval: 5 };
        let boxed: Error = original.clone().into();

        // Act
        let recovered = OptError::from(boxed);

        // Assert
        assert_eq!(recovered, original);
    }

    #[test]
    // Purpose
    // -------
    // Verify that argmin's `ConditionViolated` maps to the wrapper variant and
    // is recognized as a line-search failure when raised by a line search.
    fn argmin_condition_violated_maps_and_flags_line_search() {
        // Arrange
        let err: Error = ArgminError::ConditionViolated {
            text: "MoreThuenteLineSearch: Search direction must be a descent direction."
                .to_string(),
        }
        .into();

        // Act
        let mapped = OptError::from(err);

        // Assert
        assert!(matches!(mapped, OptError::ConditionViolated { .. }));
        assert!(mapped.is_line_search_failure());
    }

    #[test]
    // Purpose
    // -------
    // Confirm that foreign errors fall back to `BackendError` carrying the
    // original message.
    fn foreign_error_maps_to_backend_error() {
        // Arrange
        let err = Error::msg("disk on fire");

        // Act
        let mapped = OptError::from(err);

        // Assert
        match mapped {
            OptError::BackendError { text } => assert!(text.contains("disk on fire")),
            other => panic!("Expected BackendError, got {other:?}"),
        }
        assert!(!OptError::UnknownError.is_line_search_failure());
    }

    #[test]
    // Purpose
    // -------
    // The lookup error must carry the offending name in its message.
    fn unknown_optimizer_message_names_the_input() {
        let err = OptError::UnknownOptimizer { name: "conjugate".to_string() };
        assert!(err.to_string().contains("conjugate"));
    }
}
