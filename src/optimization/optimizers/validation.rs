//! Validation helpers for optimizer configuration and outcomes.
//!
//! - **Tolerance checks**: [`verify_tol_x`], [`verify_tol_f`],
//!   [`verify_tol_grad`] ensure tolerances are finite and strictly positive
//!   when provided.
//! - **Budget checks**: [`verify_max_f_eval`] and [`coerce_max_f_eval`]
//!   enforce a positive integer evaluation budget.
//! - **Gradient / Hessian validation**: [`validate_grad`],
//!   [`validate_hessian`] enforce shapes and finite entries.
//! - **Outcome checks**: [`validate_theta_hat`], [`validate_value`].
use crate::optimization::{
    errors::{OptError, OptResult},
    optimizers::types::{Grad, Hessian, Theta},
};

/// Validate the optional parameter-step tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolX`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_x(tol: Option<f64>) -> OptResult<()> {
    verify_tol(tol).map_err(|(tol, reason)| OptError::InvalidTolX { tol, reason })
}

/// Validate the optional function-value tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolF`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_f(tol: Option<f64>) -> OptResult<()> {
    verify_tol(tol).map_err(|(tol, reason)| OptError::InvalidTolF { tol, reason })
}

/// Validate the optional gradient-norm tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolGrad`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    verify_tol(tol).map_err(|(tol, reason)| OptError::InvalidTolGrad { tol, reason })
}

fn verify_tol(tol: Option<f64>) -> Result<(), (f64, &'static str)> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err((tol, "Tolerance must be finite."));
        }
        if tol <= 0.0 {
            return Err((tol, "Tolerance must be positive."));
        }
    }
    Ok(())
}

/// Validate an integer evaluation budget.
///
/// # Errors
/// Returns [`OptError::InvalidMaxFEval`] when `max_f_eval == 0`.
pub fn verify_max_f_eval(max_f_eval: usize) -> OptResult<()> {
    if max_f_eval == 0 {
        return Err(OptError::InvalidMaxFEval {
            value: 0.0,
            reason: "Maximum number of function evaluations must be greater than zero.",
        });
    }
    Ok(())
}

/// Coerce a floating-point evaluation budget (e.g. `1e4`) to an integer.
///
/// Truncates toward zero, so `2.9` becomes `2`.
///
/// # Errors
/// Returns [`OptError::InvalidMaxFEval`] for non-finite values or values
/// that truncate to zero or below.
pub fn coerce_max_f_eval(value: f64) -> OptResult<usize> {
    if !value.is_finite() {
        return Err(OptError::InvalidMaxFEval {
            value,
            reason: "Maximum number of function evaluations must be finite.",
        });
    }
    let truncated = value.trunc();
    if truncated < 1.0 {
        return Err(OptError::InvalidMaxFEval {
            value,
            reason: "Maximum number of function evaluations must be at least one.",
        });
    }
    Ok(truncated as usize)
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] for the first non-finite element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector.
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(OptError::MissingThetaHat),
    }
}

/// Validate that a scalar objective value is finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

/// Validate the shape and entries of a Hessian matrix.
///
/// # Errors
/// - [`OptError::HessianDimMismatch`] if dimensions are not `dim × dim`.
/// - [`OptError::InvalidHessian`] for the first non-finite entry.
pub fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    if hessian.nrows() != dim || hessian.ncols() != dim {
        return Err(OptError::HessianDimMismatch {
            expected: dim,
            found: (hessian.nrows(), hessian.ncols()),
        });
    }
    for ((i, j), &value) in hessian.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidHessian { row: i, col: j, value });
        }
    }
    Ok(())
}
