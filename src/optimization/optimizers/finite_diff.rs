//! optimizers::finite_diff — finite-difference Hessians from a gradient.
//!
//! Purpose
//! -------
//! Supply second-order information to engines that need a Hessian (the
//! truncated-Newton adapter) when the caller only provides a gradient. The
//! Hessian is the finite-difference Jacobian of the gradient, validated and
//! symmetrized before it reaches argmin.
//!
//! Key behaviors
//! -------------
//! - [`compute_hessian`] prefers central differences and falls back to
//!   forward differences when the central approximation fails validation.
//! - [`hessian_from_gradient`] wraps a fallible gradient: the first error
//!   raised while differencing (including an evaluation-budget refusal) is
//!   captured and returned instead of a garbage matrix.
//!
//! Conventions
//! -----------
//! - `finitediff` closures must return plain arrays, so fallible
//!   evaluations write their error into a `RefCell` slot and return `NaN`s.
use crate::optimization::{
    errors::{OptError, OptResult},
    optimizers::{
        types::{Grad, Hessian, Theta},
        validation::validate_hessian,
    },
};
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Finite-difference Hessian of a fallible gradient function.
///
/// Parameters
/// ----------
/// - `theta`: point at which to differentiate.
/// - `grad`: gradient callable; each call may fail.
///
/// Errors
/// ------
/// - The first error returned by `grad` during differencing, unchanged.
/// - [`OptError::InvalidHessian`] / [`OptError::HessianDimMismatch`] when the
///   approximation is unusable.
pub fn hessian_from_gradient<G>(theta: &Theta, grad: G) -> OptResult<Hessian>
where
    G: Fn(&Theta) -> OptResult<Grad>,
{
    let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
    let dim = theta.len();
    let grad_fn = |x: &Theta| -> Grad {
        match grad(x) {
            Ok(g) => g,
            Err(e) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                Grad::from_elem(dim, f64::NAN)
            }
        }
    };
    let hessian = compute_hessian(&grad_fn, theta);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    hessian
}

/// compute_hessian — finite-difference Hessian with validation and symmetry.
///
/// Central differences first; any validation failure on the central
/// approximation triggers a forward-difference retry, whose validation
/// result is the one surfaced.
///
/// # Errors
/// - [`OptError::HessianDimMismatch`] or [`OptError::InvalidHessian`] when
///   the forward-difference fallback also fails validation.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut cent_hess = theta.central_hessian(f);
    match validate_hessian(&cent_hess, dim) {
        Ok(_) => {
            symmetrize_hess(&mut cent_hess);
            Ok(cent_hess)
        }
        Err(_) => {
            let mut forward_hess = theta.forward_hessian(f);
            validate_hessian(&forward_hess, dim)?;
            symmetrize_hess(&mut forward_hess);
            Ok(forward_hess)
        }
    }
}

// ---- Helper methods ----

/// Average each off-diagonal pair in place; the diagonal is untouched.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Hessian construction, symmetry and validation.
    // - Error capture from fallible gradients.
    //
    // They intentionally DO NOT cover:
    // - Engine behavior that consumes these Hessians.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `compute_hessian` produces a finite, symmetric Hessian for a
    // quadratic whose gradient is linear.
    //
    // Given
    // -----
    // - `g(θ) = (2θ₀ + θ₁, θ₀ + 4θ₁)`, the gradient of
    //   `θ₀² + θ₀θ₁ + 2θ₁²`.
    //
    // Expect
    // ------
    // - Hessian ≈ [[2, 1], [1, 4]].
    fn compute_hessian_quadratic_recovers_curvature() {
        // Arrange
        let theta: Theta = array![1.0, 2.0];
        let grad_fn = |t: &Theta| array![2.0 * t[0] + t[1], t[0] + 4.0 * t[1]];

        // Act
        let hess = compute_hessian(&grad_fn, &theta).expect("Hessian should be computed");

        // Assert
        assert_eq!(hess.shape(), &[2, 2]);
        assert_eq!(hess[[0, 1]], hess[[1, 0]]);
        assert!((hess[[0, 0]] - 2.0).abs() < 1e-5);
        assert!((hess[[0, 1]] - 1.0).abs() < 1e-5);
        assert!((hess[[1, 1]] - 4.0).abs() < 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // Both central and forward paths fail on a NaN gradient, so the
    // forward-path validation error is surfaced.
    fn compute_hessian_non_finite_entries_yield_invalidhessian_error() {
        let theta: Theta = Array1::from(vec![0.0_f64]);
        let grad_fn = |_theta: &Theta| Array1::from(vec![f64::NAN]);

        let result = compute_hessian(&grad_fn, &theta);

        assert!(matches!(result, Err(OptError::InvalidHessian { .. })));
    }

    #[test]
    // Purpose
    // -------
    // An error raised by the gradient while differencing is returned as-is
    // rather than masked by a Hessian validation error.
    fn hessian_from_gradient_returns_captured_error() {
        // Arrange
        let theta: Theta = array![0.5];
        let grad = |_: &Theta| -> OptResult<Grad> {
            Err(OptError::EvaluationBudgetExhausted { max_f_eval: 3 })
        };

        // Act
        let result = hessian_from_gradient(&theta, grad);

        // Assert
        assert_eq!(result, Err(OptError::EvaluationBudgetExhausted { max_f_eval: 3 }));
    }

    #[test]
    // Purpose
    // -------
    // A well-behaved fallible gradient yields the same matrix as the
    // infallible path.
    fn hessian_from_gradient_matches_compute_hessian() {
        let theta: Theta = array![1.0];
        let hess = hessian_from_gradient(&theta, |t: &Theta| Ok(t.mapv(|x| 2.0 * (x - 3.0))))
            .expect("Hessian should be computed");
        assert!((hess[[0, 0]] - 2.0).abs() < 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // `symmetrize_hess` averages off-diagonal pairs and keeps the diagonal.
    fn symmetrize_hess_makes_matrix_symmetric() {
        let mut h: Hessian = Array2::from_shape_vec((2, 2), vec![1.0_f64, 2.0, 0.0, 3.0]).unwrap();

        super::symmetrize_hess(&mut h);

        assert_eq!(h[[0, 0]], 1.0);
        assert_eq!(h[[1, 1]], 3.0);
        assert_eq!(h[[0, 1]], 1.0);
        assert_eq!(h[[1, 0]], 1.0);
    }
}
