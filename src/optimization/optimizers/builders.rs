//! optimizers::builders — solver construction and tolerance routing.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the three argmin engines behind the
//! optimizer strategies, plus the shared helper that decides which of the
//! caller's tolerances an engine can honor.
//!
//! Key behaviors
//! -------------
//! - [`split_tolerances`] keeps the tolerances an engine supports and
//!   reports the rest, logging a warning for each one it drops.
//! - [`build_truncated_newton`], [`build_lbfgs`] and [`build_simplex`]
//!   construct configured solvers; invalid tolerances surface as
//!   [`OptError`](crate::optimization::errors::OptError) through the
//!   crate's `From<argmin::core::Error>` conversion.
//! - [`initial_simplex`] builds the starting vertices around `x0`; the
//!   simplex strategy evaluates them itself before handing them to argmin.
//!
//! Conventions
//! -----------
//! - Builders do **not** set the initial parameter vector or `max_iters`;
//!   those are runtime concerns applied by
//!   [`run_engine`](crate::optimization::optimizers::run::run_engine).
//! - When a tolerance is `None` the engine's own default stays in effect,
//!   except for the simplex, whose default spread tolerance is
//!   [`DEFAULT_SIMPLEX_FTOL`].
use crate::optimization::{
    errors::OptResult,
    optimizers::{
        traits::{ToleranceKind, Tolerances},
        types::{
            DEFAULT_LBFGS_MEM, DEFAULT_SIMPLEX_FTOL, Lbfgs, MoreThuenteLS, SIMPLEX_NONZERO_DELTA,
            SIMPLEX_ZERO_DELTA, Simplex, Theta, TruncatedNewton,
        },
    },
};
use tracing::warn;

/// split_tolerances — route caller tolerances to what an engine supports.
///
/// Parameters
/// ----------
/// - `optimizer`: display name used in the warning.
/// - `tols`: the caller's tolerances.
/// - `supported`: tolerance kinds the engine can honor.
///
/// Returns
/// -------
/// `(Tolerances, Vec<ToleranceKind>)`
///   - The tolerances with every unsupported entry cleared.
///   - The kinds that were set but unsupported, in `xtol`, `ftol`, `gtol`
///     order.
///
/// Notes
/// -----
/// - Each dropped tolerance emits one `tracing::warn!`; the run proceeds.
pub fn split_tolerances(
    optimizer: &'static str, tols: &Tolerances, supported: &[ToleranceKind],
) -> (Tolerances, Vec<ToleranceKind>) {
    let mut honored = *tols;
    let mut ignored = Vec::new();
    for kind in [ToleranceKind::Step, ToleranceKind::Function, ToleranceKind::Gradient] {
        let Some(value) = tols.get(kind) else { continue };
        if supported.contains(&kind) {
            continue;
        }
        warn!(optimizer, tolerance = %kind, value, "tolerance not supported by this optimizer; ignoring it");
        match kind {
            ToleranceKind::Step => honored.xtol = None,
            ToleranceKind::Function => honored.ftol = None,
            ToleranceKind::Gradient => honored.gtol = None,
        }
        ignored.push(kind);
    }
    (honored, ignored)
}

/// build_truncated_newton — Newton-CG with More–Thuente line search.
///
/// Parameters
/// ----------
/// - `ftol`: optional cost-change tolerance; when `None`, argmin's default
///   (machine epsilon) applies.
///
/// Errors
/// ------
/// - `OptError` (via `From<argmin::core::Error>`) when argmin rejects the
///   tolerance.
pub fn build_truncated_newton(ftol: Option<f64>) -> OptResult<TruncatedNewton> {
    let mut solver = TruncatedNewton::new(MoreThuenteLS::new());
    if let Some(ftol) = ftol {
        solver = solver.with_tolerance(ftol)?;
    }
    Ok(solver)
}

/// build_lbfgs — L-BFGS with More–Thuente line search and history
/// [`DEFAULT_LBFGS_MEM`].
///
/// Parameters
/// ----------
/// - `gtol`: optional gradient-norm tolerance wired into
///   `with_tolerance_grad`.
///
/// Errors
/// ------
/// - `OptError` (via `From<argmin::core::Error>`) when argmin rejects the
///   tolerance.
pub fn build_lbfgs(gtol: Option<f64>) -> OptResult<Lbfgs> {
    let mut solver = Lbfgs::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM);
    if let Some(gtol) = gtol {
        solver = solver.with_tolerance_grad(gtol)?;
    }
    Ok(solver)
}

/// build_simplex — Nelder–Mead over the given starting vertices.
///
/// Parameters
/// ----------
/// - `vertices`: `n + 1` starting points, usually [`initial_simplex`]`(x0)`.
/// - `ftol`: standard-deviation tolerance on the vertex costs; defaults to
///   [`DEFAULT_SIMPLEX_FTOL`].
///
/// Errors
/// ------
/// - `OptError` (via `From<argmin::core::Error>`) when argmin rejects the
///   tolerance.
pub fn build_simplex(vertices: Vec<Theta>, ftol: Option<f64>) -> OptResult<Simplex> {
    let solver = Simplex::new(vertices)
        .with_sd_tolerance(ftol.unwrap_or(DEFAULT_SIMPLEX_FTOL))?;
    Ok(solver)
}

/// initial_simplex — `x0` followed by one vertex per coordinate.
///
/// Vertex `k + 1` equals `x0` with coordinate `k` scaled by
/// `1 + SIMPLEX_NONZERO_DELTA`, or set to `SIMPLEX_ZERO_DELTA` when that
/// coordinate is zero.
pub fn initial_simplex(x0: &Theta) -> Vec<Theta> {
    let mut vertices = Vec::with_capacity(x0.len() + 1);
    vertices.push(x0.clone());
    for k in 0..x0.len() {
        let mut vertex = x0.clone();
        vertex[k] = if vertex[k] != 0.0 {
            (1.0 + SIMPLEX_NONZERO_DELTA) * vertex[k]
        } else {
            SIMPLEX_ZERO_DELTA
        };
        vertices.push(vertex);
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Tolerance routing and the ignored list.
    // - Builder success with and without tolerances.
    // - Initial simplex geometry.
    //
    // They intentionally DO NOT cover:
    // - Running the solvers, which the strategy modules do.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Unsupported tolerances are cleared and listed in canonical order;
    // supported and unset ones are untouched.
    //
    // Given
    // -----
    // - xtol and gtol set, ftol unset; only ftol supported.
    //
    // Expect
    // ------
    // - Honored tolerances are all unset; ignored = [Step, Gradient].
    fn split_tolerances_clears_unsupported_entries() {
        // Arrange
        let tols = Tolerances::new(Some(1e-6), None, Some(1e-5)).unwrap();

        // Act
        let (honored, ignored) = split_tolerances("demo", &tols, &[ToleranceKind::Function]);

        // Assert
        assert_eq!(honored, Tolerances::default());
        assert_eq!(ignored, vec![ToleranceKind::Step, ToleranceKind::Gradient]);
    }

    #[test]
    // Purpose
    // -------
    // When everything set is supported, nothing is ignored.
    fn split_tolerances_keeps_supported_entries() {
        let tols = Tolerances::new(None, Some(1e-9), Some(1e-7)).unwrap();

        let (honored, ignored) = split_tolerances(
            "demo",
            &tols,
            &[ToleranceKind::Function, ToleranceKind::Gradient],
        );

        assert_eq!(honored, tols);
        assert!(ignored.is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Builders accept both default and explicit tolerances.
    fn builders_accept_valid_tolerances() {
        assert!(build_truncated_newton(None).is_ok());
        assert!(build_truncated_newton(Some(1e-10)).is_ok());
        assert!(build_lbfgs(None).is_ok());
        assert!(build_lbfgs(Some(1e-6)).is_ok());
        assert!(build_simplex(initial_simplex(&array![1.0, 0.0]), None).is_ok());
        assert!(build_simplex(initial_simplex(&array![1.0]), Some(1e-6)).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // The initial simplex perturbs one coordinate per vertex: 5 % for
    // non-zero coordinates, a fixed 0.00025 for zeros.
    fn initial_simplex_perturbs_each_coordinate() {
        // Arrange
        let x0 = array![2.0, 0.0];

        // Act
        let vertices = initial_simplex(&x0);

        // Assert
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[0], x0);
        assert_eq!(vertices[1], array![2.1, 0.0]);
        assert_eq!(vertices[2], array![2.0, 0.00025]);
    }
}
