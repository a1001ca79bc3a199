//! optimizers::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types, engine defaults and argmin solver aliases
//! used by the optimizer adapters, so the rest of the code stays agnostic to
//! `ndarray` and argmin generics.
//!
//! Conventions
//! -----------
//! - Parameter vectors and gradients are `ndarray::Array1<f64>`; Hessians
//!   are dense `Array2<f64>`.
//! - The `*State` aliases spell out argmin's
//!   `IterState<Param, Gradient, Jacobian, Hessian, Residuals, Float>` for
//!   each engine.
//! - Engine defaults mirror the defaults of the solver family each adapter
//!   stands in for; callers override them only through `OptimizerOptions`.
use argmin::{
    core::IterState,
    solver::{
        linesearch::MoreThuenteLineSearch, neldermead::NelderMead, newton::NewtonCG,
        quasinewton::LBFGS,
    },
};
use ndarray::{Array1, Array2};

/// Parameter vector `x` being optimized.
pub type Theta = Array1<f64>;

/// Gradient vector `∇f(x)`, same shape as [`Theta`].
pub type Grad = Array1<f64>;

/// Dense Hessian matrix; `n × n` for `n = Theta.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Default evaluation budget, matching the historical `max_f_eval=1e4`.
pub const DEFAULT_MAX_F_EVAL: usize = 10_000;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 10;

/// Iteration cap applied to L-BFGS runs.
pub const DEFAULT_LBFGS_MAX_ITERS: u64 = 15_000;

/// Gradient-norm stopping rule used by the truncated-Newton adapter when the
/// caller leaves `gtol` unset.
pub const DEFAULT_TNC_GTOL: f64 = 1e-8;

/// Nelder–Mead iteration cap per free parameter.
pub const SIMPLEX_ITERS_PER_PARAM: u64 = 200;

/// Standard-deviation tolerance on simplex vertex costs when `ftol` is unset.
pub const DEFAULT_SIMPLEX_FTOL: f64 = 1e-8;

/// Relative perturbation used to build the initial simplex.
pub const SIMPLEX_NONZERO_DELTA: f64 = 0.05;

/// Absolute perturbation for zero coordinates of the initial simplex.
pub const SIMPLEX_ZERO_DELTA: f64 = 0.00025;

/// More–Thuente line search specialized to this crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// Truncated Newton (Newton-CG) solver wired to More–Thuente.
pub type TruncatedNewton = NewtonCG<MoreThuenteLS, Cost>;

/// L-BFGS solver wired to More–Thuente.
pub type Lbfgs = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// Nelder–Mead simplex solver.
pub type Simplex = NelderMead<Theta, Cost>;

/// Iteration state of the truncated-Newton engine.
pub type NewtonState = IterState<Theta, Grad, (), Hessian, (), Cost>;

/// Iteration state of the L-BFGS engine.
pub type QuasiNewtonState = IterState<Theta, Grad, (), (), (), Cost>;

/// Iteration state of the simplex engine.
pub type SimplexState = IterState<Theta, (), (), (), (), Cost>;
