//! optimizers — name-addressable minimizers over argmin engines.
//!
//! Purpose
//! -------
//! Give model code one interface to several unconstrained minimizers.
//! Callers build an [`OptimizationRequest`] (start point, objective,
//! options), resolve a strategy by name with [`get_optimizer`], and call
//! [`Optimizer::run`] to get a timed [`OptimOutcome`].
//!
//! Key behaviors
//! -------------
//! - Three strategies: truncated Newton ([`tnc`]), limited-memory BFGS
//!   ([`lbfgsb`]) and Nelder–Mead ([`simplex`]), each a thin layer over an
//!   argmin solver.
//! - [`adapter`] exposes the caller's callables to argmin and enforces the
//!   evaluation budget; [`guard`] adds the stopping rules argmin lacks;
//!   [`run`] drives the executor and normalizes how it stopped.
//! - Each strategy maps the normalized stop onto its own ordered exit-code
//!   table and reports the corresponding [`OptStatus`].
//! - Tolerances an engine cannot honor are logged with `tracing::warn!` and
//!   listed in [`OptimOutcome::ignored_tols`]; the run proceeds.
//!
//! Invariants & assumptions
//! ------------------------
//! - `funct_eval` never exceeds the configured budget; a run cut short by
//!   the budget reports the best point evaluated so far.
//! - `f_opt` is the objective at `x_opt`.
//! - Runs share no state; every call yields a fresh outcome.
//!
//! Conventions
//! -----------
//! - Parameters are [`Theta`] (`Array1<f64>`); all optimizers minimize.
//! - Caller errors (missing gradient, invalid options, unknown names) are
//!   returned as [`OptError`](crate::optimization::errors::OptError), never
//!   panics.
//!
//! Testing notes
//! -------------
//! - Every submodule carries unit tests; `tests/integration_optimizers.rs`
//!   runs the strategies end to end through the factory.

pub mod adapter;
pub mod builders;
pub mod factory;
pub mod finite_diff;
pub mod guard;
pub mod lbfgsb;
pub mod observer;
pub mod run;
pub mod simplex;
pub mod tnc;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::factory::{Strategy, get_optimizer};
pub use self::lbfgsb::LBfgsB;
pub use self::simplex::NelderMead;
pub use self::tnc::Tnc;
pub use self::traits::{
    Objective, OptStatus, OptimOutcome, OptimizationRequest, Optimizer, OptimizerOptions,
    PrintLevel, Solution, ToleranceKind, Tolerances,
};
pub use self::types::{Cost, DEFAULT_MAX_F_EVAL, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use paramfit::optimization::optimizers::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::factory::{Strategy, get_optimizer};
    pub use super::traits::{
        Objective, OptStatus, OptimOutcome, OptimizationRequest, Optimizer, OptimizerOptions,
        Tolerances,
    };
    pub use super::types::{Cost, Grad, Theta};
}
