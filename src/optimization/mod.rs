//! optimization — optimizer strategies and unified error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive minimization layer for model fitting: several
//! argmin-backed strategies addressable by name, one options/result shape
//! shared by all of them, and a single error/result surface.
//!
//! Key behaviors
//! -------------
//! - Expose the strategies, factory and request/outcome types
//!   (`optimizers`).
//! - Normalize configuration issues, numerical failures, evaluation-budget
//!   refusals and backend solver errors into a single enum
//!   (`errors::OptError`) with a common result alias (`OptResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Optimizers work in an unconstrained parameter space and minimize.
//! - Invalid inputs and callback failures are reported as `OptError`, not
//!   panics.
//!
//! Conventions
//! -----------
//! - Public entrypoints that can fail return `OptResult<T>`; callers never
//!   see raw argmin errors.
//! - Diagnostics go through `tracing`; the crate installs no subscriber.
//!
//! Downstream usage
//! ----------------
//! - Front-ends typically import the curated surface via
//!   `optimization::prelude::*`.

pub mod errors;
pub mod optimizers;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use paramfit::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::optimizers::prelude::*;
}
