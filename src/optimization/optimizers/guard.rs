//! optimizers::guard — extra stopping rules layered over an argmin solver.
//!
//! Purpose
//! -------
//! argmin engines know their own convergence tests but not the ones callers
//! configure here: a gradient-norm floor for Newton-CG, an infinity-norm
//! parameter-step floor, and the shared evaluation budget. [`Guarded`] wraps
//! any solver, delegates every step to it, and adds those rules on top.
//!
//! Key behaviors
//! -------------
//! - The wrapped solver's own `terminate` is consulted first.
//! - Gradient rules only look at gradients the ledger already holds for the
//!   current point, so they never cost an evaluation after an iteration.
//! - Before each iteration the guard checks the current point once more and
//!   skips the inner step when the run is already finished (e.g. the start
//!   point is stationary). Newton-CG's inner conjugate-gradient solve is
//!   undefined at a zero gradient, so this check must run first.
//! - A fired rule is reported as `TerminationReason::SolverExit` and kept in
//!   [`Guarded::exit`] so the runner can classify it without parsing text.
use std::fmt;

use crate::optimization::optimizers::{
    adapter::EvalLedger,
    types::{Grad, Theta},
};
use argmin::core::{
    Error, Gradient, KV, Problem, Solver, State, TerminationReason, TerminationStatus,
};
use argmin_math::ArgminL2Norm;

/// Stopping rule that fired inside [`Guarded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardExit {
    /// Gradient is exactly zero at the current point.
    GradientVanished,
    /// Gradient norm fell to or below `gtol`.
    GradientConverged,
    /// Infinity-norm parameter step fell to or below `xtol`.
    StepConverged,
    /// No evaluation budget left.
    BudgetExhausted,
}

impl fmt::Display for GuardExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GuardExit::GradientVanished => "gradient vanished",
            GuardExit::GradientConverged => "gradient norm below tolerance",
            GuardExit::StepConverged => "parameter step below tolerance",
            GuardExit::BudgetExhausted => "evaluation budget exhausted",
        };
        f.write_str(text)
    }
}

/// Solver wrapper adding gradient, step and budget stopping rules.
#[derive(Debug, Clone)]
pub struct Guarded<S> {
    pub inner: S,
    pub exit: Option<GuardExit>,
    ledger: EvalLedger,
    xtol: Option<f64>,
    gtol: Option<f64>,
    check_gradient: bool,
    last_param: Option<Theta>,
}

impl<S> Guarded<S> {
    /// Wrap `inner` with only the budget rule enabled.
    pub fn new(inner: S, ledger: EvalLedger) -> Self {
        Self {
            inner,
            exit: None,
            ledger,
            xtol: None,
            gtol: None,
            check_gradient: false,
            last_param: None,
        }
    }

    /// Enable gradient checks: an exact zero gradient always stops the run,
    /// and `gtol` (when set) stops it once the gradient norm is that small.
    pub fn with_gradient_checks(mut self, gtol: Option<f64>) -> Self {
        self.check_gradient = true;
        self.gtol = gtol;
        self
    }

    /// Stop once the infinity-norm step between iterations is within `xtol`.
    pub fn with_step_tolerance(mut self, xtol: Option<f64>) -> Self {
        self.xtol = xtol;
        self
    }

    fn gradient_exit(&self, grad: &Grad) -> Option<GuardExit> {
        if grad.iter().all(|g| *g == 0.0) {
            return Some(GuardExit::GradientVanished);
        }
        match self.gtol {
            Some(gtol) if grad.l2_norm() <= gtol => Some(GuardExit::GradientConverged),
            _ => None,
        }
    }

    fn step_exit(&self, param: &Theta) -> Option<GuardExit> {
        let (xtol, last) = (self.xtol?, self.last_param.as_ref()?);
        let step = (param - last).iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
        (step <= xtol).then_some(GuardExit::StepConverged)
    }

    fn stop(&mut self, exit: GuardExit) -> TerminationStatus {
        self.exit = Some(exit);
        TerminationStatus::Terminated(TerminationReason::SolverExit(exit.to_string()))
    }
}

impl<O, S, I> Solver<O, I> for Guarded<S>
where
    O: Gradient<Param = Theta, Gradient = Grad>,
    S: Solver<O, I>,
    I: State<Param = Theta, Float = f64>,
{
    const NAME: &'static str = S::NAME;

    fn init(&mut self, problem: &mut Problem<O>, state: I) -> Result<(I, Option<KV>), Error> {
        self.inner.init(problem, state)
    }

    fn next_iter(&mut self, problem: &mut Problem<O>, state: I) -> Result<(I, Option<KV>), Error> {
        if self.exit.is_some() {
            return Ok((state, None));
        }
        if let Some(param) = state.get_param() {
            if self.check_gradient {
                let grad = match self.ledger.cached_grad(param) {
                    Some(grad) => Some(grad),
                    None if self.ledger.exhausted() => None,
                    None => Some(problem.gradient(param)?),
                };
                if let Some(exit) = grad.as_ref().and_then(|g| self.gradient_exit(g)) {
                    self.exit = Some(exit);
                    return Ok((state, None));
                }
            }
            if self.ledger.exhausted() {
                self.exit = Some(GuardExit::BudgetExhausted);
                return Ok((state, None));
            }
            self.last_param = Some(param.clone());
        }
        self.inner.next_iter(problem, state)
    }

    fn terminate(&mut self, state: &I) -> TerminationStatus {
        if let Some(exit) = self.exit {
            return self.stop(exit);
        }
        let inner = self.inner.terminate(state);
        if inner.terminated() {
            return inner;
        }
        let Some(param) = state.get_param() else {
            return TerminationStatus::NotTerminated;
        };
        if self.check_gradient {
            if let Some(exit) = self.ledger.cached_grad(param).and_then(|g| self.gradient_exit(&g)) {
                return self.stop(exit);
            }
        }
        if let Some(exit) = self.step_exit(param) {
            return self.stop(exit);
        }
        if self.ledger.exhausted() {
            return self.stop(GuardExit::BudgetExhausted);
        }
        TerminationStatus::NotTerminated
    }
}
