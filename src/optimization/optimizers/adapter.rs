//! Adapter that exposes a caller [`Objective`] as an `argmin` problem.
//!
//! Every evaluation argmin requests goes through an [`EvalLedger`], which
//! - charges the evaluation budget and refuses calls once it is spent,
//! - caches the last combined `(f, ∇f)` evaluation so argmin's separate
//!   `cost` / `gradient` calls at the same point cost one evaluation, and
//! - remembers the best point seen, so a run cut short by the budget can
//!   still report where it got to.
//!
//! [`ArgMinAdapter::prime`] evaluates a set of points up front and pins their
//! costs. argmin's Nelder–Mead unwraps the costs of its initial vertices, so
//! those must already be known before the executor starts.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::optimization::{
    errors::{OptError, OptResult},
    optimizers::{
        finite_diff::hessian_from_gradient,
        traits::Objective,
        types::{Cost, Grad, Hessian, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient, Hessian as ArgminHessian};

#[derive(Debug, Clone)]
struct Evaluation {
    theta: Theta,
    cost: Cost,
    grad: Option<Grad>,
}

#[derive(Debug, Default)]
struct LedgerState {
    used: usize,
    last: Option<Evaluation>,
    best: Option<(Theta, Cost)>,
    pinned: Vec<(Theta, Cost)>,
}

/// Shared evaluation budget, cache and best-point record for one run.
///
/// Cloning yields a handle to the same ledger; argmin moves both the problem
/// and the solver into its executor, and both need to read it.
#[derive(Debug, Clone)]
pub struct EvalLedger {
    max_f_eval: usize,
    state: Arc<Mutex<LedgerState>>,
}

impl EvalLedger {
    pub fn new(max_f_eval: usize) -> Self {
        Self { max_f_eval, state: Arc::new(Mutex::new(LedgerState::default())) }
    }

    pub fn max_f_eval(&self) -> usize {
        self.max_f_eval
    }

    /// Evaluations charged so far.
    pub fn used(&self) -> usize {
        self.lock().used
    }

    /// True once no further evaluation would be allowed.
    pub fn exhausted(&self) -> bool {
        self.used() >= self.max_f_eval
    }

    /// Lowest-cost point evaluated so far.
    pub fn best(&self) -> Option<(Theta, Cost)> {
        self.lock().best.clone()
    }

    /// Gradient at `theta` if the last evaluation was there and produced one.
    pub fn cached_grad(&self, theta: &Theta) -> Option<Grad> {
        let state = self.lock();
        state.last.as_ref().filter(|e| e.theta == *theta).and_then(|e| e.grad.clone())
    }

    fn cached(&self, theta: &Theta) -> Option<Evaluation> {
        self.lock().last.as_ref().filter(|e| e.theta == *theta).cloned()
    }

    fn pinned(&self, theta: &Theta) -> Option<Cost> {
        self.lock().pinned.iter().find(|(point, _)| point == theta).map(|(_, cost)| *cost)
    }

    fn pin(&self, theta: &Theta, cost: Cost) {
        self.lock().pinned.push((theta.clone(), cost));
    }

    /// Reserve one evaluation.
    ///
    /// # Errors
    /// [`OptError::EvaluationBudgetExhausted`] when the budget is spent.
    fn charge(&self) -> OptResult<()> {
        let mut state = self.lock();
        if state.used >= self.max_f_eval {
            return Err(OptError::EvaluationBudgetExhausted { max_f_eval: self.max_f_eval });
        }
        state.used += 1;
        Ok(())
    }

    fn record(&self, theta: &Theta, cost: Cost, grad: Option<Grad>) {
        let mut state = self.lock();
        let improves = state.best.as_ref().map_or(true, |(_, best)| cost < *best);
        if improves {
            state.best = Some((theta.clone(), cost));
        }
        state.last = Some(Evaluation { theta: theta.clone(), cost, grad });
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Which callables the engine is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    /// Plain objective only (derivative-free engines).
    ValueOnly,
    /// Combined objective + gradient.
    ValueAndGrad,
}

/// Bridges an [`Objective`] to argmin's `CostFunction`, `Gradient` and
/// `Hessian` traits, charging every evaluation to an [`EvalLedger`].
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'r, 'a> {
    pub objective: &'r Objective<'a>,
    pub ledger: EvalLedger,
    pub mode: EvalMode,
}

impl<'r, 'a> ArgMinAdapter<'r, 'a> {
    pub fn new(objective: &'r Objective<'a>, ledger: EvalLedger, mode: EvalMode) -> Self {
        Self { objective, ledger, mode }
    }

    /// Combined evaluation at `theta`, served from the cache when possible.
    ///
    /// # Errors
    /// - [`OptError::EvaluationBudgetExhausted`] once the budget is spent.
    /// - [`OptError::NonFiniteCost`] / gradient validation errors.
    /// - Any error returned by the caller's callables.
    pub fn value_and_grad(&self, theta: &Theta) -> OptResult<(Cost, Grad)> {
        if let Some(Evaluation { cost, grad: Some(grad), .. }) = self.ledger.cached(theta) {
            return Ok((cost, grad));
        }
        self.ledger.charge()?;
        let (cost, grad) = self.objective.value_and_grad(theta)?;
        check_cost(cost)?;
        validate_grad(&grad, theta.len())?;
        self.ledger.record(theta, cost, Some(grad.clone()));
        Ok((cost, grad))
    }

    /// Plain evaluation at `theta`, served from the cache when possible.
    ///
    /// # Errors
    /// Same as [`ArgMinAdapter::value_and_grad`], minus gradient checks.
    pub fn value(&self, theta: &Theta) -> OptResult<Cost> {
        if let Some(cost) = self.ledger.pinned(theta) {
            return Ok(cost);
        }
        if let Some(eval) = self.ledger.cached(theta) {
            return Ok(eval.cost);
        }
        self.ledger.charge()?;
        let cost = self.objective.value(theta)?;
        check_cost(cost)?;
        self.ledger.record(theta, cost, None);
        Ok(cost)
    }

    /// Evaluate every point in `points` once and pin the costs, so later
    /// plain evaluations there are free and cannot fail.
    ///
    /// # Errors
    /// Stops at the first failing point with the error
    /// [`ArgMinAdapter::value`] reports; points before it stay charged and
    /// recorded in the ledger.
    pub fn prime(&self, points: &[Theta]) -> OptResult<()> {
        for point in points {
            let cost = self.value(point)?;
            self.ledger.pin(point, cost);
        }
        Ok(())
    }
}

impl CostFunction for ArgMinAdapter<'_, '_> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let cost = match self.mode {
            EvalMode::ValueOnly => self.value(theta)?,
            EvalMode::ValueAndGrad => self.value_and_grad(theta)?.0,
        };
        Ok(cost)
    }
}

impl Gradient for ArgMinAdapter<'_, '_> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.mode {
            EvalMode::ValueOnly => Err(OptError::GradientNotImplemented.into()),
            EvalMode::ValueAndGrad => Ok(self.value_and_grad(theta)?.1),
        }
    }
}

impl ArgminHessian for ArgMinAdapter<'_, '_> {
    type Param = Theta;
    type Hessian = Hessian;

    /// Finite-difference Jacobian of the gradient; each gradient call is a
    /// charged evaluation.
    fn hessian(&self, theta: &Self::Param) -> Result<Self::Hessian, Error> {
        if self.mode == EvalMode::ValueOnly {
            return Err(OptError::GradientNotImplemented.into());
        }
        let hessian = hessian_from_gradient(theta, |x| self.value_and_grad(x).map(|(_, g)| g))?;
        Ok(hessian)
    }
}

fn check_cost(cost: Cost) -> OptResult<()> {
    if !cost.is_finite() {
        return Err(OptError::NonFiniteCost { value: cost });
    }
    Ok(())
}
