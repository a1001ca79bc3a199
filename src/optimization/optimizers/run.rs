//! Execution helper that drives a guarded `argmin` solver and reports a
//! normalized [`EngineRun`].
use crate::optimization::{
    errors::{OptError, OptResult},
    optimizers::{
        adapter::{ArgMinAdapter, EvalLedger},
        guard::{GuardExit, Guarded},
        observer::TraceObserver,
        traits::{Objective, OptStatus, PrintLevel, Solution, ToleranceKind},
        types::{Cost, Theta},
    },
};
use argmin::core::{
    Executor, Solver, State, TerminationReason, TerminationStatus, observers::ObserverMode,
};
use tracing::{debug, info};

/// Engine-independent reason a run stopped. Each strategy maps these onto
/// its own exit-code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The engine's own convergence test fired (cost change, simplex spread,
    /// or L-BFGS gradient tolerance).
    CostConverged,
    GradientVanished,
    GradientConverged,
    StepConverged,
    BudgetExhausted,
    IterationLimit,
    LineSearchFailed,
    /// Empty parameter vector; the engine was never started.
    NothingToOptimize,
    /// Any other stop (interrupt, timeout, target cost).
    Aborted,
}

impl From<GuardExit> for Termination {
    fn from(exit: GuardExit) -> Self {
        match exit {
            GuardExit::GradientVanished => Termination::GradientVanished,
            GuardExit::GradientConverged => Termination::GradientConverged,
            GuardExit::StepConverged => Termination::StepConverged,
            GuardExit::BudgetExhausted => Termination::BudgetExhausted,
        }
    }
}

/// What a finished engine run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRun {
    /// Best parameter vector found.
    pub x_opt: Theta,
    /// Objective at `x_opt` as seen by the engine. May be `+inf` for engines
    /// that never store a cost; strategies re-evaluate when they need it.
    pub f_best: Cost,
    pub iterations: u64,
    pub funct_eval: usize,
    pub trace: Vec<f64>,
    pub termination: Termination,
}

impl EngineRun {
    /// Run for an empty parameter vector: the engine is never started and
    /// the objective is evaluated once at the start point.
    ///
    /// # Errors
    /// Whatever the objective returns.
    pub fn nothing_to_optimize(objective: &Objective<'_>, x_init: &Theta) -> OptResult<Self> {
        let f_best = objective.value(x_init)?;
        Ok(Self {
            x_opt: x_init.clone(),
            f_best,
            iterations: 0,
            funct_eval: 1,
            trace: Vec::new(),
            termination: Termination::NothingToOptimize,
        })
    }

    /// Package the run as a [`Solution`] with the strategy's final value and
    /// status.
    pub fn into_solution(
        self, f_opt: f64, status: OptStatus, ignored_tols: Vec<ToleranceKind>,
    ) -> Solution {
        Solution {
            x_opt: self.x_opt,
            f_opt,
            funct_eval: self.funct_eval,
            status,
            iterations: self.iterations,
            trace: Some(self.trace),
            ignored_tols,
        }
    }
}

/// Run `solver` on `problem` until it terminates, then normalize the result.
///
/// - `configure` sets the initial state (start point, iteration cap).
/// - A [`TraceObserver`] is always attached; it echoes iterations when
///   `print` is [`PrintLevel::Iterations`].
/// - Behind the `obs_slog` feature, iteration-level runs also get argmin's
///   terminal slog observer.
///
/// # Errors
/// Budget refusals and line-search failures raised inside argmin are turned
/// into a [`Termination`] at the best point the ledger saw. Every other
/// error propagates, as does a refusal that happened before any point was
/// evaluated.
pub fn run_engine<'r, 'a, S, I, C>(
    name: &'static str, print: PrintLevel, problem: ArgMinAdapter<'r, 'a>, solver: Guarded<S>,
    configure: C,
) -> OptResult<EngineRun>
where
    S: Solver<ArgMinAdapter<'r, 'a>, I>,
    I: State<Param = Theta, Float = f64>,
    C: FnOnce(I) -> I,
{
    let ledger = problem.ledger.clone();
    let observer = match print {
        PrintLevel::Iterations => TraceObserver::echoing(name),
        _ => TraceObserver::new(),
    };

    let mut executor = Executor::new(problem, solver);
    executor = executor.configure(configure).add_observer(observer.clone(), ObserverMode::Always);
    #[cfg(feature = "obs_slog")]
    if print == PrintLevel::Iterations {
        let slog = argmin_observer_slog::SlogLogger::term_noblock();
        executor = executor.add_observer(slog, ObserverMode::Always);
    }

    let run = match executor.run() {
        Ok(result) => {
            let state = result.state();
            let termination = classify(state.get_termination_status(), result.solver().exit);
            let (x_opt, f_best) = match state.get_best_param() {
                Some(best) => (best.clone(), state.get_best_cost()),
                None => ledger.best().ok_or(OptError::MissingThetaHat)?,
            };
            EngineRun {
                x_opt,
                f_best,
                iterations: state.get_iter(),
                funct_eval: ledger.used(),
                trace: observer.trace(),
                termination,
            }
        }
        Err(err) => recover(OptError::from(err), &ledger, &observer)?,
    };

    if print != PrintLevel::Silent {
        info!(
            optimizer = name,
            iterations = run.iterations,
            funct_eval = run.funct_eval,
            f = run.f_best,
            termination = ?run.termination,
            "run finished"
        );
    }
    Ok(run)
}

// ---- Helper Methods ----

fn classify(status: &TerminationStatus, exit: Option<GuardExit>) -> Termination {
    if let Some(exit) = exit {
        return exit.into();
    }
    match status {
        TerminationStatus::Terminated(TerminationReason::SolverConverged) => {
            Termination::CostConverged
        }
        TerminationStatus::Terminated(TerminationReason::MaxItersReached) => {
            Termination::IterationLimit
        }
        _ => Termination::Aborted,
    }
}

/// Turn a recoverable engine error into a stopped run at the ledger's best
/// point; anything else is handed back unchanged.
///
/// Also used for failures before the executor starts (the simplex strategy
/// evaluates its initial vertices up front).
///
/// # Errors
/// `err` itself when it is neither a budget refusal nor a line-search
/// failure, or when the ledger has no evaluated point to fall back on.
pub fn recover(err: OptError, ledger: &EvalLedger, observer: &TraceObserver) -> OptResult<EngineRun> {
    let termination = match &err {
        OptError::EvaluationBudgetExhausted { .. } => Termination::BudgetExhausted,
        e if e.is_line_search_failure() => Termination::LineSearchFailed,
        _ => return Err(err),
    };
    let Some((x_opt, f_best)) = ledger.best() else {
        return Err(err);
    };
    debug!(error = %err, ?termination, "engine stopped early; using best point seen");
    Ok(EngineRun {
        x_opt,
        f_best,
        iterations: observer.len() as u64,
        funct_eval: ledger.used(),
        trace: observer.trace(),
        termination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::optimizers::adapter::EvalMode;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Classification of argmin termination statuses and guard exits.
    // - Error recovery at the ledger's best point.
    //
    // They intentionally DO NOT cover:
    // - Full solver runs; each strategy module runs its own engine.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A guard exit wins over the reported status; otherwise argmin's
    // convergence and iteration cap map to their own categories.
    fn classify_prefers_guard_exit() {
        let converged = TerminationStatus::Terminated(TerminationReason::SolverConverged);
        let capped = TerminationStatus::Terminated(TerminationReason::MaxItersReached);

        assert_eq!(classify(&converged, None), Termination::CostConverged);
        assert_eq!(classify(&capped, None), Termination::IterationLimit);
        assert_eq!(
            classify(&capped, Some(GuardExit::StepConverged)),
            Termination::StepConverged
        );
        assert_eq!(classify(&TerminationStatus::NotTerminated, None), Termination::Aborted);
    }

    #[test]
    // Purpose
    // -------
    // A budget refusal becomes a `BudgetExhausted` run at the best point
    // evaluated so far; a refusal before any evaluation stays an error.
    //
    // Given
    // -----
    // - A ledger with budget 2 that saw x=0 (cost 9) and x=2 (cost 1).
    //
    // Expect
    // ------
    // - x_opt = [2], f_best = 1, funct_eval = 2.
    fn recover_uses_ledger_best_point() {
        // Arrange
        let objective = Objective::new(|x: &Theta| Ok((x[0] - 3.0).powi(2)));
        let ledger = EvalLedger::new(2);
        let adapter = ArgMinAdapter::new(&objective, ledger.clone(), EvalMode::ValueOnly);
        adapter.value(&array![0.0]).unwrap();
        adapter.value(&array![2.0]).unwrap();
        let refusal = adapter.value(&array![5.0]).unwrap_err();

        // Act
        let run = recover(refusal.clone(), &ledger, &TraceObserver::new()).unwrap();
        let untouched = recover(refusal, &EvalLedger::new(2), &TraceObserver::new());

        // Assert
        assert_eq!(run.termination, Termination::BudgetExhausted);
        assert_eq!(run.x_opt, array![2.0]);
        assert_eq!(run.f_best, 1.0);
        assert_eq!(run.funct_eval, 2);
        assert!(untouched.is_err());
    }

    #[test]
    // Purpose
    // -------
    // Errors that are neither budget refusals nor line-search failures
    // propagate unchanged.
    fn recover_propagates_other_errors() {
        let ledger = EvalLedger::new(2);
        let err = OptError::ObjectiveFailed { text: "boom".to_string() };

        let result = recover(err.clone(), &ledger, &TraceObserver::new());

        assert_eq!(result, Err(err));
    }
}
