//! optimizers::simplex — derivative-free Nelder–Mead strategy.
//!
//! Uses only the plain objective. `ftol` becomes the standard-deviation
//! tolerance on the vertex costs; `gtol` and `xtol` are ignored with a
//! warning (argmin's simplex exposes no vertex spread to test `xtol`
//! against). The iteration cap is `200 · n`.
//!
//! The `n + 1` initial vertices are evaluated here, through the ledger,
//! before argmin sees them: argmin's initialization cannot report a failed
//! evaluation. A budget that runs out among the vertices ends the run as
//! `BudgetExhausted` at the best vertex; any other failure is returned.
use crate::optimization::{
    errors::OptResult,
    optimizers::{
        adapter::{ArgMinAdapter, EvalLedger, EvalMode},
        builders::{build_simplex, initial_simplex, split_tolerances},
        guard::Guarded,
        observer::TraceObserver,
        run::{EngineRun, Termination, recover, run_engine},
        traits::{OptStatus, OptimizationRequest, Optimizer, PrintLevel, Solution, ToleranceKind},
        types::{SIMPLEX_ITERS_PER_PARAM, SimplexState},
    },
};

/// Display name of the simplex strategy.
pub const SIMPLEX_NAME: &str = "Nelder-Mead simplex (argmin)";

/// Exit-code table: the code is the index of the status.
pub const SIMPLEX_STATUS: [OptStatus; 4] = [
    OptStatus::Converged,
    OptStatus::BudgetExhausted,
    OptStatus::IterationLimit,
    OptStatus::Error,
];

const SUPPORTED_TOLS: [ToleranceKind; 1] = [ToleranceKind::Function];

/// Nelder–Mead downhill simplex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NelderMead;

impl NelderMead {
    /// Exit code for a normalized termination.
    pub fn exit_code(termination: Termination) -> usize {
        match termination {
            Termination::CostConverged
            | Termination::GradientVanished
            | Termination::GradientConverged
            | Termination::StepConverged
            | Termination::NothingToOptimize => 0,
            Termination::BudgetExhausted => 1,
            Termination::IterationLimit => 2,
            Termination::LineSearchFailed | Termination::Aborted => 3,
        }
    }
}

impl Optimizer for NelderMead {
    fn name(&self) -> &'static str {
        SIMPLEX_NAME
    }

    fn optimize(&self, request: &OptimizationRequest<'_>) -> OptResult<Solution> {
        let objective = &request.objective;
        let (tols, ignored) = split_tolerances(SIMPLEX_NAME, &request.opts.tols, &SUPPORTED_TOLS);

        let run = if request.x_init.is_empty() {
            EngineRun::nothing_to_optimize(objective, &request.x_init)?
        } else {
            let ledger = EvalLedger::new(request.opts.max_f_eval);
            let problem = ArgMinAdapter::new(objective, ledger.clone(), EvalMode::ValueOnly);
            let vertices = initial_simplex(&request.x_init);
            match problem.prime(&vertices) {
                Ok(()) => {
                    let solver = Guarded::new(build_simplex(vertices, tols.ftol)?, ledger);
                    let print = if request.opts.messages {
                        PrintLevel::Summary
                    } else {
                        PrintLevel::Silent
                    };
                    let max_iters = SIMPLEX_ITERS_PER_PARAM * request.x_init.len() as u64;
                    let x0 = request.x_init.clone();
                    run_engine(SIMPLEX_NAME, print, problem, solver, |state: SimplexState| {
                        state.param(x0).max_iters(max_iters)
                    })?
                }
                Err(err) => recover(err, &ledger, &TraceObserver::new())?,
            }
        };

        let f_opt = run.f_best;
        let status = SIMPLEX_STATUS[Self::exit_code(run.termination)];
        Ok(run.into_solution(f_opt, status, ignored))
    }
}
