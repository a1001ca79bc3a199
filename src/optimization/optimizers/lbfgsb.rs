//! optimizers::lbfgsb — limited-memory quasi-Newton strategy.
//!
//! argmin's L-BFGS (history
//! [`DEFAULT_LBFGS_MEM`](crate::optimization::optimizers::types::DEFAULT_LBFGS_MEM),
//! More–Thuente line search)
//! standing in for `fmin_l_bfgs_b`. Only `gtol` maps onto the engine; `xtol`
//! and `ftol` are logged and listed as ignored. The iteration cap is
//! [`DEFAULT_LBFGS_MAX_ITERS`].
use crate::optimization::{
    errors::{OptError, OptResult},
    optimizers::{
        adapter::{ArgMinAdapter, EvalLedger, EvalMode},
        builders::{build_lbfgs, split_tolerances},
        guard::Guarded,
        run::{EngineRun, Termination, run_engine},
        traits::{OptStatus, OptimizationRequest, Optimizer, PrintLevel, Solution, ToleranceKind},
        types::{DEFAULT_LBFGS_MAX_ITERS, QuasiNewtonState},
    },
};

/// Display name of the L-BFGS strategy.
pub const LBFGSB_NAME: &str = "L-BFGS (argmin)";

/// Exit-code table: the code is the index of the status.
pub const LBFGSB_STATUS: [OptStatus; 3] =
    [OptStatus::Converged, OptStatus::BudgetExhausted, OptStatus::Error];

const SUPPORTED_TOLS: [ToleranceKind; 1] = [ToleranceKind::Gradient];

/// Limited-memory BFGS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LBfgsB;

impl LBfgsB {
    /// Exit code for a normalized termination. The iteration cap shares the
    /// budget code.
    pub fn exit_code(termination: Termination) -> usize {
        match termination {
            Termination::CostConverged
            | Termination::GradientVanished
            | Termination::GradientConverged
            | Termination::StepConverged
            | Termination::NothingToOptimize => 0,
            Termination::BudgetExhausted | Termination::IterationLimit => 1,
            Termination::LineSearchFailed | Termination::Aborted => 2,
        }
    }
}

impl Optimizer for LBfgsB {
    fn name(&self) -> &'static str {
        LBFGSB_NAME
    }

    fn optimize(&self, request: &OptimizationRequest<'_>) -> OptResult<Solution> {
        let objective = &request.objective;
        if !objective.has_gradient() {
            return Err(OptError::GradientRequired { optimizer: LBFGSB_NAME });
        }
        let (tols, ignored) = split_tolerances(LBFGSB_NAME, &request.opts.tols, &SUPPORTED_TOLS);

        let run = if request.x_init.is_empty() {
            EngineRun::nothing_to_optimize(objective, &request.x_init)?
        } else {
            let ledger = EvalLedger::new(request.opts.max_f_eval);
            let solver =
                Guarded::new(build_lbfgs(tols.gtol)?, ledger.clone()).with_gradient_checks(None);
            let problem = ArgMinAdapter::new(objective, ledger, EvalMode::ValueAndGrad);
            let print =
                if request.opts.messages { PrintLevel::Iterations } else { PrintLevel::Silent };
            let x0 = request.x_init.clone();
            run_engine(LBFGSB_NAME, print, problem, solver, |state: QuasiNewtonState| {
                state.param(x0).max_iters(DEFAULT_LBFGS_MAX_ITERS)
            })?
        };

        let f_opt = objective.value_and_grad(&run.x_opt)?.0;
        let status = LBFGSB_STATUS[Self::exit_code(run.termination)];
        Ok(run.into_solution(f_opt, status, ignored))
    }
}
