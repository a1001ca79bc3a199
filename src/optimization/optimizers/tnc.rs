//! optimizers::tnc — truncated-Newton strategy.
//!
//! Purpose
//! -------
//! Minimize with argmin's Newton-CG and a More–Thuente line search. The
//! Hessian is the finite-difference Jacobian of the caller's gradient, so
//! only `(f, ∇f)` is required.
//!
//! Key behaviors
//! -------------
//! - Every tolerance is honored: `ftol` is Newton-CG's cost-change rule,
//!   `xtol` and `gtol` are stopping rules added by
//!   [`Guarded`](crate::optimization::optimizers::guard::Guarded). `gtol`
//!   falls back to [`DEFAULT_TNC_GTOL`].
//! - Stops are reported through the ordered [`TNC_STATUS`] table.
//! - `f_opt` is recomputed from the combined function at `x_opt`.
use crate::optimization::{
    errors::{OptError, OptResult},
    optimizers::{
        adapter::{ArgMinAdapter, EvalLedger, EvalMode},
        builders::{build_truncated_newton, split_tolerances},
        guard::Guarded,
        run::{EngineRun, Termination, run_engine},
        traits::{OptStatus, OptimizationRequest, Optimizer, PrintLevel, Solution, ToleranceKind},
        types::{DEFAULT_TNC_GTOL, NewtonState},
    },
};

/// Display name of the truncated-Newton strategy.
pub const TNC_NAME: &str = "TNC (argmin Newton-CG)";

/// Exit-code table: the code is the index of the status.
pub const TNC_STATUS: [OptStatus; 6] = [
    OptStatus::LocalMinimum,
    OptStatus::Converged,
    OptStatus::ParamConverged,
    OptStatus::BudgetExhausted,
    OptStatus::LineSearchFailed,
    OptStatus::ObjectiveConstant,
];

const SUPPORTED_TOLS: [ToleranceKind; 3] =
    [ToleranceKind::Step, ToleranceKind::Function, ToleranceKind::Gradient];

/// Truncated Newton (stands in for `fmin_tnc`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tnc;

impl Tnc {
    /// Exit code for a normalized termination.
    pub fn exit_code(termination: Termination) -> usize {
        match termination {
            Termination::GradientVanished | Termination::GradientConverged => 0,
            Termination::CostConverged => 1,
            Termination::StepConverged => 2,
            Termination::BudgetExhausted | Termination::IterationLimit => 3,
            Termination::LineSearchFailed | Termination::Aborted => 4,
            Termination::NothingToOptimize => 5,
        }
    }
}

impl Optimizer for Tnc {
    fn name(&self) -> &'static str {
        TNC_NAME
    }

    fn optimize(&self, request: &OptimizationRequest<'_>) -> OptResult<Solution> {
        let objective = &request.objective;
        if !objective.has_gradient() {
            return Err(OptError::GradientRequired { optimizer: TNC_NAME });
        }
        let (tols, ignored) = split_tolerances(TNC_NAME, &request.opts.tols, &SUPPORTED_TOLS);

        let run = if request.x_init.is_empty() {
            EngineRun::nothing_to_optimize(objective, &request.x_init)?
        } else {
            let ledger = EvalLedger::new(request.opts.max_f_eval);
            let solver = Guarded::new(build_truncated_newton(tols.ftol)?, ledger.clone())
                .with_gradient_checks(Some(tols.gtol.unwrap_or(DEFAULT_TNC_GTOL)))
                .with_step_tolerance(tols.xtol);
            let problem = ArgMinAdapter::new(objective, ledger, EvalMode::ValueAndGrad);
            let print =
                if request.opts.messages { PrintLevel::Iterations } else { PrintLevel::Silent };
            let x0 = request.x_init.clone();
            run_engine(TNC_NAME, print, problem, solver, |state: NewtonState| state.param(x0))?
        };

        let f_opt = objective.value_and_grad(&run.x_opt)?.0;
        let status = TNC_STATUS[Self::exit_code(run.termination)];
        Ok(run.into_solution(f_opt, status, ignored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::optimizers::{
        traits::{Objective, OptimizerOptions, Tolerances},
        types::Theta,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Convergence on smooth quadratics and the status it reports.
    // - The gradient precondition and the empty-vector case.
    // - Budget exhaustion and the step tolerance.
    //
    // They intentionally DO NOT cover:
    // - Factory lookup and timing, tested at the crate level.
    // -------------------------------------------------------------------------

    fn shifted_quadratic<'a>() -> Objective<'a> {
        Objective::from_value_and_grad(|x: &Theta| {
            Ok(((x[0] - 3.0).powi(2), array![2.0 * (x[0] - 3.0)]))
        })
    }

    #[test]
    // Purpose
    // -------
    // Newton-CG solves a one-dimensional quadratic and reports a converged
    // status with `f_opt` equal to `f(x_opt)`.
    //
    // Given
    // -----
    // - f(x) = (x − 3)², x0 = 0, default options.
    //
    // Expect
    // ------
    // - x_opt ≈ 3, f_opt ≈ 0, converged status, funct_eval within budget.
    fn tnc_minimizes_shifted_quadratic() {
        // Arrange
        let request =
            OptimizationRequest::new(array![0.0], shifted_quadratic(), OptimizerOptions::default());

        // Act
        let solution = Tnc.optimize(&request).unwrap();

        // Assert
        assert_abs_diff_eq!(solution.x_opt[0], 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.f_opt, 0.0, epsilon = 1e-10);
        assert_eq!(solution.f_opt, (solution.x_opt[0] - 3.0).powi(2));
        assert!(solution.status.is_converged(), "status was {}", solution.status);
        assert!(solution.funct_eval <= request.opts.max_f_eval);
        assert!(solution.trace.is_some());
        assert!(solution.ignored_tols.is_empty());
    }

    #[test]
    // Purpose
    // -------
    // A two-dimensional bowl given as `f` plus a gradient-only callable is
    // minimized too.
    fn tnc_accepts_value_plus_gradient_only() {
        // Arrange
        let objective = Objective::new(|x: &Theta| Ok(x[0].powi(2) + 4.0 * (x[1] + 1.0).powi(2)))
            .with_grad(|x: &Theta| Ok(array![2.0 * x[0], 8.0 * (x[1] + 1.0)]));
        let request =
            OptimizationRequest::new(array![1.5, 2.0], objective, OptimizerOptions::default());

        // Act
        let solution = Tnc.optimize(&request).unwrap();

        // Assert
        assert_abs_diff_eq!(solution.x_opt[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.x_opt[1], -1.0, epsilon = 1e-6);
        assert!(solution.status.is_converged());
    }

    #[test]
    // Purpose
    // -------
    // Without any gradient callable the strategy refuses to run.
    fn tnc_requires_gradient() {
        let objective = Objective::new(|x: &Theta| Ok(x[0] * x[0]));
        let request = OptimizationRequest::new(array![1.0], objective, OptimizerOptions::default());

        let result = Tnc.optimize(&request);

        assert_eq!(result, Err(OptError::GradientRequired { optimizer: TNC_NAME }));
    }

    #[test]
    // Purpose
    // -------
    // A budget of one evaluation stops the run with `BudgetExhausted`
    // without exceeding the budget.
    fn tnc_budget_of_one_is_exhausted() {
        // Arrange
        let opts = OptimizerOptions::new(Tolerances::default(), 1, false).unwrap();
        let request = OptimizationRequest::new(array![0.0], shifted_quadratic(), opts);

        // Act
        let solution = Tnc.optimize(&request).unwrap();

        // Assert
        assert_eq!(solution.status, OptStatus::BudgetExhausted);
        assert!(solution.funct_eval <= 1);
        assert_eq!(solution.f_opt, (solution.x_opt[0] - 3.0).powi(2));
    }

    #[test]
    // Purpose
    // -------
    // An empty parameter vector has nothing to optimize.
    //
    // Expect
    // ------
    // - Status `ObjectiveConstant` (exit code 5), zero iterations.
    fn tnc_empty_vector_is_objective_constant() {
        let objective = Objective::from_value_and_grad(|_: &Theta| Ok((1.5, Array1::zeros(0))));
        let request =
            OptimizationRequest::new(Array1::zeros(0), objective, OptimizerOptions::default());

        let solution = Tnc.optimize(&request).unwrap();

        assert_eq!(solution.status, OptStatus::ObjectiveConstant);
        assert_eq!(solution.f_opt, 1.5);
        assert_eq!(solution.iterations, 0);
    }

    #[test]
    // Purpose
    // -------
    // Exit codes index the status table in the documented order.
    fn exit_codes_follow_status_table() {
        assert_eq!(
            TNC_STATUS[Tnc::exit_code(Termination::GradientVanished)],
            OptStatus::LocalMinimum
        );
        assert_eq!(TNC_STATUS[Tnc::exit_code(Termination::CostConverged)], OptStatus::Converged);
        assert_eq!(
            TNC_STATUS[Tnc::exit_code(Termination::StepConverged)],
            OptStatus::ParamConverged
        );
        assert_eq!(
            TNC_STATUS[Tnc::exit_code(Termination::BudgetExhausted)],
            OptStatus::BudgetExhausted
        );
        assert_eq!(
            TNC_STATUS[Tnc::exit_code(Termination::LineSearchFailed)],
            OptStatus::LineSearchFailed
        );
        assert_eq!(
            TNC_STATUS[Tnc::exit_code(Termination::NothingToOptimize)],
            OptStatus::ObjectiveConstant
        );
    }
}
