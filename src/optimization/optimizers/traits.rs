//! Public API surface for running an optimizer.
//!
//! - [`Objective`]: caller-supplied objective, combined objective+gradient
//!   and gradient callables.
//! - [`Tolerances`] and [`OptimizerOptions`]: configuration shared by every
//!   optimizer.
//! - [`OptimizationRequest`]: immutable bundle of initial point, objective and
//!   options handed to an optimizer.
//! - [`Optimizer`]: the strategy trait; `optimize` is supplied per engine,
//!   `run` is the timed entry point.
//! - [`Solution`] / [`OptimOutcome`]: what a strategy produces and what the
//!   caller receives.
//! - [`OptStatus`]: closed set of caller-facing stop reasons.
use crate::optimization::{
    errors::{OptError, OptResult},
    optimizers::{
        types::{Cost, DEFAULT_MAX_F_EVAL, Grad, Theta},
        validation::{
            validate_theta_hat, validate_value, verify_max_f_eval, verify_tol_f, verify_tol_grad,
            verify_tol_x,
        },
    },
};
use std::{
    fmt,
    rc::Rc,
    time::{Duration, Instant},
};
use tracing::debug;

type ValueFn<'a> = Rc<dyn Fn(&Theta) -> OptResult<Cost> + 'a>;
type ValueGradFn<'a> = Rc<dyn Fn(&Theta) -> OptResult<(Cost, Grad)> + 'a>;
type GradFn<'a> = Rc<dyn Fn(&Theta) -> OptResult<Grad> + 'a>;

/// Caller-supplied objective callables.
///
/// Holds the plain objective `f(x)`, an optional combined `f_fp(x) -> (f, ∇f)`
/// and an optional gradient-only `fp(x) -> ∇f`. Callables may borrow model
/// data for the lifetime `'a`; errors they return propagate out of the run.
///
/// Gradient-based optimizers need [`Objective::value_and_grad`], which uses
/// `f_fp` when present and otherwise pairs `f` with `fp`.
#[derive(Clone)]
pub struct Objective<'a> {
    f: ValueFn<'a>,
    f_fp: Option<ValueGradFn<'a>>,
    fp: Option<GradFn<'a>>,
}

impl<'a> Objective<'a> {
    /// Objective with only a plain value function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Theta) -> OptResult<Cost> + 'a,
    {
        Self { f: Rc::new(f), f_fp: None, fp: None }
    }

    /// Objective defined by a combined value+gradient function; the plain
    /// value is taken from its first component.
    pub fn from_value_and_grad<G>(f_fp: G) -> Self
    where
        G: Fn(&Theta) -> OptResult<(Cost, Grad)> + 'a,
    {
        let f_fp: ValueGradFn<'a> = Rc::new(f_fp);
        let shared = Rc::clone(&f_fp);
        let f: ValueFn<'a> = Rc::new(move |x: &Theta| shared(x).map(|(cost, _)| cost));
        Self { f, f_fp: Some(f_fp), fp: None }
    }

    /// Attach a combined value+gradient function.
    pub fn with_value_and_grad<G>(mut self, f_fp: G) -> Self
    where
        G: Fn(&Theta) -> OptResult<(Cost, Grad)> + 'a,
    {
        self.f_fp = Some(Rc::new(f_fp));
        self
    }

    /// Attach a gradient-only function.
    pub fn with_grad<G>(mut self, fp: G) -> Self
    where
        G: Fn(&Theta) -> OptResult<Grad> + 'a,
    {
        self.fp = Some(Rc::new(fp));
        self
    }

    /// True when a gradient can be produced (combined or gradient-only).
    pub fn has_gradient(&self) -> bool {
        self.f_fp.is_some() || self.fp.is_some()
    }

    /// Evaluate `f(x)`.
    pub fn value(&self, x: &Theta) -> OptResult<Cost> {
        (self.f)(x)
    }

    /// Evaluate `(f(x), ∇f(x))` in one call.
    ///
    /// # Errors
    /// [`OptError::GradientNotImplemented`] when neither `f_fp` nor `fp` was
    /// supplied; otherwise whatever the callables return.
    pub fn value_and_grad(&self, x: &Theta) -> OptResult<(Cost, Grad)> {
        if let Some(f_fp) = &self.f_fp {
            return f_fp(x);
        }
        match &self.fp {
            Some(fp) => Ok((self.value(x)?, fp(x)?)),
            None => Err(OptError::GradientNotImplemented),
        }
    }
}

impl fmt::Debug for Objective<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Objective")
            .field("f_fp", &self.f_fp.is_some())
            .field("fp", &self.fp.is_some())
            .finish()
    }
}

/// Identifies one of the three optional tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToleranceKind {
    /// Parameter-step tolerance (`xtol`).
    Step,
    /// Function-value tolerance (`ftol`).
    Function,
    /// Gradient-norm tolerance (`gtol`).
    Gradient,
}

impl fmt::Display for ToleranceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToleranceKind::Step => "xtol",
            ToleranceKind::Function => "ftol",
            ToleranceKind::Gradient => "gtol",
        };
        f.write_str(name)
    }
}

/// Optional convergence tolerances. `None` means "engine default".
///
/// Each present tolerance must be finite and strictly positive
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tolerances {
    pub xtol: Option<f64>,
    pub ftol: Option<f64>,
    pub gtol: Option<f64>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// [`OptError::InvalidTolX`], [`OptError::InvalidTolF`] or
    /// [`OptError::InvalidTolGrad`] for non-finite or non-positive values.
    pub fn new(xtol: Option<f64>, ftol: Option<f64>, gtol: Option<f64>) -> OptResult<Self> {
        verify_tol_x(xtol)?;
        verify_tol_f(ftol)?;
        verify_tol_grad(gtol)?;
        Ok(Self { xtol, ftol, gtol })
    }

    /// Value of a single tolerance.
    pub fn get(&self, kind: ToleranceKind) -> Option<f64> {
        match kind {
            ToleranceKind::Step => self.xtol,
            ToleranceKind::Function => self.ftol,
            ToleranceKind::Gradient => self.gtol,
        }
    }
}

/// How much an engine reports while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintLevel {
    /// No progress output.
    Silent,
    /// One summary line when the run ends.
    Summary,
    /// One line per iteration plus the summary.
    Iterations,
}

/// Optimizer-level configuration.
///
/// Default:
/// - `tols`: all unset
/// - `max_f_eval`: [`DEFAULT_MAX_F_EVAL`]
/// - `messages`: `false`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerOptions {
    pub tols: Tolerances,
    pub max_f_eval: usize,
    pub messages: bool,
}

impl OptimizerOptions {
    /// Create validated options.
    ///
    /// # Errors
    /// [`OptError::InvalidMaxFEval`] when `max_f_eval == 0`.
    pub fn new(tols: Tolerances, max_f_eval: usize, messages: bool) -> OptResult<Self> {
        verify_max_f_eval(max_f_eval)?;
        Ok(Self { tols, max_f_eval, messages })
    }
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self { tols: Tolerances::default(), max_f_eval: DEFAULT_MAX_F_EVAL, messages: false }
    }
}

/// Everything an optimizer needs for one run. Built once, read-only after.
#[derive(Debug, Clone)]
pub struct OptimizationRequest<'a> {
    pub x_init: Theta,
    pub objective: Objective<'a>,
    pub opts: OptimizerOptions,
}

impl<'a> OptimizationRequest<'a> {
    pub fn new(x_init: Theta, objective: Objective<'a>, opts: OptimizerOptions) -> Self {
        Self { x_init, objective, opts }
    }
}

/// Caller-facing reason an optimization run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptStatus {
    /// Projected gradient vanished.
    LocalMinimum,
    /// Objective change (or simplex spread) fell below tolerance.
    Converged,
    /// Parameter step fell below tolerance.
    ParamConverged,
    /// Evaluation budget spent.
    BudgetExhausted,
    /// Iteration cap reached.
    IterationLimit,
    /// Line search could not make progress.
    LineSearchFailed,
    /// Nothing to optimize.
    ObjectiveConstant,
    /// Engine stopped abnormally.
    Error,
}

impl OptStatus {
    /// True for the statuses that mean the optimizer reached a solution.
    pub fn is_converged(&self) -> bool {
        matches!(self, OptStatus::LocalMinimum | OptStatus::Converged | OptStatus::ParamConverged)
    }
}

impl fmt::Display for OptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OptStatus::LocalMinimum => "Local minimum",
            OptStatus::Converged => "Converged",
            OptStatus::ParamConverged => "XConverged",
            OptStatus::BudgetExhausted => "Maximum number of f evaluations reached",
            OptStatus::IterationLimit => "Maximum number of iterations reached",
            OptStatus::LineSearchFailed => "Line search failed",
            OptStatus::ObjectiveConstant => "Function is constant",
            OptStatus::Error => "Error",
        };
        f.write_str(text)
    }
}

/// Normalized output of a single `optimize` call, before timing is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub x_opt: Theta,
    pub f_opt: f64,
    pub funct_eval: usize,
    pub status: OptStatus,
    pub iterations: u64,
    pub trace: Option<Vec<f64>>,
    pub ignored_tols: Vec<ToleranceKind>,
}

/// Canonical result returned by [`Optimizer::run`].
///
/// - `optimizer`: display name of the engine that produced it.
/// - `x_opt`, `f_opt`: final point and `f(x_opt)`.
/// - `funct_eval`: evaluations consumed, never above the configured budget.
/// - `status`: why the run stopped.
/// - `iterations`: engine iterations performed.
/// - `trace`: objective value per iteration, when the engine reports one.
/// - `ignored_tols`: tolerances the engine could not honor.
/// - `elapsed`: wall-clock duration of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub optimizer: &'static str,
    pub x_opt: Theta,
    pub f_opt: f64,
    pub funct_eval: usize,
    pub status: OptStatus,
    pub iterations: u64,
    pub trace: Option<Vec<f64>>,
    pub ignored_tols: Vec<ToleranceKind>,
    pub elapsed: Duration,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from a strategy's [`Solution`].
    ///
    /// # Errors
    /// Propagates validation errors for non-finite `x_opt` or `f_opt`.
    pub fn new(optimizer: &'static str, solution: Solution, elapsed: Duration) -> OptResult<Self> {
        let Solution { x_opt, f_opt, funct_eval, status, iterations, trace, ignored_tols } =
            solution;
        let x_opt = validate_theta_hat(Some(x_opt))?;
        validate_value(f_opt)?;
        Ok(Self {
            optimizer,
            x_opt,
            f_opt,
            funct_eval,
            status,
            iterations,
            trace,
            ignored_tols,
            elapsed,
        })
    }

    /// True when the status is one of the converged categories.
    pub fn converged(&self) -> bool {
        self.status.is_converged()
    }

    /// Elapsed time as a display string.
    pub fn time(&self) -> String {
        format!("{:?}", self.elapsed)
    }

    /// Render the convergence trace as `iteration<TAB>f(x)` lines, or explain
    /// that the engine supplied none.
    pub fn render_trace(&self) -> String {
        match &self.trace {
            Some(trace) if !trace.is_empty() => {
                let mut out = String::from("Iteration\tf(x)\n");
                for (iter, value) in trace.iter().enumerate() {
                    out.push_str(&format!("{iter}\t{value:.6e}\n"));
                }
                out
            }
            _ => "No trace present. Check that the optimizer actually supplies a trace."
                .to_string(),
        }
    }
}

impl fmt::Display for OptimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimizer: \t\t\t\t {}", self.optimizer)?;
        writeln!(f, "f(x_opt): \t\t\t\t {:.3}", self.f_opt)?;
        writeln!(f, "Number of function evaluations: \t {}", self.funct_eval)?;
        writeln!(f, "Optimization status: \t\t\t {}", self.status)?;
        write!(f, "Time elapsed: \t\t\t\t {}", self.time())
    }
}

/// A concrete optimization strategy.
///
/// Implementors supply [`Optimizer::name`] and override
/// [`Optimizer::optimize`]; callers use [`Optimizer::run`], which times the
/// call and wraps the [`Solution`] into an [`OptimOutcome`].
pub trait Optimizer {
    /// Human-readable engine name.
    fn name(&self) -> &'static str;

    /// Perform one optimization.
    ///
    /// The default returns [`OptError::NotImplemented`]; every concrete
    /// strategy overrides it.
    fn optimize(&self, _request: &OptimizationRequest<'_>) -> OptResult<Solution> {
        Err(OptError::NotImplemented {
            text: format!("{} must implement optimize to be used as an optimizer", self.name()),
        })
    }

    /// Timed entry point: run [`Optimizer::optimize`] and attach the elapsed
    /// wall-clock time.
    fn run(&self, request: &OptimizationRequest<'_>) -> OptResult<OptimOutcome> {
        let start = Instant::now();
        let solution = self.optimize(request)?;
        let elapsed = start.elapsed();
        debug!(
            optimizer = self.name(),
            f_opt = solution.f_opt,
            funct_eval = solution.funct_eval,
            status = %solution.status,
            elapsed = ?elapsed,
            "optimization finished"
        );
        OptimOutcome::new(self.name(), solution, elapsed)
    }
}
