//! paramfit — uniform optimizer adapters for fitting model parameters.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the optimizer layer to Python via the `_paramfit` extension module. Model
//! code hands over an objective, an initial point and a few options; the
//! chosen strategy returns one normalized, timed result.
//!
//! Key behaviors
//! -------------
//! - Re-export the optimization layer (`optimization`) as the public crate
//!   surface.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_paramfit` Python extension when `python-bindings` is enabled.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in `optimization`; this file performs only FFI
//!   glue, input conversion and error mapping.
//! - Python callables run with the GIL held for the whole optimization; the
//!   engines are single-threaded.
//!
//! Conventions
//! -----------
//! - Errors from core Rust code stay [`optimization::errors::OptError`]
//!   internally and become `PyErr` at the boundary (`KeyError` for lookup
//!   failures, `ValueError` otherwise).
//! - Logging goes through `tracing`; the Python host decides whether a
//!   subscriber is installed.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on `optimization::prelude` and ignore the
//!   PyO3 items guarded by the `python-bindings` feature.
//! - The Python packaging layer imports `_paramfit` and calls `optimize` or
//!   `get_optimizer`.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and by
//!   `tests/integration_optimizers.rs`.

pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    optimization::optimizers::{
        OptimOutcome, OptimizationRequest, Optimizer, OptimizerOptions, Strategy, Tolerances,
        get_optimizer as lookup_optimizer, validation::coerce_max_f_eval,
    },
    utils::{build_objective, extract_theta},
};

/// OptimizationResult — Python-facing view of an [`OptimOutcome`].
///
/// Purpose
/// -------
/// Present the normalized result of one optimization run to Python code in a
/// read-only wrapper.
///
/// Fields
/// ------
/// - `inner`: [`OptimOutcome`]
///   Full result including the elapsed time and the ignored tolerances.
///
/// Notes
/// -----
/// - Instances are created by `optimize` only. `str(result)` renders the
///   five-line summary block; `render_trace()` the per-iteration table.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "paramfit", name = "OptimizationResult", frozen)]
pub struct PyOptimOutcome {
    pub inner: OptimOutcome,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyOptimOutcome {
    #[getter]
    pub fn optimizer(&self) -> &'static str {
        self.inner.optimizer
    }

    #[getter]
    pub fn x_opt(&self) -> Vec<f64> {
        self.inner.x_opt.to_vec()
    }

    #[getter]
    pub fn f_opt(&self) -> f64 {
        self.inner.f_opt
    }

    #[getter]
    pub fn funct_eval(&self) -> usize {
        self.inner.funct_eval
    }

    #[getter]
    pub fn status(&self) -> String {
        self.inner.status.to_string()
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.converged()
    }

    #[getter]
    pub fn iterations(&self) -> u64 {
        self.inner.iterations
    }

    #[getter]
    pub fn trace(&self) -> Option<Vec<f64>> {
        self.inner.trace.clone()
    }

    #[getter]
    pub fn ignored_tols(&self) -> Vec<String> {
        self.inner.ignored_tols.iter().map(ToString::to_string).collect()
    }

    /// Elapsed wall-clock time in seconds.
    #[getter]
    pub fn time(&self) -> f64 {
        self.inner.elapsed.as_secs_f64()
    }

    pub fn render_trace(&self) -> String {
        self.inner.render_trace()
    }

    pub fn __str__(&self) -> String {
        self.inner.to_string()
    }

    pub fn __repr__(&self) -> String {
        format!(
            "OptimizationResult(optimizer={:?}, f_opt={}, status={:?})",
            self.inner.optimizer, self.inner.f_opt, self.inner.status
        )
    }
}

/// Optimizer — a resolved strategy handle returned by `get_optimizer`.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "paramfit", name = "Optimizer", frozen)]
pub struct PyOptimizer {
    strategy: Strategy,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyOptimizer {
    /// Display name of the engine.
    #[getter]
    pub fn name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Canonical lookup key (`fmin_tnc`, `simplex` or `lbfgsb`).
    #[getter]
    pub fn key(&self) -> &'static str {
        self.strategy.key()
    }

    #[pyo3(
        signature = (
            x_init,
            f = None,
            f_fp = None,
            fp = None,
            messages = false,
            max_f_eval = 1e4,
            ftol = None,
            gtol = None,
            xtol = None,
        ),
        text_signature = "(self, x_init, /, f=None, f_fp=None, fp=None, messages=False, \
                          max_f_eval=10000.0, ftol=None, gtol=None, xtol=None)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn run<'py>(
        &self, py: Python<'py>, x_init: &Bound<'py, PyAny>, f: Option<Bound<'py, PyAny>>,
        f_fp: Option<Bound<'py, PyAny>>, fp: Option<Bound<'py, PyAny>>, messages: bool,
        max_f_eval: f64, ftol: Option<f64>, gtol: Option<f64>, xtol: Option<f64>,
    ) -> PyResult<PyOptimOutcome> {
        run_strategy(
            py, self.strategy, x_init, f, f_fp, fp, messages, max_f_eval, ftol, gtol, xtol,
        )
    }

    pub fn __repr__(&self) -> String {
        format!("Optimizer({:?})", self.strategy.key())
    }
}

/// Resolve an optimizer by name (case-insensitive, unique substring of
/// `fmin_tnc`, `simplex` or `lbfgsb`).
///
/// Raises `KeyError` when the name matches no strategy or several.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(name = "get_optimizer")]
pub fn py_get_optimizer(name: &str) -> PyResult<PyOptimizer> {
    Ok(PyOptimizer { strategy: lookup_optimizer(name)? })
}

/// Look up `name` and minimize the objective from `x_init`.
///
/// `f(x) -> float`, `f_fp(x) -> (float, grad)` and `fp(x) -> grad` each
/// receive a 1-D `numpy.ndarray`. At least one of `f` and `f_fp` is
/// required; the gradient strategies also need `f_fp` or `fp`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (
        name,
        x_init,
        f = None,
        f_fp = None,
        fp = None,
        messages = false,
        max_f_eval = 1e4,
        ftol = None,
        gtol = None,
        xtol = None,
    ),
    text_signature = "(name, x_init, /, f=None, f_fp=None, fp=None, messages=False, \
                      max_f_eval=10000.0, ftol=None, gtol=None, xtol=None)"
)]
#[allow(clippy::too_many_arguments)]
pub fn optimize<'py>(
    py: Python<'py>, name: &str, x_init: &Bound<'py, PyAny>, f: Option<Bound<'py, PyAny>>,
    f_fp: Option<Bound<'py, PyAny>>, fp: Option<Bound<'py, PyAny>>, messages: bool,
    max_f_eval: f64, ftol: Option<f64>, gtol: Option<f64>, xtol: Option<f64>,
) -> PyResult<PyOptimOutcome> {
    let strategy = lookup_optimizer(name)?;
    run_strategy(py, strategy, x_init, f, f_fp, fp, messages, max_f_eval, ftol, gtol, xtol)
}

#[cfg(feature = "python-bindings")]
#[allow(clippy::too_many_arguments)]
fn run_strategy<'py>(
    py: Python<'py>, strategy: Strategy, x_init: &Bound<'py, PyAny>,
    f: Option<Bound<'py, PyAny>>, f_fp: Option<Bound<'py, PyAny>>,
    fp: Option<Bound<'py, PyAny>>, messages: bool, max_f_eval: f64, ftol: Option<f64>,
    gtol: Option<f64>, xtol: Option<f64>,
) -> PyResult<PyOptimOutcome> {
    let x_init = extract_theta(py, x_init)?;
    let objective = build_objective(f, f_fp, fp)?;
    let tols = Tolerances::new(xtol, ftol, gtol)?;
    let opts = OptimizerOptions::new(tols, coerce_max_f_eval(max_f_eval)?, messages)?;
    let request = OptimizationRequest::new(x_init, objective, opts);
    let inner = strategy.run(&request)?;
    Ok(PyOptimOutcome { inner })
}

/// _paramfit — PyO3 module initializer for the Python extension.
///
/// Registers `optimize`, `get_optimizer` and the two result/handle classes.
/// Invoked by Python when importing the compiled extension.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _paramfit<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<PyOptimOutcome>()?;
    m.add_class::<PyOptimizer>()?;
    m.add_function(wrap_pyfunction!(optimize, m)?)?;
    m.add_function(wrap_pyfunction!(py_get_optimizer, m)?)?;
    Ok(())
}
