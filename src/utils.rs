//! Python-boundary helpers: array extraction and callable wrapping.
//!
//! Everything here is compiled only with the `python-bindings` feature.
//!
//! Arrays cross the boundary as `f64` slices and `Vec`s, never as `ndarray`
//! types, so numpy may resolve its own `ndarray` release without clashing
//! with the crate's.
#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::optimization::{
    errors::{OptError, OptResult},
    optimizers::{Cost, Grad, Objective, Theta},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArray1,
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyUntypedArrayMethods,
};

/// Accept a 1-D `numpy.ndarray`, `pandas.Series` or float sequence as a
/// contiguous read-only `f64` array.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.is_contiguous() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.is_contiguous() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Owned copy of a Python array-like as a parameter vector.
#[cfg(feature = "python-bindings")]
pub fn extract_theta<'py>(py: Python<'py>, raw_data: &Bound<'py, PyAny>) -> PyResult<Theta> {
    let arr = extract_f64_array(py, raw_data)?;
    let values = arr.as_slice().map_err(|_| {
        pyo3::exceptions::PyValueError::new_err("expected a contiguous 1-D float64 array")
    })?;
    Ok(Theta::from(values.to_vec()))
}

/// Fresh `numpy.ndarray` copy of a parameter vector.
#[cfg(feature = "python-bindings")]
pub fn theta_to_py<'py>(py: Python<'py>, theta: &Theta) -> Bound<'py, PyArray1<f64>> {
    theta.iter().copied().collect::<Vec<f64>>().into_pyarray(py)
}

/// Build an [`Objective`] from the Python callables `f`, `f_fp` and `fp`.
///
/// Each callable receives the parameter vector as a `numpy.ndarray`.
/// `f` returns a float, `f_fp` a `(float, array-like)` pair and `fp` an
/// array-like. Python exceptions raised inside them surface as
/// [`OptError::ObjectiveFailed`].
///
/// # Errors
/// `ValueError` when neither `f` nor `f_fp` is given.
#[cfg(feature = "python-bindings")]
pub fn build_objective<'py>(
    f: Option<Bound<'py, PyAny>>, f_fp: Option<Bound<'py, PyAny>>, fp: Option<Bound<'py, PyAny>>,
) -> PyResult<Objective<'py>> {
    let mut objective = match (f, f_fp) {
        (Some(f), Some(f_fp)) => Objective::new(move |x: &Theta| call_value(&f, x))
            .with_value_and_grad(move |x: &Theta| call_value_and_grad(&f_fp, x)),
        (Some(f), None) => Objective::new(move |x: &Theta| call_value(&f, x)),
        (None, Some(f_fp)) => Objective::from_value_and_grad(move |x: &Theta| {
            call_value_and_grad(&f_fp, x)
        }),
        (None, None) => {
            return Err(pyo3::exceptions::PyValueError::new_err(
                "an objective `f` or a combined objective `f_fp` is required",
            ));
        }
    };
    if let Some(fp) = fp {
        objective = objective.with_grad(move |x: &Theta| call_grad(&fp, x));
    }
    Ok(objective)
}

// ---- Helper Methods ----

#[cfg(feature = "python-bindings")]
fn call_value(f: &Bound<'_, PyAny>, x: &Theta) -> OptResult<Cost> {
    let out = f.call1((theta_to_py(f.py(), x),)).map_err(objective_failed)?;
    out.extract::<f64>().map_err(objective_failed)
}

#[cfg(feature = "python-bindings")]
fn call_value_and_grad(f_fp: &Bound<'_, PyAny>, x: &Theta) -> OptResult<(Cost, Grad)> {
    let py = f_fp.py();
    let out = f_fp.call1((theta_to_py(py, x),)).map_err(objective_failed)?;
    let (cost, grad): (f64, Bound<'_, PyAny>) = out.extract().map_err(objective_failed)?;
    let grad = extract_theta(py, &grad).map_err(objective_failed)?;
    Ok((cost, grad))
}

#[cfg(feature = "python-bindings")]
fn call_grad(fp: &Bound<'_, PyAny>, x: &Theta) -> OptResult<Grad> {
    let py = fp.py();
    let out = fp.call1((theta_to_py(py, x),)).map_err(objective_failed)?;
    extract_theta(py, &out).map_err(objective_failed)
}

#[cfg(feature = "python-bindings")]
fn objective_failed(err: PyErr) -> OptError {
    OptError::ObjectiveFailed { text: err.to_string() }
}
