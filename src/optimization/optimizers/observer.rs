//! Trace observer: records the objective value after every iteration and,
//! when asked, echoes each iteration through `tracing`.
use std::sync::{Arc, Mutex, PoisonError};

use argmin::core::{Error, KV, State, observers::Observe};
use tracing::info;

/// Per-iteration cost recorder.
///
/// Clones share the same buffer, so the runner keeps one handle while argmin
/// owns the other; the trace survives even when the run ends in an error.
#[derive(Debug, Clone, Default)]
pub struct TraceObserver {
    costs: Arc<Mutex<Vec<f64>>>,
    echo: Option<&'static str>,
}

impl TraceObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log every iteration at info level, tagged with `optimizer`.
    pub fn echoing(optimizer: &'static str) -> Self {
        Self { costs: Arc::default(), echo: Some(optimizer) }
    }

    /// Snapshot of the recorded costs.
    pub fn trace(&self) -> Vec<f64> {
        self.costs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of iterations observed.
    pub fn len(&self) -> usize {
        self.costs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<I> Observe<I> for TraceObserver
where
    I: State<Float = f64>,
{
    fn observe_iter(&mut self, state: &I, _kv: &KV) -> Result<(), Error> {
        let cost = state.get_cost();
        self.costs.lock().unwrap_or_else(PoisonError::into_inner).push(cost);
        if let Some(optimizer) = self.echo {
            info!(
                optimizer,
                iter = state.get_iter(),
                cost,
                best_cost = state.get_best_cost(),
                "iteration"
            );
        }
        Ok(())
    }
}
