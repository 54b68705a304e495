//! Task sequencing and scheduling engine for field operations.
//!
//! Given a batch of operations with precedence constraints, the engine rejects
//! cyclic constraint sets, produces an execution order, computes a day-based
//! timeline and reports which operations can overlap.
//!
//! Pipeline:
//! 1. `validation` checks identity fields and applies defaults
//! 2. `graph` resolves dependency names into prerequisite edges
//! 3. `cycle` rejects the batch on any cycle (three-colour DFS)
//! 4. `scheduler` orders tasks with Kahn's algorithm, places them on the
//!    timeline and samples parallel-capable partners
//! 5. `metrics` computes makespan, efficiency gain and the critical path
//!
//! Every call is pure and self-contained; nothing is shared between calls.

// Allow clippy warning triggered by PyO3 macro expansion
#![cfg_attr(feature = "python", allow(clippy::useless_conversion))]

mod config;
pub mod cycle;
mod engine;
mod error;
pub mod graph;
mod logging;
pub mod metrics;
mod models;
pub mod scheduler;
pub mod sorting;
pub mod validation;

pub use config::{SequencingConfig, UnresolvedPolicy};
pub use engine::{run_json, sequence_tasks, TaskSequencer};
pub use error::{SequencingError, ValidationError};
pub use graph::{DependencyGraph, NodeId};
pub use models::{
    OptimizationGoal, OptimizedTask, Priority, ScheduleRequest, ScheduleResponse, ScheduleResult,
    Task, TaskRecord,
};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Sequence a JSON request and return the JSON response envelope.
///
/// # Arguments
/// * `request_json` - `{"tasks": [...], "optimization_goal": ..., "constraints": [...]}`
/// * `config` - Sequencing configuration (defaults when omitted)
///
/// # Returns
/// * JSON string with `success` and either the schedule or `error`/`error_type`
///
/// # Raises
/// * ValueError if the response cannot be serialized
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(signature = (request_json, config=None))]
fn sequence_json(request_json: &str, config: Option<SequencingConfig>) -> PyResult<String> {
    let config = config.unwrap_or_default();
    let response = run_json(request_json, &config);
    serde_json::to_string(&response)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// The agro_sequencer Python module.
#[cfg(feature = "python")]
#[pymodule]
fn agro_sequencer(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<SequencingConfig>()?;
    m.add_function(wrap_pyfunction!(sequence_json, m)?)?;
    Ok(())
}
