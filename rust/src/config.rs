//! Configuration types for the sequencing engine.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// What to do with a dependency name that matches no task in the batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Log a warning, record it in the result and drop the edge.
    #[default]
    DropWithWarning,
    /// Reject the whole batch.
    FailOnUnresolved,
}

impl FromStr for UnresolvedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop_with_warning" | "drop" | "warn" => Ok(Self::DropWithWarning),
            "fail_on_unresolved" | "fail" => Ok(Self::FailOnUnresolved),
            other => Err(format!("Unknown unresolved dependency policy: {}", other)),
        }
    }
}

impl fmt::Display for UnresolvedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DropWithWarning => write!(f, "drop_with_warning"),
            Self::FailOnUnresolved => write!(f, "fail_on_unresolved"),
        }
    }
}

/// Configuration for one sequencing run.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SequencingConfig {
    /// Handling of dependency names that resolve to no task
    pub unresolved_policy: UnresolvedPolicy,
    /// Maximum number of names kept in each task's `parallel_tasks` sample
    pub parallel_sample_limit: usize,
    /// Reject batches larger than this (None = no ceiling)
    pub max_batch_size: Option<usize>,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl Default for SequencingConfig {
    fn default() -> Self {
        Self {
            unresolved_policy: UnresolvedPolicy::DropWithWarning,
            parallel_sample_limit: 3,
            max_batch_size: None,
            verbosity: 0,
        }
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl SequencingConfig {
    #[new]
    #[pyo3(signature = (
        unresolved_policy=None,
        parallel_sample_limit=None,
        max_batch_size=None,
        verbosity=None
    ))]
    fn new(
        unresolved_policy: Option<String>,
        parallel_sample_limit: Option<usize>,
        max_batch_size: Option<usize>,
        verbosity: Option<u8>,
    ) -> PyResult<Self> {
        let defaults = Self::default();
        let unresolved_policy = match unresolved_policy {
            Some(s) => s
                .parse()
                .map_err(pyo3::exceptions::PyValueError::new_err)?,
            None => defaults.unresolved_policy,
        };
        Ok(Self {
            unresolved_policy,
            parallel_sample_limit: parallel_sample_limit.unwrap_or(defaults.parallel_sample_limit),
            max_batch_size: max_batch_size.or(defaults.max_batch_size),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        })
    }

    #[getter]
    fn parallel_sample_limit(&self) -> usize {
        self.parallel_sample_limit
    }

    #[setter]
    fn set_parallel_sample_limit(&mut self, value: usize) {
        self.parallel_sample_limit = value;
    }

    #[getter]
    fn max_batch_size(&self) -> Option<usize> {
        self.max_batch_size
    }

    #[setter]
    fn set_max_batch_size(&mut self, value: Option<usize>) {
        self.max_batch_size = value;
    }

    #[getter]
    fn verbosity(&self) -> u8 {
        self.verbosity
    }

    #[setter]
    fn set_verbosity(&mut self, value: u8) {
        self.verbosity = value;
    }

    #[getter(unresolved_policy)]
    fn py_unresolved_policy(&self) -> String {
        self.unresolved_policy.to_string()
    }

    #[setter(unresolved_policy)]
    fn py_set_unresolved_policy(&mut self, value: String) -> PyResult<()> {
        self.unresolved_policy = value
            .parse()
            .map_err(pyo3::exceptions::PyValueError::new_err)?;
        Ok(())
    }

    fn __repr__(&self) -> String {
        format!(
            "SequencingConfig(unresolved_policy={:?}, parallel_sample_limit={}, max_batch_size={:?})",
            self.unresolved_policy.to_string(),
            self.parallel_sample_limit,
            self.max_batch_size
        )
    }
}
