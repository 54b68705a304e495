//! Core data types for the sequencing engine.
//!
//! Wire-facing types (`TaskRecord`, `ScheduleRequest`, `ScheduleResponse`) use the
//! field names of the planning backend; `Task` is the validated, defaulted form
//! the pipeline works on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::SequencingError;

/// Task priority. Lower rank is scheduled first among ready tasks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// critical=0 < high=1 < medium=2 < low=3
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("Unknown priority: {}", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

/// Optimization goal. Only affects the order among simultaneously-ready tasks;
/// start and end days are fixed by the dependency structure alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationGoal {
    #[default]
    Time,
    Cost,
    Resources,
    Weather,
}

impl OptimizationGoal {
    /// Parse a goal label. Unrecognized labels fall back to `Time`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "cost" => Self::Cost,
            "resources" => Self::Resources,
            "weather" => Self::Weather,
            _ => Self::Time,
        }
    }
}

impl fmt::Display for OptimizationGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Time => "time",
            Self::Cost => "cost",
            Self::Resources => "resources",
            Self::Weather => "weather",
        };
        f.write_str(s)
    }
}

/// A raw task record as emitted by the planning generator.
///
/// Every field is optional on the wire so that missing identity fields surface
/// as a validation error naming the record instead of a decode failure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub estimated_duration_days: Option<f64>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub dependencies: Option<Vec<String>>,
    #[serde(default)]
    pub resources_required: Option<Vec<String>>,
}

impl TaskRecord {
    pub fn new(task_id: impl Into<String>, task_name: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            task_name: Some(task_name.into()),
            ..Self::default()
        }
    }

    pub fn duration(mut self, days: f64) -> Self {
        self.estimated_duration_days = Some(days);
        self
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn resources<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources_required = Some(labels.into_iter().map(Into::into).collect());
        self
    }
}

/// A validated task with defaults applied. Immutable for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub name: String,
    /// Whole days, always >= 1.
    pub duration: u32,
    pub priority: Priority,
    /// Deduplicated, in first-seen order.
    pub dependency_names: Vec<String>,
    pub resource_labels: Vec<String>,
}

/// One sequencing request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub optimization_goal: Option<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Calendar anchor for day 0.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

impl ScheduleRequest {
    pub fn new(tasks: Vec<TaskRecord>) -> Self {
        Self {
            tasks,
            ..Self::default()
        }
    }

    pub fn goal(&self) -> OptimizationGoal {
        self.optimization_goal
            .as_deref()
            .map(OptimizationGoal::parse_lenient)
            .unwrap_or_default()
    }
}

/// A task placed on the timeline.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptimizedTask {
    #[serde(rename = "task_id")]
    pub id: String,
    #[serde(rename = "task_name")]
    pub name: String,
    pub sequence_order: usize,
    pub start_day: u64,
    pub end_day: u64,
    pub duration_days: u32,
    pub priority: Priority,
    pub parallel_tasks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// Successful outcome of one sequencing run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduleResult {
    pub optimized_tasks: Vec<OptimizedTask>,
    pub total_duration_days: u64,
    pub optimization_goal: OptimizationGoal,
    pub efficiency_gain_percent: Option<f64>,
    pub warnings: Vec<String>,
    pub critical_path: Vec<String>,
    pub critical_path_days: u64,
}

impl ScheduleResult {
    /// Look up a scheduled task by its id.
    pub fn task(&self, id: &str) -> Option<&OptimizedTask> {
        self.optimized_tasks.iter().find(|t| t.id == id)
    }
}

/// Response envelope returned to callers. Failures never carry partial tasks.
#[derive(Clone, Debug, PartialEq)]
pub enum ScheduleResponse {
    Success(ScheduleResult),
    Failure { error: String, error_type: String },
}

#[derive(Serialize)]
struct SuccessEnvelope<'a> {
    success: bool,
    #[serde(flatten)]
    result: &'a ScheduleResult,
}

#[derive(Serialize)]
struct FailureEnvelope<'a> {
    success: bool,
    error: &'a str,
    error_type: &'a str,
}

impl Serialize for ScheduleResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(result) => SuccessEnvelope {
                success: true,
                result,
            }
            .serialize(serializer),
            Self::Failure { error, error_type } => FailureEnvelope {
                success: false,
                error,
                error_type,
            }
            .serialize(serializer),
        }
    }
}

impl ScheduleResponse {
    pub fn failure(err: &SequencingError) -> Self {
        Self::Failure {
            error: err.to_string(),
            error_type: err.error_type().to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<Result<ScheduleResult, SequencingError>> for ScheduleResponse {
    fn from(outcome: Result<ScheduleResult, SequencingError>) -> Self {
        match outcome {
            Ok(result) => Self::Success(result),
            Err(err) => Self::failure(&err),
        }
    }
}
