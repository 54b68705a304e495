//! Input validation for task records.
//!
//! Rejects the whole batch on the first malformed record and applies the
//! documented defaults to the rest: duration 1, priority medium, no
//! dependencies, no resources.

use rustc_hash::FxHashSet;

use crate::config::SequencingConfig;
use crate::error::ValidationError;
use crate::models::{Priority, Task, TaskRecord};

/// Validated batch plus any non-fatal findings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedBatch {
    pub tasks: Vec<Task>,
    pub warnings: Vec<String>,
}

fn required_field(
    value: Option<&str>,
    index: usize,
    field: &'static str,
) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::at(index, field, "missing or empty")),
    }
}

/// Convert a duration in (possibly fractional) days to whole days.
fn whole_days(days: f64, index: usize) -> Result<u32, ValidationError> {
    if !days.is_finite() || days <= 0.0 {
        return Err(ValidationError::at(
            index,
            "estimated_duration_days",
            format!("must be a positive number of days, got {}", days),
        ));
    }
    let rounded = days.ceil();
    if rounded > u32::MAX as f64 {
        return Err(ValidationError::at(
            index,
            "estimated_duration_days",
            format!("{} days is out of range", days),
        ));
    }
    Ok(rounded as u32)
}

fn dedup_in_order(values: &[String]) -> Vec<String> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Validate task records and apply defaults.
///
/// # Returns
/// * `Ok(ValidatedBatch)` with one `Task` per record, in input order
/// * `Err(ValidationError)` naming the first offending record and field
pub fn validate_records(
    records: &[TaskRecord],
    config: &SequencingConfig,
) -> Result<ValidatedBatch, ValidationError> {
    if let Some(limit) = config.max_batch_size {
        if records.len() > limit {
            return Err(ValidationError::batch(
                "tasks",
                format!(
                    "batch of {} tasks exceeds the limit of {}",
                    records.len(),
                    limit
                ),
            ));
        }
    }

    let mut tasks = Vec::with_capacity(records.len());
    let mut warnings = Vec::new();
    let mut seen_ids: FxHashSet<String> = FxHashSet::default();
    let mut seen_names: FxHashSet<String> = FxHashSet::default();

    for (index, record) in records.iter().enumerate() {
        let id = required_field(record.task_id.as_deref(), index, "task_id")?;
        let name = required_field(record.task_name.as_deref(), index, "task_name")?;

        if !seen_ids.insert(id.clone()) {
            return Err(ValidationError::at(
                index,
                "task_id",
                format!("duplicate task id '{}'", id),
            ));
        }
        if !seen_names.insert(name.clone()) {
            return Err(ValidationError::at(
                index,
                "task_name",
                format!("duplicate task name '{}'", name),
            ));
        }

        let duration = match record.estimated_duration_days {
            Some(days) => whole_days(days, index)?,
            None => 1,
        };

        let priority = match record.priority.as_deref() {
            None => Priority::default(),
            Some(label) => label.parse::<Priority>().unwrap_or_else(|_| {
                warnings.push(format!(
                    "Task '{}' has unknown priority '{}', using medium",
                    name, label
                ));
                Priority::default()
            }),
        };

        let dependency_names = record
            .dependencies
            .as_deref()
            .map(dedup_in_order)
            .unwrap_or_default();
        let resource_labels = record.resources_required.clone().unwrap_or_default();

        tasks.push(Task {
            id,
            name,
            duration,
            priority,
            dependency_names,
            resource_labels,
        });
    }

    Ok(ValidatedBatch { tasks, warnings })
}
