//! Start/end day assignment.

use chrono::{Days, NaiveDate};

use crate::error::SequencingError;
use crate::graph::{DependencyGraph, NodeId};
use crate::log_changes;
use crate::models::Task;

/// A task's placement on the timeline, in days from the start of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start_day: u64,
    pub end_day: u64,
}

/// Assign start and end days by walking the topological order.
///
/// A task starts when its last direct prerequisite ends (day 0 without
/// prerequisites). Two unrelated tasks may overlap even if they share
/// resource labels.
///
/// # Returns
/// * `Ok(slots)` indexed by node id
/// * `Err(SequencingError::InternalConsistency)` if a prerequisite appears after
///   its dependent in `order`
pub fn compute_timeline(
    graph: &DependencyGraph,
    tasks: &[Task],
    order: &[NodeId],
    verbosity: u8,
) -> Result<Vec<Slot>, SequencingError> {
    let mut slots: Vec<Option<Slot>> = vec![None; graph.len()];

    for &node in order {
        let mut start_day = 0;
        for &prereq in graph.prerequisites(node) {
            let Some(prereq_slot) = slots[prereq as usize] else {
                return Err(SequencingError::InternalConsistency(format!(
                    "'{}' was placed before its prerequisite '{}'",
                    graph.name(node),
                    graph.name(prereq)
                )));
            };
            start_day = start_day.max(prereq_slot.end_day);
        }
        let end_day = start_day + u64::from(tasks[node as usize].duration);
        log_changes!(
            verbosity,
            "Placed {} on days {}..{}",
            graph.name(node),
            start_day,
            end_day
        );
        slots[node as usize] = Some(Slot { start_day, end_day });
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(node, slot)| {
            slot.ok_or_else(|| {
                SequencingError::InternalConsistency(format!(
                    "'{}' is missing from the topological order",
                    graph.name(node as NodeId)
                ))
            })
        })
        .collect()
}

/// Calendar date `days` after `anchor`.
pub fn calendar_date(anchor: NaiveDate, days: u64) -> Option<NaiveDate> {
    anchor.checked_add_days(Days::new(days))
}
