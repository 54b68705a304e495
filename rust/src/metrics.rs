//! Schedule metrics: makespan, efficiency gain, critical path and the
//! human-readable notes that accompany them.

use crate::graph::{DependencyGraph, NodeId};
use crate::models::Task;
use crate::scheduler::Slot;

/// Aggregate figures for one schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleMetrics {
    /// max(end_day), 0 for an empty batch.
    pub total_duration_days: u64,
    /// Sum of all durations, as if every task ran back to back.
    pub naive_sequential_days: u64,
    pub efficiency_gain_percent: Option<f64>,
    /// Longest dependency chain, first task first.
    pub critical_path: Vec<NodeId>,
    pub critical_path_days: u64,
}

/// Round to one decimal place, exact halves going to the even digit.
fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Percentage saved versus running every task sequentially.
///
/// None when the sequential baseline is zero.
pub fn efficiency_gain(naive_sequential_days: u64, total_duration_days: u64) -> Option<f64> {
    if naive_sequential_days == 0 {
        return None;
    }
    let naive = naive_sequential_days as f64;
    Some(round1(
        (naive - total_duration_days as f64) / naive * 100.0,
    ))
}

/// Walk back from the task that finishes last, always stepping to a
/// prerequisite that ends exactly when the current task starts.
fn trace_critical_path(graph: &DependencyGraph, order: &[NodeId], slots: &[Slot]) -> Vec<NodeId> {
    let mut last: Option<NodeId> = None;
    for &node in order {
        let later = last.map_or(true, |l| slots[node as usize].end_day > slots[l as usize].end_day);
        if later {
            last = Some(node);
        }
    }

    let mut path = Vec::new();
    let mut current = last;
    while let Some(node) = current {
        path.push(node);
        let start = slots[node as usize].start_day;
        current = graph
            .prerequisites(node)
            .iter()
            .copied()
            .find(|&p| slots[p as usize].end_day == start);
    }
    path.reverse();
    path
}

/// Compute the metrics for a placed schedule.
pub fn compute_metrics(
    graph: &DependencyGraph,
    tasks: &[Task],
    order: &[NodeId],
    slots: &[Slot],
) -> ScheduleMetrics {
    let total_duration_days = slots.iter().map(|s| s.end_day).max().unwrap_or(0);
    let naive_sequential_days: u64 = tasks.iter().map(|t| u64::from(t.duration)).sum();

    let critical_path = trace_critical_path(graph, order, slots);
    let critical_path_days = critical_path
        .iter()
        .map(|&node| u64::from(tasks[node as usize].duration))
        .sum();

    ScheduleMetrics {
        total_duration_days,
        naive_sequential_days,
        efficiency_gain_percent: efficiency_gain(naive_sequential_days, total_duration_days),
        critical_path,
        critical_path_days,
    }
}

/// Assemble the warnings list: caller constraints verbatim, then engine
/// findings, then the efficiency note when parallelism saved time.
pub fn compile_warnings(
    constraints: &[String],
    engine_warnings: Vec<String>,
    metrics: &ScheduleMetrics,
) -> Vec<String> {
    let mut warnings: Vec<String> = constraints.to_vec();
    warnings.extend(engine_warnings);
    if let Some(gain) = metrics.efficiency_gain_percent.filter(|&g| g > 0.0) {
        warnings.push(format!(
            "Running independent tasks in parallel finishes in {} days instead of {} sequential days ({}% faster)",
            metrics.total_duration_days, metrics.naive_sequential_days, gain
        ));
    }
    warnings
}
