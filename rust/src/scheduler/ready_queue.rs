//! Topological ordering with Kahn's algorithm and a goal-driven ready queue.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::SequencingError;
use crate::graph::{DependencyGraph, NodeId};
use crate::models::{OptimizationGoal, Task};
use crate::sorting::{ready_key, ReadyKey};
use crate::{log_changes, log_debug};

/// Heap entry: key first, then arrival sequence so equal keys leave in the
/// order they became ready.
type ReadyEntry = Reverse<(ReadyKey, u64, NodeId)>;

/// Ready set of tasks whose prerequisites are all ordered.
struct ReadyQueue {
    heap: BinaryHeap<ReadyEntry>,
    arrivals: u64,
}

impl ReadyQueue {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            arrivals: 0,
        }
    }

    fn push(&mut self, node: NodeId, key: ReadyKey) {
        self.heap.push(Reverse((key, self.arrivals, node)));
        self.arrivals += 1;
    }

    fn pop(&mut self) -> Option<NodeId> {
        self.heap.pop().map(|Reverse((_, _, node))| node)
    }
}

/// Order tasks so every prerequisite precedes its dependents.
///
/// Among simultaneously ready tasks the lowest `ReadyKey` goes first; ties keep
/// ready-set arrival order (seeds in input order, newly released tasks in
/// input order).
///
/// Must only be called on an acyclic graph.
///
/// # Returns
/// * `Ok(order)` containing every node exactly once
/// * `Err(SequencingError::InternalConsistency)` if some nodes never became ready
pub fn topological_order(
    graph: &DependencyGraph,
    tasks: &[Task],
    goal: OptimizationGoal,
    verbosity: u8,
) -> Result<Vec<NodeId>, SequencingError> {
    let n = graph.len();
    let mut in_degree: Vec<usize> = (0..n as NodeId)
        .map(|node| graph.prerequisites(node).len())
        .collect();

    let mut ready = ReadyQueue::with_capacity(n);
    for node in 0..n as NodeId {
        if in_degree[node as usize] == 0 {
            ready.push(node, ready_key(&tasks[node as usize], goal));
        }
    }

    let mut order: Vec<NodeId> = Vec::with_capacity(n);

    while let Some(node) = ready.pop() {
        order.push(node);
        log_changes!(
            verbosity,
            "Sequenced #{}: {}",
            order.len(),
            tasks[node as usize].name
        );

        for &dependent in graph.dependents(node) {
            let degree = &mut in_degree[dependent as usize];
            *degree -= 1;
            log_debug!(
                verbosity,
                "  {} now waits on {} prerequisite(s)",
                tasks[dependent as usize].name,
                *degree
            );
            if *degree == 0 {
                ready.push(dependent, ready_key(&tasks[dependent as usize], goal));
            }
        }
    }

    if order.len() != n {
        return Err(SequencingError::InternalConsistency(format!(
            "topological order covers {} of {} tasks after the cycle check passed",
            order.len(),
            n
        )));
    }

    Ok(order)
}
