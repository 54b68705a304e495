//! Parallel-capable task discovery.
//!
//! Two tasks are parallel-capable when no dependency chain links them in either
//! direction. Each task keeps a small sample of such partners for display; the
//! sample is capped and follows discovery order, so it is neither a partition
//! nor guaranteed symmetric once a cap is full.

use crate::graph::{DependencyGraph, NodeId};
use crate::log_checks;

/// Collect up to `limit` parallel-capable partners for every task.
///
/// Candidates are scanned in topological order. Worst case is O(n²)
/// reachability checks.
///
/// # Returns
/// * Partner node ids indexed by node id
pub fn parallel_partners(
    graph: &DependencyGraph,
    order: &[NodeId],
    limit: usize,
    verbosity: u8,
) -> Vec<Vec<NodeId>> {
    let mut partners: Vec<Vec<NodeId>> = vec![Vec::new(); graph.len()];
    if limit == 0 {
        return partners;
    }

    for &node in order {
        let sample = &mut partners[node as usize];
        for &other in order {
            if sample.len() >= limit {
                break;
            }
            if other == node || graph.are_related(node, other) {
                continue;
            }
            log_checks!(
                verbosity,
                "{} can run alongside {}",
                graph.name(node),
                graph.name(other)
            );
            sample.push(other);
        }
    }

    partners
}
