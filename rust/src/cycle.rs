//! Cycle detection over the prerequisite graph.
//!
//! Three-colour depth-first search: white nodes are unvisited, gray nodes are
//! on the current path, black nodes are finished. An edge into a gray node is a
//! back-edge and closes a cycle. The traversal keeps an explicit stack so long
//! dependency chains cannot exhaust the call stack.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.3

use crate::error::SequencingError;
use crate::graph::{DependencyGraph, NodeId};
use crate::log_debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Find one cycle, if any.
///
/// Roots are visited in input order so the reported cycle is deterministic.
/// The returned path follows prerequisite edges and repeats its first node at
/// the end (`[a, b, a]` means a requires b and b requires a).
pub fn find_cycle(graph: &DependencyGraph, verbosity: u8) -> Option<Vec<NodeId>> {
    let mut color = vec![Color::White; graph.len()];
    // (node, index of the next prerequisite to explore)
    let mut stack: Vec<(NodeId, usize)> = Vec::new();

    for root in 0..graph.len() as NodeId {
        if color[root as usize] != Color::White {
            continue;
        }
        color[root as usize] = Color::Gray;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(&next) = graph.prerequisites(node).get(frame.1) else {
                color[node as usize] = Color::Black;
                stack.pop();
                log_debug!(verbosity, "DFS finished {}", graph.name(node));
                continue;
            };
            frame.1 += 1;

            match color[next as usize] {
                Color::White => {
                    color[next as usize] = Color::Gray;
                    stack.push((next, 0));
                }
                Color::Gray => {
                    let start = stack
                        .iter()
                        .position(|&(n, _)| n == next)
                        .unwrap_or_default();
                    let mut cycle: Vec<NodeId> = stack[start..].iter().map(|&(n, _)| n).collect();
                    cycle.push(next);
                    return Some(cycle);
                }
                Color::Black => {}
            }
        }
    }

    None
}

/// Reject the batch if the graph contains any cycle.
pub fn ensure_acyclic(graph: &DependencyGraph, verbosity: u8) -> Result<(), SequencingError> {
    match find_cycle(graph, verbosity) {
        None => Ok(()),
        Some(cycle) => Err(SequencingError::CircularDependency {
            cycle: cycle
                .into_iter()
                .map(|node| graph.name(node).to_string())
                .collect(),
        }),
    }
}
