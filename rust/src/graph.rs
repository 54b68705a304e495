//! Dependency graph construction and reachability queries.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

use crate::config::UnresolvedPolicy;
use crate::error::SequencingError;
use crate::log_debug;
use crate::models::Task;

/// Position of a task in the validated batch (u32 keeps edge lists compact).
pub type NodeId = u32;

/// Prerequisite graph for one batch. Built once, never mutated afterwards.
///
/// Node ids are positions in the validated task list.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    names: Vec<String>,
    /// Direct prerequisites per node, in the order they were listed.
    prerequisites: Vec<Vec<NodeId>>,
    /// Direct dependents per node, in input order.
    dependents: Vec<Vec<NodeId>>,
}

/// Graph plus the warnings produced while resolving dependency names.
#[derive(Debug, Clone)]
pub struct GraphBuild {
    pub graph: DependencyGraph,
    pub warnings: Vec<String>,
}

impl DependencyGraph {
    /// Resolve dependency names and build the adjacency lists.
    ///
    /// # Returns
    /// * `Ok(GraphBuild)` with dropped names reported as warnings
    /// * `Err(SequencingError::UnresolvedDependency)` for the first unknown name
    ///   when the policy is `FailOnUnresolved`
    pub fn build(
        tasks: &[Task],
        policy: UnresolvedPolicy,
        verbosity: u8,
    ) -> Result<GraphBuild, SequencingError> {
        // Names are unique after validation, so every name maps to one node.
        let by_name: FxHashMap<&str, NodeId> = tasks
            .iter()
            .enumerate()
            .map(|(node, task)| (task.name.as_str(), node as NodeId))
            .collect();

        let n = tasks.len();
        let mut prerequisites: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut dependents: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut warnings = Vec::new();

        for (node, task) in tasks.iter().enumerate() {
            let node = node as NodeId;
            for dep_name in &task.dependency_names {
                match by_name.get(dep_name.as_str()).copied() {
                    Some(dep) => {
                        prerequisites[node as usize].push(dep);
                        dependents[dep as usize].push(node);
                        log_debug!(verbosity, "Edge: {} requires {}", task.name, dep_name);
                    }
                    None => match policy {
                        UnresolvedPolicy::FailOnUnresolved => {
                            return Err(SequencingError::UnresolvedDependency {
                                task: task.name.clone(),
                                dependency: dep_name.clone(),
                            });
                        }
                        UnresolvedPolicy::DropWithWarning => {
                            tracing::warn!(
                                task = %task.name,
                                dependency = %dep_name,
                                "dependency not found in batch, ignoring it"
                            );
                            warnings.push(format!(
                                "Dependency '{}' of task '{}' not found; ignored",
                                dep_name, task.name
                            ));
                        }
                    },
                }
            }
        }

        Ok(GraphBuild {
            graph: Self {
                names: tasks.iter().map(|task| task.name.clone()).collect(),
                prerequisites,
                dependents,
            },
            warnings,
        })
    }

    pub fn len(&self) -> usize {
        self.prerequisites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prerequisites.is_empty()
    }

    /// Name of a node's task.
    pub fn name(&self, node: NodeId) -> &str {
        self.names
            .get(node as usize)
            .map(String::as_str)
            .unwrap_or_default()
    }

    #[inline]
    pub fn prerequisites(&self, node: NodeId) -> &[NodeId] {
        &self.prerequisites[node as usize]
    }

    #[inline]
    pub fn dependents(&self, node: NodeId) -> &[NodeId] {
        &self.dependents[node as usize]
    }

    /// Whether `to` is reachable from `from` by following prerequisite edges,
    /// i.e. whether `from` transitively depends on `to`.
    pub fn has_path(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }
        let mut visited = vec![false; self.len()];
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        visited[from as usize] = true;
        queue.push_back(from);

        while let Some(node) = queue.pop_front() {
            for &prereq in self.prerequisites(node) {
                if prereq == to {
                    return true;
                }
                if !visited[prereq as usize] {
                    visited[prereq as usize] = true;
                    queue.push_back(prereq);
                }
            }
        }
        false
    }

    /// Whether a dependency chain connects two tasks in either direction.
    pub fn are_related(&self, a: NodeId, b: NodeId) -> bool {
        self.has_path(a, b) || self.has_path(b, a)
    }

    /// The graph as `task id -> prerequisite task ids`.
    pub fn prerequisite_ids(&self, tasks: &[Task]) -> FxHashMap<String, FxHashSet<String>> {
        tasks
            .iter()
            .zip(&self.prerequisites)
            .map(|(task, prereqs)| {
                let ids = prereqs
                    .iter()
                    .map(|&p| tasks[p as usize].id.clone())
                    .collect();
                (task.id.clone(), ids)
            })
            .collect()
    }
}
