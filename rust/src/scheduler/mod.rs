//! Ordering and timeline construction for a validated, acyclic batch.
//!
//! Kahn's algorithm produces the execution order, the timeline follows that
//! order, and the parallelism pass samples unrelated task pairs.

mod parallelism;
mod ready_queue;
mod timeline;

pub use parallelism::parallel_partners;
pub use ready_queue::topological_order;
pub use timeline::{calendar_date, compute_timeline, Slot};
