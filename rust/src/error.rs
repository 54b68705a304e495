//! Error types for the sequencing engine.

use std::fmt;
use thiserror::Error;

/// A rejected task record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Index of the offending record (None for batch-level problems).
    pub index: Option<usize>,
    /// Offending field name as it appears on the wire.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn at(index: usize, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            field,
            message: message.into(),
        }
    }

    pub fn batch(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            index: None,
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "Task {} field '{}': {}", index, self.field, self.message),
            None => write!(f, "Field '{}': {}", self.field, self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors that abort a sequencing run. No partial schedule accompanies any of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequencingError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnresolvedDependency { task: String, dependency: String },
    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),
}

impl SequencingError {
    /// Wire category of this error.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::UnresolvedDependency { .. } => "validation",
            Self::CircularDependency { .. } => "circular_dependency",
            Self::InternalConsistency(_) => "unknown",
        }
    }
}
