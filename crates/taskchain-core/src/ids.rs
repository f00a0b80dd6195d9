//! Newtype wrapper for task identity within a pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a task in its pipeline.
///
/// Pipelines are fixed-length and never reordered, so the position doubles as
/// the task's identity for the lifetime of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskIndex(usize);

impl TaskIndex {
    /// Create a new TaskIndex.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw position.
    pub fn get(&self) -> usize {
        self.0
    }

    /// Index of the task that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TaskIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for TaskIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl From<TaskIndex> for usize {
    fn from(index: TaskIndex) -> Self {
        index.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_next() {
        assert_eq!(TaskIndex::new(2).next(), TaskIndex::new(3));
    }

    #[test]
    fn test_index_display() {
        let index = TaskIndex::from(7);
        assert_eq!(format!("{}", index), "7");
    }
}
