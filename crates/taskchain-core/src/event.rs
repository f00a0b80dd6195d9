//! Pipeline notifications and read-only views of pipeline state.

use serde::{Deserialize, Serialize};

use crate::{TaskIndex, TaskState};

/// A notification produced by the pipeline.
///
/// Events are delivered in exactly the order the pipeline produces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A task context changed state.
    StateChanged {
        index: TaskIndex,
        name: String,
        state: TaskState,
        /// Diagnostic message when `state` is `Failed`.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// The run reached its end.
    Completed {
        finished: usize,
        failed: usize,
        /// Tasks never dispatched because the run stopped early.
        skipped: usize,
    },
}

impl PipelineEvent {
    /// Create a StateChanged event.
    pub fn state_changed(
        index: TaskIndex,
        name: impl Into<String>,
        state: TaskState,
        error: Option<String>,
    ) -> Self {
        Self::StateChanged {
            index,
            name: name.into(),
            state,
            error,
        }
    }

    /// Returns true for the terminal `Completed` event.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Read-only view of one task context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub index: TaskIndex,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Read-only view of the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    /// Index of the task executing or about to execute.
    pub cursor: TaskIndex,
    pub running: bool,
    pub tasks: Vec<TaskSnapshot>,
}

impl PipelineSnapshot {
    /// Number of tasks currently in `state`.
    pub fn count(&self, state: TaskState) -> usize {
        self.tasks.iter().filter(|t| t.state == state).count()
    }

    /// Returns true once every task has reached a terminal state.
    pub fn all_terminal(&self) -> bool {
        self.tasks.iter().all(|t| t.state.is_terminal())
    }
}
