//! Task lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a task within a pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Task has not been dispatched in the current run.
    #[default]
    Runnable,
    /// Task is executing on the background worker.
    Running,
    /// Task completed without error.
    Finished,
    /// Task raised a failure.
    Failed,
}

impl TaskState {
    /// Returns true if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    /// Returns true if the task is executing right now.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true if a task in this state may move to `next`.
    ///
    /// Terminal states are never left through a transition; only an explicit
    /// reset brings a context back to `Runnable`.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Runnable, Self::Running)
                | (Self::Running, Self::Finished)
                | (Self::Running, Self::Failed)
        )
    }

    /// Upper-case label, as used in logs and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Runnable => "RUNNABLE",
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_runnable() {
        assert_eq!(TaskState::default(), TaskState::Runnable);
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(TaskState::Runnable.can_transition_to(TaskState::Running));
        assert!(TaskState::Running.can_transition_to(TaskState::Finished));
        assert!(TaskState::Running.can_transition_to(TaskState::Failed));

        assert!(!TaskState::Runnable.can_transition_to(TaskState::Finished));
        assert!(!TaskState::Running.can_transition_to(TaskState::Running));
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        for terminal in [TaskState::Finished, TaskState::Failed] {
            assert!(terminal.is_terminal());
            for next in [
                TaskState::Runnable,
                TaskState::Running,
                TaskState::Finished,
                TaskState::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_serde_format() {
        let json = serde_json::to_string(&TaskState::Finished).unwrap();
        assert_eq!(json, "\"FINISHED\"");
    }
}
