//! The task contract and its lifecycle wrapper.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{PipelineError, TaskExecutionFailed, TaskIndex, TaskState};

/// A named unit of background work.
///
/// `run` is invoked at most once per pipeline run. Returning `Ok(())` records
/// the task as finished; any `TaskExecutionFailed` records it as failed.
#[async_trait]
pub trait Task: Send + Sync {
    /// Human-readable name, stable for the task's lifetime.
    fn name(&self) -> &str;

    /// Informational link describing the task. Has no effect on execution.
    fn reference_url(&self) -> Option<&str> {
        None
    }

    /// Perform the task's action.
    async fn run(&self) -> Result<(), TaskExecutionFailed>;
}

/// A task paired with its current lifecycle state.
///
/// The task is shared with the background worker only for the duration of a
/// single `run` call; the context is its sole long-lived owner.
pub struct TaskContext {
    index: TaskIndex,
    task: Arc<dyn Task>,
    state: TaskState,
    error: Option<String>,
}

impl TaskContext {
    /// Wrap a task at the given pipeline position.
    pub fn new(index: TaskIndex, task: Arc<dyn Task>) -> Self {
        Self {
            index,
            task,
            state: TaskState::Runnable,
            error: None,
        }
    }

    pub fn index(&self) -> TaskIndex {
        self.index
    }

    pub fn task(&self) -> &Arc<dyn Task> {
        &self.task
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Diagnostic message of the last failed run, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: TaskState) -> Result<(), PipelineError> {
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                index: self.index,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Record a failed run along with its diagnostic.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), PipelineError> {
        self.transition(TaskState::Failed)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Return to `Runnable`, forgetting any previous outcome.
    pub fn reset(&mut self) {
        self.state = TaskState::Runnable;
        self.error = None;
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("index", &self.index)
            .field("name", &self.task.name())
            .field("state", &self.state)
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl Task for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        async fn run(&self) -> Result<(), TaskExecutionFailed> {
            Ok(())
        }
    }

    fn context() -> TaskContext {
        TaskContext::new(TaskIndex::new(0), Arc::new(Noop))
    }

    #[test]
    fn test_new_context_is_runnable() {
        let ctx = context();
        assert_eq!(ctx.state(), TaskState::Runnable);
        assert_eq!(ctx.name(), "noop");
        assert!(ctx.task().reference_url().is_none());
    }

    #[test]
    fn test_fail_records_diagnostic() {
        let mut ctx = context();
        ctx.transition(TaskState::Running).unwrap();
        ctx.fail("status mismatch").unwrap();

        assert_eq!(ctx.state(), TaskState::Failed);
        assert_eq!(ctx.error(), Some("status mismatch"));
    }

    #[test]
    fn test_invalid_transition_is_rejected() {
        let mut ctx = context();
        let err = ctx.transition(TaskState::Finished).unwrap_err();

        assert_eq!(
            err,
            PipelineError::InvalidTransition {
                index: TaskIndex::new(0),
                from: TaskState::Runnable,
                to: TaskState::Finished,
            }
        );
        assert_eq!(ctx.state(), TaskState::Runnable);
    }

    #[test]
    fn test_reset_clears_outcome() {
        let mut ctx = context();
        ctx.transition(TaskState::Running).unwrap();
        ctx.fail("boom").unwrap();
        ctx.reset();

        assert_eq!(ctx.state(), TaskState::Runnable);
        assert!(ctx.error().is_none());
    }

    #[tokio::test]
    async fn test_run_through_trait_object() {
        let ctx = context();
        assert!(ctx.task().run().await.is_ok());
    }
}
