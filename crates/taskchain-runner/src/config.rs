//! Runner configuration.

use std::time::Duration;

/// What the pipeline does after a task fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and keep going with the next task.
    #[default]
    Continue,
    /// End the run after the first failure. Later tasks stay `Runnable`.
    StopOnFailure,
}

/// Runner configuration.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Behaviour after a failed task.
    pub failure_policy: FailurePolicy,

    /// Upper bound on a single task's run. `None` waits indefinitely.
    pub task_timeout: Option<Duration>,
}

impl RunnerConfig {
    /// Builder method to set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Builder method to set a per-task timeout.
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }
}
