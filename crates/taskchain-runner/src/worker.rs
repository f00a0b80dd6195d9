//! Background execution: the single task worker and the observer notifier.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use taskchain_core::{PipelineEvent, Task, TaskExecutionFailed, TaskIndex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::observer::PipelineObserver;
use crate::runner::RunnerInner;

/// How a single task run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TaskOutcome {
    Finished,
    Failed(String),
}

/// A run handed to the worker.
pub(crate) struct RunRequest {
    pub(crate) first: TaskIndex,
    /// Kept until the run is over; released afterwards so an idle runner
    /// shuts down once its last handle is dropped.
    pub(crate) runner: Arc<RunnerInner>,
}

/// Executes one run at a time, task after task.
///
/// Each request names the first index of a run; the worker keeps going from
/// there until the runner reports the run is over.
pub(crate) async fn run_worker(mut dispatch_rx: mpsc::Receiver<RunRequest>) {
    while let Some(RunRequest { first, runner }) = dispatch_rx.recv().await {
        let mut next = Some(first);
        while let Some(index) = next {
            let Some(task) = runner.task_for(index) else {
                warn!(index = %index, "Dispatched task is no longer current");
                break;
            };

            let outcome = execute(index, task, runner.config().task_timeout).await;
            next = runner.complete_task(index, outcome);
        }
    }
    debug!("Dispatch channel closed, worker exiting");
}

async fn execute(index: TaskIndex, task: Arc<dyn Task>, timeout: Option<Duration>) -> TaskOutcome {
    let task_name = task.name().to_string();
    info!(index = %index, task = %task_name, "Executing task");

    // A panic inside the task surfaces as a JoinError instead of taking the
    // worker down with it.
    let handle = tokio::spawn(async move { task.run().await });
    let abort = handle.abort_handle();

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                abort.abort();
                error!(index = %index, task = %task_name, ?limit, "Task timed out");
                return TaskOutcome::Failed(format!("Timed out after {:?}", limit));
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(())) => {
            info!(index = %index, task = %task_name, "Task successfully executed");
            TaskOutcome::Finished
        }
        Ok(Err(e)) => {
            let message = diagnostic(&e);
            error!(index = %index, task = %task_name, error = %message, "Task execution failed");
            TaskOutcome::Failed(message)
        }
        Err(e) => {
            error!(index = %index, task = %task_name, error = %e, "Task aborted");
            TaskOutcome::Failed(format!("Task aborted: {e}"))
        }
    }
}

/// Message plus the chain of underlying causes.
fn diagnostic(err: &TaskExecutionFailed) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Delivers events to every observer, one event at a time.
///
/// Each delivery runs in its own task and is awaited before the next one, so
/// order is kept and a panicking observer cannot silence the others.
pub(crate) async fn run_notifier(
    observers: Vec<Arc<dyn PipelineObserver>>,
    mut event_rx: mpsc::UnboundedReceiver<PipelineEvent>,
) {
    while let Some(event) = event_rx.recv().await {
        let event = Arc::new(event);
        for (position, observer) in observers.iter().enumerate() {
            let observer = Arc::clone(observer);
            let delivered = Arc::clone(&event);
            let delivery = tokio::spawn(async move {
                if delivered.is_completed() {
                    observer.on_pipeline_complete(&delivered).await;
                } else {
                    observer.on_state_changed(&delivered).await;
                }
            });
            if let Err(e) = delivery.await {
                error!(observer = position, error = %e, "Observer failed to handle event");
            }
        }
    }
    debug!("Event channel closed, notifier exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Outcome(Result<(), &'static str>);

    #[async_trait]
    impl Task for Outcome {
        fn name(&self) -> &str {
            "outcome"
        }

        async fn run(&self) -> Result<(), TaskExecutionFailed> {
            self.0.map_err(TaskExecutionFailed::new)
        }
    }

    struct Panics;

    #[async_trait]
    impl Task for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        async fn run(&self) -> Result<(), TaskExecutionFailed> {
            panic!("task blew up");
        }
    }

    struct Sleeps(Duration);

    #[async_trait]
    impl Task for Sleeps {
        fn name(&self) -> &str {
            "sleeps"
        }

        async fn run(&self) -> Result<(), TaskExecutionFailed> {
            tokio::time::sleep(self.0).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_execute_success() {
        let outcome = execute(TaskIndex::new(0), Arc::new(Outcome(Ok(()))), None).await;
        assert_eq!(outcome, TaskOutcome::Finished);
    }

    #[tokio::test]
    async fn test_execute_failure_keeps_message() {
        let outcome = execute(TaskIndex::new(0), Arc::new(Outcome(Err("status mismatch"))), None).await;
        assert_eq!(outcome, TaskOutcome::Failed("status mismatch".to_string()));
    }

    #[tokio::test]
    async fn test_execute_contains_panic() {
        let outcome = execute(TaskIndex::new(0), Arc::new(Panics), None).await;
        assert!(matches!(outcome, TaskOutcome::Failed(msg) if msg.starts_with("Task aborted")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_timeout() {
        let task = Arc::new(Sleeps(Duration::from_secs(60)));
        let outcome = execute(TaskIndex::new(0), task, Some(Duration::from_secs(1))).await;
        assert!(matches!(outcome, TaskOutcome::Failed(msg) if msg.starts_with("Timed out")));
    }

    #[test]
    fn test_diagnostic_includes_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = TaskExecutionFailed::with_source("request failed", io);
        assert_eq!(diagnostic(&err), "request failed: connection refused");
    }
}
