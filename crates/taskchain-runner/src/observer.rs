//! Observer contract for pipeline notifications.
//!
//! Observers are driven by a dedicated notifier task, never by the caller of
//! `start`, and each event is fully delivered to every observer before the
//! next one is looked at.

use async_trait::async_trait;
use taskchain_core::{PipelineEvent, TaskState};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Receives pipeline notifications.
///
/// Observers only read; they must not mutate task contexts. Calling
/// [`TaskRunner::snapshot`](crate::TaskRunner::snapshot) from inside a
/// callback is fine.
#[async_trait]
pub trait PipelineObserver: Send + Sync {
    /// Called for every `PipelineEvent::StateChanged`.
    async fn on_state_changed(&self, event: &PipelineEvent);

    /// Called once per run with the `PipelineEvent::Completed` event.
    async fn on_pipeline_complete(&self, event: &PipelineEvent);
}

/// Forwards every event to an unbounded channel.
///
/// # Example
///
/// ```rust,no_run
/// use taskchain_runner::ChannelObserver;
///
/// let (observer, mut rx) = ChannelObserver::new();
///
/// tokio::spawn(async move {
///     while let Some(event) = rx.recv().await {
///         println!("Received: {:?}", event);
///     }
/// });
/// ```
pub struct ChannelObserver {
    event_tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiver its events go to.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { event_tx: tx }, rx)
    }
}

#[async_trait]
impl PipelineObserver for ChannelObserver {
    async fn on_state_changed(&self, event: &PipelineEvent) {
        // Receiver might be dropped
        self.event_tx.send(event.clone()).ok();
    }

    async fn on_pipeline_complete(&self, event: &PipelineEvent) {
        self.event_tx.send(event.clone()).ok();
    }
}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

#[async_trait]
impl PipelineObserver for TracingObserver {
    async fn on_state_changed(&self, event: &PipelineEvent) {
        if let PipelineEvent::StateChanged {
            index,
            name,
            state,
            error,
        } = event
        {
            match state {
                TaskState::Failed => error!(
                    index = %index,
                    task = %name,
                    error = error.as_deref().unwrap_or_default(),
                    "Task failed"
                ),
                _ => info!(index = %index, task = %name, state = %state, "Task state changed"),
            }
        }
    }

    async fn on_pipeline_complete(&self, event: &PipelineEvent) {
        if let PipelineEvent::Completed {
            finished,
            failed,
            skipped,
        } = event
        {
            info!(finished, failed, skipped, "All tasks complete");
        }
    }
}
