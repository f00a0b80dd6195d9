//! Core domain errors.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::{TaskIndex, TaskState};

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure raised by a task's action.
///
/// Assertion failures and failures reported by external collaborators
/// (connection errors, unexpected status codes) share this type, so the
/// pipeline records both the same way.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaskExecutionFailed {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TaskExecutionFailed {
    /// Create a failure carrying only a diagnostic message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a failure wrapping an underlying error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Failure for a violated expectation, naming both values.
    pub fn expected(
        what: &str,
        expected: impl fmt::Display,
        actual: Option<impl fmt::Display>,
    ) -> Self {
        let actual = actual
            .map(|a| a.to_string())
            .unwrap_or_else(|| "nothing".to_string());
        Self::new(format!("Expected {what} {expected}, got {actual}"))
    }

    /// The diagnostic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors reported to callers of the pipeline.
///
/// None of these alter any task context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// `start` was called while a run is active.
    #[error("Pipeline is already running")]
    AlreadyRunning,

    /// `reset` was called while a run is active.
    #[error("Pipeline cannot be reset while running")]
    NotIdle,

    /// A context was asked to make a transition its state does not allow.
    #[error("Invalid state transition for task {index}: {from} -> {to}")]
    InvalidTransition {
        index: TaskIndex,
        from: TaskState,
        to: TaskState,
    },

    /// The background worker is gone.
    #[error("Pipeline worker is not available")]
    WorkerUnavailable,
}
