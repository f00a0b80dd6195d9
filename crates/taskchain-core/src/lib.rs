//! Taskchain Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Async runtime specifics
//!
//! Everything the sequencer and its hosts agree on lives here: the task
//! contract, task lifecycle states, pipeline events and snapshots.

pub mod error;
pub mod event;
pub mod ids;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use error::{PipelineError, TaskExecutionFailed};
pub use event::{PipelineEvent, PipelineSnapshot, TaskSnapshot};
pub use ids::TaskIndex;
pub use status::TaskState;
pub use task::{Task, TaskContext};
