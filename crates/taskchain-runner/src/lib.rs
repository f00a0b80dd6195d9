//! Sequential task pipeline.
//!
//! A [`TaskRunner`] owns a fixed, ordered list of task contexts and executes
//! them one at a time on a single background worker. Each finished task
//! (successful or not) hands over to the next one until the list is
//! exhausted, and every state change is reported to the registered
//! [`PipelineObserver`]s in the order it happened.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use taskchain_core::{Task, TaskExecutionFailed};
//! use taskchain_runner::{ChannelObserver, TaskRunner};
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Task for Hello {
//!     fn name(&self) -> &str {
//!         "hello"
//!     }
//!
//!     async fn run(&self) -> Result<(), TaskExecutionFailed> {
//!         Ok(())
//!     }
//! }
//!
//! async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//!     let (observer, mut events) = ChannelObserver::new();
//!     let runner = TaskRunner::builder()
//!         .with_task(Arc::new(Hello))
//!         .with_observer(Arc::new(observer))
//!         .build();
//!
//!     runner.start()?;
//!     while let Some(event) = events.recv().await {
//!         println!("{:?}", event);
//!         if event.is_completed() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod observer;
mod runner;
mod worker;

pub use config::{FailurePolicy, RunnerConfig};
pub use observer::{ChannelObserver, PipelineObserver, TracingObserver};
pub use runner::{PipelineBuilder, TaskRunner};
