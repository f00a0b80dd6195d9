//! The pipeline sequencer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use taskchain_core::{
    PipelineError, PipelineEvent, PipelineSnapshot, Task, TaskContext, TaskIndex, TaskSnapshot,
    TaskState,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::{FailurePolicy, RunnerConfig};
use crate::observer::PipelineObserver;
use crate::worker::{self, RunRequest, TaskOutcome};

/// Builder for a [`TaskRunner`].
#[derive(Default)]
pub struct PipelineBuilder {
    tasks: Vec<Arc<dyn Task>>,
    observers: Vec<Arc<dyn PipelineObserver>>,
    config: RunnerConfig,
}

impl PipelineBuilder {
    /// Append a task. Tasks run in the order they are added.
    pub fn with_task(mut self, task: Arc<dyn Task>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Append several tasks.
    pub fn with_tasks(mut self, tasks: impl IntoIterator<Item = Arc<dyn Task>>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    /// Register an observer.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Set the runner configuration.
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the runner and spawn its worker and notifier.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> TaskRunner {
        let contexts = self
            .tasks
            .into_iter()
            .enumerate()
            .map(|(i, task)| TaskContext::new(TaskIndex::new(i), task))
            .collect();

        // Depth 1: at most one run can be waiting for the worker.
        let (dispatch_tx, dispatch_rx) = mpsc::channel(1);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (idle_tx, _) = watch::channel(true);

        let inner = Arc::new(RunnerInner {
            state: Mutex::new(PipelineState {
                contexts,
                cursor: TaskIndex::new(0),
                running: false,
            }),
            config: self.config,
            dispatch_tx,
            event_tx,
            idle_tx,
        });

        tokio::spawn(worker::run_worker(dispatch_rx));
        tokio::spawn(worker::run_notifier(self.observers, event_rx));

        TaskRunner { inner }
    }
}

/// Runs a fixed, ordered list of tasks one at a time.
///
/// Cloning is cheap; all clones drive the same pipeline.
#[derive(Clone)]
pub struct TaskRunner {
    inner: Arc<RunnerInner>,
}

impl TaskRunner {
    /// Start building a pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Begin a run from the first task.
    ///
    /// Contexts left over from a previous run are reset first. Fails with
    /// [`PipelineError::AlreadyRunning`] while a run is active, without
    /// touching the cursor or any context.
    pub fn start(&self) -> Result<(), PipelineError> {
        self.inner.start()
    }

    /// Return every context to `Runnable` and the cursor to 0.
    ///
    /// Only valid between runs.
    pub fn reset(&self) -> Result<(), PipelineError> {
        self.inner.reset()
    }

    /// Returns true while a run is active.
    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// Number of tasks in the pipeline.
    pub fn len(&self) -> usize {
        self.inner.lock().contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current view of the pipeline.
    pub fn snapshot(&self) -> PipelineSnapshot {
        self.inner.snapshot()
    }

    /// Wait until no run is active.
    ///
    /// Resolves once the end of the run is recorded; observers may still be
    /// receiving its final events.
    pub async fn wait_idle(&self) {
        let mut idle_rx = self.inner.idle_tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = idle_rx.wait_for(|idle| *idle).await;
    }
}

struct PipelineState {
    contexts: Vec<TaskContext>,
    cursor: TaskIndex,
    running: bool,
}

pub(crate) struct RunnerInner {
    state: Mutex<PipelineState>,
    config: RunnerConfig,
    dispatch_tx: mpsc::Sender<RunRequest>,
    event_tx: mpsc::UnboundedSender<PipelineEvent>,
    idle_tx: watch::Sender<bool>,
}

impl RunnerInner {
    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Queue an event for observers.
    ///
    /// Always called with the state lock held so that delivery order matches
    /// mutation order.
    fn emit(&self, event: PipelineEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Notifier stopped, dropping event");
        }
    }

    fn emit_state(&self, ctx: &TaskContext) {
        self.emit(PipelineEvent::state_changed(
            ctx.index(),
            ctx.name(),
            ctx.state(),
            ctx.error().map(str::to_owned),
        ));
    }

    fn emit_completed(&self, state: &PipelineState) {
        let count = |wanted: TaskState| {
            state
                .contexts
                .iter()
                .filter(|ctx| ctx.state() == wanted)
                .count()
        };
        self.emit(PipelineEvent::Completed {
            finished: count(TaskState::Finished),
            failed: count(TaskState::Failed),
            skipped: count(TaskState::Runnable),
        });
    }

    fn reset_contexts(&self, state: &mut PipelineState) {
        for ctx in state.contexts.iter_mut() {
            if ctx.state() != TaskState::Runnable {
                ctx.reset();
                self.emit_state(ctx);
            }
        }
        state.cursor = TaskIndex::new(0);
    }

    /// The dispatched request carries a strong handle, so a started run
    /// reaches its end even if every `TaskRunner` is dropped meanwhile.
    fn start(self: &Arc<Self>) -> Result<(), PipelineError> {
        let mut state = self.lock();
        if state.running {
            warn!(cursor = %state.cursor, "Start requested while pipeline is running");
            return Err(PipelineError::AlreadyRunning);
        }

        self.reset_contexts(&mut state);

        if state.contexts.is_empty() {
            info!("Pipeline has no tasks");
            self.emit_completed(&state);
            return Ok(());
        }

        let first = TaskIndex::new(0);
        state.contexts[0].transition(TaskState::Running)?;
        let request = RunRequest {
            first,
            runner: Arc::clone(self),
        };
        if let Err(e) = self.dispatch_tx.try_send(request) {
            error!(error = %e, "Failed to dispatch first task");
            state.contexts[0].reset();
            return Err(PipelineError::WorkerUnavailable);
        }

        // The worker cannot record anything for this run until the lock is
        // released, so Running(0) is always the first event of the run.
        state.running = true;
        self.emit_state(&state.contexts[0]);
        self.idle_tx.send_replace(false);

        info!(tasks = state.contexts.len(), "Pipeline started");
        Ok(())
    }

    fn reset(&self) -> Result<(), PipelineError> {
        let mut state = self.lock();
        if state.running {
            return Err(PipelineError::NotIdle);
        }
        self.reset_contexts(&mut state);
        debug!("Pipeline reset");
        Ok(())
    }

    /// The task at `index`, if the run is still positioned on it.
    pub(crate) fn task_for(&self, index: TaskIndex) -> Option<Arc<dyn Task>> {
        let state = self.lock();
        if !state.running || state.cursor != index {
            return None;
        }
        state
            .contexts
            .get(index.get())
            .map(|ctx| Arc::clone(ctx.task()))
    }

    /// Record the outcome of the task at `index` and pick what runs next.
    ///
    /// Returns the index the worker should execute next, already marked
    /// `Running`, or `None` when the run is over.
    pub(crate) fn complete_task(&self, index: TaskIndex, outcome: TaskOutcome) -> Option<TaskIndex> {
        let mut state = self.lock();

        let failed = matches!(outcome, TaskOutcome::Failed(_));
        let ctx = &mut state.contexts[index.get()];
        let recorded = match outcome {
            TaskOutcome::Finished => ctx.transition(TaskState::Finished),
            TaskOutcome::Failed(message) => ctx.fail(message),
        };
        match recorded {
            Ok(()) => self.emit_state(ctx),
            Err(e) => error!(error = %e, "Failed to record task outcome"),
        }

        let next = index.next();
        let stop = failed && self.config.failure_policy == FailurePolicy::StopOnFailure;
        if !stop && next.get() < state.contexts.len() {
            state.cursor = next;
            let ctx = &mut state.contexts[next.get()];
            if ctx.transition(TaskState::Running).is_ok() {
                self.emit_state(ctx);
                return Some(next);
            }
            error!(index = %next, state = %ctx.state(), "Next task is not runnable");
        } else if stop {
            info!(index = %index, "Stopping pipeline after failed task");
        }

        state.running = false;
        self.emit_completed(&state);
        self.idle_tx.send_replace(true);
        info!("All tasks complete");
        None
    }

    fn snapshot(&self) -> PipelineSnapshot {
        let state = self.lock();
        PipelineSnapshot {
            cursor: state.cursor,
            running: state.running,
            tasks: state
                .contexts
                .iter()
                .map(|ctx| TaskSnapshot {
                    index: ctx.index(),
                    name: ctx.name().to_string(),
                    reference_url: ctx.task().reference_url().map(str::to_owned),
                    state: ctx.state(),
                    error: ctx.error().map(str::to_owned),
                })
                .collect(),
        }
    }
}
