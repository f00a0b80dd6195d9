//! Rendering of pipeline events for the terminal.

use std::io::{self, Write};

use serde::Serialize;
use taskchain_core::{PipelineEvent, PipelineSnapshot, TaskState};
use tokio::sync::mpsc;

/// How events are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One readable line per transition.
    Human,
    /// One JSON object per line.
    Json,
}

/// A timestamped JSON line.
#[derive(Debug, Serialize)]
struct JsonLine<'a, T: Serialize> {
    timestamp: String,
    #[serde(flatten)]
    payload: &'a T,
}

impl<'a, T: Serialize> JsonLine<'a, T> {
    fn new(payload: &'a T) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            payload,
        }
    }
}

/// Formats events and snapshots according to the output mode.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    mode: OutputMode,
}

impl Renderer {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// Render one event, or `None` when the mode does not show it.
    pub fn format_event(&self, event: &PipelineEvent) -> Option<String> {
        match self.mode {
            OutputMode::Json => serde_json::to_string(&JsonLine::new(event)).ok(),
            OutputMode::Human => match event {
                // Resets are noise for a human reader.
                PipelineEvent::StateChanged {
                    state: TaskState::Runnable,
                    ..
                } => None,
                PipelineEvent::StateChanged {
                    index,
                    name,
                    state,
                    error,
                } => Some(match error {
                    Some(error) => format!("[{:<8}] #{} {}: {}", state, index, name, error),
                    None => format!("[{:<8}] #{} {}", state, index, name),
                }),
                PipelineEvent::Completed {
                    finished,
                    failed,
                    skipped,
                } => Some(format!(
                    "All tasks complete: {} finished, {} failed, {} skipped",
                    finished, failed, skipped
                )),
            },
        }
    }

    /// Render the whole pipeline state.
    pub fn format_snapshot(&self, snapshot: &PipelineSnapshot) -> String {
        match self.mode {
            OutputMode::Json => serde_json::to_string(&JsonLine::new(snapshot)).unwrap_or_default(),
            OutputMode::Human => {
                let mut lines = vec![format!(
                    "Pipeline {} (cursor {})",
                    if snapshot.running { "running" } else { "idle" },
                    snapshot.cursor
                )];
                for task in &snapshot.tasks {
                    let mut line = format!("  #{} {:<16} {}", task.index, task.name, task.state);
                    if let Some(url) = &task.reference_url {
                        line.push_str(&format!("  {}", url));
                    }
                    if let Some(error) = &task.error {
                        line.push_str(&format!("\n      {}", error));
                    }
                    lines.push(line);
                }
                lines.join("\n")
            }
        }
    }

    pub fn print_event(&self, event: &PipelineEvent) {
        if let Some(line) = self.format_event(event) {
            emit(&line);
        }
    }

    pub fn print_snapshot(&self, snapshot: &PipelineSnapshot) {
        emit(&self.format_snapshot(snapshot));
    }
}

fn emit(line: &str) {
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", line);
    let _ = stdout.flush();
}

/// Print events until the end of the current run.
///
/// Returns the number of failed tasks, or `None` if the event stream closed
/// first.
pub async fn render_until_complete(
    renderer: Renderer,
    events: &mut mpsc::UnboundedReceiver<PipelineEvent>,
) -> Option<usize> {
    while let Some(event) = events.recv().await {
        renderer.print_event(&event);
        if let PipelineEvent::Completed { failed, .. } = event {
            return Some(failed);
        }
    }
    None
}
