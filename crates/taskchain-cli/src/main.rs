//! Taskchain demo host.
//!
//! Runs the HTTP verification pipeline and renders every task transition.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use taskchain_core::PipelineEvent;
use taskchain_http::{demo_tasks, HttpClient};
use taskchain_runner::{ChannelObserver, TaskRunner, TracingObserver};

mod config;
mod output;

use config::Config;
use output::{render_until_complete, OutputMode, Renderer};

/// Taskchain - sequential HTTP verification demo
#[derive(Parser, Debug)]
#[command(name = "taskchain")]
#[command(about = "Run HTTP verification tasks one at a time", long_about = None)]
pub struct Cli {
    /// Emit JSON lines instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Stop the run after the first failed task
    #[arg(long, global = true)]
    stop_on_failure: bool,

    /// HTTP request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Upper bound on a single task's run, in seconds
    #[arg(long, global = true)]
    task_timeout_secs: Option<u64>,

    /// File fetched by the download task
    #[arg(long, global = true)]
    download_url: Option<String>,

    /// URL expected to answer with a permanent redirect
    #[arg(long, global = true)]
    redirect_url: Option<String>,

    /// Location the redirect must point to
    #[arg(long, global = true)]
    expected_location: Option<String>,

    /// Endpoint the form is posted to
    #[arg(long, global = true)]
    post_url: Option<String>,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline to completion
    Run {
        /// Number of consecutive runs
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },

    /// List the tasks and their reference links
    List,

    /// Drive the pipeline with commands read from stdin
    Interactive,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays parseable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_cli(&cli);
    let renderer = Renderer::new(if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    });

    let client = HttpClient::from_config(&config.http)?;
    let (observer, mut events) = ChannelObserver::new();
    let runner = TaskRunner::builder()
        .with_tasks(demo_tasks(&client, &config.urls))
        .with_observer(Arc::new(TracingObserver))
        .with_observer(Arc::new(observer))
        .with_config(config.runner.clone())
        .build();

    match cli.command {
        Commands::Run { repeat } => run(&runner, renderer, &mut events, repeat).await,
        Commands::List => {
            renderer.print_snapshot(&runner.snapshot());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Interactive => interactive(runner, renderer, events).await,
    }
}

async fn run(
    runner: &TaskRunner,
    renderer: Renderer,
    events: &mut UnboundedReceiver<PipelineEvent>,
    repeat: u32,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut any_failed = false;

    for attempt in 1..=repeat.max(1) {
        info!(attempt, repeat, "Starting pipeline");
        runner.start()?;

        match render_until_complete(renderer, events).await {
            Some(failed) => any_failed |= failed > 0,
            None => return Err("event stream closed before the pipeline completed".into()),
        }
        runner.wait_idle().await;
    }

    Ok(if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

const HELP: &str = "Commands: start, reset, status, help, quit";

async fn interactive(
    runner: TaskRunner,
    renderer: Renderer,
    mut events: UnboundedReceiver<PipelineEvent>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            renderer.print_event(&event);
        }
    });

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            "start" => {
                if let Err(e) = runner.start() {
                    println!("{}", e);
                }
            }
            "reset" => {
                if let Err(e) = runner.reset() {
                    println!("{}", e);
                }
            }
            "status" => renderer.print_snapshot(&runner.snapshot()),
            "help" => println!("{}", HELP),
            "quit" | "exit" => break,
            other => {
                warn!(command = other, "Unknown command");
                println!("Unknown command '{}'. {}", other, HELP);
            }
        }
    }

    // A started run always goes to its end
    if runner.is_running() {
        println!("Waiting for the running pipeline to finish...");
        runner.wait_idle().await;
    }

    // Dropping the last handle closes the event stream once the final
    // events have been printed.
    drop(runner);
    printer.await?;

    Ok(ExitCode::SUCCESS)
}
