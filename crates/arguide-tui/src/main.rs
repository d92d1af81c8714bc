/*
[INPUT]:  CLI arguments, optional YAML demo configuration
[OUTPUT]: Terminal front-end walking scripted AR tasks through the UI core
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or tracing setup
*/

mod config;
mod simulator;
mod tui;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use arguide_core::{CommandDispatcher, FrontendUi};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::DemoConfig;
use crate::simulator::SimulatedManager;
use crate::tui::{LOG_BUFFER_CAPACITY, LogBuffer, LogBufferHandle, LogWriterFactory};

#[derive(Parser, Debug)]
#[command(name = "arguide", version, about = "Terminal front-end for AR task guidance")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Validate configuration and exit
    #[arg(long = "dry-run")]
    dry_run: bool,
    /// Exit after this many UI ticks
    #[arg(long = "exit-after-ticks", value_name = "N")]
    exit_after_ticks: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let log_buffer = LogBuffer::handle(LOG_BUFFER_CAPACITY);
    let _file_guard = init_tracing(&args, &log_buffer)?;

    let config = load_config(args.config_path.as_deref())?;
    info!(
        task_count = config.tasks.len(),
        step_delay_ms = config.simulation.step_delay_ms,
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let manager = Arc::new(SimulatedManager::new(&config));
    let mut ui = FrontendUi::new(
        manager.clone(),
        CommandDispatcher::with_tracing(),
        config.ui.clone(),
    );
    ui.attach();
    manager.publish_tasks();

    tui::run_tui(ui, log_buffer, args.exit_after_ticks).await?;
    info!(state = %manager.state(), "session ended");
    Ok(())
}

fn init_tracing(args: &Cli, log_buffer: &LogBufferHandle) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&args.log_level).context("invalid log level")?;

    // Stderr would corrupt the alternate screen, so the TUI gets the ring buffer.
    let console_layer = if args.dry_run {
        fmt::layer().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(LogWriterFactory::new(log_buffer.clone()))
            .boxed()
    };

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_log_file(path)?);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<DemoConfig> {
    if let Some(path) = path {
        return DemoConfig::from_file(path).context("load config");
    }
    match DemoConfig::default_path() {
        Some(path) if path.exists() => DemoConfig::from_file(&path).context("load default config"),
        _ => DemoConfig::builtin().context("load built-in catalog"),
    }
}
