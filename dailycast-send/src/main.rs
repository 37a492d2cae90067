//! dailycast-send - Daily content distribution daemon
//!
//! Waits for the configured local time each day, publishes the day's content
//! to every configured destination and reports the outcome.

use anyhow::Context;
use clap::Parser;
use libdailycast::config::{resolve_config_path, Config};
use libdailycast::logging::{LogFormat, LoggingConfig};
use libdailycast::scheduler::events::{EventReceiver, SchedulerEvent};
use libdailycast::{DailycastError, RunReport, Scheduler, Shutdown};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "dailycast-send")]
#[command(version)]
#[command(about = "Daily scheduler that distributes content to every configured destination")]
#[command(long_about = "\
dailycast-send - Daily content distribution daemon

DESCRIPTION:
    dailycast-send reads one content file per destination from the content
    folder and publishes it once a day at the configured local time. Every
    run produces a JSON report covering what was fetched and what was
    posted where.

USAGE:
    # Run the daily scheduler in the foreground (logs to stderr)
    dailycast-send

    # Publish right now, print the report and exit
    dailycast-send --once

    # Keep an append-only history of every run
    dailycast-send --report-log ~/dailycast-runs.jsonl

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (a run in progress is finished first,
                      including a --once run)

CONFIGURATION:
    Configuration file: ~/.config/dailycast/config.toml
    (override with --config or DAILYCAST_CONFIG)

    [schedule]
    time = \"19:00\"
    timezone = \"Asia/Kolkata\"

    [content]
    folder = \"~/dailycast/content\"

    [content.mapping]
    facebook = \"facebook_content.txt\"
    twitter = \"twitter_content.txt\"

EXIT CODES:
    0 - Success, or clean shutdown
    1 - Runtime error, or a --once run that was not fully successful
    2 - Configuration error
")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "PATH", env = "DAILYCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Run the pipeline once immediately and exit
    #[arg(long, visible_alias = "test")]
    once: bool,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Log output format
    #[arg(long, value_name = "FORMAT", env = "DAILYCAST_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Append each run report to this file as one JSON line
    #[arg(long, value_name = "PATH")]
    report_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = std::env::var(libdailycast::logging::LEVEL_ENV_VAR).unwrap_or_else(|_| "info".to_string());
    LoggingConfig::new(cli.log_format, level, cli.verbose).init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(exit_code(&e));
        }
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<DailycastError>()
        .map(DailycastError::exit_code)
        .unwrap_or(1)
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config_path = resolve_config_path(cli.config.as_deref())?;
    let config = Config::load_from_path(&config_path)?;
    let scheduler = Scheduler::from_config(&config)?;

    info!(config = %config_path.display(), schedule = %scheduler.schedule(), "dailycast-send starting");

    let shutdown = Shutdown::new();
    setup_signal_handlers(&shutdown)?;

    if cli.once {
        let report = scheduler.run_once().await?;
        if let Some(path) = &cli.report_log {
            append_report(path, &report).await?;
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
        if shutdown.is_requested() {
            info!("Shutdown requested during the run; the run was completed first");
        }
        return Ok(if report.is_success() { 0 } else { 1 });
    }

    let recorder = cli
        .report_log
        .map(|path| tokio::spawn(record_reports(scheduler.subscribe(), path)));

    scheduler.run(&shutdown).await;

    // Dropping the scheduler closes the event channel and ends the recorder
    drop(scheduler);
    if let Some(recorder) = recorder {
        if let Err(e) = recorder.await {
            warn!("Report recorder ended abnormally: {}", e);
        }
    }

    info!("dailycast-send stopped");
    Ok(0)
}

/// Append every completed run's report to `path`
async fn record_reports(mut events: EventReceiver, path: PathBuf) {
    loop {
        match events.recv().await {
            Ok(SchedulerEvent::RunCompleted { report, .. }) => {
                if let Err(e) = append_report(&path, &report).await {
                    error!(path = %path.display(), "Failed to append run report: {:#}", e);
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Report recorder fell behind; some events were dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn append_report(path: &Path, report: &RunReport) -> anyhow::Result<()> {
    report
        .append_json_line(path)
        .await
        .with_context(|| format!("Failed to append to report log {}", path.display()))
}

/// Set up signal handlers for graceful shutdown
#[cfg(unix)]
fn setup_signal_handlers(shutdown: &Shutdown) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Signal setup failed")?;

    let shutdown = shutdown.clone();
    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            info!("Received shutdown signal, stopping gracefully...");
            shutdown.request();
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn setup_signal_handlers(shutdown: &Shutdown) -> anyhow::Result<()> {
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, stopping gracefully...");
            shutdown.request();
        }
    });
    Ok(())
}
