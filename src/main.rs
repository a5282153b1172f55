//! OBD-II live data logger - headless entry point
//!
//! Runs one polling session against the simulated engine link, pumping the
//! pipeline every 100 ms, then prints what was captured.

use anyhow::{bail, Context};
use clap::Parser;
use obdvis_rs::{
    config::AppConfig,
    display::{ChartFrame, TeeLog, TracingLog, WriterLog},
    pipeline::{checked_interval, PipelineController},
    MockLink,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Consumer tick
const PUMP_INTERVAL: Duration = Duration::from_millis(100);

/// CLI for the `obdvis` logger.
#[derive(Parser, Debug)]
#[command(name = "obdvis", about = "Poll OBD-II parameters, log them to CSV and chart them", version)]
struct Cli {
    /// TOML project file
    #[arg(long)]
    config: Option<PathBuf>,

    /// How long to poll, in seconds
    #[arg(long, default_value_t = 10.0)]
    duration: f64,

    /// Seconds between acquisition ticks (overrides the config)
    #[arg(long)]
    interval: Option<f64>,

    /// Do not write a CSV log
    #[arg(long)]
    no_persist: bool,

    /// Chart window in seconds, 0 = whole session (overrides the config)
    #[arg(long)]
    window: Option<f64>,

    /// Parameter label to poll; repeat for several (overrides the config)
    #[arg(long = "param", value_name = "LABEL")]
    params: Vec<String>,

    /// Print the session summary as JSON
    #[arg(long)]
    json: bool,

    /// List the known parameter labels and exit
    #[arg(long)]
    list_params: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,obdvis_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };

    if cli.list_params {
        for label in config.registry().labels() {
            println!("{}", label);
        }
        return Ok(());
    }

    if let Some(interval) = cli.interval {
        config.acquisition.interval_secs = interval;
    }
    if !cli.params.is_empty() {
        config.acquisition.parameters = cli.params.clone();
    }
    if cli.no_persist {
        config.persistence.enabled = false;
    }
    if let Some(window) = cli.window {
        config.display.set_window(window);
    }
    config.validate()?;
    if !cli.duration.is_finite() || cli.duration <= 0.0 {
        bail!("--duration must be a positive number of seconds");
    }

    let interval = checked_interval(config.acquisition.interval_secs)?;
    let run_for = Duration::from_secs_f64(cli.duration);

    std::fs::create_dir_all(&config.persistence.directory).with_context(|| {
        format!("creating log directory {}", config.persistence.directory.display())
    })?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("events")
        .filename_suffix("log")
        .build(&config.persistence.directory)
        .context("creating event log appender")?;
    let (event_writer, _guard) = tracing_appender::non_blocking(appender);
    let mut log = TeeLog::new(WriterLog::new(event_writer), TracingLog);
    let mut chart = ChartFrame::new();

    tracing::info!("Starting OBD-II logger");
    let mut controller = PipelineController::from_config(&config);
    controller.attach_link(Box::new(MockLink::simulated_engine()))?;
    controller.start(
        &config.acquisition.parameters,
        interval,
        config.persistence.enabled,
    )?;

    let started = Instant::now();
    while started.elapsed() < run_for && controller.is_running() {
        controller.pump(&mut log, &mut chart);
        std::thread::sleep(PUMP_INTERVAL);
    }

    controller.stop();
    let exit = controller.wait_for_exit();
    controller.pump(&mut log, &mut chart);
    tracing::info!("Session ended: {:?}", exit);

    let summary = controller.summary();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Captured {} samples ({} null readings) for {}",
            summary.stats.samples,
            summary.stats.null_readings,
            summary.labels.join(", ")
        );
        for (slot, _) in controller.display().graphs.iter().enumerate() {
            let label = controller.display().slot_text(slot);
            let points = chart.points(label);
            match points.last() {
                Some(last) => println!(
                    "  Graph {}: {} - {} points, last {:.2} at {:.1}s",
                    slot + 1,
                    label,
                    points.len(),
                    last.value,
                    last.time
                ),
                None => println!("  Graph {}: {}", slot + 1, label),
            }
        }
        if let Some(path) = &summary.log_file {
            println!("CSV log: {} ({} rows)", path.display(), summary.stats.rows_written);
        }
    }

    controller.detach_link();
    controller.pump(&mut log, &mut chart);
    Ok(())
}
