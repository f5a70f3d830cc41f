//! insider-threat entrypoint: run one pipeline stage, or one of the two
//! monitoring loops until Ctrl+C (or a tick cap).

use clap::{Parser, Subcommand, ValueEnum};
use insider_threat::{
    config::AppConfig,
    logging::StructuredLogger,
    monitor::{run, AlertSink, ConsoleSink, JsonSink, StopSignal, TickSource},
    stages,
    threat::AlertFloor,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "insider-threat")]
#[command(about = "Daily behavioral features, threat labeling and live monitoring")]
struct Cli {
    /// JSON config file; missing or unreadable means defaults
    #[arg(short, long, env = "INSIDER_THREAT_CONFIG", default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Profile the raw CSV exports
    Explore,
    /// Raw events → daily counts → merged feature table
    Preprocess,
    /// Label the merged table and fit the classifier
    Train,
    /// Replay stored alerts above a floor at a fixed cadence
    Monitor {
        /// Seconds between ticks (1-10)
        #[arg(long)]
        refresh: Option<u64>,
        #[arg(long, value_enum)]
        min_level: Option<LevelArg>,
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
        #[arg(long)]
        seed: Option<u64>,
        /// ndjson alerts instead of console lines
        #[arg(long)]
        json: bool,
    },
    /// Score synthetic behavior with the trained classifier
    Simulate {
        /// Seconds between samples
        #[arg(long)]
        interval: Option<u64>,
        #[arg(long)]
        ticks: Option<u64>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LevelArg {
    Warning,
    Critical,
}

impl From<LevelArg> for AlertFloor {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Warning => AlertFloor::Warning,
            LevelArg::Critical => AlertFloor::Critical,
        }
    }
}

fn install_stop_handler() -> StopSignal {
    let stop = StopSignal::new();
    let handle = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || handle.stop()) {
        warn!(error = %e, "could not install Ctrl+C handler");
    }
    stop
}

fn drive<M: TickSource, S: AlertSink>(
    monitor: &mut M,
    sink: &mut S,
    interval_secs: u64,
    max_ticks: Option<u64>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let stop = install_stop_handler();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let summary = runtime.block_on(run(
        monitor,
        sink,
        Duration::from_secs(interval_secs),
        &stop,
        max_ticks,
    ));
    if stop.is_stopped() {
        info!(ticks = summary.ticks, "stopped by user");
    }
    Ok(())
}

fn execute(cli: Cli, mut config: AppConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match cli.command {
        Command::Explore => {
            for (path, profile) in stages::explore(&config)? {
                match profile {
                    Ok(p) => println!("{}", serde_json::to_string_pretty(&p)?),
                    Err(e) => println!("{}: {}", path.display(), e),
                }
            }
        }
        Command::Preprocess => {
            let summary = stages::preprocess(&config)?;
            info!(
                logon_days = summary.logon_days,
                device_days = summary.device_days,
                merged_rows = summary.merged_rows,
                "preprocess complete"
            );
        }
        Command::Train => {
            let eval = stages::train(&config)?;
            info!(
                samples = eval.samples,
                agreement = eval.agreement,
                held_out = eval.held_out,
                disagreements = eval.disagreements(),
                "train complete"
            );
        }
        Command::Monitor {
            refresh,
            min_level,
            ticks,
            seed,
            json,
        } => {
            if let Some(r) = refresh {
                config.monitor.refresh_interval_secs = r;
            }
            if let Some(level) = min_level {
                config.monitor.min_alert_level = level.into();
            }
            if seed.is_some() {
                config.monitor.seed = seed;
            }
            let config = config.validated();

            let (table, classifier) = stages::load_monitor_inputs(&config)?;
            let mut monitor = stages::historical_monitor(&config, table, classifier);
            info!(
                refresh_secs = config.monitor.refresh_interval_secs,
                floor = ?config.monitor.min_alert_level,
                "live monitoring (Ctrl+C to stop)"
            );
            let interval = config.monitor.refresh_interval_secs;
            if json {
                drive(&mut monitor, &mut JsonSink::new(std::io::stdout()), interval, ticks)?;
            } else {
                drive(&mut monitor, &mut ConsoleSink::stdout(), interval, ticks)?;
            }
        }
        Command::Simulate {
            interval,
            ticks,
            seed,
        } => {
            if let Some(i) = interval {
                config.simulation.interval_secs = i;
            }
            if seed.is_some() {
                config.simulation.seed = seed;
            }
            let config = config.validated();

            let classifier = stages::load_classifier(&config)?;
            let mut monitor = stages::simulation_monitor(&config, classifier);
            info!(interval_secs = config.simulation.interval_secs, "simulation (Ctrl+C to stop)");
            drive(
                &mut monitor,
                &mut ConsoleSink::stdout(),
                config.simulation.interval_secs,
                ticks,
            )?;
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config);
    StructuredLogger::init(config.log.json, &config.log.level);

    info!(config = %cli.config.display(), "insider-threat starting");
    if let Err(e) = execute(cli, config) {
        error!(error = %e, "stage failed");
        return Err(e);
    }
    Ok(())
}
