//! Driver monitoring simulator - main entry point

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dms::DmsConfig;
use dms_sim::{init_logging, read_trace, simulate, Pacing, Scenario};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

#[derive(Parser)]
#[command(name = "dms-sim", version, about = "Run driver-monitoring scenarios offline")]
struct Cli {
    /// Configuration file (TOML, JSON or YAML); `DMS_*` environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print Prometheus metrics to stderr after the run
    #[arg(long)]
    metrics: bool,

    /// Feed frames on the nominal frame clock, dropping those that arrive while busy
    #[arg(long)]
    realtime: bool,

    #[command(subcommand)]
    scenario: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Eyes drift shut and reopen
    Drowsy,
    /// Two yawns
    Yawn,
    /// Camera blocked
    NoFace,
    /// Driver looks away twice
    HeadTurn,
    /// Replay a JSON-lines landmark trace
    Replay { trace: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    info!("=== DMS simulator v{} ===", env!("CARGO_PKG_VERSION"));

    let prometheus = if cli.metrics {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install metrics recorder")?;
        Some(handle)
    } else {
        None
    };

    let config = DmsConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let interval_ms = config.frame_interval_ms();

    let (name, frames) = match &cli.scenario {
        Command::Drowsy => named(Scenario::Drowsy, interval_ms),
        Command::Yawn => named(Scenario::Yawn, interval_ms),
        Command::NoFace => named(Scenario::NoFace, interval_ms),
        Command::HeadTurn => named(Scenario::HeadTurn, interval_ms),
        Command::Replay { trace } => ("replay", read_trace(trace)?),
    };

    let pacing = if cli.realtime {
        Pacing::Realtime { interval_ms }
    } else {
        Pacing::Replay
    };

    let report = simulate(name, config, frames, pacing).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }

    Ok(())
}

fn named(scenario: Scenario, interval_ms: u64) -> (&'static str, Vec<dms::source::DetectorResult>) {
    (scenario.name(), scenario.frames(interval_ms))
}
