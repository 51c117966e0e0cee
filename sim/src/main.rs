//! gauge-sim: replay gauge voting scenarios from the command line.

use anyhow::Context;
use clap::Parser;
use gauge_sim::{Scenario, ScenarioReport, ScenarioRunner, SimConfig};
use gauge_utils::{format_duration, init_logging, LogFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gauge-sim", about = "Gauge voting engine simulator")]
struct Cli {
    /// Path to a TOML configuration file. CLI flags and env vars override it.
    #[arg(long, global = true, env = "GAUGE_SIM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, e.g. "info" or "debug,gauge_voting=trace".
    #[arg(long, global = true, env = "GAUGE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format: "human" or "json".
    #[arg(long, global = true, env = "GAUGE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a scenario file.
    Run {
        /// Scenario TOML file.
        #[arg(long)]
        scenario: PathBuf,

        /// Override the epoch length in seconds.
        #[arg(long, env = "GAUGE_EPOCH_DURATION_SECS")]
        epoch_duration_secs: Option<u64>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the default configuration as TOML.
    DefaultConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SimConfig::from_toml_file(&path.to_string_lossy())
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    match cli.command {
        Command::DefaultConfig => {
            print!("{}", SimConfig::default().to_toml_string()?);
        }
        Command::Run {
            scenario,
            epoch_duration_secs,
            json,
        } => {
            if let Some(secs) = epoch_duration_secs {
                config.epoch_duration_secs = secs;
            }
            config.validate()?;
            init_logging(config.log_format, &config.log_level)?;
            tracing::info!(
                epoch = %format_duration(config.epoch_duration_secs),
                scenario = %scenario.display(),
                "starting simulation"
            );

            let scenario = Scenario::from_toml_file(&scenario.to_string_lossy())?;
            let report = ScenarioRunner::new(&config)?.run(&scenario)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }
    Ok(())
}

fn print_report(report: &ScenarioReport) {
    println!("scenario: {}", report.name);
    for step in &report.steps {
        let mark = if step.ok { "ok " } else { "err" };
        println!(
            "  [{mark}] #{:<3} epoch {:<3} {:<24} {}",
            step.index, step.epoch, step.action, step.outcome
        );
    }
    println!("final epoch: {}", report.final_epoch);
    for (account, balances) in &report.balances {
        for (mint, amount) in balances {
            println!("  {account:<12} {mint:<8} {amount}");
        }
    }
    println!("invariants: {}", if report.invariants_ok { "ok" } else { "VIOLATED" });
}
