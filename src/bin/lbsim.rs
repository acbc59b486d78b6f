//! lbsim CLI: configure and run a dispatcher simulation.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lbsim::config::SimConfig;
use lbsim::dispatcher::Dispatcher;
use lbsim::telemetry::{TelemetryConfig, init_telemetry};
use lbsim::worker::OccupancyPolicy;

#[derive(Parser)]
#[command(name = "lbsim", about = "Round-robin dispatcher simulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a simulation and print the report
    Run {
        #[command(flatten)]
        overrides: Overrides,
        /// Also write the report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Skip printing events to stdout (the log file is still written)
        #[arg(long)]
        quiet: bool,
        /// Prompt for worker count and runtime
        #[arg(long)]
        interactive: bool,
    },
    /// Print the effective configuration
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(Args)]
struct Overrides {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of workers
    #[arg(long)]
    workers: Option<usize>,
    /// Horizon in clock cycles
    #[arg(long)]
    runtime: Option<u64>,
    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Probability of a new request on an empty-queue cycle
    #[arg(long)]
    arrival_probability: Option<f64>,
    /// Occupancy policy (immediate-idle | busy-until-finish)
    #[arg(long)]
    policy: Option<OccupancyPolicy>,
    /// Report log file (appended)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            overrides,
            json,
            quiet,
            interactive,
        } => {
            let mut config = load_config(&overrides)?;
            if interactive {
                prompt_counts(&mut config)?;
            }
            cmd_run(config, json, quiet)
        }
        Command::Config { overrides } => {
            let config = load_config(&overrides)?;
            config.validate()?;
            println!("{config:#?}");
            Ok(())
        }
    }
}

/// Defaults, then the TOML file, then the environment, then flags.
fn load_config(overrides: &Overrides) -> anyhow::Result<SimConfig> {
    let mut config = match overrides.config {
        Some(ref path) => SimConfig::from_toml_file(path)?,
        None => SimConfig::default(),
    };
    config.apply_env()?;

    if let Some(workers) = overrides.workers {
        config.workers = workers;
    }
    if let Some(runtime) = overrides.runtime {
        config.runtime = runtime;
    }
    if let Some(seed) = overrides.seed {
        config.seed = Some(seed);
    }
    if let Some(p) = overrides.arrival_probability {
        config.arrival_probability = p;
    }
    if let Some(policy) = overrides.policy {
        config.policy = policy;
    }
    if let Some(ref path) = overrides.log_file {
        config.log_file = path.clone();
    }
    Ok(config)
}

fn prompt_counts(config: &mut SimConfig) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    config.workers = prompt(&mut lines, "Enter the number of workers", config.workers)?;
    config.runtime = prompt(&mut lines, "Enter the runtime in clock cycles", config.runtime)?;
    Ok(())
}

fn prompt<T, I>(lines: &mut I, label: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
    I: Iterator<Item = std::io::Result<String>>,
{
    print!("{label} [{default}]: ");
    std::io::stdout().flush()?;

    let Some(line) = lines.next().transpose()? else {
        return Ok(default);
    };
    let line = line.trim();
    if line.is_empty() {
        return Ok(default);
    }
    line.parse()
        .map_err(|e| anyhow::anyhow!("invalid input '{line}': {e}"))
}

fn cmd_run(config: SimConfig, json: Option<PathBuf>, quiet: bool) -> anyhow::Result<()> {
    config.validate()?;

    if let Err(e) = init_telemetry(TelemetryConfig {
        log_level: config.log_level.clone(),
        compact: true,
    }) {
        eprintln!("telemetry disabled: {e}");
    }

    let mut dispatcher = Dispatcher::from_config(&config)?;
    dispatcher.run();
    let report = dispatcher.report();

    if quiet {
        let s = &report.summary;
        println!(
            "Run {}: finished={} rejected={} ending_queue={}",
            s.run_id, s.finished, s.rejected, s.ending_queue_len
        );
    } else {
        report.write_to(std::io::stdout().lock())?;
    }

    report.append_to_file(&config.log_file)?;
    tracing::info!(path = %config.log_file.display(), "report appended");

    if let Some(path) = json {
        report.write_json(&path)?;
        tracing::info!(path = %path.display(), "json report written");
    }

    Ok(())
}
