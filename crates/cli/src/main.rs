//! MicroMonitor CLI
//!
//! A command-line front end for the telemetry API: container listing,
//! reconciled log tails, rolling stats, benchmarks, cost predictions and
//! report export.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{benchmark, containers, costs, logs, report, AppContext};
use monitor_lib::{
    workbench::{DEFAULT_BENCHMARK_SECS, DEFAULT_HORIZON_HOURS},
    Provider, WorkloadIntensity,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// MicroMonitor CLI
#[derive(Parser)]
#[command(name = "mm")]
#[command(author, version, about = "CLI for MicroMonitor container telemetry", long_about = None)]
pub struct Cli {
    /// Telemetry API base URL (can also be set via MM_API_URL env var)
    #[arg(long, env = "MM_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List running containers with their live stats
    Containers,

    /// Show host CPU, memory, disk and network usage
    Host,

    /// Show a container's log tail
    Logs {
        /// Container ID
        id: String,

        /// Keep polling and print new output as it arrives
        #[arg(long)]
        follow: bool,

        /// Poll interval in milliseconds when following
        #[arg(long, default_value_t = 3000,
              value_parser = clap::value_parser!(u64).range(100..))]
        interval_ms: u64,
    },

    /// Show a container's CPU and memory usage
    Stats {
        /// Container ID
        id: String,

        /// Keep polling and redraw the last ten samples
        #[arg(long)]
        watch: bool,

        /// Poll interval in milliseconds when watching
        #[arg(long, default_value_t = 2000,
              value_parser = clap::value_parser!(u64).range(100..))]
        interval_ms: u64,
    },

    /// Run or inspect container benchmarks
    #[command(subcommand)]
    Benchmark(BenchmarkCommands),

    /// Predict cost from the latest benchmark and compare providers
    Predict {
        /// Container ID
        id: String,

        #[command(flatten)]
        selection: PricingArgs,
    },

    /// Export an HTML cost report for a container
    Report {
        /// Container ID
        id: String,

        #[command(flatten)]
        selection: PricingArgs,

        /// Output file or directory (defaults to the current directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum BenchmarkCommands {
    /// Benchmark a container and store the averages
    Run {
        /// Container ID
        id: String,

        /// Benchmark length in seconds
        #[arg(long, default_value_t = DEFAULT_BENCHMARK_SECS,
              value_parser = clap::value_parser!(u64).range(1..=25))]
        duration: u64,
    },

    /// Show the stored benchmark for a container
    Last {
        /// Container ID
        id: String,
    },
}

/// Provider, workload intensity and horizon for predictions and reports
#[derive(clap::Args)]
pub struct PricingArgs {
    /// Cloud provider (AWS, Azure, GCP)
    #[arg(long, short)]
    pub provider: Option<Provider>,

    /// Workload intensity (light, medium, heavy)
    #[arg(long, short, default_value_t = WorkloadIntensity::Medium)]
    pub intensity: WorkloadIntensity,

    /// Prediction horizon in hours
    #[arg(long, default_value_t = DEFAULT_HORIZON_HOURS)]
    pub hours: f64,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;
    let ctx = AppContext::new(&cli, &config)?;

    match cli.command {
        Commands::Containers => containers::list_containers(&ctx).await?,
        Commands::Host => containers::show_host(&ctx).await?,
        Commands::Logs {
            id,
            follow,
            interval_ms,
        } => logs::show_logs(&ctx, &id, follow, interval_ms).await?,
        Commands::Stats {
            id,
            watch,
            interval_ms,
        } => logs::show_stats(&ctx, &id, watch, interval_ms).await?,
        Commands::Benchmark(benchmark_cmd) => match benchmark_cmd {
            BenchmarkCommands::Run { id, duration } => {
                benchmark::run_benchmark(&ctx, &id, duration).await?;
            }
            BenchmarkCommands::Last { id } => {
                benchmark::show_last_benchmark(&ctx, &id).await?;
            }
        },
        Commands::Predict { id, selection } => {
            costs::predict(&ctx, &id, &selection).await?;
        }
        Commands::Report {
            id,
            selection,
            output,
        } => {
            report::export_report(&ctx, &id, &selection, output).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
