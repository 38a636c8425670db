//! TradeFlow - shipment clearance pipeline CLI
//!
//! The `tradeflow` command runs a shipment through the seven-stage pipeline
//! with the baseline agents and prints the activity feed and final record.
//!
//! ## Commands
//!
//! - `process`: Run a shipment loaded from a JSON file
//! - `demo`: Run the built-in demo shipment

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use tradeflow_cli::{
    demo_shipment, format_agent, format_event, load_shipment, run_shipment, RunOptions,
};
use tradeflow_core::metrics::METRICS;
use tradeflow_core::{telemetry, ShipmentRecord};

#[derive(Parser)]
#[command(name = "tradeflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-agent customs clearance pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "TRADEFLOW_LOG_JSON")]
    json: bool,

    /// Simulated latency of each stage call, in milliseconds
    #[arg(long, global = true, env = "TRADEFLOW_STAGE_LATENCY_MS", default_value_t = 0)]
    latency_ms: u64,

    /// Number of events kept in the activity feed
    #[arg(long, global = true, env = "TRADEFLOW_EVENT_RETENTION", default_value_t = 100)]
    event_retention: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a shipment described by a JSON file
    Process {
        /// Path to the shipment JSON
        file: PathBuf,

        /// Write the final record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Process the built-in demo shipment
    Demo {
        /// Write the final record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    telemetry::init_tracing(cli.json, level);

    let options = RunOptions {
        latency: Duration::from_millis(cli.latency_ms),
        event_retention: cli.event_retention,
    };

    let result = match cli.command {
        Commands::Process { file, output } => {
            let shipment = load_shipment(&file)?;
            cmd_process(shipment, &options, output.as_deref()).await
        }
        Commands::Demo { output } => {
            cmd_process(demo_shipment(), &options, output.as_deref()).await
        }
    };

    METRICS.flush();
    result
}

async fn cmd_process(
    shipment: ShipmentRecord,
    options: &RunOptions,
    output: Option<&Path>,
) -> Result<()> {
    let report = run_shipment(shipment, options).await?;

    println!("Activity ({} events)", report.events.len());
    for event in report.events.iter() {
        println!("  {}", format_event(event));
    }

    println!();
    println!("Agents");
    for agent in &report.agents {
        println!("  {}", format_agent(agent));
    }

    println!();
    println!(
        "Shipment {} ({}): {}",
        report.record.reference_number, report.record.id, report.record.status
    );

    let json = serde_json::to_string_pretty(&report.record)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write record to {}", path.display()))?;
            println!("Record written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
