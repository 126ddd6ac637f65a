//! fabricscaled — the fabricscale daemon.
//!
//! Wires the fabric-aware template pass and the scale-up status reporter
//! to a local record store.
//!
//! # Usage
//!
//! ```text
//! fabricscaled templates --nodes nodes.json --templates templates.json
//! fabricscaled report --attempt attempt.json
//! fabricscaled run --attempt attempt.json
//! fabricscaled status
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use fabricscale_core::FabricScaleConfig;

mod commands;

#[derive(Parser)]
#[command(name = "fabricscaled", about = "fabricscale daemon", version)]
struct Cli {
    /// Path to fabricscale.toml. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute per-node-group templates with fabric attribution applied.
    Templates {
        /// JSON array of nodes.
        #[arg(long)]
        nodes: PathBuf,
        /// JSON object mapping node group id to its base template.
        #[arg(long)]
        templates: PathBuf,
        /// Sort nodes by name before picking each group's representative.
        #[arg(long)]
        sort: bool,
    },
    /// Aggregate one scale-up attempt and persist it to the status record.
    Report {
        /// JSON scale-up attempt result.
        #[arg(long)]
        attempt: PathBuf,
    },
    /// Re-publish the attempt file every report interval until interrupted.
    Run {
        #[arg(long)]
        attempt: PathBuf,
    },
    /// Print the persisted scale-up status record.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,fabricscaled=debug")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => FabricScaleConfig::from_file(path)?,
        None => FabricScaleConfig::default(),
    };
    info!(namespace = %config.status.namespace, "fabricscaled starting");

    match cli.command {
        Command::Templates {
            nodes,
            templates,
            sort,
        } => {
            let output = commands::templates(&config, &nodes, &templates, sort)?;
            println!("{output}");
            Ok(())
        }
        Command::Report { attempt } => {
            let store = commands::open_store(&config)?;
            commands::report(&config, &store, &attempt)?;
            Ok(())
        }
        Command::Run { attempt } => {
            let store = commands::open_store(&config)?;
            commands::run(config, store, attempt).await
        }
        Command::Status => {
            let store = commands::open_store(&config)?;
            println!("{}", commands::status(&config, &store)?);
            Ok(())
        }
    }
}
