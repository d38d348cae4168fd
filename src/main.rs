use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use topscore_export::config::{self, Config};
use topscore_export::topscore::TopScoreClient;
use topscore_export::{export_resource, export_resource_to, ExportOutcome, Resource};

#[derive(Debug, Parser)]
#[command(author, version, about = "Export TopScore products and players to CSV")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Five-line credentials file (auth URL, client id, client secret, username, password)
    #[arg(long)]
    credentials: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Export products and their variation families
    Products {
        /// Output CSV path (defaults to <output_dir>/products.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export persons as players
    Players {
        /// Output CSV path (defaults to <output_dir>/players.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export both tables to their default paths
    All,
}

fn load_config(args: &Args) -> Result<Config> {
    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    match &args.credentials {
        Some(path) => {
            let credential = config::load_credentials_file(path)
                .with_context(|| format!("failed to load credentials from {}", path.display()))?;
            Ok(cfg.with_credential(credential))
        }
        None => Ok(cfg),
    }
}

fn report(outcome: &ExportOutcome) {
    match outcome {
        ExportOutcome::Written {
            resource,
            declared_count,
            page_count,
            records,
            path,
        } => info!(
            %resource,
            declared_count,
            page_count,
            records,
            path=%path.display(),
            "table written"
        ),
        ExportOutcome::Empty { resource } => {
            warn!(%resource, "resource has no items; no table written")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;
    cfg.ensure_dirs()?;
    let settings = cfg.export_settings()?;
    let client = TopScoreClient::from_config(&cfg)?;

    let outcomes = match &args.command {
        Command::Products { out } => {
            let outcome = match out {
                Some(path) => export_resource_to(&client, Resource::Products, &settings, path).await,
                None => export_resource(&client, Resource::Products, &settings).await,
            };
            vec![outcome.context("products export failed")?]
        }
        Command::Players { out } => {
            let outcome = match out {
                Some(path) => export_resource_to(&client, Resource::Persons, &settings, path).await,
                None => export_resource(&client, Resource::Persons, &settings).await,
            };
            vec![outcome.context("players export failed")?]
        }
        Command::All => {
            let mut outcomes = Vec::new();
            for resource in [Resource::Products, Resource::Persons] {
                let outcome = export_resource(&client, resource, &settings)
                    .await
                    .with_context(|| format!("{} export failed", resource))?;
                outcomes.push(outcome);
            }
            outcomes
        }
    };

    for outcome in &outcomes {
        report(outcome);
    }
    Ok(())
}
