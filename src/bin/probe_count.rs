use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use topscore_export::config;
use topscore_export::fetch::{page_count, probe_count};
use topscore_export::topscore::TopScoreClient;
use topscore_export::Resource;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Target {
    Products,
    Players,
}

#[derive(Parser, Debug)]
#[command(about = "Print the declared item count and page count for a resource without fetching pages")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Five-line credentials file overriding the YAML credentials
    #[arg(long)]
    credentials: Option<PathBuf>,

    #[arg(value_enum)]
    target: Target,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = config::load(Some(&args.config))?;
    if let Some(path) = &args.credentials {
        cfg = cfg.with_credential(config::load_credentials_file(path)?);
    }
    let settings = cfg.export_settings()?;
    let client = TopScoreClient::from_config(&cfg)?;

    let resource = match args.target {
        Target::Products => Resource::Products,
        Target::Players => Resource::Persons,
    };
    let count = probe_count(&client, resource).await?;
    println!("Resource: {}", resource);
    println!("Declared count: {}", count);
    println!(
        "Pages at {} per page: {}",
        settings.page_size,
        page_count(count, settings.page_size)
    );
    Ok(())
}
