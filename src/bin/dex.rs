use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pocket_dex::catalog::{load_reference_csv, ReferenceIndex};
use pocket_dex::config::AppConfig;
use pocket_dex::tracing::{init_tracing, LogFormat, DEFAULT_FILTER};
use pocket_dex::util::env;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dex", version, about = "Card catalog admin CLI")]
struct Cli {
    /// Optional override for DATABASE_URL
    #[arg(long, global = true)]
    db_url: Option<String>,
    /// Optional override for CARD_DATA_PATH
    #[arg(long, global = true)]
    card_data: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Print raw record, known record and account totals
    Stats,
    /// List set names from the reference data
    Expansions,
    /// Print the raw rarity distribution
    RarityCounts,
    /// Load the reference CSV and report malformed, accepted, duplicate and skipped rows
    CheckReference,
}

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    init_tracing(DEFAULT_FILTER, LogFormat::from_env(LogFormat::Compact))?;

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(url) = cli.db_url {
        config.database_url = url;
    }
    if let Some(path) = cli.card_data {
        config.card_data_path = path;
    }

    match cli.command {
        Commands::CheckReference => {
            let loaded = load_reference_csv(&config.card_data_path)
                .with_context(|| format!("reading {}", config.card_data_path.display()))?;
            let total = loaded.records.len() + loaded.malformed;
            let malformed = loaded.malformed;
            let index = ReferenceIndex::build(loaded.records);
            let stats = index.stats();
            info!(path = %config.card_data_path.display(), "check-reference: done");
            println!("rows:       {total}");
            println!("malformed:  {malformed}");
            println!("accepted:   {}", stats.accepted);
            println!("duplicates: {}", stats.duplicates);
            println!("skipped:    {}", stats.skipped);
            println!("sets:       {}", index.all_set_names().len());
        }
        Commands::Expansions => {
            let catalog = config.build_catalog().await?;
            for set in catalog.expansions() {
                println!("{set}");
            }
        }
        Commands::RarityCounts => {
            let catalog = config.build_catalog().await?;
            for row in catalog.rarity_counts().await? {
                println!("{:>8}  {}", row.count, row.rarity);
            }
        }
        Commands::Stats => {
            let catalog = config.build_catalog().await?;
            let stats = catalog.collection_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
