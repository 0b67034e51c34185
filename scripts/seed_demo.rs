use std::path::PathBuf;

use absentia::{logging, seed, DualStore, StoreConfig};
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "seed_demo",
    about = "Preload the absence dashboard store with demo data"
)]
struct Cli {
    /// Directory holding the durable store; defaults to the platform data dir.
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let config = match cli.data_dir {
        Some(dir) => StoreConfig::at_path(dir.join("absentia.sqlite3")),
        None => StoreConfig::at_data_dir(),
    };
    let store = DualStore::open(config)?;
    let summary = seed::run_demo_seed(&store).await?;
    println!(
        "Seeded {} validation entries, history for {} employees, {} preventive plans.",
        summary.validations, summary.employees_with_history, summary.employees_with_plans
    );
    Ok(())
}
