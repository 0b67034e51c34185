use std::path::PathBuf;

use absentia::{logging, DualStore, NetworkStatus, OperationQueue, StoreConfig};
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "queue_status",
    about = "Inspect the pending operation queue of a store"
)]
struct Cli {
    /// Directory holding the durable store; defaults to the platform data dir.
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Emit the raw queue as JSON instead of a table.
    #[arg(long)]
    json: bool,
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
    // Pull the durable copy into the fast store before reading.
    store.hydrate().await?;

    let queue = OperationQueue::new(store, NetworkStatus::online());
    let operations = queue.read();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&operations)?);
        return Ok(());
    }

    if operations.is_empty() {
        println!("Operation queue is empty.");
        return Ok(());
    }
    println!("{:<28} {:<22} {:>7}  {}", "ID", "TYPE", "RETRIES", "LAST ERROR");
    for op in &operations {
        println!(
            "{:<28} {:<22} {:>7}  {}",
            op.id,
            op.kind,
            op.retry_count,
            op.last_error.as_deref().unwrap_or("-"),
        );
    }
    println!("{} operation(s) pending.", operations.len());
    Ok(())
}
