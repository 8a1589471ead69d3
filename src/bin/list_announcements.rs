use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use gfi_populate::config;
use gfi_populate::db::AnnouncementStore;

#[derive(Parser, Debug)]
#[command(author, version, about = "Print every recorded announcement")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let store = AnnouncementStore::open(&cfg.database_url()).await?;
    let entries = store.entries().await?;
    for entry in &entries {
        println!("{}  {}", entry.timestamp, entry.key);
    }
    println!("{} announcement(s)", entries.len());
    store.close().await;
    Ok(())
}
