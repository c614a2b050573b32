use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use eventfeed::feed::to_atom_xml;
use eventfeed::{EventStore, FeedProperties, FeedService};

/// Get the default properties path (~/.config/eventfeed/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("eventfeed")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "eventfeed", about = "Render an event log page as an Atom feed")]
struct Args {
    /// SQLite database holding the event_records table
    #[arg(long, value_name = "FILE")]
    db: PathBuf,

    /// Feed properties file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Event category; empty selects every event
    #[arg(long, default_value = "")]
    category: String,

    /// Archive page id; omit for the recent page
    #[arg(long)]
    page: Option<u32>,

    /// URI the feed is served from, used for self and paging links
    #[arg(long, value_name = "URI")]
    request_uri: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let properties = FeedProperties::load(&config_path)
        .with_context(|| format!("Failed to load properties from {}", config_path.display()))?;

    let db_path = args
        .db
        .to_str()
        .context("Database path is not valid UTF-8")?;
    let store = EventStore::open(db_path, properties.page_size())
        .await
        .with_context(|| format!("Failed to open event store at {db_path}"))?;

    let service = FeedService::new(store, properties);
    let feed = match args.page {
        Some(page_id) => {
            service
                .archive_feed(&args.request_uri, &args.category, page_id)
                .await
        }
        None => service.recent_feed(&args.request_uri, &args.category).await,
    }
    .context("Failed to build feed")?;

    println!("{}", to_atom_xml(&feed)?);
    Ok(())
}
