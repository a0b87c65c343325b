//! `alveo` command line entry point.
//!
//! Loads configuration, opens the client and its cache, and runs one
//! subcommand. Logging goes to stderr so command output on stdout stays
//! pipeable.

use std::path::PathBuf;

use alveo_client::{Client, Document, ItemGroup, ListCategory};
use alveo_core::AlveoConfig;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Command line client for the Alveo research data repository
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Do not read from the local cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Fetch from the server even if a fresh cache entry exists
    #[arg(long, global = true)]
    force: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the server's API version
    Version,

    /// List the collections visible to this account
    Collections,

    /// Print the metadata of an item
    Item {
        /// Item URL
        url: String,
    },

    /// Save a document's content to a directory
    Document {
        /// Document URL
        url: String,

        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// File name, instead of the document's own
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Print the primary text of an item
    PrimaryText {
        /// Item URL
        url: String,
    },

    /// Search item metadata and print matching item URLs
    Search {
        /// Metadata query, e.g. `collection_name:ace`
        query: String,

        /// Also fetch and print the metadata of every match
        #[arg(long)]
        metadata: bool,
    },

    /// List item lists, or the items of one list
    ItemLists {
        /// Name of a list to show
        name: Option<String>,

        /// Look the name up among lists shared with this account
        #[arg(long)]
        shared: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = AlveoConfig::load().context("loading configuration")?;
    if cli.no_cache {
        config.use_cache = false;
    }
    config.require_api_key()?;

    let client = Client::from_config(&config).await?;
    tracing::debug!(api = %client.api_url(), cache = %config.cache_dir.display(), "client ready");

    let outcome = run(&client, cli.command, cli.force).await;
    finish(outcome, client.close().await)
}

/// The subcommand's result wins; a failed close is only logged.
fn finish(outcome: Result<()>, closed: Result<(), alveo_core::Error>) -> Result<()> {
    if let Err(e) = closed {
        tracing::warn!(error = %e, "failed to close cache");
    }
    outcome
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(client: &Client, command: Command, force: bool) -> Result<()> {
    match command {
        Command::Version => println!("{}", client.api_version().await?),
        Command::Collections => {
            for collection in client.collections().await? {
                println!("{}\t{}", collection.name(), collection.url());
            }
        }
        Command::Item { url } => {
            let item = client.get_item(&url, force).await?;
            println!("{}", serde_json::to_string_pretty(item.metadata())?);
        }
        Command::Document { url, dir, name } => {
            let document = Document::from_url(url.as_str());
            let path = client
                .download_document(&document, &dir, name.as_deref(), force)
                .await?;
            println!("{}", path.display());
        }
        Command::PrimaryText { url } => match client.get_primary_text(&url, force).await? {
            Some(text) => println!("{text}"),
            None => eprintln!("{url} has no primary text"),
        },
        Command::Search { query, metadata } => {
            let group = client.search_metadata(&query).await?;
            if metadata {
                print_items(client, &group, force).await?;
            } else {
                for url in &group {
                    println!("{url}");
                }
            }
        }
        Command::ItemLists { name: Some(name), shared } => {
            let category = if shared { ListCategory::Shared } else { ListCategory::Own };
            let list = client.get_item_list_by_name(&name, category).await?;
            for url in list.items() {
                println!("{url}");
            }
        }
        Command::ItemLists { name: None, .. } => {
            let index = client.item_lists().await?;
            for (label, lists) in [("own", &index.own), ("shared", &index.shared)] {
                for list in lists {
                    let count = list.num_items.map(|n| n.to_string()).unwrap_or_default();
                    println!("{label}\t{}\t{count}\t{}", list.name, list.item_list_url);
                }
            }
        }
    }
    Ok(())
}

async fn print_items(client: &Client, group: &ItemGroup, force: bool) -> Result<()> {
    for item in client.get_all(group, force).await? {
        println!("{}", serde_json::to_string(item.metadata())?);
    }
    Ok(())
}
