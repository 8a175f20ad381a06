use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use rarity::config::Config;
use rarity::metadata::client::MetadataClient;
use rarity::metadata::traits::MetadataSource;
use rarity::output::terminal;
use rarity::pipeline::fetch::{FetchOptions, Strategy, DEFAULT_CONCURRENCY};
use rarity::pipeline::rank::{self, DEFAULT_TOP_K};
use rarity::pipeline::throttle::{Throttle, DEFAULT_THROTTLE_PAUSE};

/// Rarity: rank the members of a collection by how rare their traits are.
///
/// Fetches every member's traits, counts how often each trait value occurs
/// across the whole collection, and reports the members whose traits are
/// the least common.
#[derive(Parser)]
#[command(name = "rarity", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the whole collection and print the rarest members
    Rank {
        /// Collection slug on the metadata provider (default: RARITY_COLLECTION or azuki1)
        #[arg(long)]
        collection: Option<String>,

        /// Number of members; ids run 1..=count (default: RARITY_COLLECTION_SIZE or 10000)
        #[arg(long)]
        count: Option<u32>,

        /// How many of the rarest members to report (default: 5)
        #[arg(long, short = 'k', default_value_t = DEFAULT_TOP_K)]
        top: usize,

        /// Maximum fetches in flight at once (default: 64)
        #[arg(long, short = 'c', default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Fetch strategy: "bounded" (spawn per member under a semaphore) or "pool" (fixed workers)
        #[arg(long, default_value_t = Strategy::Bounded)]
        strategy: Strategy,

        /// Pause after every N launches to go easy on the provider (0 = never)
        #[arg(long, default_value = "0")]
        throttle_every: u32,

        /// Length of each throttle pause in milliseconds
        #[arg(long, default_value_t = DEFAULT_THROTTLE_PAUSE.as_millis() as u64)]
        throttle_pause_ms: u64,

        /// Print both frequency tables after aggregation
        #[arg(long)]
        show_tables: bool,

        /// Print every member's traits and score
        #[arg(long)]
        show_members: bool,
    },

    /// Fetch and print a single member's traits
    Member {
        /// Member id (1-based)
        id: u32,

        /// Collection slug on the metadata provider
        #[arg(long)]
        collection: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rarity=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rank {
            collection,
            count,
            top,
            concurrency,
            strategy,
            throttle_every,
            throttle_pause_ms,
            show_tables,
            show_members,
        } => {
            let mut config = Config::load()?;
            if let Some(slug) = collection {
                config.collection = slug;
            }
            if let Some(count) = count {
                config.collection_size = count;
            }
            config.require_collection()?;

            let collection = config.collection();
            let source: Arc<dyn MetadataSource> =
                Arc::new(MetadataClient::new(&config.api_url, config.fetch_timeout)?);

            let options = FetchOptions {
                concurrency,
                strategy,
                throttle: Throttle::new(throttle_every, Duration::from_millis(throttle_pause_ms)),
                show_progress: true,
            };

            println!(
                "Ranking {} ({} members, {} concurrent, {} strategy)...",
                collection.slug, collection.size, concurrency, strategy
            );

            let ranking = rank::run(source, &collection, top, &options).await?;

            if show_members {
                terminal::display_members(&ranking);
            }
            if show_tables {
                terminal::display_tables(&ranking.harvest.tables);
            }
            terminal::display_ranking(&ranking);

            info!(
                fetched = ranking.fetched(),
                failed = ranking.failed_ids().len(),
                "Done"
            );
        }

        Commands::Member { id, collection } => {
            let config = Config::load()?;
            let slug = collection.unwrap_or(config.collection);
            let client = MetadataClient::new(&config.api_url, config.fetch_timeout)?;

            println!("Fetching member #{id} of {slug}...");
            match client.fetch_traits(&slug, id).await {
                Ok(traits) => {
                    terminal::display_member(&rarity::models::Member::new(id, traits));
                }
                Err(e) => {
                    println!("  {} {:#}", "Fetch failed:".red(), e);
                }
            }
        }
    }

    Ok(())
}
