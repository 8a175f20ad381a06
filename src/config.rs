use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::metadata::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::models::Collection;

/// Collection ranked when nothing else is configured.
pub const DEFAULT_COLLECTION: &str = "azuki1";
pub const DEFAULT_COLLECTION_SIZE: u32 = 10_000;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// override whatever is set here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Metadata provider base URL (RARITY_API_URL).
    pub api_url: String,
    /// Collection slug on the provider (RARITY_COLLECTION).
    pub collection: String,
    /// Number of members; ids run 1..=size (RARITY_COLLECTION_SIZE).
    pub collection_size: u32,
    /// Per-request timeout (RARITY_FETCH_TIMEOUT_SECS).
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            collection_size: DEFAULT_COLLECTION_SIZE,
            fetch_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every setting has a default; a value that is set but does not parse
    /// is an error rather than silently falling back.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            api_url: env::var("RARITY_API_URL").unwrap_or(defaults.api_url),
            collection: env::var("RARITY_COLLECTION").unwrap_or(defaults.collection),
            collection_size: parse_var("RARITY_COLLECTION_SIZE")?
                .unwrap_or(defaults.collection_size),
            fetch_timeout: parse_var::<u64>("RARITY_FETCH_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
        })
    }

    /// The configured collection.
    pub fn collection(&self) -> Collection {
        Collection::new(self.collection.clone(), self.collection_size)
    }

    /// Check that there is something to rank.
    /// Call this before starting a fetch pass.
    pub fn require_collection(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            anyhow::bail!(
                "No collection configured. Pass --collection or set RARITY_COLLECTION."
            );
        }
        if self.collection_size == 0 {
            anyhow::bail!(
                "Collection size must be at least 1. Pass --count or set RARITY_COLLECTION_SIZE."
            );
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} is not a valid number: {raw:?}")),
        Err(_) => Ok(None),
    }
}
