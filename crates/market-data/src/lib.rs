//! Live quotes from the Yahoo Finance chart endpoint, normalized per asset class
//! and served through a TTL cache with stale fallback.

pub mod cache;
pub mod client;
pub mod derive;
pub mod error;
pub mod service;
pub mod symbols;

pub use cache::{
    resolve_fetch, CacheEntry, CacheState, FetchResolution, QuoteCache, DEFAULT_TTL_MS,
};
pub use client::{ChartSource, YahooChartClient};
pub use derive::{build_quote, calculate_spread, determine_digits, ChartMeta};
pub use error::MarketDataError;
pub use service::MarketDataService;
pub use symbols::to_provider_symbol;

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Configuration for the market-data layer
#[derive(Debug, Clone)]
pub struct MarketDataConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_millis(DEFAULT_TTL_MS as u64),
        }
    }
}
