use analysis_core::{AnalysisError, QuoteProvider, QuoteRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::cache::{resolve_fetch, CacheState, FetchResolution, QuoteCache};
use crate::client::{ChartSource, YahooChartClient};
use crate::error::MarketDataError;
use crate::MarketDataConfig;

/// Free-text crypto names retried under their canonical symbol when the primary lookup fails
const ALIAS_FALLBACKS: &[(&str, &str)] = &[
    ("bitcoin", "BTCUSD"),
    ("btc", "BTCUSD"),
    ("ethereum", "ETHUSD"),
    ("eth", "ETHUSD"),
];

/// Caller-facing quote entry point: cache first, upstream second, stale data on upstream failure
pub struct MarketDataService<S = YahooChartClient> {
    source: S,
    cache: Arc<QuoteCache>,
}

impl MarketDataService<YahooChartClient> {
    pub fn from_config(config: &MarketDataConfig) -> Result<Self, MarketDataError> {
        let ttl_ms = config.cache_ttl.as_millis() as i64;
        Ok(Self::new(
            YahooChartClient::new(config)?,
            Arc::new(QuoteCache::new(ttl_ms)),
        ))
    }
}

impl<S: ChartSource> MarketDataService<S> {
    pub fn new(source: S, cache: Arc<QuoteCache>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    pub async fn get_market_data(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError> {
        let state = self.cache.state_at(symbol, Utc::now().timestamp_millis());

        if let CacheState::Fresh(data) = state {
            tracing::debug!("Using cached data for {}", symbol);
            return Ok(data);
        }

        tracing::info!("Fetching fresh data for {}", symbol);
        let outcome = self.source.fetch_quote(symbol).await;

        match resolve_fetch(state, outcome) {
            FetchResolution::Store(data) => {
                self.cache
                    .insert_at(symbol, data.clone(), Utc::now().timestamp_millis());
                Ok(data)
            }
            FetchResolution::ServeStale { data, error } => {
                tracing::warn!(
                    "Error fetching data for {}: {}. Using expired cache",
                    symbol,
                    error
                );
                Ok(data)
            }
            FetchResolution::Fail(error) => {
                tracing::error!("Error fetching data for {}: {}", symbol, error);
                Err(error)
            }
        }
    }

    /// Like [`get_market_data`](Self::get_market_data), but retries well-known crypto
    /// names under their canonical symbol. The returned record is tagged with the
    /// caller's input and `fallback_used`.
    pub async fn get_market_data_with_fallback(
        &self,
        symbol: &str,
    ) -> Result<QuoteRecord, MarketDataError> {
        let primary_error = match self.get_market_data(symbol).await {
            Ok(data) => return Ok(data),
            Err(e) => e,
        };

        let lower = symbol.trim().to_lowercase();
        let fallback = ALIAS_FALLBACKS
            .iter()
            .find(|(alias, _)| *alias == lower)
            .map(|(_, canonical)| *canonical);

        let Some(fallback_symbol) = fallback else {
            return Err(primary_error);
        };

        tracing::info!("Primary symbol {} failed, trying fallback {}", symbol, fallback_symbol);
        match self.get_market_data(fallback_symbol).await {
            Ok(mut data) => {
                data.symbol = fallback_symbol.to_string();
                data.original_symbol = Some(symbol.to_string());
                data.fallback_used = Some(true);
                Ok(data)
            }
            Err(e) => {
                tracing::warn!("Fallback symbol {} also failed: {}", fallback_symbol, e);
                Err(primary_error)
            }
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("Quote cache cleared");
    }
}

#[async_trait]
impl<S: ChartSource> QuoteProvider for MarketDataService<S> {
    async fn get_market_data(&self, symbol: &str) -> Result<QuoteRecord, AnalysisError> {
        MarketDataService::get_market_data(self, symbol)
            .await
            .map_err(AnalysisError::from)
    }
}
