use async_trait::async_trait;
use crate::{AnalysisError, QuoteRecord};

/// Source of normalized live quotes, keyed by canonical symbol
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn get_market_data(&self, symbol: &str) -> Result<QuoteRecord, AnalysisError>;
}
