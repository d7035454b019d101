use analysis_core::{Instrument, QuoteProvider, QuoteRecord};
use instrument_catalog::InstrumentCatalog;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SymbolValidation {
    Found {
        valid: bool,
        symbol: Instrument,
        #[serde(rename = "marketData")]
        market_data: Option<QuoteRecord>,
        source: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<&'static str>,
    },
    NotFound {
        valid: bool,
        symbol: String,
        message: &'static str,
    },
}

impl SymbolValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, SymbolValidation::Found { .. })
    }
}

/// Checks a user-supplied symbol against the database and, when known, the live quote feed
pub struct SymbolValidator {
    catalog: Arc<InstrumentCatalog>,
    quotes: Arc<dyn QuoteProvider>,
}

impl SymbolValidator {
    pub fn new(catalog: Arc<InstrumentCatalog>, quotes: Arc<dyn QuoteProvider>) -> Self {
        Self { catalog, quotes }
    }

    pub async fn validate(&self, symbol: &str) -> SymbolValidation {
        let found = self
            .catalog
            .load()
            .and_then(|catalog| catalog.find_by_symbol_or_name(symbol).cloned());

        let Some(instrument) = found else {
            tracing::info!("Symbol {} not found in database", symbol);
            return SymbolValidation::NotFound {
                valid: false,
                symbol: symbol.to_string(),
                message: "Symbol not found in database",
            };
        };

        match self.quotes.get_market_data(symbol).await {
            Ok(quote) => SymbolValidation::Found {
                valid: true,
                symbol: instrument,
                market_data: Some(quote),
                source: "database+yahoo",
                warning: None,
            },
            Err(e) => {
                tracing::warn!("Market data unavailable for {}: {}", symbol, e);
                SymbolValidation::Found {
                    valid: true,
                    symbol: instrument,
                    market_data: None,
                    source: "database",
                    warning: Some("Market data unavailable"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::AnalysisError;
    use async_trait::async_trait;
    use instrument_catalog::ReloadPolicy;
    use std::io::Write;

    struct FixedQuotes(Option<f64>);

    #[async_trait]
    impl QuoteProvider for FixedQuotes {
        async fn get_market_data(&self, symbol: &str) -> Result<QuoteRecord, AnalysisError> {
            let price = self
                .0
                .ok_or_else(|| AnalysisError::ApiError("HTTP 500: Internal Server Error".to_string()))?;
            Ok(QuoteRecord {
                symbol: symbol.to_string(),
                yahoo_symbol: format!("{}=X", symbol),
                price,
                bid: price,
                ask: price,
                change: 0.0,
                change_percent: 0.0,
                digits: 5,
                spread: 0.0,
                tick_size: 0.00001,
                timestamp: 0,
                currency: "USD".to_string(),
                market_state: "REGULAR".to_string(),
                original_symbol: None,
                fallback_used: None,
            })
        }
    }

    fn catalog_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"symbol":"EURUSD","name":"Euro vs US Dollar","category":"forex","bid":1.0849,"ask":1.0851}}]"#
        )
        .unwrap();
        file
    }

    fn validator(file: &tempfile::NamedTempFile, price: Option<f64>) -> SymbolValidator {
        SymbolValidator::new(
            Arc::new(InstrumentCatalog::new(file.path(), ReloadPolicy::EveryCall)),
            Arc::new(FixedQuotes(price)),
        )
    }

    #[tokio::test]
    async fn test_found_with_market_data() {
        let file = catalog_file();
        let result = validator(&file, Some(1.085)).validate("eurusd").await;
        let value = serde_json::to_value(&result).unwrap();

        assert!(result.is_valid());
        assert_eq!(value["source"], "database+yahoo");
        assert_eq!(value["symbol"]["symbol"], "EURUSD");
        assert_eq!(value["marketData"]["price"], 1.085);
        assert!(value.get("warning").is_none());
    }

    #[tokio::test]
    async fn test_found_by_name_without_market_data() {
        let file = catalog_file();
        let result = validator(&file, None).validate("euro").await;
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["valid"], true);
        assert_eq!(value["source"], "database");
        assert_eq!(value["marketData"], serde_json::Value::Null);
        assert_eq!(value["warning"], "Market data unavailable");
    }

    #[tokio::test]
    async fn test_not_found() {
        let file = catalog_file();
        let result = validator(&file, Some(1.0)).validate("DOGE").await;

        assert_eq!(
            result,
            SymbolValidation::NotFound {
                valid: false,
                symbol: "DOGE".to_string(),
                message: "Symbol not found in database",
            }
        );
    }
}
