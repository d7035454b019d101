use analysis_core::AnalysisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("No data available for this symbol")]
    NoData,

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<MarketDataError> for AnalysisError {
    fn from(e: MarketDataError) -> Self {
        AnalysisError::ApiError(e.to_string())
    }
}
