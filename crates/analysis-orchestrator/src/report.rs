use serde::Serialize;
use serde_json::Value;

/// Headline figures of a successful analysis
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub original_symbol: String,
    pub resolved_symbol: String,
    pub synonym_used: bool,
    pub total_phases: u32,
    pub phases_completed: u32,
    pub price_used: f64,
    pub trading_direction: Value,
    pub entry_price: Value,
    pub elliott_wave_applicable: bool,
    pub elliott_pattern: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    success: bool,
    /// Model output with the caller's symbol, phases and metadata merged in
    pub result: Value,
    pub symbol: String,
    pub confidence: Value,
    pub filename: String,
    pub analysis_summary: AnalysisSummary,
}

impl AnalysisReport {
    pub fn new(
        result: Value,
        symbol: String,
        confidence: Value,
        filename: String,
        analysis_summary: AnalysisSummary,
    ) -> Self {
        Self {
            success: true,
            result,
            symbol,
            confidence,
            filename,
            analysis_summary,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisFailure {
    success: bool,
    pub error: String,
    pub symbol: String,
    pub filename: String,
}

impl AnalysisFailure {
    pub fn new(
        error: impl Into<String>,
        symbol: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: error.into(),
            symbol: symbol.into(),
            filename: filename.into(),
        }
    }
}

/// Result of one analysis request; serializes with a `success` flag
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Success(Box<AnalysisReport>),
    Failure(AnalysisFailure),
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success(_))
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            AnalysisOutcome::Success(report) => Some(report),
            AnalysisOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AnalysisFailure> {
        match self {
            AnalysisOutcome::Success(_) => None,
            AnalysisOutcome::Failure(failure) => Some(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_shape() {
        let outcome = AnalysisOutcome::Failure(AnalysisFailure::new("boom", "btc", "chart.png"));
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(
            value,
            serde_json::json!({"success": false, "error": "boom", "symbol": "btc", "filename": "chart.png"})
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure().map(|f| f.error.as_str()), Some("boom"));
    }
}
