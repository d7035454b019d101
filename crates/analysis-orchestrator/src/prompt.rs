use analysis_core::{AnalysisError, VolatilityData};
use serde_json::json;
use std::path::PathBuf;

const SELECTED_SYMBOL: &str = "{{SELECTED_SYMBOL}}";
const CURRENT_PRICE: &str = "{{CURRENT_PRICE}}";
const SYMBOLS_LIST: &str = "{{SYMBOLS_LIST}}";
const EXTRACTED_DATA: &str = "{{EXTRACTED_DATA}}";
const VOLATILITY_INFO: &str = "{{VOLATILITY_INFO}}";

/// Values substituted into the prompt template
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub symbol: &'a str,
    pub price: f64,
    pub symbols_list: &'a str,
    pub volatility: Option<&'a VolatilityData>,
}

/// Reads the analysis template from disk and fills its placeholders
#[derive(Debug, Clone)]
pub struct PromptComposer {
    template_path: PathBuf,
}

impl PromptComposer {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
        }
    }

    pub fn load_template(&self) -> Result<String, AnalysisError> {
        std::fs::read_to_string(&self.template_path).map_err(|e| {
            tracing::error!(
                "Error reading prompt template {}: {}",
                self.template_path.display(),
                e
            );
            AnalysisError::TemplateError(format!("{}: {}", self.template_path.display(), e))
        })
    }

    pub fn compose(&self, context: &PromptContext<'_>) -> Result<String, AnalysisError> {
        let template = self.load_template()?;
        Ok(render(&template, context))
    }
}

/// Replace the first occurrence of each placeholder.
pub fn render(template: &str, context: &PromptContext<'_>) -> String {
    let volatility = context
        .volatility
        .map(volatility_block)
        .unwrap_or_default();

    template
        .replacen(SELECTED_SYMBOL, context.symbol, 1)
        .replacen(CURRENT_PRICE, &context.price.to_string(), 1)
        .replacen(SYMBOLS_LIST, context.symbols_list, 1)
        .replacen(EXTRACTED_DATA, &extracted_data_placeholder(), 1)
        .replacen(VOLATILITY_INFO, &volatility, 1)
}

fn extracted_data_placeholder() -> String {
    let marker = json!({ "message": "Data will be extracted from the image by the model" });
    serde_json::to_string_pretty(&marker).unwrap_or_default()
}

fn fixed(value: Option<f64>, decimals: usize) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn volatility_block(data: &VolatilityData) -> String {
    format!(
        "\n## Volatility and Current Market Conditions:\n\
         - **Annualized Volatility**: {}% ({})\n\
         - **Average True Range (ATR)**: {}%\n\
         - **Recommended Stop Loss distance**: {}%\n\
         - **Recommended Entry Limit distance**: {}%\n\
         - **Analysis based on 30 days of real historical data**",
        fixed(data.annualized, 1),
        data.level.as_deref().filter(|l| !l.is_empty()).unwrap_or("N/A"),
        fixed(data.atr_percentage, 2),
        fixed(data.recommended_stop_distance, 2),
        fixed(data.recommended_entry_distance, 2),
    )
}
