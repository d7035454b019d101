//! Provenance records attached to every successful analysis.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::validation::{is_truthy, truthy_field};

pub const ANALYSIS_VERSION: &str = "3.2-Enhanced-With-Synonyms";
pub const TOTAL_PHASES: u32 = 6;

/// Where the reference price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// Supplied by the caller, normally a live quote
    Caller,
    /// Bid/ask midpoint from the symbols database
    Catalog,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::Caller => "Yahoo Finance (Live)",
            PriceSource::Catalog => "Symbols Database (Bid/Ask)",
        }
    }
}

impl Serialize for PriceSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed,
    Warning,
    NotApplicable,
}

/// The mapped symbol when a synonym was applied, `false` otherwise
fn symbol_or_false<S: Serializer>(
    value: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(symbol) => serializer.serialize_str(symbol),
        None => serializer.serialize_bool(false),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolResolutionPhase {
    pub status: PhaseStatus,
    pub original_input: String,
    pub resolved_symbol: String,
    pub symbol_changed: bool,
    #[serde(serialize_with = "symbol_or_false")]
    pub synonym_used: Option<String>,
    pub message: String,
}

impl SymbolResolutionPhase {
    pub fn new(original: &str, resolved: &str, synonym: Option<&str>) -> Self {
        let changed = original != resolved;
        let message = if changed {
            format!(
                "Symbol \"{}\" resolved to \"{}\" using the synonym database",
                original, resolved
            )
        } else {
            format!("Symbol \"{}\" recognized directly", original)
        };

        Self {
            status: PhaseStatus::Completed,
            original_input: original.to_string(),
            resolved_symbol: resolved.to_string(),
            symbol_changed: changed,
            synonym_used: synonym.map(str::to_string),
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseValidationPhase {
    pub status: PhaseStatus,
    pub symbol_found: bool,
    /// `categories`, `flat_array`, or `unavailable` when the database could not be read
    pub database_structure: &'static str,
    pub total_symbols_available: usize,
    pub message: String,
}

impl DatabaseValidationPhase {
    pub fn new(resolved: &str, found: bool, structure: Option<&'static str>, total: usize) -> Self {
        let message = if found {
            format!("Symbol \"{}\" validated in database", resolved)
        } else {
            format!(
                "Symbol \"{}\" not found in database, continuing with analysis",
                resolved
            )
        };

        Self {
            status: if found {
                PhaseStatus::Completed
            } else {
                PhaseStatus::Warning
            },
            symbol_found: found,
            database_structure: structure.unwrap_or("unavailable"),
            total_symbols_available: total,
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceDeterminationPhase {
    pub status: PhaseStatus,
    pub price_used: f64,
    pub price_source: PriceSource,
    pub current_price_provided: bool,
    pub symbol_price_available: bool,
    pub message: String,
}

impl PriceDeterminationPhase {
    pub fn new(price: f64, source: PriceSource, provided: bool, catalog_priced: bool) -> Self {
        Self {
            status: PhaseStatus::Completed,
            price_used: price,
            price_source: source,
            current_price_provided: provided,
            symbol_price_available: catalog_priced,
            message: format!("Price {} obtained from {}", price, source.as_str()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AiAnalysisPhase {
    pub status: PhaseStatus,
    pub ai_model: String,
    pub analysis_timestamp: String,
    pub image_processed: bool,
    pub prompt_enhanced: bool,
    pub volatility_data_available: bool,
    pub message: String,
}

impl AiAnalysisPhase {
    pub fn new(model: &str, timestamp: &str, volatility_supplied: bool) -> Self {
        Self {
            status: PhaseStatus::Completed,
            ai_model: model.to_string(),
            analysis_timestamp: timestamp.to_string(),
            image_processed: true,
            prompt_enhanced: volatility_supplied,
            volatility_data_available: volatility_supplied,
            message: "Analysis completed by the vision model using the image and market data"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultValidationPhase {
    pub status: PhaseStatus,
    pub coherence_check: bool,
    pub risk_analysis: bool,
    pub technical_analysis: bool,
    pub trading_plan_generated: bool,
    pub message: String,
}

impl ResultValidationPhase {
    pub fn from_analysis(analysis: &Value) -> Self {
        let validation = truthy_field(analysis, "validation");
        let has = |key: &str| validation.and_then(|v| truthy_field(v, key)).is_some();

        Self {
            status: PhaseStatus::Completed,
            coherence_check: has("coherence_check"),
            risk_analysis: has("risk_analysis"),
            technical_analysis: truthy_field(analysis, "technical_analysis").is_some(),
            trading_plan_generated: truthy_field(analysis, "trading_plan").is_some(),
            message: "Coherence validation and risk analysis completed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RulesCompliance {
    pub wave2_not_beyond_wave1: Value,
    pub wave3_not_shortest: Value,
    pub wave4_no_overlap_wave1: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElliottWavePhase {
    pub status: PhaseStatus,
    pub elliott_wave_applicable: bool,
    pub pattern_type: Value,
    pub current_wave: Value,
    pub confidence_level: Value,
    pub rules_compliance: Option<RulesCompliance>,
    pub fibonacci_targets: Value,
    pub invalidation_level: Value,
    pub message: String,
}

/// `wave[key]` if truthy, else `fallback`
fn field_or(wave: Option<&Value>, key: &str, fallback: Value) -> Value {
    wave.and_then(|w| truthy_field(w, key))
        .cloned()
        .unwrap_or(fallback)
}

impl ElliottWavePhase {
    pub fn from_analysis(analysis: &Value) -> Self {
        let wave = truthy_field(analysis, "technical_analysis")
            .and_then(|ta| truthy_field(ta, "elliott_wave"));
        let applicable = wave.and_then(|w| w.get("applicable")).is_some_and(is_truthy);

        let rules_compliance = wave
            .and_then(|w| truthy_field(w, "rules_compliance"))
            .map(|rules| {
                let rule = |key: &str| rules.get(key).cloned().unwrap_or(Value::Null);
                RulesCompliance {
                    wave2_not_beyond_wave1: rule("rule_1_wave2_not_beyond_wave1"),
                    wave3_not_shortest: rule("rule_2_wave3_not_shortest"),
                    wave4_no_overlap_wave1: rule("rule_3_wave4_no_overlap_wave1"),
                }
            });

        let message = if applicable {
            "Elliott Wave analysis completed with pattern identification"
        } else {
            "Elliott Wave analysis not applicable to this market structure"
        };

        Self {
            status: if wave.is_some() {
                PhaseStatus::Completed
            } else {
                PhaseStatus::NotApplicable
            },
            elliott_wave_applicable: applicable,
            pattern_type: field_or(wave, "pattern_type", Value::from("none")),
            current_wave: field_or(wave, "current_wave", Value::from("not_identified")),
            confidence_level: field_or(wave, "confidence", Value::from("low")),
            rules_compliance,
            fibonacci_targets: field_or(wave, "fibonacci_targets", Value::Array(Vec::new())),
            invalidation_level: field_or(wave, "invalidation_level", Value::Null),
            message: message.to_string(),
        }
    }
}

/// All six phases in pipeline order
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisPhases {
    pub phase_1_symbol_resolution: SymbolResolutionPhase,
    pub phase_2_database_validation: DatabaseValidationPhase,
    pub phase_3_price_determination: PriceDeterminationPhase,
    pub phase_4_ai_analysis: AiAnalysisPhase,
    pub phase_5_result_validation: ResultValidationPhase,
    pub phase_6_elliott_wave_analysis: ElliottWavePhase,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    pub filename: String,
    pub analysis_timestamp: String,
    pub model_used: String,
    pub original_symbol: String,
    pub resolved_symbol: String,
    pub selected_symbol: String,
    pub price_source: PriceSource,
    pub price_used: f64,
    pub synonym_mapping_used: bool,
    pub analysis_version: &'static str,
}
