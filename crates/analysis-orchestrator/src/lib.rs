//! Chart-image analysis pipeline: symbol resolution, price determination, prompt
//! composition, vision inference and validation of the returned trading plan.

use analysis_core::{AnalysisError, Instrument, VolatilityData};
use chrono::{SecondsFormat, Utc};
use inference_client::VisionProvider;
use instrument_catalog::{resolve_symbol, synonym, InstrumentCatalog, DEFAULT_PROMPT_LIMIT};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

pub mod phases;
pub mod prompt;
pub mod report;
pub mod validation;
pub mod validator;

pub use phases::{AnalysisMetadata, AnalysisPhases, PriceSource, ANALYSIS_VERSION, TOTAL_PHASES};
pub use prompt::{PromptComposer, PromptContext};
pub use report::{AnalysisFailure, AnalysisOutcome, AnalysisReport, AnalysisSummary};
pub use validator::{SymbolValidation, SymbolValidator};

use phases::{
    AiAnalysisPhase, DatabaseValidationPhase, ElliottWavePhase, PriceDeterminationPhase,
    ResultValidationPhase, SymbolResolutionPhase,
};
use validation::{enforce_symbol, is_truthy, parse_analysis, require_structure, truthy_field};

const DEFAULT_CONFIDENCE: f64 = 0.8;

/// One chart to analyze
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: Vec<u8>,
    pub mime_type: String,
    pub symbol: String,
    pub filename: String,
    /// Live price supplied by the caller; wins over the database midpoint
    pub current_price: Option<f64>,
    pub volatility: Option<VolatilityData>,
}

impl AnalysisRequest {
    pub fn new(image: Vec<u8>, symbol: impl Into<String>) -> Self {
        Self {
            image,
            mime_type: "image/jpeg".to_string(),
            symbol: symbol.into(),
            filename: "image".to_string(),
            current_price: None,
            volatility: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_price(mut self, price: Option<f64>) -> Self {
        self.current_price = price;
        self
    }

    pub fn with_volatility(mut self, volatility: Option<VolatilityData>) -> Self {
        self.volatility = volatility;
        self
    }
}

pub struct ChartAnalysisOrchestrator {
    catalog: Arc<InstrumentCatalog>,
    provider: Arc<dyn VisionProvider>,
    composer: PromptComposer,
}

impl ChartAnalysisOrchestrator {
    pub fn new(
        catalog: Arc<InstrumentCatalog>,
        provider: Arc<dyn VisionProvider>,
        template_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            provider,
            composer: PromptComposer::new(template_path),
        }
    }

    /// Run the full pipeline. Every error is folded into [`AnalysisOutcome::Failure`].
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisOutcome {
        tracing::info!(
            "Starting chart analysis for {} ({}, price: {:?}, volatility: {})",
            request.symbol,
            request.filename,
            request.current_price,
            request.volatility.is_some()
        );

        match self.run(&request).await {
            Ok(report) => AnalysisOutcome::Success(Box::new(report)),
            Err(e) => {
                tracing::error!("Chart analysis failed for {}: {}", request.symbol, e);
                AnalysisOutcome::Failure(AnalysisFailure::new(
                    e.to_string(),
                    request.symbol.clone(),
                    request.filename.clone(),
                ))
            }
        }
    }

    async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
        let original = request.symbol.as_str();
        if original.trim().is_empty() {
            return Err(AnalysisError::MissingInput(
                "a symbol is required for chart analysis".to_string(),
            ));
        }
        if request.image.is_empty() {
            return Err(AnalysisError::MissingInput(
                "an image is required for chart analysis".to_string(),
            ));
        }

        // Phase 1: symbol resolution
        let resolved = resolve_symbol(original);
        let synonym_used = synonym(original);
        tracing::info!("Symbol \"{}\" resolved to \"{}\"", original, resolved);

        // Phase 2: database lookup, absence is only a warning
        let catalog = self.catalog.load();
        let instrument: Option<Instrument> =
            catalog.as_ref().and_then(|c| c.find(&resolved).cloned());
        if instrument.is_none() {
            tracing::warn!(
                "Symbol \"{}\" not found in database, continuing anyway",
                resolved
            );
        }

        // Phase 3: price determination
        let (price, price_source) = determine_price(request.current_price, instrument.as_ref())?;
        tracing::info!("Using price {} ({})", price, price_source.as_str());

        // Phase 4: inference
        let symbols_list = catalog
            .as_ref()
            .map(|c| c.format_for_prompt(DEFAULT_PROMPT_LIMIT))
            .unwrap_or_default();
        let prompt = self.composer.compose(&PromptContext {
            symbol: &resolved,
            price,
            symbols_list: &symbols_list,
            volatility: request.volatility.as_ref(),
        })?;

        let raw = self
            .provider
            .infer(&prompt, &request.image, &request.mime_type)
            .await
            .map_err(|e| AnalysisError::InferenceError(e.to_string()))?;
        tracing::info!("Model response received for {}", resolved);

        // Phase 5: validation
        let mut analysis = parse_analysis(&raw)?;
        require_structure(&analysis)?;
        enforce_symbol(&mut analysis, original);

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let model = self.provider.model_id().to_string();
        let snapshot = Value::Object(analysis.clone());

        // Phase 6 reads the same snapshot
        let phases = AnalysisPhases {
            phase_1_symbol_resolution: SymbolResolutionPhase::new(
                original,
                &resolved,
                synonym_used,
            ),
            phase_2_database_validation: DatabaseValidationPhase::new(
                &resolved,
                instrument.is_some(),
                catalog.as_ref().map(|c| c.shape().as_str()),
                catalog.as_ref().map(|c| c.len()).unwrap_or(0),
            ),
            phase_3_price_determination: PriceDeterminationPhase::new(
                price,
                price_source,
                price_source == PriceSource::Caller,
                instrument.as_ref().is_some_and(Instrument::has_price),
            ),
            phase_4_ai_analysis: AiAnalysisPhase::new(
                &model,
                &timestamp,
                request.volatility.is_some(),
            ),
            phase_5_result_validation: ResultValidationPhase::from_analysis(&snapshot),
            phase_6_elliott_wave_analysis: ElliottWavePhase::from_analysis(&snapshot),
        };

        let metadata = AnalysisMetadata {
            filename: request.filename.clone(),
            analysis_timestamp: timestamp,
            model_used: model,
            original_symbol: original.to_string(),
            resolved_symbol: resolved.clone(),
            selected_symbol: original.to_string(),
            price_source,
            price_used: price,
            synonym_mapping_used: original != resolved,
            analysis_version: ANALYSIS_VERSION,
        };

        let summary = AnalysisSummary {
            original_symbol: original.to_string(),
            resolved_symbol: resolved.clone(),
            synonym_used: original != resolved,
            total_phases: TOTAL_PHASES,
            phases_completed: TOTAL_PHASES,
            price_used: price,
            trading_direction: plan_field(&snapshot, "direction"),
            entry_price: plan_field(&snapshot, "entry_price"),
            elliott_wave_applicable: phases.phase_6_elliott_wave_analysis.elliott_wave_applicable,
            elliott_pattern: phases.phase_6_elliott_wave_analysis.pattern_type.clone(),
        };

        let confidence = truthy_field(&snapshot, "validation")
            .and_then(|v| truthy_field(v, "confidence"))
            .cloned()
            .unwrap_or(Value::from(DEFAULT_CONFIDENCE));

        attach_warnings(&mut analysis, original);
        analysis.insert("analysis_phases".to_string(), to_json(&phases)?);
        analysis.insert("metadata".to_string(), to_json(&metadata)?);

        tracing::info!(
            "Chart analysis completed for {}: {} {}",
            original,
            summary.trading_direction,
            summary.entry_price
        );

        Ok(AnalysisReport::new(
            Value::Object(analysis),
            original.to_string(),
            confidence,
            request.filename.clone(),
            summary,
        ))
    }
}

/// Caller price when present and non-zero, else the database bid/ask midpoint.
fn determine_price(
    caller_price: Option<f64>,
    instrument: Option<&Instrument>,
) -> Result<(f64, PriceSource), AnalysisError> {
    if let Some(price) = caller_price.filter(|p| *p != 0.0 && p.is_finite()) {
        return Ok((price, PriceSource::Caller));
    }

    instrument
        .and_then(Instrument::mid_price)
        .map(|mid| (mid, PriceSource::Catalog))
        .ok_or(AnalysisError::NoPriceAvailable)
}

fn plan_field(analysis: &Value, key: &str) -> Value {
    truthy_field(analysis, "trading_plan")
        .and_then(|plan| truthy_field(plan, key))
        .cloned()
        .unwrap_or_else(|| Value::from("N/A"))
}

/// Surface the model's coherence and risk findings at the top level.
fn attach_warnings(analysis: &mut Map<String, Value>, original: &str) {
    let Some(validation) = analysis.get("validation").filter(|v| is_truthy(v)).cloned() else {
        return;
    };

    if let Some(coherence) = truthy_field(&validation, "coherence_check") {
        let coherent = coherence.get("values_coherent").is_some_and(is_truthy);
        if !coherent {
            let issues: Vec<String> = coherence
                .get("issues_found")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .map(|i| match i {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            tracing::warn!("Incoherent values detected for {}: {:?}", original, issues);

            analysis.insert(
                "user_warning".to_string(),
                serde_json::json!({
                    "type": "coherence",
                    "message": format!(
                        "Values were adjusted to be coherent with {}. {}",
                        original,
                        issues.join(". ")
                    ),
                }),
            );
        }
    }

    if let Some(warnings) = validation
        .get("warnings")
        .filter(|w| w.as_array().is_some_and(|a| !a.is_empty()))
    {
        analysis.insert("risk_warnings".to_string(), warnings.clone());
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, AnalysisError> {
    serde_json::to_value(value).map_err(|e| AnalysisError::Unknown(e.to_string()))
}
