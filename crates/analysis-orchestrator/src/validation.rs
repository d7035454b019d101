//! Parsing and shape checks for the model's raw text output.

use analysis_core::AnalysisError;
use serde_json::{Map, Value};

/// Keys every analysis must carry with a truthy value
const REQUIRED_KEYS: [&str; 3] = ["symbol", "trading_plan", "technical_analysis"];

/// Strip a surrounding ```` ```json ```` (or bare ```` ``` ````) fence.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();

    let without_open = if trimmed
        .get(..7)
        .is_some_and(|open| open.eq_ignore_ascii_case("```json"))
    {
        &trimmed[7..]
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };

    let body = without_open.trim_start();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// JSON truthiness: null, false, 0, NaN and "" are falsy; every object and array is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `value[key]` when it exists and is truthy
pub fn truthy_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| is_truthy(v))
}

/// Parse cleaned model output into a JSON object.
pub fn parse_analysis(raw: &str) -> Result<Map<String, Value>, AnalysisError> {
    let cleaned = strip_code_fences(raw);

    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AnalysisError::UnexpectedStructure(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        ))),
        Err(e) => Err(AnalysisError::ParseError(e.to_string())),
    }
}

pub fn require_structure(analysis: &Map<String, Value>) -> Result<(), AnalysisError> {
    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !analysis.get(*key).is_some_and(is_truthy))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::UnexpectedStructure(format!(
            "missing {}",
            missing.join(", ")
        )))
    }
}

/// The caller's symbol is authoritative: overwrite whatever the model echoed.
pub fn enforce_symbol(analysis: &mut Map<String, Value>, original_symbol: &str) {
    analysis.insert("symbol".to_string(), Value::String(original_symbol.to_string()));

    if let Some(Value::Object(plan)) = analysis.get_mut("trading_plan") {
        plan.insert("symbol".to_string(), Value::String(original_symbol.to_string()));
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
