use anyhow::{Context, Result};
use inference_client::InferenceConfig;
use instrument_catalog::ReloadPolicy;
use market_data::MarketDataConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub symbols_path: PathBuf,
    pub prompt_template_path: PathBuf,
    pub catalog_reload: ReloadPolicy,
    pub inference: InferenceConfig,
    pub market_data: MarketDataConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Crate defaults, overridden by whichever variables `lookup` knows about
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let seconds = |key: &str| -> Result<Option<Duration>> {
            lookup(key)
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .map(Duration::from_secs)
                        .with_context(|| format!("{} must be a whole number of seconds", key))
                })
                .transpose()
        };

        let mut inference = InferenceConfig::default();
        inference.api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());
        if let Some(model) = lookup("GEMINI_MODEL") {
            inference.model = model;
        }
        if let Some(base_url) = lookup("GEMINI_BASE_URL") {
            inference.base_url = base_url;
        }
        if let Some(timeout) = seconds("INFERENCE_TIMEOUT_SECS")? {
            inference.timeout = timeout;
        }

        let mut market_data = MarketDataConfig::default();
        if let Some(base_url) = lookup("MARKET_DATA_BASE_URL") {
            market_data.base_url = base_url;
        }
        if let Some(ttl) = seconds("QUOTE_CACHE_TTL_SECS")? {
            market_data.cache_ttl = ttl;
        }

        Ok(Self {
            symbols_path: lookup("SYMBOLS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("symbols.json")),
            prompt_template_path: lookup("PROMPT_TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("prompt_unificado_analisis.md")),
            catalog_reload: lookup("CATALOG_RELOAD")
                .map(|v| ReloadPolicy::from_env_value(&v))
                .unwrap_or_default(),
            inference,
            market_data,
        })
    }
}
