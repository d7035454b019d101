use analysis_core::{expected_range, Instrument};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Instruments listed in the prompt inventory by default
pub const DEFAULT_PROMPT_LIMIT: usize = 50;
const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read symbols file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse symbols file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The two accepted on-disk layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Grouped { categories: serde_json::Map<String, Value> },
    Flat(Vec<Value>),
    Unrecognized(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogShape {
    Categories,
    FlatArray,
}

impl CatalogShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogShape::Categories => "categories",
            CatalogShape::FlatArray => "flat_array",
        }
    }
}

/// Normalized instrument list, in file order (categories first-to-last, then symbol order).
#[derive(Debug, Clone)]
pub struct Catalog {
    shape: CatalogShape,
    instruments: Vec<Instrument>,
}

impl Catalog {
    pub fn new(shape: CatalogShape, instruments: Vec<Instrument>) -> Self {
        Self { shape, instruments }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        Ok(Self::from_document(document))
    }

    fn from_document(document: CatalogDocument) -> Self {
        match document {
            CatalogDocument::Grouped { categories } => {
                let instruments = categories
                    .into_iter()
                    .filter_map(|(_, mut group)| match group.get_mut("symbols").map(Value::take) {
                        Some(Value::Array(entries)) => Some(entries),
                        _ => None,
                    })
                    .flatten()
                    .filter_map(parse_entry)
                    .collect();
                Self::new(CatalogShape::Categories, instruments)
            }
            CatalogDocument::Flat(entries) => Self::new(
                CatalogShape::FlatArray,
                entries.into_iter().filter_map(parse_entry).collect(),
            ),
            CatalogDocument::Unrecognized(_) => {
                tracing::warn!(
                    "Symbols file is neither a category map nor a flat list; treating as empty"
                );
                Self::new(CatalogShape::FlatArray, Vec::new())
            }
        }
    }

    pub fn shape(&self) -> CatalogShape {
        self.shape
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Exact, case-insensitive symbol lookup
    pub fn find(&self, symbol: &str) -> Option<&Instrument> {
        if symbol.is_empty() {
            return None;
        }
        self.instruments.iter().find(|i| i.matches_symbol(symbol))
    }

    /// Symbol match first, then a name substring match (used by symbol validation)
    pub fn find_by_symbol_or_name(&self, query: &str) -> Option<&Instrument> {
        let query_lower = query.to_lowercase();
        self.instruments.iter().find(|i| {
            i.matches_symbol(query) || i.name.to_lowercase().contains(&query_lower)
        })
    }

    pub fn by_category(&self, category: &str) -> Vec<&Instrument> {
        self.instruments
            .iter()
            .filter(|i| i.category == category)
            .collect()
    }

    /// Case-insensitive substring search over symbol and name
    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<&Instrument> {
        let query_lower = query.to_lowercase();
        self.instruments
            .iter()
            .filter(|i| {
                i.symbol.to_lowercase().contains(&query_lower)
                    || i.name.to_lowercase().contains(&query_lower)
            })
            .take(limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .collect()
    }

    /// Compact inventory of the first `limit` instruments for grounding the prompt
    pub fn format_for_prompt(&self, limit: usize) -> String {
        self.instruments
            .iter()
            .take(limit)
            .map(format_instrument)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn parse_entry(entry: Value) -> Option<Instrument> {
    let has_symbol = entry
        .get("symbol")
        .and_then(|s| s.as_str())
        .is_some_and(|s| !s.is_empty());
    if !has_symbol {
        return None;
    }
    match serde_json::from_value::<Instrument>(entry) {
        Ok(instrument) => Some(instrument),
        Err(e) => {
            tracing::debug!("Skipping malformed instrument entry: {}", e);
            None
        }
    }
}

fn format_instrument(instrument: &Instrument) -> String {
    let price_range = match (non_zero(instrument.bid), non_zero(instrument.ask)) {
        (Some(bid), Some(ask)) => format!("{} - {}", bid, ask),
        (Some(p), None) | (None, Some(p)) => p.to_string(),
        (None, None) => "N/A".to_string(),
    };

    // Network name for tokens, otherwise the ticker itself
    let asset_name = instrument
        .blockchain
        .as_deref()
        .filter(|b| !b.is_empty())
        .unwrap_or(instrument.symbol.as_str());

    let category = if instrument.category.is_empty() {
        "N/A"
    } else {
        instrument.category.as_str()
    };

    let digits = instrument
        .digits
        .filter(|d| *d > 0)
        .map(|d| d.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let tick_size = non_zero(instrument.tick_size)
        .map(|t| t.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "- {}: {}\n  * Category: {}\n  * Current price: {}\n  * Expected range: {}\n  \
         * Digits: {}, Tick size: {}",
        instrument.symbol,
        asset_name,
        category,
        price_range,
        expected_range(instrument),
        digits,
        tick_size
    )
}

fn non_zero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

/// When the symbols file is re-read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReloadPolicy {
    /// Re-read and re-parse on every access so edits to the file apply immediately
    #[default]
    EveryCall,
    /// Parse once and reuse until [`InstrumentCatalog::invalidate`] is called
    Cached,
}

impl ReloadPolicy {
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "cached" | "cache" => ReloadPolicy::Cached,
            _ => ReloadPolicy::EveryCall,
        }
    }
}

/// Owner of the symbols file location and (optionally) its parsed contents
pub struct InstrumentCatalog {
    path: PathBuf,
    policy: ReloadPolicy,
    cached: RwLock<Option<Arc<Catalog>>>,
}

impl InstrumentCatalog {
    pub fn new(path: impl Into<PathBuf>, policy: ReloadPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            cached: RwLock::new(None),
        }
    }

    /// Load the catalog, failing soft.
    ///
    /// `None` means no catalog is available; callers carry on without one.
    pub fn load(&self) -> Option<Arc<Catalog>> {
        if self.policy == ReloadPolicy::Cached {
            let guard = self.cached.read().unwrap_or_else(|p| p.into_inner());
            if let Some(catalog) = guard.as_ref() {
                return Some(Arc::clone(catalog));
            }
        }

        match self.read_from_disk() {
            Ok(catalog) => {
                let catalog = Arc::new(catalog);
                tracing::debug!(
                    "Loaded {} instruments from {} ({})",
                    catalog.len(),
                    self.path.display(),
                    catalog.shape().as_str()
                );
                if self.policy == ReloadPolicy::Cached {
                    let mut guard = self.cached.write().unwrap_or_else(|p| p.into_inner());
                    *guard = Some(Arc::clone(&catalog));
                }
                Some(catalog)
            }
            Err(e) => {
                tracing::error!("Error reading symbols database: {}", e);
                None
            }
        }
    }

    /// Drop the parsed copy so the next `load` re-reads the file
    pub fn invalidate(&self) {
        let mut guard = self.cached.write().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }

    fn read_from_disk(&self) -> Result<Catalog, CatalogError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        Catalog::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FLAT: &str = r#"[
        {"symbol": "EURUSD", "name": "Euro vs US Dollar", "category": "forex", "bid": 1.085, "ask": 1.0852, "digits": 5, "tickSize": 0.00001},
        {"symbol": "BTCUSD", "name": "Bitcoin - Crypto", "category": "crypto", "bid": 60000, "ask": 60010, "digits": 2, "tickSize": 0.01}
    ]"#;

    const GROUPED: &str = r#"{
        "categories": {
            "forex": {"symbols": [
                {"symbol": "EURUSD", "name": "Euro vs US Dollar", "category": "forex", "bid": 1.085, "ask": 1.0852, "digits": 5, "tickSize": 0.00001}
            ]},
            "crypto": {"symbols": [
                {"symbol": "BTCUSD", "name": "Bitcoin - Crypto", "category": "crypto", "bid": 60000, "ask": 60010, "digits": 2, "tickSize": 0.01}
            ]}
        }
    }"#;

    #[test]
    fn test_find_identical_across_shapes() {
        let flat = Catalog::from_json_str(FLAT).unwrap();
        let grouped = Catalog::from_json_str(GROUPED).unwrap();

        assert_eq!(flat.shape(), CatalogShape::FlatArray);
        assert_eq!(grouped.shape(), CatalogShape::Categories);

        for symbol in ["EURUSD", "btcusd", "BtcUsd"] {
            let a = flat.find(symbol).unwrap();
            let b = grouped.find(symbol).unwrap();
            assert_eq!(a, b);
        }
        assert!(flat.find("XAUUSD").is_none());
        assert!(grouped.find("XAUUSD").is_none());
        // No fuzzy matching
        assert!(flat.find("BTC").is_none());
    }

    #[test]
    fn test_grouped_order_preserved() {
        let grouped = Catalog::from_json_str(GROUPED).unwrap();
        let symbols: Vec<&str> = grouped.instruments().iter().map(|i| i.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["EURUSD", "BTCUSD"]);
    }

    #[test]
    fn test_entries_without_symbol_skipped() {
        let catalog = Catalog::from_json_str(r#"[{"name": "nameless"}, {"symbol": "XAUUSD"}]"#).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.instruments()[0].symbol, "XAUUSD");
    }

    #[test]
    fn test_format_for_prompt() {
        let catalog = Catalog::from_json_str(FLAT).unwrap();
        let text = catalog.format_for_prompt(DEFAULT_PROMPT_LIMIT);

        assert!(text.starts_with("- EURUSD: EURUSD\n"));
        assert!(text.contains("* Current price: 60000 - 60010"));
        assert!(text.contains("- BTCUSD: BTCUSD\n"));
        assert!(text.contains("* Expected range: 57005 - 63005"));
        assert!(text.contains("* Digits: 5, Tick size: 0.00001"));

        let limited = catalog.format_for_prompt(1);
        assert!(!limited.contains("BTCUSD"));
        assert_eq!(Catalog::new(CatalogShape::FlatArray, Vec::new()).format_for_prompt(50), "");
    }

    #[test]
    fn test_format_for_prompt_prefers_blockchain() {
        let catalog = Catalog::from_json_str(
            r#"[{"symbol": "USDTUSD", "name": "Tether - Stablecoin", "blockchain": "Ethereum"},
                {"symbol": "XAUUSD", "name": "Gold Spot", "blockchain": ""}]"#,
        )
        .unwrap();
        let text = catalog.format_for_prompt(DEFAULT_PROMPT_LIMIT);

        assert!(text.starts_with("- USDTUSD: Ethereum\n"));
        assert!(text.contains("- XAUUSD: XAUUSD\n"));
        assert!(text.contains("* Current price: N/A"));
    }

    #[test]
    fn test_entries_with_null_or_mistyped_fields_kept() {
        let catalog = Catalog::from_json_str(
            r#"[{"symbol": "BTCUSD", "name": null, "category": null, "bid": 60000, "ask": 60010},
                {"symbol": "EURUSD", "name": "Euro", "digits": 5.0, "bid": 1.085, "ask": 1.0852}]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);

        let btc = catalog.find("BTCUSD").unwrap();
        assert_eq!(btc.name, "");
        assert_eq!(btc.mid_price(), Some(60005.0));

        let eur = catalog.find("eurusd").unwrap();
        assert_eq!(eur.digits, Some(5));
        assert!(catalog.format_for_prompt(DEFAULT_PROMPT_LIMIT).contains("* Category: N/A"));
    }

    #[test]
    fn test_search_and_category_filter() {
        let catalog = Catalog::from_json_str(FLAT).unwrap();
        assert_eq!(catalog.search("bit", None).len(), 1);
        assert_eq!(catalog.search("usd", Some(1)).len(), 1);
        assert_eq!(catalog.by_category("forex").len(), 1);
        assert!(catalog.by_category("indices").is_empty());
        assert_eq!(catalog.find_by_symbol_or_name("euro").unwrap().symbol, "EURUSD");
    }

    #[test]
    fn test_load_fails_soft() {
        let catalog = InstrumentCatalog::new("/nonexistent/symbols.json", ReloadPolicy::EveryCall);
        assert!(catalog.load().is_none());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let catalog = InstrumentCatalog::new(file.path(), ReloadPolicy::EveryCall);
        assert!(catalog.load().is_none());
    }

    #[test]
    fn test_reload_policies() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", FLAT).unwrap();

        let every_call = InstrumentCatalog::new(file.path(), ReloadPolicy::EveryCall);
        let cached = InstrumentCatalog::new(file.path(), ReloadPolicy::Cached);
        assert_eq!(every_call.load().unwrap().len(), 2);
        assert_eq!(cached.load().unwrap().len(), 2);

        std::fs::write(file.path(), r#"[{"symbol": "XAUUSD"}]"#).unwrap();

        assert_eq!(every_call.load().unwrap().len(), 1);
        assert_eq!(cached.load().unwrap().len(), 2);

        cached.invalidate();
        assert_eq!(cached.load().unwrap().len(), 1);
    }

    #[test]
    fn test_reload_policy_from_env_value() {
        assert_eq!(ReloadPolicy::from_env_value("cached"), ReloadPolicy::Cached);
        assert_eq!(ReloadPolicy::from_env_value("every_call"), ReloadPolicy::EveryCall);
        assert_eq!(ReloadPolicy::from_env_value(""), ReloadPolicy::EveryCall);
    }
}
