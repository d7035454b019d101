//! chart-analyst: analyze trading chart screenshots and look up instrument data.
//!
//! Usage:
//!   chart-analyst analyze chart.png btc --price 60005 --volatility vol.json
//!   chart-analyst quote EURUSD
//!   chart-analyst symbols --category crypto
//!   chart-analyst search gold
//!   chart-analyst validate XAUUSD

mod config;

use analysis_core::VolatilityData;
use analysis_orchestrator::{AnalysisRequest, ChartAnalysisOrchestrator, SymbolValidator};
use anyhow::{bail, Context, Result};
use config::AppConfig;
use inference_client::GeminiClient;
use instrument_catalog::InstrumentCatalog;
use market_data::MarketDataService;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        print_usage();
        std::process::exit(1);
    };

    let config = AppConfig::from_env()?;
    let catalog = Arc::new(InstrumentCatalog::new(
        config.symbols_path.clone(),
        config.catalog_reload,
    ));

    let output = match command {
        "analyze" => analyze(&config, catalog, &args[1..]).await?,
        "quote" => {
            let symbol = positional(&args[1..], 0, "symbol")?;
            let service = MarketDataService::from_config(&config.market_data)?;
            match service.get_market_data_with_fallback(symbol).await {
                Ok(quote) => serde_json::to_value(quote)?,
                Err(e) => {
                    tracing::error!("Error fetching market data for {}: {}", symbol, e);
                    print_json(&json!({
                        "error": "Failed to fetch market data",
                        "message": e.to_string(),
                        "symbol": symbol,
                    }))?;
                    std::process::exit(1);
                }
            }
        }
        "symbols" => {
            let category = flag_value(&args[1..], "--category");
            let loaded = catalog
                .load()
                .context("symbols database could not be loaded")?;
            match category {
                Some(category) => {
                    let symbols = loaded.by_category(category);
                    json!({ "symbols": symbols, "total": symbols.len(), "category": category })
                }
                None => json!({ "symbols": loaded.instruments(), "total": loaded.len() }),
            }
        }
        "search" => {
            let query = positional(&args[1..], 0, "query")?;
            let loaded = catalog
                .load()
                .context("symbols database could not be loaded")?;
            let symbols = loaded.search(query, None);
            json!({ "query": query, "symbols": symbols, "total": symbols.len() })
        }
        "validate" => {
            let symbol = positional(&args[1..], 0, "symbol")?;
            let quotes = Arc::new(MarketDataService::from_config(&config.market_data)?);
            let validator = SymbolValidator::new(catalog, quotes);
            serde_json::to_value(validator.validate(symbol).await)?
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    };

    print_json(&output)
}

async fn analyze(
    config: &AppConfig,
    catalog: Arc<InstrumentCatalog>,
    args: &[String],
) -> Result<Value> {
    let image_path = positional(args, 0, "image")?;
    let symbol = positional(args, 1, "symbol")?;

    let price = flag_value(args, "--price")
        .map(|p| p.parse::<f64>().with_context(|| format!("invalid --price value: {}", p)))
        .transpose()?;

    let volatility = match flag_value(args, "--volatility") {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read volatility file {}", path))?;
            Some(serde_json::from_str::<VolatilityData>(&raw).context("invalid volatility JSON")?)
        }
        None => None,
    };

    let image = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("failed to read image {}", image_path))?;
    let filename = Path::new(image_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();

    let provider = GeminiClient::new(&config.inference).context("GEMINI_API_KEY must be set")?;
    let orchestrator = ChartAnalysisOrchestrator::new(
        catalog,
        Arc::new(provider),
        config.prompt_template_path.clone(),
    );

    let request = AnalysisRequest::new(image, symbol)
        .with_mime_type(mime_type_for(image_path))
        .with_filename(filename)
        .with_price(price)
        .with_volatility(volatility);

    let outcome = orchestrator.analyze(request).await;
    Ok(serde_json::to_value(outcome)?)
}

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "chart_analyst=info,analysis_orchestrator=info,market_data=info".into()
        })
    };

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // Logs go to stderr so stdout stays valid JSON
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Nth argument that is neither a flag nor a flag's value
fn positional<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    let mut skip_next = false;
    let mut positionals = args.iter().filter(|a| {
        if skip_next {
            skip_next = false;
            return false;
        }
        if a.starts_with("--") {
            skip_next = true;
            return false;
        }
        true
    });

    match positionals.nth(index) {
        Some(value) => Ok(value.as_str()),
        None => bail!("missing <{}> argument", name),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn mime_type_for(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  chart-analyst analyze <image> <symbol> [--price P] [--volatility FILE]");
    eprintln!("  chart-analyst quote <symbol>          Cached quote, crypto alias fallback");
    eprintln!("  chart-analyst symbols [--category C]  List the symbols database");
    eprintln!("  chart-analyst search <query>          Search symbols by ticker or name");
    eprintln!("  chart-analyst validate <symbol>       Check a symbol against the database");
    eprintln!();
    eprintln!("Environment: GEMINI_API_KEY, SYMBOLS_PATH, PROMPT_TEMPLATE_PATH, CATALOG_RELOAD,");
    eprintln!("             MARKET_DATA_BASE_URL, QUOTE_CACHE_TTL_SECS, RUST_LOG, RUST_LOG_FORMAT");
}
