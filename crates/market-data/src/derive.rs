//! Fields derived from a single reference price.
//!
//! Digits follow [`analysis_core::classify`] precedence (JPY pair, forex, crypto,
//! index, commodity). Spread checks forex before anything else and does not give
//! yen symbols their own branch, so `BTCJPY` gets 3 digits but a crypto spread.

use analysis_core::{
    classify, is_commodity, is_crypto, is_forex_pair, is_index, AssetClass, QuoteRecord,
};
use serde::Deserialize;

/// `chart.result[0].meta` block of the chart response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub previous_close: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub market_state: Option<String>,
}

pub fn determine_digits(price: f64, symbol: &str) -> u32 {
    let upper = symbol.to_uppercase();

    match classify(&upper) {
        AssetClass::JpyPair => 3,
        AssetClass::Forex => 5,
        AssetClass::Crypto => {
            if price >= 1000.0 {
                2
            } else if price >= 10.0 {
                3
            } else if price >= 1.0 {
                4
            } else {
                8
            }
        }
        AssetClass::Index => 2,
        AssetClass::Commodity => {
            if upper.contains("XAU") || upper.contains("GC") {
                2
            } else if upper.contains("XAG") || upper.contains("SI") {
                3
            } else {
                2
            }
        }
        AssetClass::Other => 5,
    }
}

fn tick_size(digits: u32) -> f64 {
    10f64.powi(-(digits as i32))
}

/// Simulated spread in price units
pub fn calculate_spread(price: f64, symbol: &str) -> f64 {
    let upper = symbol.to_uppercase();
    let tick = tick_size(determine_digits(price, &upper));

    if is_forex_pair(&upper) {
        return if upper.contains("EUR") || upper.contains("GBP") {
            2.0 * tick
        } else if upper.contains("JPY") {
            3.0 * tick
        } else if upper.contains("AUD") || upper.contains("CAD") {
            4.0 * tick
        } else {
            5.0 * tick
        };
    }

    if is_crypto(&upper) {
        return price * 0.001;
    }

    if is_index(&upper) {
        return price * 0.0001;
    }

    if is_commodity(&upper) {
        return if upper.contains("XAU") {
            0.5
        } else if upper.contains("XAG") {
            0.02
        } else {
            price * 0.0005
        };
    }

    5.0 * tick
}

/// Build a normalized quote from the provider's meta block.
///
/// `symbol` is the symbol as requested; derivations classify that symbol, not the
/// provider's.
pub fn build_quote(
    symbol: &str,
    provider_symbol: &str,
    meta: &ChartMeta,
    now_ms: i64,
) -> QuoteRecord {
    let price = meta.regular_market_price.filter(|p| *p != 0.0).unwrap_or(0.0);
    let previous_close = meta
        .previous_close
        .filter(|p| *p != 0.0)
        .unwrap_or(price);

    let digits = determine_digits(price, symbol);
    let spread = calculate_spread(price, symbol);

    let change_percent = if previous_close != 0.0 {
        (price - previous_close) / previous_close * 100.0
    } else {
        0.0
    };

    QuoteRecord {
        symbol: symbol.to_string(),
        yahoo_symbol: meta
            .symbol
            .clone()
            .unwrap_or_else(|| provider_symbol.to_string()),
        price,
        bid: price - spread / 2.0,
        ask: price + spread / 2.0,
        change: price - previous_close,
        change_percent,
        digits,
        spread,
        tick_size: tick_size(digits),
        timestamp: now_ms,
        currency: meta.currency.clone().unwrap_or_else(|| "USD".to_string()),
        market_state: meta
            .market_state
            .clone()
            .unwrap_or_else(|| "CLOSED".to_string()),
        original_symbol: None,
        fallback_used: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_digits_by_asset_class() {
        assert_eq!(determine_digits(150.0, "USDJPY"), 3);
        assert_eq!(determine_digits(1.1, "EURUSD"), 5);
        assert_eq!(determine_digits(60000.0, "BTCUSD"), 2);
        assert_eq!(determine_digits(150.0, "LTCUSD"), 3);
        assert_eq!(determine_digits(2.5, "XRPUSD"), 4);
        assert_eq!(determine_digits(0.4, "ADAUSD"), 8);
        assert_eq!(determine_digits(5000.0, "SPX"), 2);
        assert_eq!(determine_digits(2300.0, "XAUUSD"), 2);
        assert_eq!(determine_digits(28.0, "XAGUSD"), 3);
        assert_eq!(determine_digits(80.0, "OIL"), 2);
        assert_eq!(determine_digits(180.0, "AAPL"), 5);
    }

    #[test]
    fn test_spread_by_asset_class() {
        assert!(approx(calculate_spread(1.1, "EURUSD"), 0.00002));
        assert!(approx(calculate_spread(150.0, "USDJPY"), 0.003));
        assert!(approx(calculate_spread(0.66, "AUDUSD"), 0.00004));
        assert!(approx(calculate_spread(0.9, "USDCHF"), 0.00005));
        assert!(approx(calculate_spread(60000.0, "BTCUSD"), 60.0));
        assert!(approx(calculate_spread(5000.0, "SPX"), 0.5));
        assert!(approx(calculate_spread(2300.0, "XAUUSD"), 0.5));
        assert!(approx(calculate_spread(28.0, "XAGUSD"), 0.02));
        assert!(approx(calculate_spread(80.0, "OIL"), 0.04));
        assert!(approx(calculate_spread(180.0, "AAPL"), 0.00005));
    }

    #[test]
    fn test_yen_crypto_cross_uses_crypto_spread() {
        assert_eq!(determine_digits(9_000_000.0, "BTCJPY"), 3);
        assert!(approx(calculate_spread(9_000_000.0, "BTCJPY"), 9000.0));
    }

    #[test]
    fn test_build_quote() {
        let meta = ChartMeta {
            symbol: Some("EURUSD=X".to_string()),
            regular_market_price: Some(1.1),
            previous_close: Some(1.0),
            currency: None,
            market_state: Some("REGULAR".to_string()),
        };
        let quote = build_quote("EURUSD", "EURUSD=X", &meta, 1_700_000_000_000);

        assert_eq!(quote.yahoo_symbol, "EURUSD=X");
        assert!(approx(quote.change, 0.1));
        assert!(approx(quote.change_percent, 10.0));
        assert_eq!(quote.digits, 5);
        assert!(approx(quote.tick_size, 0.00001));
        assert!(approx(quote.bid, 1.1 - 0.00001));
        assert!(approx(quote.ask, 1.1 + 0.00001));
        assert_eq!(quote.currency, "USD");
        assert_eq!(quote.market_state, "REGULAR");
        assert_eq!(quote.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_build_quote_guards_zero_previous_close() {
        let meta = ChartMeta::default();
        let quote = build_quote("XYZ", "XYZ=X", &meta, 0);

        assert_eq!(quote.price, 0.0);
        assert_eq!(quote.change, 0.0);
        assert_eq!(quote.change_percent, 0.0);
        assert_eq!(quote.yahoo_symbol, "XYZ=X");
        assert_eq!(quote.market_state, "CLOSED");
    }
}
