//! Asset-class heuristics over canonical symbols.
//!
//! Classification is substring based, so a symbol can satisfy several predicates
//! (`EURJPY` is both a JPY pair and a forex pair, `BTCUSD` starts with no currency
//! code but contains `BTC`). [`classify`] resolves the ambiguity with a fixed
//! precedence:
//!
//! 1. JPY pair
//! 2. forex pair
//! 3. crypto
//! 4. index
//! 5. commodity
//! 6. other
//!
//! Digit and spread derivation in `market-data` and the prompt range hints both go
//! through this module so that the precedence lives in one place.

use serde::{Deserialize, Serialize};

use crate::Instrument;

const FOREX_CURRENCIES: &[&str] = &["EUR", "GBP", "USD", "JPY", "CHF", "CAD", "AUD", "NZD"];
const CRYPTO_CODES: &[&str] = &["BTC", "ETH", "LTC", "XRP", "ADA", "DOT", "LINK", "BCH"];
const INDEX_CODES: &[&str] = &["SPX", "NASDAQ", "DOW", "FTSE", "DAX", "NIKKEI"];
/// Spot codes plus the provider's futures roots (GC, SI, CL, NG)
const COMMODITY_CODES: &[&str] = &["XAU", "XAG", "OIL", "GAS", "GC", "SI", "CL", "NG"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Forex pair quoted in yen
    JpyPair,
    Forex,
    Crypto,
    Index,
    Commodity,
    Other,
}

pub fn is_jpy_pair(symbol: &str) -> bool {
    symbol.to_uppercase().contains("JPY")
}

/// Starts with a currency code and ends with a different currency code.
pub fn is_forex_pair(symbol: &str) -> bool {
    let symbol = symbol.to_uppercase();
    FOREX_CURRENCIES.iter().any(|c| symbol.starts_with(c))
        && FOREX_CURRENCIES
            .iter()
            .any(|c| symbol.ends_with(c) && !symbol.starts_with(c))
}

pub fn is_crypto(symbol: &str) -> bool {
    let symbol = symbol.to_uppercase();
    CRYPTO_CODES.iter().any(|c| symbol.contains(c))
}

pub fn is_index(symbol: &str) -> bool {
    let symbol = symbol.to_uppercase();
    INDEX_CODES.iter().any(|c| symbol.contains(c)) || symbol.starts_with('^')
}

pub fn is_commodity(symbol: &str) -> bool {
    let symbol = symbol.to_uppercase();
    COMMODITY_CODES.iter().any(|c| symbol.contains(c))
}

/// Classify a symbol using the fixed precedence documented at module level.
pub fn classify(symbol: &str) -> AssetClass {
    if is_jpy_pair(symbol) {
        AssetClass::JpyPair
    } else if is_forex_pair(symbol) {
        AssetClass::Forex
    } else if is_crypto(symbol) {
        AssetClass::Crypto
    } else if is_index(symbol) {
        AssetClass::Index
    } else if is_commodity(symbol) {
        AssetClass::Commodity
    } else {
        AssetClass::Other
    }
}

/// Advisory price band around the instrument's mid price, used only as prompt text.
///
/// Keyword order here differs from [`classify`]: cross pairs such as `EURJPY`
/// take the major-currency band before the yen band.
pub fn expected_range(instrument: &Instrument) -> String {
    let (bid, ask) = match (instrument.bid, instrument.ask) {
        (Some(b), Some(a)) if b != 0.0 && a != 0.0 => (b, a),
        _ => return "N/A".to_string(),
    };

    let mid = (bid + ask) / 2.0;
    let s = instrument.symbol.to_lowercase();
    let digits = instrument.digits_or(4) as usize;
    let has = |keys: &[&str]| keys.iter().any(|k| s.contains(k));

    if has(&["eur", "gbp", "aud", "chf", "cad", "nzd"]) {
        if mid > 50.0 {
            rounded_band(mid, 0.01)
        } else if mid > 10.0 {
            fixed_band(mid, 0.01, digits)
        } else {
            fixed_band(mid, 0.02, digits)
        }
    } else if has(&["jpy"]) {
        fixed_band(mid, 0.01, 2)
    } else if has(&["btc", "bitcoin", "eth", "ethereum"]) {
        rounded_band(mid, 0.05)
    } else if has(&["xau", "gold"]) {
        rounded_band(mid, 0.02)
    } else if has(&["usoil", "oil"]) {
        fixed_band(mid, 0.05, 2)
    } else if has(&["sp500", "nasdaq", "dow", "indice"]) {
        rounded_band(mid, 0.02)
    } else if mid > 1000.0 {
        rounded_band(mid, 0.05)
    } else if mid > 100.0 {
        fixed_band(mid, 0.05, 2)
    } else {
        fixed_band(mid, 0.10, digits)
    }
}

fn rounded_band(mid: f64, pct: f64) -> String {
    format!(
        "{:.0} - {:.0}",
        (mid * (1.0 - pct)).round(),
        (mid * (1.0 + pct)).round()
    )
}

fn fixed_band(mid: f64, pct: f64, decimals: usize) -> String {
    format!(
        "{:.*} - {:.*}",
        decimals,
        mid * (1.0 - pct),
        decimals,
        mid * (1.0 + pct)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument(symbol: &str, bid: f64, ask: f64, digits: Option<u32>) -> Instrument {
        Instrument {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            category: "test".to_string(),
            bid: Some(bid),
            ask: Some(ask),
            digits,
            tick_size: None,
            blockchain: None,
        }
    }

    #[test]
    fn test_forex_pair_detection() {
        assert!(is_forex_pair("EURUSD"));
        assert!(is_forex_pair("usdjpy"));
        assert!(!is_forex_pair("BTCUSD"));
        // Same code on both ends is not a pair
        assert!(!is_forex_pair("USDUSD"));
    }

    #[test]
    fn test_classify_precedence() {
        assert_eq!(classify("USDJPY"), AssetClass::JpyPair);
        assert_eq!(classify("EURJPY"), AssetClass::JpyPair);
        assert_eq!(classify("GBPUSD"), AssetClass::Forex);
        assert_eq!(classify("BTCUSD"), AssetClass::Crypto);
        assert_eq!(classify("ETH-USD"), AssetClass::Crypto);
        assert_eq!(classify("^GSPC"), AssetClass::Index);
        assert_eq!(classify("NASDAQ"), AssetClass::Index);
        assert_eq!(classify("XAUUSD"), AssetClass::Commodity);
        assert_eq!(classify("NATGAS"), AssetClass::Commodity);
        assert_eq!(classify("AAPL"), AssetClass::Other);
    }

    #[test]
    fn test_overlapping_keywords_follow_precedence() {
        // "DOT" (crypto) appears inside "DOTDOW" but crypto outranks index
        assert_eq!(classify("DOTDOW"), AssetClass::Crypto);
        // "GC" futures root inside a forex-shaped string still resolves as forex
        assert_eq!(classify("EURGCUSD"), AssetClass::Forex);
    }

    #[test]
    fn test_expected_range_missing_quote() {
        let mut inst = instrument("EURUSD", 1.0, 1.0, None);
        inst.ask = None;
        assert_eq!(expected_range(&inst), "N/A");
    }

    #[test]
    fn test_expected_range_forex() {
        let inst = instrument("EURUSD", 1.1, 1.1, Some(5));
        assert_eq!(expected_range(&inst), "1.07800 - 1.12200");
    }

    #[test]
    fn test_expected_range_jpy_and_crypto() {
        let jpy = instrument("USDJPY", 150.0, 150.0, Some(3));
        assert_eq!(expected_range(&jpy), "148.50 - 151.50");

        let btc = instrument("BTCUSD", 60000.0, 60010.0, Some(2));
        assert_eq!(expected_range(&btc), "57005 - 63005");
    }

    #[test]
    fn test_expected_range_generic_buckets() {
        let large = instrument("AAPL", 2000.0, 2000.0, None);
        assert_eq!(expected_range(&large), "1900 - 2100");

        let mid = instrument("AAPL", 200.0, 200.0, None);
        assert_eq!(expected_range(&mid), "190.00 - 210.00");

        let small = instrument("AAPL", 10.0, 10.0, None);
        assert_eq!(expected_range(&small), "9.0000 - 11.0000");
    }
}
