use serde::{Deserialize, Serialize};

/// Instrument entry from the local symbols database.
///
/// Only `symbol` is required. Every other field tolerates null or a mistyped
/// value and falls back to unset, so one sloppy field never hides an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub bid: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub ask: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub digits: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub tick_size: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub blockchain: Option<String>,
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(opt_string(deserializer)?.unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// Finite numbers, either bare or written as a string
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(value.filter(|v| v.is_finite()))
    }

    /// Non-negative integers, accepting `5.0` as `5`
    pub fn whole_number<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u32>, D::Error> {
        Ok(number(deserializer)?
            .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX))
            .map(|v| v as u32))
    }
}

impl Instrument {
    /// Case-insensitive identity check
    pub fn matches_symbol(&self, symbol: &str) -> bool {
        self.symbol.eq_ignore_ascii_case(symbol)
    }

    /// Bid/ask midpoint, treating a missing side as zero.
    /// `None` when both sides are missing or zero.
    pub fn mid_price(&self) -> Option<f64> {
        let bid = self.bid.unwrap_or(0.0);
        let ask = self.ask.unwrap_or(0.0);
        if bid == 0.0 && ask == 0.0 {
            return None;
        }
        Some((bid + ask) / 2.0)
    }

    /// True when at least one side of the book is quoted
    pub fn has_price(&self) -> bool {
        self.bid.is_some_and(|b| b != 0.0) || self.ask.is_some_and(|a| a != 0.0)
    }

    /// Digits with zero treated as unset
    pub fn digits_or(&self, default: u32) -> u32 {
        match self.digits {
            Some(d) if d > 0 => d,
            _ => default,
        }
    }
}

/// Normalized live quote for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub symbol: String,
    pub yahoo_symbol: String,
    pub price: f64,
    pub bid: f64,
    pub ask: f64,
    pub change: f64,
    pub change_percent: f64,
    pub digits: u32,
    pub spread: f64,
    pub tick_size: f64,
    /// Epoch milliseconds at which the record was produced
    pub timestamp: i64,
    pub currency: String,
    pub market_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_used: Option<bool>,
}

/// Volatility snapshot supplied by the caller alongside a chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolatilityData {
    /// Annualized volatility in percent
    #[serde(default)]
    pub annualized: Option<f64>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub atr_percentage: Option<f64>,
    #[serde(default)]
    pub recommended_stop_distance: Option<f64>,
    #[serde(default)]
    pub recommended_entry_distance: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_deserializes_camel_case() {
        let json = r#"{"symbol":"EURUSD","name":"Euro vs US Dollar","category":"forex","bid":1.085,"ask":1.0852,"digits":5,"tickSize":0.00001}"#;
        let inst: Instrument = serde_json::from_str(json).unwrap();
        assert_eq!(inst.symbol, "EURUSD");
        assert_eq!(inst.tick_size, Some(0.00001));
        assert_eq!(inst.digits, Some(5));
        assert!(inst.blockchain.is_none());
    }

    #[test]
    fn test_instrument_tolerates_null_and_mistyped_fields() {
        let json = r#"{"symbol":"BTCUSD","name":null,"category":7,"bid":60000,"ask":"60010","digits":5.0,"tickSize":"n/a","blockchain":null}"#;
        let inst: Instrument = serde_json::from_str(json).unwrap();

        assert_eq!(inst.symbol, "BTCUSD");
        assert_eq!(inst.name, "");
        assert_eq!(inst.category, "");
        assert_eq!(inst.bid, Some(60000.0));
        assert_eq!(inst.ask, Some(60010.0));
        assert_eq!(inst.digits, Some(5));
        assert_eq!(inst.tick_size, None);
        assert_eq!(inst.blockchain, None);
        assert_eq!(inst.mid_price(), Some(60005.0));
    }

    #[test]
    fn test_instrument_rejects_fractional_digits() {
        let inst: Instrument =
            serde_json::from_str(r#"{"symbol":"EURUSD","digits":4.5}"#).unwrap();
        assert_eq!(inst.digits, None);
        assert_eq!(inst.digits_or(5), 5);

        let negative: Instrument =
            serde_json::from_str(r#"{"symbol":"EURUSD","digits":-2}"#).unwrap();
        assert_eq!(negative.digits, None);
    }

    #[test]
    fn test_mid_price() {
        let inst = Instrument {
            symbol: "BTCUSD".to_string(),
            name: "Bitcoin".to_string(),
            category: "crypto".to_string(),
            bid: Some(60000.0),
            ask: Some(60010.0),
            digits: None,
            tick_size: None,
            blockchain: None,
        };
        assert_eq!(inst.mid_price(), Some(60005.0));
        assert!(inst.matches_symbol("btcusd"));

        let unpriced = Instrument { bid: None, ask: None, ..inst };
        assert_eq!(unpriced.mid_price(), None);
        assert!(!unpriced.has_price());
    }

    #[test]
    fn test_quote_record_omits_fallback_fields() {
        let quote = QuoteRecord {
            symbol: "EURUSD".to_string(),
            yahoo_symbol: "EURUSD=X".to_string(),
            price: 1.1,
            bid: 1.09999,
            ask: 1.10001,
            change: 0.0,
            change_percent: 0.0,
            digits: 5,
            spread: 0.00002,
            tick_size: 0.00001,
            timestamp: 0,
            currency: "USD".to_string(),
            market_state: "REGULAR".to_string(),
            original_symbol: None,
            fallback_used: None,
        };
        let value = serde_json::to_value(&quote).unwrap();
        assert_eq!(value["yahooSymbol"], "EURUSD=X");
        assert_eq!(value["marketState"], "REGULAR");
        assert!(value.get("fallbackUsed").is_none());
    }
}
