/// Canonical symbol to Yahoo Finance symbol
const PROVIDER_SYMBOLS: &[(&str, &str)] = &[
    // Forex
    ("EURUSD", "EURUSD=X"),
    ("GBPUSD", "GBPUSD=X"),
    ("USDJPY", "USDJPY=X"),
    ("USDCHF", "USDCHF=X"),
    ("AUDUSD", "AUDUSD=X"),
    ("USDCAD", "USDCAD=X"),
    ("NZDUSD", "NZDUSD=X"),
    ("EURGBP", "EURGBP=X"),
    ("EURJPY", "EURJPY=X"),
    ("GBPJPY", "GBPJPY=X"),
    ("EURCHF", "EURCHF=X"),
    ("EURCAD", "EURCAD=X"),
    ("EURAUD", "EURAUD=X"),
    ("AUDCAD", "AUDCAD=X"),
    ("AUDJPY", "AUDJPY=X"),
    ("CADJPY", "CADJPY=X"),
    ("CHFJPY", "CHFJPY=X"),
    ("NZDJPY", "NZDJPY=X"),
    // Metals and energy futures
    ("XAUUSD", "GC=F"),
    ("XAGUSD", "SI=F"),
    ("OIL", "CL=F"),
    ("NATGAS", "NG=F"),
    // Indices
    ("SPX", "^GSPC"),
    ("NASDAQ", "^IXIC"),
    ("DOW", "^DJI"),
    ("FTSE", "^FTSE"),
    ("DAX", "^GDAXI"),
    ("NIKKEI", "^N225"),
    // Crypto
    ("BTCUSD", "BTC-USD"),
    ("ETHUSD", "ETH-USD"),
    ("LTCUSD", "LTC-USD"),
    ("XRPUSD", "XRP-USD"),
    ("ADAUSD", "ADA-USD"),
];

/// Map a canonical symbol to the provider's syntax. Unmapped symbols get the forex `=X` suffix.
pub fn to_provider_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    PROVIDER_SYMBOLS
        .iter()
        .find(|(canonical, _)| *canonical == upper)
        .map(|(_, provider)| provider.to_string())
        .unwrap_or_else(|| format!("{}=X", upper))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_symbols() {
        assert_eq!(to_provider_symbol("eurusd"), "EURUSD=X");
        assert_eq!(to_provider_symbol("XAUUSD"), "GC=F");
        assert_eq!(to_provider_symbol("NIKKEI"), "^N225");
        assert_eq!(to_provider_symbol("btcusd"), "BTC-USD");
    }

    #[test]
    fn test_unmapped_symbol_defaults_to_forex_suffix() {
        assert_eq!(to_provider_symbol("SOLUSD"), "SOLUSD=X");
        assert_eq!(to_provider_symbol(" gbpnzd "), "GBPNZD=X");
    }
}
