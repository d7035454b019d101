/// Free-text aliases (lower-case) to canonical symbols.
const SYMBOL_SYNONYMS: &[(&str, &str)] = &[
    // Crypto
    ("bitcoin", "BTCUSD"),
    ("btc", "BTCUSD"),
    ("ethereum", "ETHUSD"),
    ("eth", "ETHUSD"),
    ("ripple", "XRPUSD"),
    ("xrp", "XRPUSD"),
    ("litecoin", "LTCUSD"),
    ("ltc", "LTCUSD"),
    ("cardano", "ADAUSD"),
    ("ada", "ADAUSD"),
    ("solana", "SOLUSD"),
    ("sol", "SOLUSD"),
    ("binance", "BNBUSD"),
    ("bnb", "BNBUSD"),
    ("dogecoin", "DOGUSD"),
    ("doge", "DOGUSD"),
    ("polkadot", "DOTUSD"),
    ("dot", "DOTUSD"),
    ("avalanche", "AVAXUSD"),
    ("avax", "AVAXUSD"),
    ("chainlink", "LNKUSD"),
    ("link", "LNKUSD"),
    ("polygon", "MATICUSD"),
    ("matic", "MATICUSD"),
    ("uniswap", "UNIUSD"),
    ("uni", "UNIUSD"),
    // Metals and commodities
    ("gold", "XAUUSD"),
    ("xau", "XAUUSD"),
    ("oro", "XAUUSD"),
    ("silver", "XAGUSD"),
    ("xag", "XAGUSD"),
    ("plata", "XAGUSD"),
    ("oil", "OILUSD"),
    ("petróleo", "OILUSD"),
    ("copper", "XCUUSD"),
    ("cobre", "XCUUSD"),
    ("platinum", "XPTUSD"),
    ("xpt", "XPTUSD"),
    ("palladium", "XPDUSD"),
    ("xpd", "XPDUSD"),
    // Forex majors
    ("eur", "EURUSD"),
    ("euro", "EURUSD"),
    ("eurodollar", "EURUSD"),
    ("gbp", "GBPUSD"),
    ("pound", "GBPUSD"),
    ("sterling", "GBPUSD"),
    ("cable", "GBPUSD"),
    ("jpy", "USDJPY"),
    ("yen", "USDJPY"),
    ("chf", "USDCHF"),
    ("franc", "USDCHF"),
    ("cad", "USDCAD"),
    ("loonie", "USDCAD"),
    ("aud", "AUDUSD"),
    ("aussie", "AUDUSD"),
    ("nzd", "NZDUSD"),
    ("kiwi", "NZDUSD"),
    // Indices
    ("sp500", "US500"),
    ("s&p", "US500"),
    ("nasdaq", "US100"),
    ("dow", "US30"),
    ("dax", "GER40"),
    ("ftse", "UK100"),
];

/// 3-6 ASCII letters followed by `USD`, case-insensitive.
pub fn is_canonical(symbol: &str) -> bool {
    let len = symbol.len();
    if !(6..=9).contains(&len) || !symbol.is_ascii() {
        return false;
    }
    let (base, quote) = symbol.split_at(len - 3);
    quote.eq_ignore_ascii_case("usd") && base.chars().all(|c| c.is_ascii_alphabetic())
}

/// Synonym table lookup, ignoring case and surrounding whitespace.
pub fn synonym(input: &str) -> Option<&'static str> {
    let key = input.trim().to_lowercase();
    SYMBOL_SYNONYMS
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
}

/// Normalize a user-supplied identifier into a canonical ticker.
///
/// Unknown inputs pass through upper-cased; this never fails.
pub fn resolve_symbol(input: &str) -> String {
    let normalized = input.trim().to_lowercase();

    if is_canonical(&normalized) {
        return normalized.to_uppercase();
    }

    match synonym(&normalized) {
        Some(canonical) => canonical.to_string(),
        None => normalized.to_uppercase(),
    }
}
