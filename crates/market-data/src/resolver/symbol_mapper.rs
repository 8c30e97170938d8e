//! Deterministic mapping from ledger asset names to provider symbols.
//!
//! The primary scheme is the Finnhub one (`AAPL`, `XETRA:SAP`,
//! `BINANCE:BTCUSDT`). Yahoo and CoinGecko symbols are derived from the
//! primary symbol so every tier talks about the same instrument.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::InstrumentClass;

/// Exchange prefix used for crypto pairs on the primary provider.
pub const CRYPTO_EXCHANGE_PREFIX: &str = "BINANCE";

/// Quote currency used for crypto pairs on the primary provider.
pub const CRYPTO_QUOTE_CURRENCY: &str = "USDT";

/// Stablecoin and fiat suffixes stripped from crypto tickers, longest first.
const QUOTE_SUFFIXES: &[&str] = &["FDUSD", "USDT", "USDC", "BUSD", "TUSD", "USD"];

/// Yahoo exchange suffix to primary-provider exchange prefix.
const EXCHANGE_SUFFIXES: &[(&str, &str)] = &[
    (".DE", "XETRA"),
    (".L", "LSE"),
    (".TO", "TSX"),
    (".PA", "EPA"),
    (".AS", "AMS"),
    (".HK", "HKEX"),
];

/// Base ticker to CoinGecko coin id for the coins the ledger commonly holds.
const COINGECKO_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("SOL", "solana"),
    ("BNB", "binancecoin"),
    ("XRP", "ripple"),
    ("ADA", "cardano"),
    ("DOGE", "dogecoin"),
    ("DOT", "polkadot"),
    ("LTC", "litecoin"),
    ("AVAX", "avalanche-2"),
    ("LINK", "chainlink"),
    ("MATIC", "matic-network"),
    ("TON", "the-open-network"),
    ("TRX", "tron"),
];

lazy_static! {
    static ref PLAIN_TICKER: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9.\-]{0,11}$").unwrap();
    static ref EXPLICIT_SYMBOL: Regex = Regex::new(r"^[A-Z]+:[A-Z0-9.\-]+$").unwrap();
    static ref TICKER_SEPARATORS: Regex = Regex::new(r"[\s/_\-]").unwrap();
}

/// Maps a ledger asset name to the primary provider symbol.
///
/// Returns `None` for names that cannot be a ticker (e.g. "My Apartment").
///
/// ```
/// use ledgerfolio_market_data::models::InstrumentClass;
/// use ledgerfolio_market_data::resolver::primary_symbol;
///
/// assert_eq!(primary_symbol("aapl", InstrumentClass::Equity).as_deref(), Some("AAPL"));
/// assert_eq!(primary_symbol("SAP.DE", InstrumentClass::Equity).as_deref(), Some("XETRA:SAP"));
/// assert_eq!(primary_symbol("btc", InstrumentClass::Crypto).as_deref(), Some("BINANCE:BTCUSDT"));
/// assert_eq!(primary_symbol("Lake House", InstrumentClass::Equity), None);
/// ```
pub fn primary_symbol(asset: &str, class: InstrumentClass) -> Option<String> {
    let upper = asset.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }

    match class {
        InstrumentClass::Crypto => {
            let base = crypto_base_ticker(&upper);
            if base.is_empty() || !PLAIN_TICKER.is_match(&base) {
                return None;
            }
            Some(format!(
                "{}:{}{}",
                CRYPTO_EXCHANGE_PREFIX, base, CRYPTO_QUOTE_CURRENCY
            ))
        }
        InstrumentClass::Equity => {
            if EXPLICIT_SYMBOL.is_match(&upper) {
                return Some(upper);
            }
            for (suffix, exchange) in EXCHANGE_SUFFIXES {
                if let Some(ticker) = upper.strip_suffix(suffix) {
                    if !ticker.is_empty() {
                        return Some(format!("{}:{}", exchange, ticker));
                    }
                }
            }
            PLAIN_TICKER.is_match(&upper).then_some(upper)
        }
    }
}

/// Strips exchange prefix, separators, and quote-currency suffix from a
/// crypto ticker: `BINANCE:ETHUSDT`, `eth/usd`, `ETH-USD` all become `ETH`.
pub fn crypto_base_ticker(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    let without_prefix = match upper.split_once(':') {
        Some((_, rest)) => rest.to_string(),
        None => upper,
    };
    let compact = TICKER_SEPARATORS.replace_all(&without_prefix, "").to_string();

    for suffix in QUOTE_SUFFIXES {
        if let Some(base) = compact.strip_suffix(suffix) {
            if !base.is_empty() {
                return base.to_string();
            }
        }
    }
    compact
}

/// Yahoo Finance symbol for a primary symbol.
pub fn yahoo_symbol(primary: &str, class: InstrumentClass) -> String {
    match class {
        InstrumentClass::Crypto => format!("{}-USD", crypto_base_ticker(primary)),
        InstrumentClass::Equity => match primary.split_once(':') {
            Some((exchange, ticker)) => EXCHANGE_SUFFIXES
                .iter()
                .find(|(_, prefix)| *prefix == exchange)
                .map(|(suffix, _)| format!("{}{}", ticker, suffix))
                .unwrap_or_else(|| ticker.to_string()),
            None => primary.to_string(),
        },
    }
}

/// CoinGecko coin id for a crypto symbol, when it is one of the known coins.
pub fn coingecko_id(symbol: &str) -> Option<&'static str> {
    let base = crypto_base_ticker(symbol);
    COINGECKO_IDS
        .iter()
        .find(|(ticker, _)| *ticker == base)
        .map(|(_, id)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equity_plain_and_explicit() {
        assert_eq!(
            primary_symbol(" msft ", InstrumentClass::Equity).as_deref(),
            Some("MSFT")
        );
        assert_eq!(
            primary_symbol("NYSE:BRK.B", InstrumentClass::Equity).as_deref(),
            Some("NYSE:BRK.B")
        );
        assert_eq!(
            primary_symbol("shop.to", InstrumentClass::Equity).as_deref(),
            Some("TSX:SHOP")
        );
    }

    #[test]
    fn test_equity_rejects_names() {
        assert_eq!(primary_symbol("Family Car", InstrumentClass::Equity), None);
        assert_eq!(primary_symbol("", InstrumentClass::Equity), None);
        assert_eq!(
            primary_symbol("AVERYLONGCOMPANYNAME", InstrumentClass::Equity),
            None
        );
    }

    #[test]
    fn test_crypto_suffix_stripping() {
        assert_eq!(crypto_base_ticker("BINANCE:ETHUSDT"), "ETH");
        assert_eq!(crypto_base_ticker("eth/usd"), "ETH");
        assert_eq!(crypto_base_ticker("SOL-USDC"), "SOL");
        assert_eq!(crypto_base_ticker("USDT"), "USDT");
        assert_eq!(
            primary_symbol("BINANCE:BTCUSDT", InstrumentClass::Crypto).as_deref(),
            Some("BINANCE:BTCUSDT")
        );
    }

    #[test]
    fn test_yahoo_symbols() {
        assert_eq!(yahoo_symbol("XETRA:SAP", InstrumentClass::Equity), "SAP.DE");
        assert_eq!(yahoo_symbol("NYSE:IBM", InstrumentClass::Equity), "IBM");
        assert_eq!(yahoo_symbol("AAPL", InstrumentClass::Equity), "AAPL");
        assert_eq!(
            yahoo_symbol("BINANCE:BTCUSDT", InstrumentClass::Crypto),
            "BTC-USD"
        );
    }

    #[test]
    fn test_coingecko_ids() {
        assert_eq!(coingecko_id("BINANCE:ETHUSDT"), Some("ethereum"));
        assert_eq!(coingecko_id("BTC"), Some("bitcoin"));
        assert_eq!(coingecko_id("UNKNOWNCOIN"), None);
    }
}
