//! Symbol resolution for market data providers.
//!
//! Every tier derives its own symbol from the primary symbol:
//!
//! ```text
//! ledger asset "SAP.DE" ──> primary "XETRA:SAP" ──> yahoo "SAP.DE"
//! ledger asset "eth"    ──> primary "BINANCE:ETHUSDT" ──> yahoo "ETH-USD"
//!                                                     └─> coingecko "ethereum"
//! ```

mod symbol_mapper;

pub use symbol_mapper::{
    coingecko_id, crypto_base_ticker, primary_symbol, yahoo_symbol, CRYPTO_EXCHANGE_PREFIX,
    CRYPTO_QUOTE_CURRENCY,
};
