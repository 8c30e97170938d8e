//! Ledgerfolio Market Data Crate
//!
//! Provider-agnostic quote and history fetching for the Ledgerfolio engine.
//!
//! # Overview
//!
//! - Deterministic mapping from ledger asset names to provider symbols
//! - Snapshot quotes: stream cache → Finnhub → CoinGecko / Yahoo
//! - History: Finnhub, CoinGecko, Yahoo, and local CSV files, merged
//! - Circuit breaking and price validation
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   Ledger asset   | --> |  primary_symbol  |  (resolver)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   QuoteContext   |
//!                          +------------------+
//!                             |            |
//!                             v            v
//!                  +---------------+  +-----------------+
//!                  | QuoteRegistry |  | HistoryRegistry |
//!                  +---------------+  +-----------------+
//!                             |            |
//!                             v            v
//!                          +------------------+
//!                          |    Providers     |  (Finnhub, CoinGecko, ...)
//!                          +------------------+
//! ```

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod resolver;

pub use models::{
    earliest_close, merge_series, InstrumentClass, PricePoint, QuoteContext,
    QuoteSnapshot,
};

pub use provider::coingecko::CoinGeckoProvider;
pub use provider::finnhub::FinnhubProvider;
pub use provider::historic_csv::HistoricCsvProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::{HistoryProvider, QuoteProvider};

pub use registry::{CircuitBreaker, HistoryRegistry, QuoteRegistry};

pub use resolver::{crypto_base_ticker, primary_symbol, yahoo_symbol};

pub use errors::{MarketDataError, RetryClass};
