use serde::{Deserialize, Serialize};

/// Instrument class used to route a request to providers that can serve it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentClass {
    /// Listed securities: stocks, ETFs, funds.
    Equity,
    /// Cryptocurrencies quoted against a stablecoin.
    Crypto,
}

impl InstrumentClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InstrumentClass::Equity => "EQUITY",
            InstrumentClass::Crypto => "CRYPTO",
        }
    }
}
