use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Classification of a listed security, as reported by the market data
/// provider. Determines valuation-quirk handling: `Fund` prices come from
/// the most recent historical close instead of a live quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Common stock / equity (AAPL, MKS.L, ...)
    Equity,
    /// Exchange-traded fund
    Etf,
    /// Market index (^FTSE, ^GSPC, ...)
    Index,
    /// Mutual fund / OEIC, quotes update once a day
    Fund,
    /// Cryptocurrency pair (BTC-USD, ...)
    Crypto,
    /// Currency pair
    Currency,
    /// Anything the provider reports that we don't special-case
    Other,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Equity => write!(f, "Equity"),
            Classification::Etf => write!(f, "ETF"),
            Classification::Index => write!(f, "Index"),
            Classification::Fund => write!(f, "Fund"),
            Classification::Crypto => write!(f, "Crypto"),
            Classification::Currency => write!(f, "Currency"),
            Classification::Other => write!(f, "Other"),
        }
    }
}

/// Live information about one security, as returned by the market data
/// gateway. `price` is always denominated in whole major currency units;
/// the gateway applies any minor-unit normalization before building this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityInfo {
    /// Ticker symbol, uppercased (e.g., "AAPL", "MKS.L", "BTC-USD")
    pub symbol: String,

    /// Human-readable name (e.g., "Apple Inc.")
    pub name: String,

    /// The currency the security trades in (ISO code)
    pub currency: String,

    /// Instrument classification reported by the provider
    pub classification: Classification,

    /// Current price per unit, in `currency` major units
    pub price: Decimal,
}

/// One aggregated position in the portfolio, keyed by symbol.
///
/// Derived from the transaction log: created on the first Buy, adjusted
/// incrementally on every later transaction, deleted when `units` reaches
/// exactly zero. A stored row always has `units > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldSecurity {
    /// Ticker symbol, uppercased. Primary key
    pub symbol: String,

    /// Display name, resolved once at creation and not refreshed
    pub name: String,

    /// Quantity held
    #[serde(with = "rust_decimal::serde::str")]
    pub units: Decimal,

    /// The security's native trading currency (ISO code)
    pub currency: String,

    /// Running sum of amounts paid, net of buys minus sells, in `currency`
    #[serde(with = "rust_decimal::serde::str")]
    pub paid: Decimal,

    /// Running sum of amounts paid converted to the base currency at each
    /// transaction's historical exchange rate
    #[serde(with = "rust_decimal::serde::str")]
    pub paid_base: Decimal,
}

/// Securities listed on the LSE are quoted in pence (GBX) while stating GBP
/// as their currency. Prices and unit prices for these symbols must be
/// divided by 100 to get major currency units. This is a quoting convention,
/// not a unit conversion, and has to be applied identically when recording a
/// transaction and when valuing the holding.
pub fn minor_unit_quoted(symbol: &str) -> bool {
    symbol.ends_with(".L")
}
