use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::security::SecurityInfo;
use crate::models::valuation::PricePoint;

/// Trait abstraction over the external market-data provider.
///
/// The core calls this for symbol resolution, live info and price history.
/// If a provider stops working or changes, only its implementation is
/// replaced without touching the ledger and valuation logic.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Human-readable name of this gateway (for logs/errors).
    fn name(&self) -> &str;

    /// Resolve a free-text security name to a ticker symbol.
    /// Fails with `UnknownSecurity` when nothing matches.
    async fn resolve_symbol(&self, name: &str) -> Result<String, CoreError>;

    /// Current name, currency, classification and price for a symbol.
    ///
    /// The returned price is always in whole major currency units; any
    /// minor-unit quoting convention is normalized here, and Fund
    /// classifications fall back to the most recent historical close.
    async fn current_info(&self, symbol: &str) -> Result<SecurityInfo, CoreError>;

    /// Daily close prices over a date range, sorted ascending by date.
    async fn history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError>;
}

/// Trait abstraction over the external exchange-rate provider.
#[async_trait]
pub trait ExchangeRateGateway: Send + Sync {
    /// Human-readable name of this gateway (for logs/errors).
    fn name(&self) -> &str;

    /// Earliest date this provider has rate data for, if bounded.
    /// Callers clamp historical lookups to this date themselves, so
    /// transactions predating coverage still resolve deterministically.
    fn floor_date(&self) -> Option<NaiveDate> {
        None
    }

    /// Exchange rate `from → to`; the latest rate when `as_of` is `None`,
    /// otherwise the rate on that date.
    ///
    /// `from == to` must return exactly 1 without a network call.
    async fn rate(
        &self,
        from: &str,
        to: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Decimal, CoreError>;
}
