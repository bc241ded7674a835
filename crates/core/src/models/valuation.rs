use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single close price on a date, from the market data gateway's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
}

/// Live valuation of one holding, computed within a single refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub symbol: String,

    /// Live price per unit in the holding's native currency
    pub live_price: Decimal,

    /// Current `native → base` exchange rate used for this snapshot
    pub exchange_rate: Decimal,

    /// `live_price * units`, in the native currency
    pub current_value: Decimal,

    /// `current_value * exchange_rate`, in the base currency
    pub current_value_base: Decimal,

    /// `current_value_base - paid_base`
    pub value_change_base: Decimal,

    /// `((current_value_base - paid_base) / paid_base) * 100`;
    /// defined as zero when `paid_base` is zero
    pub return_pct: Decimal,
}

/// A holding whose gateway fetch failed during a refresh. Other holdings'
/// snapshots are unaffected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingFailure {
    pub symbol: String,
    pub reason: String,
}

/// Result of pricing a set of holdings: one snapshot per symbol that priced
/// successfully, plus the per-holding failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingOutcome {
    pub snapshots: HashMap<String, PricingSnapshot>,
    pub failures: Vec<PricingFailure>,
}

/// Portfolio-level aggregates over a snapshot map, in the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub total_paid_base: Decimal,
    pub total_value_base: Decimal,
    pub total_change_base: Decimal,
    pub return_pct: Decimal,
}

/// Decomposition of the portfolio return into a price-change component and
/// a currency-risk component.
///
/// `currency_risk_pct` is computed as `absolute_pct - value_change_pct`, so
/// the decomposition is additive by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsBreakdown {
    /// Return in the base currency, including currency effects
    pub absolute_pct: Decimal,

    /// Return computed in native currencies only, ignoring exchange-rate
    /// movement
    pub value_change_pct: Decimal,

    /// Residual attributed purely to exchange-rate movement since purchase
    pub currency_risk_pct: Decimal,
}

/// Everything one `refresh()` produces: the snapshot map, the aggregates and
/// the breakdown, stamped with the refresh time. Plain data, no UI types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioValuation {
    pub priced_at: DateTime<Utc>,
    pub outcome: PricingOutcome,
    pub totals: PortfolioTotals,
    pub breakdown: ReturnsBreakdown,
}
