use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Buy or Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Buy => write!(f, "Buy"),
            TransactionKind::Sell => write!(f, "Sell"),
        }
    }
}

/// User-submitted trade details, before resolution and enrichment.
/// `record_transaction` turns one of these into a persisted [`Transaction`].
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub symbol: String,
    pub platform: String,
    pub currency: String,
    pub amount: Decimal,
    pub unit_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// One row of the append-only transaction log, the source of truth the
/// holdings table is derived from.
///
/// `units`, `amount_base` and `exchange_rate` are computed at submission
/// time and stored for auditability; exchange rates are never retroactively
/// recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Globally unique id, generated at creation time
    pub id: Uuid,

    pub kind: TransactionKind,

    /// Execution time; never in the future relative to submission
    pub timestamp: DateTime<Utc>,

    /// Ticker symbol, uppercased
    pub symbol: String,

    /// Free-text venue/broker label
    pub platform: String,

    /// Currency the amount is denominated in (ISO code)
    pub currency: String,

    /// Cash amount of the trade, in `currency`
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,

    /// Price per unit, in `currency`, already minor-unit normalized
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,

    /// Derived: `amount / unit_price`
    #[serde(with = "rust_decimal::serde::str")]
    pub units: Decimal,

    /// `amount` converted to the base currency at `exchange_rate`
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_base: Decimal,

    /// The historical `currency → base` rate used for the conversion
    #[serde(with = "rust_decimal::serde::str")]
    pub exchange_rate: Decimal,
}

impl Transaction {
    /// Build a transaction from a draft plus the resolved exchange rate.
    /// `unit_price` must already be normalized to major currency units.
    pub fn from_draft(draft: &TransactionDraft, unit_price: Decimal, exchange_rate: Decimal) -> Self {
        let units = draft.amount / unit_price;
        Self {
            id: Uuid::new_v4(),
            kind: draft.kind,
            timestamp: draft.timestamp,
            symbol: draft.symbol.to_uppercase(),
            platform: draft.platform.clone(),
            currency: draft.currency.to_uppercase(),
            amount: draft.amount,
            unit_price,
            units,
            amount_base: draft.amount * exchange_rate,
            exchange_rate,
        }
    }
}
