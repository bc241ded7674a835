use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::errors::CoreError;
use crate::gateways::traits::{ExchangeRateGateway, MarketDataGateway};
use crate::models::security::{minor_unit_quoted, HeldSecurity};
use crate::models::settings::Settings;
use crate::models::transaction::{Transaction, TransactionDraft, TransactionKind};
use crate::store::{HoldingChange, LedgerStore};

/// Owns all writes to the two ledger tables: the append-only transaction
/// log and the holdings table derived from it.
///
/// Holdings are maintained incrementally: each transaction adjusts `units`,
/// `paid` and `paid_base` rather than recomputing them from the log. The
/// `reconcile` repair operation rebuilds the table from the log when drift
/// is suspected.
pub struct PortfolioLedger;

impl PortfolioLedger {
    pub fn new() -> Self {
        Self
    }

    /// Validate, enrich and persist one user-submitted trade, then bring
    /// the holdings table up to date.
    ///
    /// All validation and all gateway calls happen before any write, and
    /// the transaction row plus its holdings change go to the store as one
    /// commit, so a failure at any point leaves no partial mutation behind.
    pub async fn record_transaction(
        &self,
        store: &mut dyn LedgerStore,
        market: &dyn MarketDataGateway,
        rates: &dyn ExchangeRateGateway,
        settings: &Settings,
        mut draft: TransactionDraft,
    ) -> Result<Transaction, CoreError> {
        if draft.amount <= Decimal::ZERO {
            return Err(CoreError::ValidationError(
                "Transaction amount must be positive".into(),
            ));
        }
        if draft.unit_price <= Decimal::ZERO {
            return Err(CoreError::ValidationError(
                "Unit price must be positive".into(),
            ));
        }
        if draft.timestamp > Utc::now() {
            return Err(CoreError::ValidationError(
                "The transaction timestamp cannot be in the future".into(),
            ));
        }

        let symbol = draft.symbol.to_uppercase();
        // Uppercase once up front, so the rate lookup and the audited
        // currency/exchange_rate pair are keyed by the same ISO code.
        draft.currency = draft.currency.to_uppercase();

        // Resolves the display name and proves the symbol exists; fails
        // with UnknownSecurity before anything is persisted.
        let info = market.current_info(&symbol).await?;

        // LSE quoting convention: the submitted unit price is in pence
        let unit_price = if minor_unit_quoted(&symbol) {
            draft.unit_price / Decimal::from(100)
        } else {
            draft.unit_price
        };

        // Historical rate as of the execution date, clamped to the
        // provider's floor so pre-coverage transactions still resolve.
        let mut as_of = draft.timestamp.date_naive();
        if let Some(floor) = rates.floor_date() {
            as_of = as_of.max(floor);
        }
        let exchange_rate = rates
            .rate(&draft.currency, &settings.base_currency, Some(as_of))
            .await?;

        let transaction = Transaction::from_draft(&draft, unit_price, exchange_rate);

        // Fail closed: the upsert is computed and checked before either
        // table is written.
        let updated = self.apply_to_holding(
            store.get_holding(&symbol)?,
            &transaction,
            &info.name,
        )?;

        let change = match updated {
            Some(holding) => HoldingChange::Upsert(holding),
            None => HoldingChange::Delete(symbol),
        };
        store.commit(&transaction, &change)?;

        log::debug!(
            "recorded {} {} {} @ {} ({} units)",
            transaction.kind,
            transaction.amount,
            transaction.symbol,
            transaction.unit_price,
            transaction.units
        );

        Ok(transaction)
    }

    /// Compute the holdings row resulting from one transaction.
    ///
    /// Returns `Some(row)` to persist, or `None` when the position was
    /// fully liquidated and the row must be deleted. The zero check is an
    /// exact decimal comparison; unit quantities are exact rationals of
    /// the inputs, so full liquidation lands on zero precisely.
    fn apply_to_holding(
        &self,
        existing: Option<HeldSecurity>,
        transaction: &Transaction,
        name: &str,
    ) -> Result<Option<HeldSecurity>, CoreError> {
        let mut holding = match existing {
            None => {
                if transaction.kind == TransactionKind::Sell {
                    return Err(CoreError::NoSuchHolding(transaction.symbol.clone()));
                }
                return Ok(Some(HeldSecurity {
                    symbol: transaction.symbol.clone(),
                    name: name.to_string(),
                    units: transaction.units,
                    currency: transaction.currency.clone(),
                    paid: transaction.amount,
                    paid_base: transaction.amount_base,
                }));
            }
            Some(h) => h,
        };

        match transaction.kind {
            TransactionKind::Buy => {
                holding.units += transaction.units;
                holding.paid += transaction.amount;
                holding.paid_base += transaction.amount_base;
            }
            TransactionKind::Sell => {
                if transaction.units > holding.units {
                    return Err(CoreError::ValidationError(format!(
                        "Cannot sell {} units of {}: only {} held",
                        transaction.units, transaction.symbol, holding.units
                    )));
                }
                holding.units -= transaction.units;
                holding.paid -= transaction.amount;
                holding.paid_base -= transaction.amount_base;
            }
        }

        if holding.units.is_zero() {
            Ok(None)
        } else {
            Ok(Some(holding))
        }
    }

    /// Unconditional delete, used for corrective operations.
    pub fn remove_holding(
        &self,
        store: &mut dyn LedgerStore,
        symbol: &str,
    ) -> Result<(), CoreError> {
        store.delete_holding(&symbol.to_uppercase())
    }

    /// Sum of `paid_base` across all holdings; zero on an empty ledger.
    pub fn total_paid_into_portfolio(&self, store: &dyn LedgerStore) -> Result<Decimal, CoreError> {
        Ok(store
            .list_holdings()?
            .iter()
            .map(|h| h.paid_base)
            .sum())
    }

    /// Rebuild the holdings table from the transaction log.
    ///
    /// Incremental updates can drift if a write is interrupted; this repair
    /// operation recomputes every aggregate from scratch and rewrites only
    /// the rows that differ. Returns the symbols whose rows changed.
    pub fn reconcile(&self, store: &mut dyn LedgerStore) -> Result<Vec<String>, CoreError> {
        let mut log = store.list_transactions()?;
        log.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let existing: HashMap<String, HeldSecurity> = store
            .list_holdings()?
            .into_iter()
            .map(|h| (h.symbol.clone(), h))
            .collect();

        let mut rebuilt: HashMap<String, HeldSecurity> = HashMap::new();
        for tx in &log {
            let entry = rebuilt
                .entry(tx.symbol.clone())
                .or_insert_with(|| HeldSecurity {
                    symbol: tx.symbol.clone(),
                    // A drifted row may be gone entirely; the name is the
                    // only field the log does not carry.
                    name: existing
                        .get(&tx.symbol)
                        .map(|h| h.name.clone())
                        .unwrap_or_else(|| tx.symbol.clone()),
                    units: Decimal::ZERO,
                    currency: tx.currency.clone(),
                    paid: Decimal::ZERO,
                    paid_base: Decimal::ZERO,
                });
            match tx.kind {
                TransactionKind::Buy => {
                    entry.units += tx.units;
                    entry.paid += tx.amount;
                    entry.paid_base += tx.amount_base;
                }
                TransactionKind::Sell => {
                    entry.units -= tx.units;
                    entry.paid -= tx.amount;
                    entry.paid_base -= tx.amount_base;
                }
            }
        }
        rebuilt.retain(|_, h| h.units > Decimal::ZERO);

        let mut changed = Vec::new();

        for (symbol, old) in &existing {
            match rebuilt.get(symbol) {
                Some(new) if new == old => {}
                Some(new) => {
                    store.put_holding(new)?;
                    changed.push(symbol.clone());
                }
                None => {
                    store.delete_holding(symbol)?;
                    changed.push(symbol.clone());
                }
            }
        }
        for (symbol, new) in &rebuilt {
            if !existing.contains_key(symbol) {
                store.put_holding(new)?;
                changed.push(symbol.clone());
            }
        }

        changed.sort();
        if !changed.is_empty() {
            log::warn!("reconcile repaired {} holding(s): {:?}", changed.len(), changed);
        }
        Ok(changed)
    }
}

impl Default for PortfolioLedger {
    fn default() -> Self {
        Self::new()
    }
}
