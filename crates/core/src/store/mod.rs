pub mod file;
pub mod format;
pub mod memory;

use crate::errors::CoreError;
use crate::models::security::HeldSecurity;
use crate::models::transaction::Transaction;

/// The holdings-table side of a transaction commit.
#[derive(Debug, Clone, PartialEq)]
pub enum HoldingChange {
    /// Insert or replace the row for the transaction's symbol.
    Upsert(HeldSecurity),
    /// The position was fully liquidated; remove the row.
    Delete(String),
}

/// Narrow interface over durable keyed storage for the two ledger tables:
/// holdings (one row per symbol) and transactions (append-style log keyed by
/// unique id).
///
/// The Portfolio Ledger exclusively owns writes through this trait; the
/// Valuation Engine only reads holdings. The storage engine behind it is a
/// collaborator, not part of the core.
pub trait LedgerStore: Send {
    /// Look up one holding by symbol.
    fn get_holding(&self, symbol: &str) -> Result<Option<HeldSecurity>, CoreError>;

    /// Insert or replace a holding row.
    fn put_holding(&mut self, holding: &HeldSecurity) -> Result<(), CoreError>;

    /// Delete a holding row. Deleting an absent row is not an error.
    fn delete_holding(&mut self, symbol: &str) -> Result<(), CoreError>;

    /// All holdings, sorted by symbol for deterministic iteration.
    fn list_holdings(&self) -> Result<Vec<HeldSecurity>, CoreError>;

    /// Append a transaction to the log.
    fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), CoreError>;

    /// Append a transaction and apply its holdings change as one commit:
    /// both mutations are persisted together or neither is.
    fn commit(
        &mut self,
        transaction: &Transaction,
        change: &HoldingChange,
    ) -> Result<(), CoreError>;

    /// The full transaction log, newest first.
    fn list_transactions(&self) -> Result<Vec<Transaction>, CoreError>;
}
