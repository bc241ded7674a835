use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::security::HeldSecurity;
use crate::models::transaction::Transaction;

use super::{HoldingChange, LedgerStore};

/// In-memory ledger store: the two tables as plain collections.
///
/// Serves as the default backing for tests and as the working set the
/// file-backed store loads into / snapshots from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    holdings: HashMap<String, HeldSecurity>,
    transactions: Vec<Transaction>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of holding rows currently stored.
    pub fn holding_count(&self) -> usize {
        self.holdings.len()
    }

    /// Number of rows in the transaction log.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}

impl LedgerStore for MemoryStore {
    fn get_holding(&self, symbol: &str) -> Result<Option<HeldSecurity>, CoreError> {
        Ok(self.holdings.get(&symbol.to_uppercase()).cloned())
    }

    fn put_holding(&mut self, holding: &HeldSecurity) -> Result<(), CoreError> {
        self.holdings
            .insert(holding.symbol.to_uppercase(), holding.clone());
        Ok(())
    }

    fn delete_holding(&mut self, symbol: &str) -> Result<(), CoreError> {
        self.holdings.remove(&symbol.to_uppercase());
        Ok(())
    }

    fn list_holdings(&self) -> Result<Vec<HeldSecurity>, CoreError> {
        let mut rows: Vec<HeldSecurity> = self.holdings.values().cloned().collect();
        rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(rows)
    }

    fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), CoreError> {
        self.transactions.push(transaction.clone());
        Ok(())
    }

    fn commit(
        &mut self,
        transaction: &Transaction,
        change: &HoldingChange,
    ) -> Result<(), CoreError> {
        self.transactions.push(transaction.clone());
        match change {
            HoldingChange::Upsert(holding) => {
                self.holdings
                    .insert(holding.symbol.to_uppercase(), holding.clone());
            }
            HoldingChange::Delete(symbol) => {
                self.holdings.remove(&symbol.to_uppercase());
            }
        }
        Ok(())
    }

    fn list_transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        let mut log = self.transactions.clone();
        log.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(log)
    }
}
