use std::path::{Path, PathBuf};

use crate::errors::CoreError;
use crate::models::security::HeldSecurity;
use crate::models::transaction::Transaction;

use super::format;
use super::memory::MemoryStore;
use super::{HoldingChange, LedgerStore};

/// File-backed ledger store: an in-memory working set persisted as a
/// versioned PTLG snapshot at a path supplied at construction.
///
/// Every committed write is flushed to disk immediately, so a transaction
/// and its holdings upsert land together or not at all (the snapshot is
/// written atomically via a temp-file rename).
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Open the snapshot at `path`, creating an empty ledger if the file
    /// does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            let bytes = std::fs::read(&path)?;
            format::read_snapshot(&bytes)?
        } else {
            MemoryStore::new()
        };
        Ok(Self { path, inner })
    }

    fn flush(&self) -> Result<(), CoreError> {
        let bytes = format::write_snapshot(&self.inner)?;
        let tmp = self.path.with_extension("ptlg.tmp");
        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply a mutation to the working set and flush once. A failed flush
    /// rolls the working set back, so memory never runs ahead of disk.
    fn mutate<F>(&mut self, f: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut MemoryStore) -> Result<(), CoreError>,
    {
        let before = self.inner.clone();
        let mut result = f(&mut self.inner);
        if result.is_ok() {
            result = self.flush();
        }
        if result.is_err() {
            self.inner = before;
        }
        result
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for FileStore {
    fn get_holding(&self, symbol: &str) -> Result<Option<HeldSecurity>, CoreError> {
        self.inner.get_holding(symbol)
    }

    fn put_holding(&mut self, holding: &HeldSecurity) -> Result<(), CoreError> {
        self.mutate(|store| store.put_holding(holding))
    }

    fn delete_holding(&mut self, symbol: &str) -> Result<(), CoreError> {
        self.mutate(|store| store.delete_holding(symbol))
    }

    fn list_holdings(&self) -> Result<Vec<HeldSecurity>, CoreError> {
        self.inner.list_holdings()
    }

    fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), CoreError> {
        self.mutate(|store| store.insert_transaction(transaction))
    }

    fn commit(
        &mut self,
        transaction: &Transaction,
        change: &HoldingChange,
    ) -> Result<(), CoreError> {
        self.mutate(|store| store.commit(transaction, change))
    }

    fn list_transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        self.inner.list_transactions()
    }
}
