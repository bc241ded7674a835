pub mod errors;
pub mod gateways;
pub mod models;
pub mod services;
pub mod store;

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use errors::CoreError;
use gateways::frankfurter::FrankfurterRates;
use gateways::traits::{ExchangeRateGateway, MarketDataGateway};
use gateways::yahoo::YahooMarketData;
use models::security::HeldSecurity;
use models::settings::Settings;
use models::transaction::{Transaction, TransactionDraft};
use models::valuation::{PortfolioTotals, PortfolioValuation, PricePoint, ReturnsBreakdown};
use services::ledger::PortfolioLedger;
use services::valuation::ValuationEngine;
use store::file::FileStore;
use store::memory::MemoryStore;
use store::LedgerStore;

/// Main entry point for the Portfolio Tracker core library.
///
/// Owns the ledger store behind a single-writer lock: transaction recording
/// and refresh are serialized relative to each other, so a refresh never
/// observes a holdings table mid-mutation. Gateway network I/O happens
/// outside the lock wherever possible; recording holds it end to end so a
/// transaction and its holdings upsert commit together.
///
/// The tracker itself does no scheduling; `refresh()` is idempotent and an
/// external timer simply calls it on whatever interval it likes.
#[must_use]
pub struct PortfolioTracker {
    store: Mutex<Box<dyn LedgerStore>>,
    market: Arc<dyn MarketDataGateway>,
    rates: Arc<dyn ExchangeRateGateway>,
    settings: Settings,
    ledger: PortfolioLedger,
    valuation: ValuationEngine,
    /// Snapshot of the most recent completed refresh, for weight queries
    /// between refresh cycles.
    last_valuation: Mutex<Option<PortfolioValuation>>,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("base_currency", &self.settings.base_currency)
            .field("market_gateway", &self.market.name())
            .field("rate_gateway", &self.rates.name())
            .finish()
    }
}

impl PortfolioTracker {
    /// Build a tracker over any store and gateway implementations.
    pub fn new(
        store: Box<dyn LedgerStore>,
        market: Arc<dyn MarketDataGateway>,
        rates: Arc<dyn ExchangeRateGateway>,
        settings: Settings,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            market,
            rates,
            settings,
            ledger: PortfolioLedger::new(),
            valuation: ValuationEngine::new(),
            last_valuation: Mutex::new(None),
        }
    }

    /// Tracker backed by a snapshot file at `path`, priced via Yahoo
    /// Finance and converted via Frankfurter.
    pub fn open(path: impl AsRef<Path>, settings: Settings) -> Result<Self, CoreError> {
        let store = FileStore::open(path)?;
        let market = YahooMarketData::new()?;
        Ok(Self::new(
            Box::new(store),
            Arc::new(market),
            Arc::new(FrankfurterRates::new()),
            settings,
        ))
    }

    /// Tracker with a fresh in-memory ledger and the default gateways.
    pub fn in_memory(settings: Settings) -> Result<Self, CoreError> {
        let market = YahooMarketData::new()?;
        Ok(Self::new(
            Box::new(MemoryStore::new()),
            Arc::new(market),
            Arc::new(FrankfurterRates::new()),
            settings,
        ))
    }

    // ── Ledger ──────────────────────────────────────────────────────

    /// Record a buy/sell transaction and upsert the holdings aggregate.
    /// Fails closed: on any constraint violation or gateway failure
    /// nothing is persisted.
    pub async fn record_transaction(
        &self,
        draft: TransactionDraft,
    ) -> Result<Transaction, CoreError> {
        let mut store = self.store.lock().await;
        self.ledger
            .record_transaction(
                &mut **store,
                self.market.as_ref(),
                self.rates.as_ref(),
                &self.settings,
                draft,
            )
            .await
    }

    /// Delete a holding row unconditionally (corrective operation).
    pub async fn remove_holding(&self, symbol: &str) -> Result<(), CoreError> {
        let mut store = self.store.lock().await;
        self.ledger.remove_holding(&mut **store, symbol)
    }

    /// Sum of `paid_base` across all holdings; zero on an empty ledger.
    pub async fn total_paid_into_portfolio(&self) -> Result<Decimal, CoreError> {
        let store = self.store.lock().await;
        self.ledger.total_paid_into_portfolio(&**store)
    }

    /// Current holdings, sorted by symbol.
    pub async fn holdings(&self) -> Result<Vec<HeldSecurity>, CoreError> {
        let store = self.store.lock().await;
        store.list_holdings()
    }

    /// The full transaction log, newest first.
    pub async fn transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        let store = self.store.lock().await;
        store.list_transactions()
    }

    /// Rebuild the holdings table from the transaction log (repair for
    /// interrupted writes). Returns the symbols whose rows changed.
    pub async fn reconcile(&self) -> Result<Vec<String>, CoreError> {
        let mut store = self.store.lock().await;
        self.ledger.reconcile(&mut **store)
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Price all holdings and compute portfolio totals and the returns
    /// breakdown, all within one refresh cycle.
    ///
    /// The holdings table is read atomically under the store lock; gateway
    /// fetches then run without blocking ledger writes. Per-holding fetch
    /// failures are reported in the outcome and do not abort the refresh.
    pub async fn refresh(&self) -> Result<PortfolioValuation, CoreError> {
        let holdings = {
            let store = self.store.lock().await;
            store.list_holdings()?
        };

        let outcome = self
            .valuation
            .price_holdings(
                self.market.as_ref(),
                self.rates.as_ref(),
                &self.settings.base_currency,
                &holdings,
            )
            .await;

        let totals = self.valuation.portfolio_totals(&holdings, &outcome.snapshots);
        let breakdown = self
            .valuation
            .returns_breakdown(&holdings, &outcome.snapshots);

        let valuation = PortfolioValuation {
            priced_at: Utc::now(),
            outcome,
            totals,
            breakdown,
        };

        *self.last_valuation.lock().await = Some(valuation.clone());
        Ok(valuation)
    }

    /// The most recent completed refresh, if any.
    pub async fn latest_valuation(&self) -> Option<PortfolioValuation> {
        self.last_valuation.lock().await.clone()
    }

    /// Portfolio aggregates from the most recent refresh.
    pub async fn portfolio_totals(&self) -> Result<PortfolioTotals, CoreError> {
        let guard = self.last_valuation.lock().await;
        let valuation = guard.as_ref().ok_or(CoreError::EmptyPortfolio)?;
        Ok(valuation.totals.clone())
    }

    /// Returns decomposition from the most recent refresh.
    pub async fn returns_breakdown(&self) -> Result<ReturnsBreakdown, CoreError> {
        let guard = self.last_valuation.lock().await;
        let valuation = guard.as_ref().ok_or(CoreError::EmptyPortfolio)?;
        Ok(valuation.breakdown.clone())
    }

    /// One holding's share of total portfolio value, as a percentage
    /// rounded to 3 decimal places. Requires a prior `refresh()`;
    /// `EmptyPortfolio` when there is no priced value to weigh against.
    pub async fn weight(&self, symbol: &str) -> Result<Decimal, CoreError> {
        let guard = self.last_valuation.lock().await;
        let valuation = guard.as_ref().ok_or(CoreError::EmptyPortfolio)?;
        self.valuation.weight(symbol, &valuation.outcome.snapshots)
    }

    // ── Market data ─────────────────────────────────────────────────

    /// Resolve a free-text security name to a ticker symbol.
    pub async fn resolve_symbol(&self, name: &str) -> Result<String, CoreError> {
        self.market.resolve_symbol(name).await
    }

    /// Daily close prices for a symbol over a date range.
    pub async fn price_history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        self.market.history(symbol, from, to).await
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
