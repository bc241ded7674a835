use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::errors::CoreError;
use crate::gateways::traits::{ExchangeRateGateway, MarketDataGateway};
use crate::models::security::HeldSecurity;
use crate::models::valuation::{
    PortfolioTotals, PricingFailure, PricingOutcome, PricingSnapshot, ReturnsBreakdown,
};

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Computes live valuation and return metrics over the holdings table.
///
/// Read-only with respect to the ledger: it consumes `HeldSecurity` rows
/// and gateway observations, and produces plain data. All arithmetic is
/// exact decimal; percentages stay full precision until a display boundary
/// rounds them.
pub struct ValuationEngine;

impl ValuationEngine {
    pub fn new() -> Self {
        Self
    }

    /// `((current - paid) / paid) * 100`, with a zero denominator defined
    /// as a zero return rather than an error.
    pub fn rate_of_return(current: Decimal, paid: Decimal) -> Decimal {
        if paid.is_zero() {
            Decimal::ZERO
        } else {
            ((current - paid) / paid) * ONE_HUNDRED
        }
    }

    /// Price every holding within one refresh cycle.
    ///
    /// Each holding's gateway fetch is independent: a failure is recorded
    /// against that symbol and pricing continues with the rest. The
    /// returned map is complete before any caller reads it: a snapshot,
    /// not a stream.
    pub async fn price_holdings(
        &self,
        market: &dyn MarketDataGateway,
        rates: &dyn ExchangeRateGateway,
        base_currency: &str,
        holdings: &[HeldSecurity],
    ) -> PricingOutcome {
        let mut outcome = PricingOutcome::default();

        for holding in holdings {
            match self.price_one(market, rates, base_currency, holding).await {
                Ok(snapshot) => {
                    outcome.snapshots.insert(holding.symbol.clone(), snapshot);
                }
                Err(e) => {
                    log::warn!("pricing {} failed: {e}", holding.symbol);
                    outcome.failures.push(PricingFailure {
                        symbol: holding.symbol.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        outcome
    }

    async fn price_one(
        &self,
        market: &dyn MarketDataGateway,
        rates: &dyn ExchangeRateGateway,
        base_currency: &str,
        holding: &HeldSecurity,
    ) -> Result<PricingSnapshot, CoreError> {
        let info = market.current_info(&holding.symbol).await?;
        let exchange_rate = rates.rate(&info.currency, base_currency, None).await?;

        let current_value = info.price * holding.units;
        let current_value_base = current_value * exchange_rate;
        let value_change_base = current_value_base - holding.paid_base;
        let return_pct = Self::rate_of_return(current_value_base, holding.paid_base);

        Ok(PricingSnapshot {
            symbol: holding.symbol.clone(),
            live_price: info.price,
            exchange_rate,
            current_value,
            current_value_base,
            value_change_base,
            return_pct,
        })
    }

    /// Aggregate a snapshot map to portfolio level. Holdings without a
    /// snapshot (failed fetches) are left out of every sum, so paid and
    /// value totals stay paired.
    pub fn portfolio_totals(
        &self,
        holdings: &[HeldSecurity],
        snapshots: &HashMap<String, PricingSnapshot>,
    ) -> PortfolioTotals {
        let mut total_paid_base = Decimal::ZERO;
        let mut total_value_base = Decimal::ZERO;

        for holding in holdings {
            if let Some(snapshot) = snapshots.get(&holding.symbol) {
                total_paid_base += holding.paid_base;
                total_value_base += snapshot.current_value_base;
            }
        }

        PortfolioTotals {
            total_paid_base,
            total_value_base,
            total_change_base: total_value_base - total_paid_base,
            return_pct: Self::rate_of_return(total_value_base, total_paid_base),
        }
    }

    /// Decompose the portfolio return into price-change and currency-risk
    /// components.
    ///
    /// `currency_risk_pct` is the subtraction of the two independently
    /// computed percentages, never estimated separately, so
    /// `absolute_pct == value_change_pct + currency_risk_pct` holds exactly.
    pub fn returns_breakdown(
        &self,
        holdings: &[HeldSecurity],
        snapshots: &HashMap<String, PricingSnapshot>,
    ) -> ReturnsBreakdown {
        let mut total_value = Decimal::ZERO;
        let mut total_value_base = Decimal::ZERO;
        let mut total_paid = Decimal::ZERO;
        let mut total_paid_base = Decimal::ZERO;

        for holding in holdings {
            if let Some(snapshot) = snapshots.get(&holding.symbol) {
                total_value += snapshot.current_value;
                total_value_base += snapshot.current_value_base;
                total_paid += holding.paid;
                total_paid_base += holding.paid_base;
            }
        }

        let absolute_pct = Self::rate_of_return(total_value_base, total_paid_base);
        let value_change_pct = Self::rate_of_return(total_value, total_paid);

        ReturnsBreakdown {
            absolute_pct,
            value_change_pct,
            currency_risk_pct: absolute_pct - value_change_pct,
        }
    }

    /// One holding's share of the portfolio as a percentage, rounded to
    /// 3 decimal places for display. Signals `EmptyPortfolio` when the
    /// total value is zero or the symbol was not priced.
    pub fn weight(
        &self,
        symbol: &str,
        snapshots: &HashMap<String, PricingSnapshot>,
    ) -> Result<Decimal, CoreError> {
        let total: Decimal = snapshots.values().map(|s| s.current_value_base).sum();
        if total.is_zero() {
            return Err(CoreError::EmptyPortfolio);
        }
        let snapshot = snapshots
            .get(&symbol.to_uppercase())
            .ok_or(CoreError::EmptyPortfolio)?;

        Ok(((snapshot.current_value_base / total) * ONE_HUNDRED).round_dp(3))
    }
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new()
    }
}
