// ═══════════════════════════════════════════════════════════════════
// Valuation Engine tests: pricing snapshots, totals, the returns
// decomposition, and portfolio weights
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::gateways::traits::{ExchangeRateGateway, MarketDataGateway};
use portfolio_tracker_core::models::security::{Classification, HeldSecurity, SecurityInfo};
use portfolio_tracker_core::models::valuation::PricePoint;
use portfolio_tracker_core::services::valuation::ValuationEngine;

// ═══════════════════════════════════════════════════════════════════
// Mock Gateways
// ═══════════════════════════════════════════════════════════════════

struct MockMarketData {
    securities: HashMap<String, SecurityInfo>,
}

impl MockMarketData {
    fn with(securities: &[(&str, &str, Decimal)]) -> Self {
        let map = securities
            .iter()
            .map(|(symbol, currency, price)| {
                (
                    symbol.to_string(),
                    SecurityInfo {
                        symbol: symbol.to_string(),
                        name: format!("{symbol} Test Asset"),
                        currency: currency.to_string(),
                        classification: Classification::Equity,
                        price: *price,
                    },
                )
            })
            .collect();
        Self { securities: map }
    }
}

#[async_trait]
impl MarketDataGateway for MockMarketData {
    fn name(&self) -> &str {
        "MockMarket"
    }

    async fn resolve_symbol(&self, name: &str) -> Result<String, CoreError> {
        Err(CoreError::UnknownSecurity(name.to_string()))
    }

    async fn current_info(&self, symbol: &str) -> Result<SecurityInfo, CoreError> {
        self.securities
            .get(&symbol.to_uppercase())
            .cloned()
            .ok_or_else(|| CoreError::UnknownSecurity(symbol.to_string()))
    }

    async fn history(
        &self,
        _symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        Ok(Vec::new())
    }
}

struct MockRates {
    rates: HashMap<(String, String), Decimal>,
}

impl MockRates {
    fn with(rates: &[(&str, &str, Decimal)]) -> Self {
        let map = rates
            .iter()
            .map(|(from, to, rate)| ((from.to_string(), to.to_string()), *rate))
            .collect();
        Self { rates: map }
    }
}

#[async_trait]
impl ExchangeRateGateway for MockRates {
    fn name(&self) -> &str {
        "MockRates"
    }

    async fn rate(
        &self,
        from: &str,
        to: &str,
        _as_of: Option<NaiveDate>,
    ) -> Result<Decimal, CoreError> {
        if from.eq_ignore_ascii_case(to) {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(&(from.to_uppercase(), to.to_uppercase()))
            .copied()
            .ok_or_else(|| CoreError::Gateway {
                gateway: "MockRates".into(),
                message: format!("No rate for {from}/{to}"),
            })
    }
}

fn holding(
    symbol: &str,
    currency: &str,
    units: Decimal,
    paid: Decimal,
    paid_base: Decimal,
) -> HeldSecurity {
    HeldSecurity {
        symbol: symbol.to_string(),
        name: format!("{symbol} Test Asset"),
        units,
        currency: currency.to_string(),
        paid,
        paid_base,
    }
}

// ═══════════════════════════════════════════════════════════════════
// Pricing snapshots
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn pricing_converts_native_value_through_the_live_rate() {
    let engine = ValuationEngine::new();
    let market = MockMarketData::with(&[("AAPL", "USD", dec!(200))]);
    let rates = MockRates::with(&[("USD", "GBP", dec!(0.8))]);

    // Bought 10 units for 1000 USD when the rate was 0.75 → 750 GBP paid
    let holdings = vec![holding("AAPL", "USD", dec!(10), dec!(1000), dec!(750))];
    let outcome = engine.price_holdings(&market, &rates, "GBP", &holdings).await;

    assert!(outcome.failures.is_empty());
    let snap = &outcome.snapshots["AAPL"];
    assert_eq!(snap.live_price, dec!(200));
    assert_eq!(snap.current_value, dec!(2000));
    assert_eq!(snap.current_value_base, dec!(1600.0));
    assert_eq!(snap.value_change_base, dec!(850.0));
    // (1600 - 750) / 750 * 100
    assert_eq!(snap.return_pct.round_dp(4), dec!(113.3333));
}

#[tokio::test]
async fn a_failed_symbol_does_not_abort_the_rest() {
    let engine = ValuationEngine::new();
    let market = MockMarketData::with(&[("AAPL", "USD", dec!(200))]);
    let rates = MockRates::with(&[("USD", "GBP", dec!(0.8))]);

    let holdings = vec![
        holding("AAPL", "USD", dec!(10), dec!(1000), dec!(750)),
        holding("DELISTED", "USD", dec!(5), dec!(500), dec!(400)),
    ];
    let outcome = engine.price_holdings(&market, &rates, "GBP", &holdings).await;

    assert_eq!(outcome.snapshots.len(), 1);
    assert!(outcome.snapshots.contains_key("AAPL"));
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].symbol, "DELISTED");

    // Totals only cover the priced holding, keeping paid and value paired
    let totals = engine.portfolio_totals(&holdings, &outcome.snapshots);
    assert_eq!(totals.total_paid_base, dec!(750));
    assert_eq!(totals.total_value_base, dec!(1600.0));
}

#[tokio::test]
async fn zero_paid_yields_a_zero_return() {
    assert_eq!(
        ValuationEngine::rate_of_return(dec!(500), Decimal::ZERO),
        Decimal::ZERO
    );

    let engine = ValuationEngine::new();
    let market = MockMarketData::with(&[("FREE", "GBP", dec!(10))]);
    let rates = MockRates::with(&[]);

    let holdings = vec![holding("FREE", "GBP", dec!(3), Decimal::ZERO, Decimal::ZERO)];
    let outcome = engine.price_holdings(&market, &rates, "GBP", &holdings).await;

    assert_eq!(outcome.snapshots["FREE"].return_pct, Decimal::ZERO);
    let totals = engine.portfolio_totals(&holdings, &outcome.snapshots);
    assert_eq!(totals.return_pct, Decimal::ZERO);
}

// ═══════════════════════════════════════════════════════════════════
// Returns decomposition
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn breakdown_components_always_sum_to_the_absolute_return() {
    let engine = ValuationEngine::new();
    let market = MockMarketData::with(&[
        ("AAPL", "USD", dec!(210)),
        ("SAP.DE", "EUR", dec!(95)),
        ("VOD.L", "GBP", dec!(0.72)),
    ]);
    let rates = MockRates::with(&[
        ("USD", "GBP", dec!(0.79)),
        ("EUR", "GBP", dec!(0.86)),
    ]);

    let holdings = vec![
        holding("AAPL", "USD", dec!(10), dec!(1850), dec!(1480)),
        holding("SAP.DE", "EUR", dec!(20), dec!(1700), dec!(1445)),
        holding("VOD.L", "GBP", dec!(1000), dec!(690), dec!(690)),
    ];
    let outcome = engine.price_holdings(&market, &rates, "GBP", &holdings).await;
    assert!(outcome.failures.is_empty());

    let breakdown = engine.returns_breakdown(&holdings, &outcome.snapshots);
    // Held by construction: risk is defined as the exact difference
    assert_eq!(
        breakdown.absolute_pct,
        breakdown.value_change_pct + breakdown.currency_risk_pct
    );
}

#[tokio::test]
async fn rate_move_alone_shows_up_entirely_as_currency_risk() {
    let engine = ValuationEngine::new();
    // Price unchanged: still worth exactly what was paid in USD
    let market = MockMarketData::with(&[("AAPL", "USD", dec!(100))]);
    // Rate moved from 0.8 at purchase to 0.9 now
    let rates = MockRates::with(&[("USD", "GBP", dec!(0.9))]);

    let holdings = vec![holding("AAPL", "USD", dec!(10), dec!(1000), dec!(800))];
    let outcome = engine.price_holdings(&market, &rates, "GBP", &holdings).await;

    let breakdown = engine.returns_breakdown(&holdings, &outcome.snapshots);
    assert_eq!(breakdown.value_change_pct, Decimal::ZERO);
    assert_eq!(breakdown.absolute_pct, dec!(12.5));
    assert_eq!(breakdown.currency_risk_pct, dec!(12.5));
}

#[tokio::test]
async fn single_currency_portfolio_carries_no_currency_risk() {
    let engine = ValuationEngine::new();
    let market = MockMarketData::with(&[("VOD.L", "GBP", dec!(1.2))]);
    let rates = MockRates::with(&[]);

    let holdings = vec![holding("VOD.L", "GBP", dec!(1000), dec!(1000), dec!(1000))];
    let outcome = engine.price_holdings(&market, &rates, "GBP", &holdings).await;

    let breakdown = engine.returns_breakdown(&holdings, &outcome.snapshots);
    assert_eq!(breakdown.currency_risk_pct, Decimal::ZERO);
    assert_eq!(breakdown.absolute_pct, dec!(20.0));
}

// ═══════════════════════════════════════════════════════════════════
// Weights
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn weights_cover_the_portfolio_and_round_to_three_places() {
    let engine = ValuationEngine::new();
    let market = MockMarketData::with(&[
        ("AAPL", "USD", dec!(100)),
        ("SAP.DE", "EUR", dec!(100)),
        ("VOD.L", "GBP", dec!(1)),
    ]);
    let rates = MockRates::with(&[
        ("USD", "GBP", dec!(0.8)),
        ("EUR", "GBP", dec!(0.85)),
    ]);

    let holdings = vec![
        holding("AAPL", "USD", dec!(10), dec!(1000), dec!(800)),
        holding("SAP.DE", "EUR", dec!(10), dec!(1000), dec!(850)),
        holding("VOD.L", "GBP", dec!(350), dec!(350), dec!(350)),
    ];
    let outcome = engine.price_holdings(&market, &rates, "GBP", &holdings).await;

    // Base values: 800 + 850 + 350 = 2000
    assert_eq!(engine.weight("AAPL", &outcome.snapshots).unwrap(), dec!(40.000));
    assert_eq!(engine.weight("SAP.DE", &outcome.snapshots).unwrap(), dec!(42.500));
    assert_eq!(engine.weight("vod.l", &outcome.snapshots).unwrap(), dec!(17.500));

    let sum: Decimal = ["AAPL", "SAP.DE", "VOD.L"]
        .iter()
        .map(|s| engine.weight(s, &outcome.snapshots).unwrap())
        .sum();
    assert_eq!(sum, dec!(100.000));
}

#[tokio::test]
async fn weight_signals_empty_portfolio_when_there_is_nothing_to_share() {
    let engine = ValuationEngine::new();
    let empty = HashMap::new();
    assert!(matches!(
        engine.weight("AAPL", &empty),
        Err(CoreError::EmptyPortfolio)
    ));

    let market = MockMarketData::with(&[("AAPL", "USD", dec!(100))]);
    let rates = MockRates::with(&[("USD", "GBP", dec!(0.8))]);
    let holdings = vec![holding("AAPL", "USD", dec!(10), dec!(1000), dec!(800))];
    let outcome = engine.price_holdings(&market, &rates, "GBP", &holdings).await;

    // Priced portfolio, but the asked-for symbol isn't in it
    assert!(matches!(
        engine.weight("MISSING", &outcome.snapshots),
        Err(CoreError::EmptyPortfolio)
    ));
}
