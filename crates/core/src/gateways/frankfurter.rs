use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::CoreError;
use super::traits::ExchangeRateGateway;

const BASE_URL: &str = "https://api.frankfurter.dev/v1";

/// Frankfurter has ECB reference rates from this date onwards. Lookups for
/// earlier dates are clamped to it.
pub const FLOOR_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1999, 1, 4) {
    Some(d) => d,
    None => unreachable!(),
};

/// Frankfurter API gateway for fiat exchange rates.
///
/// - **Free**: No API key, no rate limits, open-source.
/// - **Source**: European Central Bank (ECB) data, daily fixings.
/// - **Endpoints**: `/latest`, `/{date}`
pub struct FrankfurterRates {
    client: Client,
}

impl FrankfurterRates {
    pub fn new() -> Self {
        let builder = Client::builder().timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
        }
    }
}

impl Default for FrankfurterRates {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a `YYYY-MM-DD` string into a date for a historical rate lookup.
/// Malformed input fails with `InvalidDate`.
pub fn parse_rate_date(s: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| CoreError::InvalidDate(s.to_string()))
}

// ── Frankfurter API response types ──────────────────────────────────

#[derive(Deserialize)]
struct RatesResponse {
    rates: HashMap<String, Decimal>,
}

#[async_trait]
impl ExchangeRateGateway for FrankfurterRates {
    fn name(&self) -> &str {
        "Frankfurter"
    }

    fn floor_date(&self) -> Option<NaiveDate> {
        Some(FLOOR_DATE)
    }

    async fn rate(
        &self,
        from: &str,
        to: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Decimal, CoreError> {
        let base = from.to_uppercase();
        let target = to.to_uppercase();

        // Same currency → rate is exactly 1, no network call
        if base == target {
            return Ok(Decimal::ONE);
        }

        // Clamp pre-coverage dates to the earliest available fixing
        let url = match as_of {
            None => format!("{BASE_URL}/latest?base={base}&symbols={target}"),
            Some(date) => {
                let clamped = date.max(FLOOR_DATE);
                format!("{BASE_URL}/{}?base={base}&symbols={target}", clamped.format("%Y-%m-%d"))
            }
        };

        log::debug!("fetching {base}->{target} rate (as_of: {as_of:?})");

        let response = self.client.get(&url).send().await?;

        // Frankfurter answers 404 for dates it cannot interpret
        if response.status().is_client_error() {
            if let Some(date) = as_of {
                return Err(CoreError::InvalidDate(date.to_string()));
            }
            return Err(CoreError::Gateway {
                gateway: "Frankfurter".into(),
                message: format!("Request rejected for {base}/{target}: {}", response.status()),
            });
        }

        let resp: RatesResponse = response.json().await.map_err(|e| CoreError::Gateway {
            gateway: "Frankfurter".into(),
            message: format!("Failed to parse response for {base}/{target}: {e}"),
        })?;

        resp.rates
            .get(&target)
            .copied()
            .ok_or_else(|| CoreError::Gateway {
                gateway: "Frankfurter".into(),
                message: format!("No rate found for {base} → {target}"),
            })
    }
}
