use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::errors::CoreError;
use crate::models::security::{minor_unit_quoted, Classification, SecurityInfo};
use crate::models::valuation::PricePoint;
use super::traits::MarketDataGateway;

/// Yahoo Finance gateway for security resolution, live quotes and history.
///
/// - **Free**: No API key required (unofficial public API).
/// - **Coverage**: Global equities, ETFs, indices, mutual funds, crypto.
///
/// Uses the `yahoo_finance_api` crate. Two valuation quirks are handled
/// here so the core always receives a price in whole major currency units:
/// - Mutual funds report once a day and often lack a live quote, so their
///   price comes from the most recent close in a one-month window.
/// - LSE-listed symbols (`.L`) are quoted in pence; the price is divided
///   by 100 and the currency reported as GBP.
pub struct YahooMarketData {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooMarketData {
    pub fn new() -> Result<Self, CoreError> {
        let connector =
            yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::Gateway {
                gateway: "Yahoo Finance".into(),
                message: format!("Failed to create connector: {e}"),
            })?;
        Ok(Self { connector })
    }

    /// Convert a `chrono::NaiveDate` to `time::OffsetDateTime` (midnight UTC).
    fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, CoreError> {
        let month: time::Month = match date.month() {
            1 => time::Month::January,
            2 => time::Month::February,
            3 => time::Month::March,
            4 => time::Month::April,
            5 => time::Month::May,
            6 => time::Month::June,
            7 => time::Month::July,
            8 => time::Month::August,
            9 => time::Month::September,
            10 => time::Month::October,
            11 => time::Month::November,
            12 => time::Month::December,
            _ => unreachable!(),
        };

        let odt = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
            .map_err(|e| CoreError::Gateway {
                gateway: "Yahoo Finance".into(),
                message: format!("Invalid date {date}: {e}"),
            })?
            .with_hms(0, 0, 0)
            .map_err(|e| CoreError::Gateway {
                gateway: "Yahoo Finance".into(),
                message: format!("Invalid time for {date}: {e}"),
            })?
            .assume_utc();
        Ok(odt)
    }

    /// Convert a unix timestamp (seconds) to `chrono::NaiveDate`.
    fn timestamp_to_naive_date(ts: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }

    fn to_decimal(price: f64, symbol: &str) -> Result<Decimal, CoreError> {
        Decimal::from_f64(price).ok_or_else(|| CoreError::Gateway {
            gateway: "Yahoo Finance".into(),
            message: format!("Non-finite price returned for {symbol}: {price}"),
        })
    }

    /// Display name for `symbol` among `(symbol, long_name, short_name)`
    /// search hits. Only an exact ticker match counts: a near-miss hit
    /// must not lend its name to a symbol that does not exist.
    fn display_name(
        symbol: &str,
        hits: impl IntoIterator<Item = (String, String, String)>,
    ) -> Option<String> {
        hits.into_iter()
            .find(|(hit_symbol, _, _)| hit_symbol.eq_ignore_ascii_case(symbol))
            .map(|(_, long_name, short_name)| {
                if long_name.is_empty() {
                    short_name
                } else {
                    long_name
                }
            })
    }

    fn classify(instrument_type: &str) -> Classification {
        match instrument_type {
            "EQUITY" => Classification::Equity,
            "ETF" => Classification::Etf,
            "INDEX" => Classification::Index,
            "MUTUALFUND" => Classification::Fund,
            "CRYPTOCURRENCY" => Classification::Crypto,
            "CURRENCY" => Classification::Currency,
            _ => Classification::Other,
        }
    }

    /// Most recent close within a trailing window. Mutual funds publish one
    /// price a day, so a month-long window guarantees at least one fixing.
    async fn latest_close(&self, symbol: &str, range: &str) -> Result<f64, CoreError> {
        let resp = self
            .connector
            .get_quote_range(symbol, "1d", range)
            .await
            .map_err(|e| CoreError::Gateway {
                gateway: "Yahoo Finance".into(),
                message: format!("Failed to fetch {range} range for {symbol}: {e}"),
            })?;

        let quotes = resp.quotes().map_err(|e| CoreError::Gateway {
            gateway: "Yahoo Finance".into(),
            message: format!("Failed to parse quotes for {symbol}: {e}"),
        })?;

        quotes
            .last()
            .map(|q| q.close)
            .ok_or_else(|| CoreError::PriceNotAvailable {
                symbol: symbol.to_string(),
                currency: "native".to_string(),
            })
    }
}

#[async_trait]
impl MarketDataGateway for YahooMarketData {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn resolve_symbol(&self, name: &str) -> Result<String, CoreError> {
        let result = self
            .connector
            .search_ticker(name)
            .await
            .map_err(|e| CoreError::Gateway {
                gateway: "Yahoo Finance".into(),
                message: format!("Search failed for '{name}': {e}"),
            })?;

        result
            .quotes
            .first()
            .map(|q| q.symbol.to_uppercase())
            .ok_or_else(|| CoreError::UnknownSecurity(name.to_string()))
    }

    async fn current_info(&self, symbol: &str) -> Result<SecurityInfo, CoreError> {
        let symbol = symbol.to_uppercase();

        // The search endpoint is the only one that carries display names.
        // No hit for an exact ticker means the symbol does not exist.
        let search = self
            .connector
            .search_ticker(&symbol)
            .await
            .map_err(|e| CoreError::Gateway {
                gateway: "Yahoo Finance".into(),
                message: format!("Search failed for '{symbol}': {e}"),
            })?;
        let name = Self::display_name(
            &symbol,
            search
                .quotes
                .iter()
                .map(|q| (q.symbol.clone(), q.long_name.clone(), q.short_name.clone())),
        )
        .ok_or_else(|| CoreError::UnknownSecurity(symbol.clone()))?;

        let resp = self
            .connector
            .get_latest_quotes(&symbol, "1d")
            .await
            .map_err(|e| CoreError::Gateway {
                gateway: "Yahoo Finance".into(),
                message: format!("Failed to fetch latest quote for {symbol}: {e}"),
            })?;

        let meta = resp.metadata().map_err(|e| CoreError::Gateway {
            gateway: "Yahoo Finance".into(),
            message: format!("No metadata for {symbol}: {e}"),
        })?;

        let classification = Self::classify(&meta.instrument_type);

        // Funds report once a day and the live quote is often missing or
        // stale, so take the most recent close from a month-long window.
        let raw_price = match classification {
            Classification::Fund => self.latest_close(&symbol, "1mo").await?,
            _ => match resp.last_quote() {
                Ok(quote) => quote.close,
                Err(_) => self.latest_close(&symbol, "5d").await?,
            },
        };

        let mut price = Self::to_decimal(raw_price, &symbol)?;
        let mut currency = meta
            .currency
            .clone()
            .unwrap_or_else(|| "USD".to_string())
            .to_uppercase();

        // LSE quoting convention: pence → pounds
        if minor_unit_quoted(&symbol) {
            price /= Decimal::from(100);
            currency = "GBP".to_string();
        }

        log::debug!("{symbol}: {price} {currency} ({classification})");

        Ok(SecurityInfo {
            symbol,
            name,
            currency,
            classification,
            price,
        })
    }

    async fn history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let start = Self::to_offset_datetime(from)?;
        let end = Self::to_offset_datetime(to + chrono::Duration::days(1))?; // inclusive end

        let resp = self
            .connector
            .get_quote_history(symbol, start, end)
            .await
            .map_err(|e| CoreError::Gateway {
                gateway: "Yahoo Finance".into(),
                message: format!("Failed to fetch history for {symbol}: {e}"),
            })?;

        let quotes = resp.quotes().map_err(|e| CoreError::Gateway {
            gateway: "Yahoo Finance".into(),
            message: format!("Failed to parse quotes for {symbol}: {e}"),
        })?;

        let minor = minor_unit_quoted(symbol);
        let mut points = Vec::with_capacity(quotes.len());
        for q in &quotes {
            let date = match Self::timestamp_to_naive_date(q.timestamp) {
                Some(d) if d >= from && d <= to => d,
                _ => continue,
            };
            let mut close = Self::to_decimal(q.close, symbol)?;
            if minor {
                close /= Decimal::from(100);
            }
            points.push(PricePoint { date, close });
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}
