use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ProviderError;
use crate::model::{Bar, History, HistoryRange, Interval, Quote, SymbolMatch, SymbolSummary};
use crate::provider::DataProvider;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
/// The endpoints are unofficial; stay well under their tolerance.
const DEFAULT_REQUESTS_PER_SECOND: NonZeroU32 = nonzero!(4u32);
const SEARCH_RESULT_LIMIT: usize = 10;
const SUMMARY_MODULES: &str = "assetProfile,summaryDetail,quoteType,calendarEvents";

pub struct YahooProvider {
    client: reqwest::Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    base_url: String,
}

impl YahooProvider {
    pub fn new(base_url: Option<String>, requests_per_second: Option<u32>) -> Self {
        let quota = Quota::per_second(
            requests_per_second
                .and_then(NonZeroU32::new)
                .unwrap_or(DEFAULT_REQUESTS_PER_SECOND),
        );
        Self {
            client: reqwest::Client::new(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Report<ProviderError>> {
        // Wait for the rate limiter before touching the network.
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .change_context(ProviderError::Request)
            .attach_with(|| format!("path: {path}"))?;

        if !response.status().is_success() {
            return Err(Report::new(ProviderError::Request)
                .attach(format!("HTTP status: {}", response.status())));
        }

        response
            .json()
            .await
            .change_context(ProviderError::ResponseParse)
            .attach_with(|| format!("path: {path}"))
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl DataProvider for YahooProvider {
    fn fetch_history(
        &self,
        symbol: &str,
        range: HistoryRange,
        interval: Interval,
    ) -> BoxFuture<'_, Result<History, Report<ProviderError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            let path = format!("/v8/finance/chart/{symbol}");
            let query = [
                ("range", range.as_str().to_owned()),
                ("interval", interval.as_str().to_owned()),
            ];
            let envelope: ChartEnvelope = self.get_json(&path, &query).await?;

            let data = envelope
                .chart
                .result
                .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
                .ok_or_else(|| {
                    Report::new(ProviderError::NoData {
                        symbol: symbol.clone(),
                    })
                })?;

            let history = data.into_history(&symbol, range, interval);
            info!(
                symbol = %symbol,
                range = %range,
                interval = %interval,
                bars = history.bars.len(),
                "fetched history"
            );
            Ok(history)
        })
    }

    fn fetch_quotes(
        &self,
        symbols: &[String],
    ) -> BoxFuture<'_, Result<Vec<Quote>, Report<ProviderError>>> {
        let joined = symbols.join(",");
        Box::pin(async move {
            let query = [("symbols", joined)];
            let envelope: QuoteEnvelope = self.get_json("/v7/finance/quote", &query).await?;
            let quotes: Vec<Quote> = envelope
                .quote_response
                .result
                .into_iter()
                .map(RawQuote::into_quote)
                .collect();
            debug!(count = quotes.len(), "fetched quotes");
            Ok(quotes)
        })
    }

    fn search(
        &self,
        query: &str,
    ) -> BoxFuture<'_, Result<Vec<SymbolMatch>, Report<ProviderError>>> {
        let query = query.to_owned();
        Box::pin(async move {
            let params = [
                ("q", query),
                ("quotesCount", SEARCH_RESULT_LIMIT.to_string()),
                ("newsCount", "0".to_owned()),
            ];
            let envelope: SearchEnvelope = self.get_json("/v1/finance/search", &params).await?;
            Ok(envelope
                .quotes
                .into_iter()
                .map(RawSearchHit::into_match)
                .collect())
        })
    }

    fn fetch_summary(
        &self,
        symbol: &str,
    ) -> BoxFuture<'_, Result<SymbolSummary, Report<ProviderError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            let path = format!("/v10/finance/quoteSummary/{symbol}");
            let query = [("modules", SUMMARY_MODULES.to_owned())];
            let envelope: SummaryEnvelope = self.get_json(&path, &query).await?;

            let result = envelope
                .quote_summary
                .result
                .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
                .ok_or_else(|| {
                    Report::new(ProviderError::NoData {
                        symbol: symbol.clone(),
                    })
                })?;

            Ok(result.into_summary(&symbol))
        })
    }
}

// ── Chart (history) response types ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

/// Per-field arrays with `null` holes for halted/missing bars.
#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartResult {
    /// Drop bars with any missing component; the engine's validator would
    /// reject them anyway, and partial bars carry no usable information.
    fn into_history(self, symbol: &str, range: HistoryRange, interval: Interval) -> History {
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();
        let bars = self
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let timestamp = DateTime::from_timestamp(ts, 0)?;
                Some(Bar {
                    timestamp,
                    open: (*quote.open.get(i)?)?,
                    high: (*quote.high.get(i)?)?,
                    low: (*quote.low.get(i)?)?,
                    close: (*quote.close.get(i)?)?,
                    volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
                })
            })
            .collect();
        History {
            symbol: symbol.to_owned(),
            range,
            interval,
            bars,
        }
    }
}

// ── Quote response types ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteBody,
}

#[derive(Debug, Deserialize)]
struct QuoteBody {
    #[serde(default)]
    result: Vec<RawQuote>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    symbol: String,
    #[serde(rename = "regularMarketPrice")]
    price: Option<f64>,
    #[serde(rename = "regularMarketPreviousClose")]
    previous_close: Option<f64>,
    #[serde(rename = "regularMarketDayHigh")]
    day_high: Option<f64>,
    #[serde(rename = "regularMarketDayLow")]
    day_low: Option<f64>,
    #[serde(rename = "regularMarketVolume")]
    volume: Option<f64>,
    #[serde(rename = "regularMarketTime")]
    market_time: Option<i64>,
}

impl RawQuote {
    fn into_quote(self) -> Quote {
        Quote {
            symbol: self.symbol,
            price: self.price.unwrap_or(f64::NAN),
            previous_close: self.previous_close,
            day_high: self.day_high,
            day_low: self.day_low,
            volume: self.volume,
            market_time: self.market_time.and_then(|t| DateTime::from_timestamp(t, 0)),
        }
    }
}

// ── Search response types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    quotes: Vec<RawSearchHit>,
}

#[derive(Debug, Deserialize)]
struct RawSearchHit {
    symbol: String,
    #[serde(rename = "shortname")]
    short_name: Option<String>,
    #[serde(rename = "longname")]
    long_name: Option<String>,
    exchange: Option<String>,
    #[serde(rename = "quoteType")]
    quote_type: Option<String>,
}

impl RawSearchHit {
    fn into_match(self) -> SymbolMatch {
        SymbolMatch {
            symbol: self.symbol,
            name: self.long_name.or(self.short_name),
            exchange: self.exchange,
            asset_type: self.quote_type,
        }
    }
}

// ── Summary response types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryResult {
    #[serde(rename = "assetProfile")]
    asset_profile: Option<AssetProfile>,
    #[serde(rename = "summaryDetail")]
    summary_detail: Option<SummaryDetail>,
    #[serde(rename = "quoteType")]
    quote_type: Option<QuoteTypeModule>,
    #[serde(rename = "calendarEvents")]
    calendar_events: Option<CalendarEvents>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryDetail {
    #[serde(rename = "marketCap")]
    market_cap: Option<WrappedValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<WrappedValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<WrappedValue>,
    #[serde(rename = "dividendRate")]
    dividend_rate: Option<WrappedValue>,
    #[serde(rename = "dividendYield")]
    dividend_yield: Option<WrappedValue>,
    #[serde(rename = "exDividendDate")]
    ex_dividend_date: Option<WrappedValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteTypeModule {
    #[serde(rename = "longName")]
    long_name: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CalendarEvents {
    earnings: Option<EarningsEvents>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EarningsEvents {
    #[serde(rename = "earningsDate")]
    earnings_date: Vec<WrappedValue>,
}

/// Yahoo wraps numerics as `{"raw": 1.23, "fmt": "1.23"}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WrappedValue {
    raw: Option<f64>,
}

impl WrappedValue {
    fn value(&self) -> Option<f64> {
        self.raw
    }

    fn epoch(&self) -> Option<DateTime<Utc>> {
        self.raw.and_then(|r| DateTime::from_timestamp(r as i64, 0))
    }
}

impl SummaryResult {
    fn into_summary(self, symbol: &str) -> SymbolSummary {
        let profile = self.asset_profile.unwrap_or_default();
        let detail = self.summary_detail.unwrap_or_default();
        let quote_type = self.quote_type.unwrap_or_default();
        let earnings_date = self
            .calendar_events
            .and_then(|c| c.earnings)
            .and_then(|e| e.earnings_date.first().and_then(WrappedValue::epoch));

        SymbolSummary {
            symbol: symbol.to_owned(),
            name: quote_type.long_name.or(quote_type.short_name),
            sector: profile.sector,
            industry: profile.industry,
            market_cap: detail.market_cap.as_ref().and_then(WrappedValue::value),
            trailing_pe: detail.trailing_pe.as_ref().and_then(WrappedValue::value),
            forward_pe: detail.forward_pe.as_ref().and_then(WrappedValue::value),
            dividend_rate: detail.dividend_rate.as_ref().and_then(WrappedValue::value),
            dividend_yield: detail.dividend_yield.as_ref().and_then(WrappedValue::value),
            ex_dividend_date: detail.ex_dividend_date.as_ref().and_then(WrappedValue::epoch),
            earnings_date,
        }
    }
}
