//! Transport adapter: newline-delimited JSON over stdin/stdout.
//!
//! One request object per line, one response object per line. The engine
//! has no knowledge of this framing; this module translates envelopes into
//! engine/provider calls and their results into the response shape. A bad
//! line produces an error response, never a dead loop.

use std::sync::Arc;

use error_stack::{Report, ResultExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::{Indicator, REGISTRY};
use crate::error::{ProtocolError, TransportError};
use crate::model::{HistoryRange, Interval, SeriesInput};
use crate::provider::DataProvider;

/// Read requests from stdin and answer on stdout until EOF or cancellation.
pub async fn serve(
    provider: Option<Arc<dyn DataProvider>>,
    cancel: CancellationToken,
) -> Result<(), Report<TransportError>> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();

    info!(indicators = REGISTRY.len(), "serving on stdio");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("serve loop cancelled");
                break;
            }
            line = lines.next_line() => {
                let line = line.change_context(TransportError::Read)?;
                let Some(line) = line else {
                    debug!("request stream closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let response = handle_line(&line, provider.as_deref()).await;
                let mut body = response.to_string();
                body.push('\n');
                stdout
                    .write_all(body.as_bytes())
                    .await
                    .change_context(TransportError::Write)?;
                stdout.flush().await.change_context(TransportError::Write)?;
            }
        }
    }

    Ok(())
}

fn ok(id: Value, result: Value) -> Value {
    json!({ "id": id, "ok": true, "result": result })
}

fn fail(id: Value, kind: &str, message: impl std::fmt::Display) -> Value {
    json!({ "id": id, "ok": false, "error": { "kind": kind, "message": message.to_string() } })
}

#[derive(Debug, Deserialize)]
struct ComputeBody {
    indicator: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    series: SeriesInput,
}

#[derive(Debug, Deserialize)]
struct HistoryBody {
    symbol: String,
    range: Option<String>,
    interval: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteBody {
    symbols: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    query: String,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    symbol: String,
}

async fn handle_line(line: &str, provider: Option<&dyn DataProvider>) -> Value {
    let request: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "unparseable request line");
            return fail(Value::Null, ProtocolError::MalformedRequest.kind(), e);
        }
    };

    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let Some(method) = request
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_owned)
    else {
        return fail(
            id,
            ProtocolError::MalformedRequest.kind(),
            "missing \"method\" field",
        );
    };

    match method.as_str() {
        "list_indicators" => ok(id, json!({ "indicators": REGISTRY })),
        "compute" => handle_compute(id, request),
        "history" | "quote" | "search" | "summary" => {
            let Some(provider) = provider else {
                return fail(
                    id,
                    "provider_disabled",
                    "data provider is disabled in configuration",
                );
            };
            handle_provider_call(id, &method, request, provider).await
        }
        other => {
            let error = ProtocolError::UnknownMethod { name: other.into() };
            fail(id, error.kind(), error)
        }
    }
}

fn handle_compute(id: Value, request: Value) -> Value {
    let body: ComputeBody = match serde_json::from_value(request) {
        Ok(body) => body,
        Err(e) => return fail(id, ProtocolError::MalformedRequest.kind(), e),
    };

    let call = match Indicator::parse(&body.indicator, body.params) {
        Ok(call) => call,
        Err(report) => {
            let context = report.current_context();
            return fail(id, context.kind(), context);
        }
    };

    match call.compute(&body.series) {
        Ok(response) => {
            debug!(indicator = %body.indicator, length = response.length, "computed");
            ok(id, json!(response))
        }
        Err(report) => {
            let context = report.current_context();
            debug!(indicator = %body.indicator, error = %context, "validation failed");
            fail(id, context.kind(), context)
        }
    }
}

async fn handle_provider_call(
    id: Value,
    method: &str,
    request: Value,
    provider: &dyn DataProvider,
) -> Value {
    match method {
        "history" => {
            let body: HistoryBody = match serde_json::from_value(request) {
                Ok(body) => body,
                Err(e) => return fail(id, ProtocolError::MalformedRequest.kind(), e),
            };
            let Some(range) = parse_range(body.range.as_deref()) else {
                return fail(id, ProtocolError::MalformedRequest.kind(), "unknown range");
            };
            let Some(interval) = parse_interval(body.interval.as_deref()) else {
                return fail(id, ProtocolError::MalformedRequest.kind(), "unknown interval");
            };
            match provider.fetch_history(&body.symbol, range, interval).await {
                Ok(history) => ok(id, json!(history)),
                Err(report) => {
                    let context = report.current_context();
                    warn!(symbol = %body.symbol, error = ?report, "history fetch failed");
                    fail(id, context.kind(), context)
                }
            }
        }
        "quote" => {
            let body: QuoteBody = match serde_json::from_value(request) {
                Ok(body) => body,
                Err(e) => return fail(id, ProtocolError::MalformedRequest.kind(), e),
            };
            match provider.fetch_quotes(&body.symbols).await {
                Ok(quotes) => ok(id, json!({ "quotes": quotes })),
                Err(report) => {
                    let context = report.current_context();
                    fail(id, context.kind(), context)
                }
            }
        }
        "search" => {
            let body: SearchBody = match serde_json::from_value(request) {
                Ok(body) => body,
                Err(e) => return fail(id, ProtocolError::MalformedRequest.kind(), e),
            };
            match provider.search(&body.query).await {
                Ok(matches) => ok(id, json!({ "matches": matches })),
                Err(report) => {
                    let context = report.current_context();
                    fail(id, context.kind(), context)
                }
            }
        }
        "summary" => {
            let body: SummaryBody = match serde_json::from_value(request) {
                Ok(body) => body,
                Err(e) => return fail(id, ProtocolError::MalformedRequest.kind(), e),
            };
            match provider.fetch_summary(&body.symbol).await {
                Ok(summary) => ok(id, json!(summary)),
                Err(report) => {
                    let context = report.current_context();
                    fail(id, context.kind(), context)
                }
            }
        }
        _ => unreachable!("handle_provider_call called with {method}"),
    }
}

fn parse_range(s: Option<&str>) -> Option<HistoryRange> {
    match s {
        None => Some(HistoryRange::Month1),
        Some(s) => HistoryRange::from_str(s),
    }
}

fn parse_interval(s: Option<&str>) -> Option<Interval> {
    match s {
        None => Some(Interval::Day1),
        Some(s) => Interval::from_str(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn handle(line: &str) -> Value {
        handle_line(line, None).await
    }

    #[tokio::test]
    async fn compute_round_trip_over_the_wire() {
        let line = r#"{"id": 7, "method": "compute", "indicator": "sma",
            "params": {"period": 3},
            "series": {"close": [10.0, 11.0, 12.0, 11.0, 10.0, 9.0, 10.0, 11.0, 12.0, 13.0]}}"#;
        let response = handle(line).await;
        assert_eq!(response["id"], json!(7));
        assert_eq!(response["ok"], json!(true));
        let result = &response["result"];
        assert_eq!(result["warmup"], json!(2));
        let values = result["outputs"][0]["values"].as_array().unwrap();
        assert_eq!(values.len(), 10);
        assert!(values[0].is_null());
        assert!(values[1].is_null());
        assert_eq!(values[2], json!(11.0));
    }

    #[tokio::test]
    async fn validation_error_becomes_structured_body() {
        let line = r#"{"id": 1, "method": "compute", "indicator": "rsi",
            "series": {"close": [1.0, 2.0, 3.0]}}"#;
        let response = handle(line).await;
        assert_eq!(response["ok"], json!(false));
        assert_eq!(response["error"]["kind"], json!("insufficient_data"));
        assert!(response["error"]["message"].as_str().unwrap().contains("15"));
    }

    #[tokio::test]
    async fn unknown_indicator_reported() {
        let line = r#"{"id": 2, "method": "compute", "indicator": "supertrend",
            "series": {"close": [1.0]}}"#;
        let response = handle(line).await;
        assert_eq!(response["error"]["kind"], json!("unknown_indicator"));
    }

    #[tokio::test]
    async fn malformed_line_answered_with_null_id() {
        let response = handle("{not json").await;
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["ok"], json!(false));
        assert_eq!(response["error"]["kind"], json!("malformed_request"));
    }

    #[tokio::test]
    async fn missing_method_rejected() {
        let response = handle(r#"{"id": 3}"#).await;
        assert_eq!(response["error"]["kind"], json!("malformed_request"));
    }

    #[tokio::test]
    async fn unknown_method_rejected() {
        let response = handle(r#"{"id": 4, "method": "backtest"}"#).await;
        assert_eq!(response["error"]["kind"], json!("unknown_method"));
    }

    #[tokio::test]
    async fn list_indicators_exposes_registry() {
        let response = handle(r#"{"id": 5, "method": "list_indicators"}"#).await;
        assert_eq!(response["ok"], json!(true));
        let indicators = response["result"]["indicators"].as_array().unwrap();
        assert_eq!(indicators.len(), REGISTRY.len());
        assert!(indicators.iter().any(|i| i["name"] == json!("sar")));
    }

    #[tokio::test]
    async fn provider_methods_fail_cleanly_when_disabled() {
        let response = handle(r#"{"id": 6, "method": "history", "symbol": "AAPL"}"#).await;
        assert_eq!(response["error"]["kind"], json!("provider_disabled"));
    }

    #[tokio::test]
    async fn compute_ignores_provider_absence() {
        let line = r#"{"id": 8, "method": "compute", "indicator": "obv",
            "series": {"close": [1.0, 2.0], "volume": [10.0, 20.0]}}"#;
        let response = handle(line).await;
        assert_eq!(response["ok"], json!(true));
        assert_eq!(response["result"]["warmup"], json!(0));
    }
}
