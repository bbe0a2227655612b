//! Integration tests for the TradingView MPC relay endpoints
//!
//! A wiremock server plays the TradingView API server.


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::Bytes;
use serde_json::{json, Value};
use starferry_tradingview::config::RelayConfig;
use starferry_tradingview::error::RelayError;
use starferry_tradingview::metrics::Metrics;
use starferry_tradingview::plugins::tradingview_mpc::{
    ChartQuery, SymbolsQuery, TradingViewApi, UpstreamResponse,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use test_utils::{
    relay_server, stub_server, unreachable_api_url, TestApp, CHART_PATH, STATUS_PATH,
    SYMBOLS_PATH,
};

#[tokio::test]
async fn status_returns_upstream_body_unchanged() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"connected": true})))
        .expect(1)
        .mount(&app.tradingview)
        .await;

    let response = app.server.get(STATUS_PATH).await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body, json!({"connected": true}));
}

#[tokio::test]
async fn status_body_is_forwarded_byte_for_byte() {
    let app = TestApp::new().await;
    let raw = "{ \"connected\" : true,\n  \"session\": \"abc\" }";
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(raw, "application/json"))
        .mount(&app.tradingview)
        .await;

    let response = app.server.get(STATUS_PATH).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), raw);
    assert_eq!(response.header("content-type"), "application/json");
}

#[tokio::test]
async fn symbols_forwards_exchange_and_returns_symbols() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/symbols"))
        .and(body_json(json!({"exchange": "NASDAQ"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["AAPL", "MSFT"])))
        .expect(1)
        .mount(&app.tradingview)
        .await;

    let response = app
        .server
        .post(SYMBOLS_PATH)
        .json(&json!({"exchange": "NASDAQ"}))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body, json!(["AAPL", "MSFT"]));
}

#[tokio::test]
async fn symbols_forwards_exchange_value_exactly() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/symbols"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.tradingview)
        .await;

    for exchange in ["NYSE", " binance ", "LSE:GB", "東証"] {
        let response = app
            .server
            .post(SYMBOLS_PATH)
            .json(&json!({"exchange": exchange}))
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let requests = app
        .tradingview
        .received_requests()
        .await
        .expect("wiremock requests");
    let forwarded: Vec<String> = requests
        .iter()
        .map(|req| {
            let body: Value = serde_json::from_slice(&req.body).expect("json body");
            body["exchange"].as_str().expect("exchange").to_string()
        })
        .collect();
    assert_eq!(forwarded, vec!["NYSE", " binance ", "LSE:GB", "東証"]);
}

#[tokio::test]
async fn chart_without_range_omits_range_fields_upstream() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/chart"))
        .and(body_json(json!({"symbol": "NASDAQ:AAPL", "interval": "1D"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bars": []})))
        .expect(1)
        .mount(&app.tradingview)
        .await;

    let response = app
        .server
        .post(CHART_PATH)
        .json(&json!({"symbol": "NASDAQ:AAPL", "interval": "1D"}))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>(), json!({"bars": []}));

    let requests = app
        .tradingview
        .received_requests()
        .await
        .expect("wiremock requests");
    let body: Value = serde_json::from_slice(&requests[0].body).expect("json body");
    let object = body.as_object().expect("object body");
    assert!(!object.contains_key("range_from"));
    assert!(!object.contains_key("range_to"));
}

#[tokio::test]
async fn chart_forwards_supplied_range_bounds() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/chart"))
        .and(body_json(json!({
            "symbol": "BINANCE:BTCUSDT",
            "interval": "60",
            "range_from": "2024-01-01",
            "range_to": "2024-02-01"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bars": [[1, 2, 3]]})))
        .expect(1)
        .mount(&app.tradingview)
        .await;

    let response = app
        .server
        .post(CHART_PATH)
        .json(&json!({
            "symbol": "BINANCE:BTCUSDT",
            "interval": "60",
            "range_from": "2024-01-01",
            "range_to": "2024-02-01"
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>(), json!({"bars": [[1, 2, 3]]}));
}

#[tokio::test]
async fn chart_forwards_only_the_range_bound_supplied() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/chart"))
        .and(body_json(json!({
            "symbol": "NASDAQ:MSFT",
            "interval": "1W",
            "range_to": "2024-06-30"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bars": []})))
        .expect(1)
        .mount(&app.tradingview)
        .await;

    let response = app
        .server
        .post(CHART_PATH)
        .json(&json!({
            "symbol": "NASDAQ:MSFT",
            "interval": "1W",
            "range_from": null,
            "range_to": "2024-06-30"
        }))
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn upstream_error_status_and_body_pass_through() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/symbols"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "unknown exchange"})),
        )
        .mount(&app.tradingview)
        .await;

    let response = app
        .server
        .post(SYMBOLS_PATH)
        .json(&json!({"exchange": "NOWHERE"}))
        .await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.json::<Value>(), json!({"error": "unknown exchange"}));
}

#[tokio::test]
async fn upstream_server_error_passes_through() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "session lost"})))
        .mount(&app.tradingview)
        .await;

    let response = app.server.get(STATUS_PATH).await;
    assert_eq!(response.status_code(), 500);
    assert_eq!(response.json::<Value>(), json!({"error": "session lost"}));
}

#[tokio::test]
async fn non_json_success_body_is_reported_as_bad_gateway() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&app.tradingview)
        .await;

    let response = app.server.get(STATUS_PATH).await;
    assert_eq!(response.status_code(), 502);

    let body: Value = response.json();
    assert!(body["detail"].as_str().unwrap().contains("malformed"));
}

#[tokio::test]
async fn unreachable_api_server_yields_service_unavailable_on_every_endpoint() {
    let config = RelayConfig::new(&unreachable_api_url()).expect("valid url");
    let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
    let server = relay_server(config, metrics);

    let status = server.get(STATUS_PATH).await;
    assert_eq!(status.status_code(), 503);
    assert!(status.json::<Value>()["detail"]
        .as_str()
        .unwrap()
        .contains("TradingView API unavailable"));

    let symbols = server
        .post(SYMBOLS_PATH)
        .json(&json!({"exchange": "NASDAQ"}))
        .await;
    assert_eq!(symbols.status_code(), 503);

    let chart = server
        .post(CHART_PATH)
        .json(&json!({"symbol": "NASDAQ:AAPL", "interval": "1D"}))
        .await;
    assert_eq!(chart.status_code(), 503);
}

#[tokio::test]
async fn slow_api_server_times_out_as_unavailable() {
    let app = TestApp::with_timeout(Duration::from_millis(300)).await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"connected": true}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&app.tradingview)
        .await;

    let started = Instant::now();
    let response = app.server.get(STATUS_PATH).await;
    assert_eq!(response.status_code(), 503);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let app = TestApp::new().await;

    let symbols = app.server.post(SYMBOLS_PATH).json(&json!({})).await;
    assert_eq!(symbols.status_code(), 422);
    assert!(symbols.json::<Value>()["detail"].is_string());

    let chart = app
        .server
        .post(CHART_PATH)
        .json(&json!({"symbol": "NASDAQ:AAPL"}))
        .await;
    assert_eq!(chart.status_code(), 422);

    let requests = app
        .tradingview
        .received_requests()
        .await
        .expect("wiremock requests");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn malformed_json_body_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post(SYMBOLS_PATH)
        .content_type("application/json")
        .bytes(Bytes::from_static(b"{\"exchange\": "))
        .await;
    assert_eq!(response.status_code(), 422);
}

#[tokio::test]
async fn upstream_calls_are_recorded_in_metrics() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/symbols"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["AAPL"])))
        .mount(&app.tradingview)
        .await;

    let _ = app
        .server
        .post(SYMBOLS_PATH)
        .json(&json!({"exchange": "NASDAQ"}))
        .await;

    let body = app.server.get("/metrics").await.text();
    let line = body
        .lines()
        .find(|line| line.starts_with("upstream_requests_total{"))
        .expect("upstream_requests_total sample");
    assert!(line.contains("endpoint=\"symbols\""));
    assert!(line.contains("outcome=\"success\""));
    assert!(line.ends_with(" 1"));
}

/// Counts calls so tests can prove validation happens before forwarding.
#[derive(Default)]
struct CountingApi {
    calls: AtomicUsize,
}

impl CountingApi {
    fn reply(&self) -> Result<UpstreamResponse, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(UpstreamResponse {
            status: 200,
            content_type: None,
            body: Bytes::from_static(b"{}"),
        })
    }
}

#[async_trait]
impl TradingViewApi for CountingApi {
    async fn status(&self) -> Result<UpstreamResponse, RelayError> {
        self.reply()
    }

    async fn symbols(&self, _query: &SymbolsQuery) -> Result<UpstreamResponse, RelayError> {
        self.reply()
    }

    async fn chart(&self, _query: &ChartQuery) -> Result<UpstreamResponse, RelayError> {
        self.reply()
    }
}

#[tokio::test]
async fn empty_required_fields_never_reach_the_api_server() {
    let api = Arc::new(CountingApi::default());
    let server = stub_server(api.clone());

    let symbols = server.post(SYMBOLS_PATH).json(&json!({"exchange": ""})).await;
    assert_eq!(symbols.status_code(), 422);

    let blank_symbol = server
        .post(CHART_PATH)
        .json(&json!({"symbol": "  ", "interval": "1D"}))
        .await;
    assert_eq!(blank_symbol.status_code(), 422);

    let blank_interval = server
        .post(CHART_PATH)
        .json(&json!({"symbol": "NASDAQ:AAPL", "interval": ""}))
        .await;
    assert_eq!(blank_interval.status_code(), 422);

    assert_eq!(api.calls.load(Ordering::SeqCst), 0);

    let valid = server.post(SYMBOLS_PATH).json(&json!({"exchange": "NYSE"})).await;
    assert_eq!(valid.status_code(), 200);
    assert_eq!(valid.header("content-type"), "application/json");
    assert_eq!(api.calls.load(Ordering::SeqCst), 1);
}
