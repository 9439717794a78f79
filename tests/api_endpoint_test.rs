use axum::http::StatusCode;
use hypehold::api::{self, AppState};
use hypehold::config::{Config, RunMode};
use hypehold::datasource::{DataSourceError, MockDataSource};
use hypehold::domain::{Decimal, TimeMs, MS_PER_HOUR};
use hypehold::engine::Thresholds;
use hypehold::orchestration::Analyzer;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

const ACTIVE: &str = "0x00000000000000000000000000000000000000a1";
const BROKEN: &str = "0x00000000000000000000000000000000000000b2";
const EMPTY: &str = "0x00000000000000000000000000000000000000c3";

fn test_config() -> Config {
    Config {
        run_mode: RunMode::Serve,
        port: 0,
        hyperliquid_api_url: "http://example.invalid".to_string(),
        min_recent_closes: 2,
        min_avg_daily_closes: 2,
        max_avg_holding_hours: Decimal::one(),
        show_full_stats: false,
        screen_concurrency: 1,
        address_list_file: None,
        blacklist_file: None,
        report_csv_path: None,
    }
}

fn active_fills() -> Vec<Value> {
    let now = TimeMs::now().as_ms();
    let start = now - 4 * MS_PER_HOUR;
    vec![
        json!({"coin": "BTC", "dir": "Open Long", "sz": "1", "px": "100", "time": start}),
        json!({"coin": "BTC", "dir": "Close Long", "sz": "1", "px": "101", "time": start + MS_PER_HOUR / 4}),
        json!({"coin": "PURR/USDC", "dir": "Buy", "sz": "10", "px": "0.2", "time": start}),
        json!({"coin": "PURR/USDC", "dir": "Sell", "sz": "4", "px": "0.2", "time": start + MS_PER_HOUR / 2}),
    ]
}

fn setup_test_app() -> axum::Router {
    let datasource = Arc::new(
        MockDataSource::new()
            .with_fills(ACTIVE, active_fills())
            .with_failure(BROKEN, DataSourceError::RateLimited),
    );
    let analyzer = Arc::new(Analyzer::new(datasource, test_config().thresholds()));
    api::create_router(AppState::new(analyzer))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = get(setup_test_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let (status, body) = get(setup_test_app(), "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_holding_times_endpoint() {
    let (status, body) =
        get(setup_test_app(), &format!("/v1/holding-times?user={}", ACTIVE)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["user"], ACTIVE);
    assert_eq!(body["fillCounts"]["derivative"], 2);
    assert_eq!(body["fillCounts"]["spot"], 2);
    assert_eq!(body["derivative"]["totalCloseCount"], 1);
    assert_eq!(body["derivative"]["overallSimpleAvg"], 0.25);
    assert_eq!(body["spot"]["overallSimpleAvg"], 0.5);
    assert_eq!(body["combined"]["totalCloseCount"], 2);

    let per_coin = body["perCoin"].as_array().unwrap();
    assert_eq!(per_coin.len(), 2);

    let open = body["openPositions"].as_array().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["coin"], "PURR/USDC");
    assert_eq!(open[0]["totalSize"], 6.0);
    assert!(body["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_holding_times_unknown_user_has_no_data() {
    let (status, body) =
        get(setup_test_app(), &format!("/v1/holding-times?user={}", EMPTY)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["combined"].is_null());
    assert_eq!(body["warnings"][0]["kind"], "noClosedLots");
}

#[tokio::test]
async fn test_screen_endpoint_uses_configured_thresholds() {
    let (status, body) = get(setup_test_app(), &format!("/v1/screen?user={}", ACTIVE)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["passes"], true);
    assert_eq!(body["metrics"]["recent24hCloseCount"], 2);
    assert_eq!(body["metrics"]["avgHoldingHours"], 0.375);
    assert_eq!(body["metrics"]["meetsAllCriteria"], true);
}

#[tokio::test]
async fn test_screen_endpoint_query_overrides() {
    let uri = format!(
        "/v1/screen?user={}&minRecentCloses=3&maxAvgHoldingHours=0.1",
        ACTIVE
    );
    let (status, body) = get(setup_test_app(), &uri).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["passes"], false);
    assert_eq!(body["metrics"]["meetsRecentCriteria"], false);
    assert_eq!(body["metrics"]["meetsAvgCriteria"], true);
    assert_eq!(body["metrics"]["meetsHoldingTimeCriteria"], false);
}

#[tokio::test]
async fn test_screen_unknown_user_does_not_pass() {
    let (status, body) = get(setup_test_app(), &format!("/v1/screen?user={}", EMPTY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["passes"], false);
    assert!(body["metrics"].is_null());
}

#[tokio::test]
async fn test_invalid_user_is_bad_request() {
    for uri in [
        "/v1/screen?user=0x123",
        "/v1/holding-times?user=not-an-address",
    ] {
        let (status, body) = get(setup_test_app(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid user address");
    }
}

#[tokio::test]
async fn test_invalid_threshold_is_bad_request() {
    let uri = format!("/v1/screen?user={}&maxAvgHoldingHours=abc", ACTIVE);
    let (status, _) = get(setup_test_app(), &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let (status, body) = get(setup_test_app(), &format!("/v1/screen?user={}", BROKEN)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("Rate limited"));
}

#[test]
fn test_default_thresholds_match_config_defaults() {
    assert_eq!(Thresholds::default().min_recent_closes, 24);
}
