//! HTTP 接口集成测试

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chainscope::{
    api,
    app_state::AppState,
    config::Config,
    infrastructure::discovery_source::{DiscoverySource, StaticDiscoverySource},
};
use common::{hex_id, spawn_chain_node, StubReply, APP_ID};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config(port: Option<u16>) -> Config {
    let mut config = Config::from_env().unwrap();
    config.network.host = "127.0.0.1".into();
    config.network.port = port.unwrap_or(8080);
    config.network.application_id = port.map(|_| APP_ID.to_string());
    config.session.active_chain_id = None;
    config.session.active_owner = None;
    config.dispatch.request_timeout_ms = 2000;
    config.health.timeout_ms = 2000;
    config
}

fn app_with(config: Config, listing: String) -> (Router, Arc<AppState>) {
    let source: Arc<dyn DiscoverySource> = Arc::new(StaticDiscoverySource::new(listing));
    let state = Arc::new(AppState::with_discovery_source(Arc::new(config), source));
    (api::routes(state.clone()), state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_healthz_and_trace_id_header() {
    let (app, _) = app_with(test_config(None), String::new());
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header("X-Trace-Id", "trace-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-trace-id"], "trace-42");

    let (status, body) = send(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["deploymentContext"], false);
}

#[tokio::test]
async fn test_refresh_then_list_and_active() {
    let a = hex_id('a');
    let b = hex_id('b');
    let (app, state) = app_with(
        test_config(None),
        format!("chains/{a} chains/{a} chains/{b}"),
    );

    let (status, body) = send(&app, "GET", "/api/chains/active", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "no_active_chain");
    assert!(body["trace_id"].is_string());

    let (status, body) = send(&app, "POST", "/api/chains/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["generation"], 1);
    assert_eq!(body["data"]["chains"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/session",
        Some(json!({"activeChainId": b})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["session"]["activeChainId"], json!(b));
    assert_eq!(state.registry.snapshot().await.generation, 2);

    let (status, body) = send(&app, "GET", "/api/chains/active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["chainId"], json!(b));
    assert_eq!(body["data"]["isActive"], true);

    let (_, body) = send(&app, "GET", "/api/chains", None).await;
    let chains = body["data"]["chains"].as_array().unwrap();
    assert_eq!(chains.len(), 2);
    assert_eq!(chains.iter().filter(|c| c["isActive"] == true).count(), 1);
}

#[tokio::test]
async fn test_session_rejects_invalid_ids() {
    let (app, state) = app_with(test_config(None), String::new());
    let (status, body) = send(
        &app,
        "PUT",
        "/api/session",
        Some(json!({"activeChainId": "not-a-chain"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_chain_id");
    assert_eq!(state.session.read().await.active_chain_id, None);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/session",
        Some(json!({"activeChainId": hex_id('a'), "activeOwner": "0x1234"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_owner");
}

#[tokio::test]
async fn test_query_fans_out_in_target_order() {
    let a = hex_id('a');
    let b = hex_id('b');
    let node = spawn_chain_node(vec![
        (a.as_str(), StubReply::Status(500)),
        (b.as_str(), StubReply::Json(json!({"data": {"ping": true}}))),
    ])
    .await;
    let (app, _) = app_with(test_config(Some(node.addr.port())), String::new());

    let (status, body) = send(
        &app,
        "POST",
        "/api/query",
        Some(json!({"query": "{ ping }", "targets": [a, b]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!([
            {"chainId": a, "success": false, "error": "HTTP 500"},
            {"chainId": b, "success": true, "data": {"ping": true}}
        ])
    );

    let (status, body) = send(
        &app,
        "POST",
        "/api/query",
        Some(json!({"query": "{ ping }", "targets": ["c1"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_chain_id");

    let (status, _) = send(&app, "POST", "/api/query", Some(json!({"query": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_without_context_is_empty() {
    let a = hex_id('a');
    let (app, _) = app_with(test_config(None), format!("chains/{a}"));
    send(&app, "POST", "/api/chains/refresh", None).await;

    let (status, body) = send(&app, "POST", "/api/query", Some(json!({"query": "{ x }"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_chain_health_endpoints() {
    let a = hex_id('a');
    let node = spawn_chain_node(vec![(
        a.as_str(),
        StubReply::Json(json!({"data": {"health": {"status": "ok", "totalEvents": 5}}})),
    )])
    .await;
    let (app, _) = app_with(test_config(Some(node.addr.port())), format!("chains/{a}"));

    let unknown = format!("/api/chains/{}/health", hex_id('b'));
    let (status, body) = send(&app, "POST", &unknown, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "chain_not_found");

    send(&app, "POST", "/api/chains/refresh", None).await;

    let (status, body) = send(&app, "POST", &format!("/api/chains/{a}/health"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"blockHeight": 5, "syncStatus": "synced"}));

    let (status, body) = send(&app, "POST", "/api/chains/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["chains"][0]["blockHeight"], 5);
    assert_eq!(body["data"]["chains"][0]["syncStatus"], "synced");
}

#[tokio::test]
async fn test_provision_redirects() {
    let (app, _) = app_with(test_config(None), String::new());
    let (status, body) = send(&app, "POST", "/api/chains/provision", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["kind"], "redirect");
    assert!(body["data"]["instructions"]
        .as_str()
        .unwrap()
        .contains("open-chain"));
}

#[tokio::test]
async fn test_openapi_and_metrics() {
    let (app, _) = app_with(test_config(None), String::new());
    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/query"].is_object());

    send(&app, "GET", "/healthz", None).await;
    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let text = String::from_utf8(
        to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();
    assert!(text.contains("chainscope_endpoint_requests_total{endpoint=\"GET /healthz\"}"));
}
