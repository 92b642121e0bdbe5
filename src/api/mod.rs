use std::{sync::Arc, time::Instant};

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::from_fn,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Level;
use utoipa::OpenApi;

use crate::{
    api::{
        handlers::{
            active_chain, cross_chain_query, healthz, list_chains, metrics, probe_all_health,
            probe_chain_health, provision_chain, refresh_chains, update_session,
        },
        middleware::{trace_id_middleware, TraceId, TRACE_ID_HEADER},
    },
    app_state::AppState,
};

pub mod handlers;
pub mod middleware;
pub mod response;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::healthz,
        handlers::list_chains,
        handlers::active_chain,
        handlers::refresh_chains,
        handlers::probe_all_health,
        handlers::probe_chain_health,
        handlers::update_session,
        handlers::cross_chain_query,
        handlers::provision_chain,
    ),
    components(schemas(
        handlers::Healthz,
        handlers::ChainsView,
        handlers::SessionUpdate,
        handlers::SessionView,
        handlers::QueryRequest,
        crate::domain::ChainRecord,
        crate::domain::SyncStatus,
        crate::domain::HealthReport,
        crate::domain::CrossChainResult,
        crate::domain::SessionContext,
        crate::service::ProvisioningRequest,
        crate::service::ProvisioningOutcome,
    )),
    tags((name = "chainscope", description = "Multi-chain registry, health and query fan-out"))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn routes(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::HeaderName::from_static(TRACE_ID_HEADER)]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/api/chains", get(list_chains))
        .route("/api/chains/active", get(active_chain))
        .route("/api/chains/refresh", post(refresh_chains))
        .route("/api/chains/health", post(probe_all_health))
        .route("/api/chains/provision", post(provision_chain))
        .route("/api/chains/:chain_id/health", post(probe_chain_health))
        .route("/api/session", put(update_session))
        .route("/api/query", post(cross_chain_query))
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn(trace_id_middleware))
                .layer(from_fn(add_response_time_header))
                .layer(from_fn(trace_log)),
        )
}

async fn add_response_time_header(req: Request, next: axum::middleware::Next) -> Response {
    let start = Instant::now();
    let mut resp = next.run(req).await;
    let elapsed_ms = start.elapsed().as_millis().to_string();
    resp.headers_mut().insert(
        "x-response-time",
        HeaderValue::from_str(&format!("{}ms", elapsed_ms))
            .unwrap_or(HeaderValue::from_static("0ms")),
    );
    resp
}

async fn trace_log(req: Request, next: axum::middleware::Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let trace_id = req
        .extensions()
        .get::<TraceId>()
        .map(|t| t.0.clone())
        .unwrap_or_else(|| "-".to_string());
    let resp = next.run(req).await;
    let status = resp.status();
    let elapsed = start.elapsed().as_millis();
    tracing::event!(Level::INFO, trace_id=%trace_id, method=%method, path=%path, status=%status.as_u16(), elapsed_ms=%elapsed, "http_request");
    resp
}
