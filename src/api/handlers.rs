use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    api::{
        middleware::TraceId,
        response::{success_response, ApiResponse},
    },
    app_state::AppState,
    domain::{ChainRecord, CrossChainResult, HealthReport, RegistrySnapshot, SessionContext},
    error::AppError,
    service::{ProvisioningOutcome, ProvisioningRequest},
    utils::IdentifierValidator,
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// 记录失败计数并附上 trace_id
fn fail(endpoint: &'static str, trace_id: &TraceId, err: AppError) -> AppError {
    crate::metrics::count_err(endpoint);
    tracing::warn!(endpoint, trace_id = %trace_id.0, code = err.code.as_str(), message = %err.message, "api_request_failed");
    err.with_trace_id(trace_id.0.clone())
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Healthz {
    pub status: String,
    pub generation: u64,
    pub chains: usize,
    /// 是否配置了应用 ID
    pub deployment_context: bool,
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "OK", body = Healthz))
)]
pub async fn healthz(State(st): State<Arc<AppState>>) -> ApiResult<Healthz> {
    crate::metrics::count_ok("GET /healthz");
    let snapshot = st.registry.snapshot().await;
    success_response(Healthz {
        status: "ok".into(),
        generation: snapshot.generation,
        chains: snapshot.len(),
        deployment_context: st.coordinator.has_context(),
    })
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::render_prometheus(),
    )
}

/// 注册表视图
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainsView {
    pub chains: Vec<ChainRecord>,
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl ChainsView {
    fn new(snapshot: &RegistrySnapshot, last_error: Option<String>) -> Self {
        Self {
            chains: snapshot.chains.clone(),
            generation: snapshot.generation,
            refreshed_at: snapshot.refreshed_at,
            last_error,
        }
    }
}

async fn current_view(st: &AppState) -> ChainsView {
    let snapshot = st.registry.snapshot().await;
    ChainsView::new(&snapshot, st.registry.last_error().await)
}

#[utoipa::path(
    get,
    path = "/api/chains",
    responses((status = 200, description = "Current registry snapshot", body = ChainsView))
)]
pub async fn list_chains(State(st): State<Arc<AppState>>) -> ApiResult<ChainsView> {
    crate::metrics::count_ok("GET /api/chains");
    success_response(current_view(&st).await)
}

#[utoipa::path(
    get,
    path = "/api/chains/active",
    responses(
        (status = 200, description = "Active chain", body = ChainRecord),
        (status = 404, description = "No active chain")
    )
)]
pub async fn active_chain(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
) -> ApiResult<ChainRecord> {
    const EP: &str = "GET /api/chains/active";
    match st.registry.active().await {
        Some(record) => {
            crate::metrics::count_ok(EP);
            success_response(record)
        }
        None => Err(fail(EP, &trace_id, AppError::no_active_chain())),
    }
}

#[utoipa::path(
    post,
    path = "/api/chains/refresh",
    responses(
        (status = 200, description = "Discovery completed", body = ChainsView),
        (status = 502, description = "Discovery source failed, previous snapshot kept")
    )
)]
pub async fn refresh_chains(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
) -> ApiResult<ChainsView> {
    const EP: &str = "POST /api/chains/refresh";
    let snapshot = st
        .refresh_registry()
        .await
        .map_err(|e| fail(EP, &trace_id, e.into()))?;
    crate::metrics::count_ok(EP);
    success_response(ChainsView::new(&snapshot, None))
}

#[utoipa::path(
    post,
    path = "/api/chains/health",
    responses((status = 200, description = "Health merged into registry", body = ChainsView))
)]
pub async fn probe_all_health(State(st): State<Arc<AppState>>) -> ApiResult<ChainsView> {
    crate::metrics::count_ok("POST /api/chains/health");
    st.health.probe_registry(&st.registry).await;
    success_response(current_view(&st).await)
}

#[utoipa::path(
    post,
    path = "/api/chains/{chain_id}/health",
    params(("chain_id" = String, Path, description = "64-hex chain id")),
    responses(
        (status = 200, description = "Probe result", body = HealthReport),
        (status = 404, description = "Chain not in registry"),
        (status = 503, description = "No deployment context")
    )
)]
pub async fn probe_chain_health(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(chain_id): Path<String>,
) -> ApiResult<HealthReport> {
    const EP: &str = "POST /api/chains/:chain_id/health";
    IdentifierValidator::validate_chain_id(&chain_id).map_err(|e| fail(EP, &trace_id, e))?;

    let record = st
        .registry
        .get(&chain_id)
        .await
        .ok_or_else(|| fail(EP, &trace_id, AppError::chain_not_found(&chain_id)))?;

    let report = st.health.probe_health(&record).await.ok_or_else(|| {
        fail(
            EP,
            &trace_id,
            AppError::configuration_missing("APPLICATION_ID is not configured"),
        )
    })?;

    st.registry.apply_health(&chain_id, report).await;
    crate::metrics::count_ok(EP);
    success_response(report)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub active_chain_id: Option<String>,
    pub active_owner: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub session: SessionContext,
    pub registry: ChainsView,
}

#[utoipa::path(
    put,
    path = "/api/session",
    request_body = SessionUpdate,
    responses(
        (status = 200, description = "Session updated and registry refreshed", body = SessionView),
        (status = 400, description = "Invalid chain id or owner"),
        (status = 502, description = "Session updated but discovery failed")
    )
)]
pub async fn update_session(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Json(req): Json<SessionUpdate>,
) -> ApiResult<SessionView> {
    const EP: &str = "PUT /api/session";
    let session = SessionContext::new(req.active_chain_id, req.active_owner);
    if let Some(chain_id) = &session.active_chain_id {
        IdentifierValidator::validate_chain_id(chain_id).map_err(|e| fail(EP, &trace_id, e))?;
    }
    if let Some(owner) = &session.active_owner {
        IdentifierValidator::validate_owner(owner).map_err(|e| fail(EP, &trace_id, e))?;
    }

    *st.session.write().await = session.clone();
    tracing::info!(active_chain_id = ?session.active_chain_id, "session_updated");

    let snapshot = st
        .refresh_registry()
        .await
        .map_err(|e| fail(EP, &trace_id, e.into()))?;
    crate::metrics::count_ok(EP);
    success_response(SessionView {
        session,
        registry: ChainsView::new(&snapshot, None),
    })
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub variables: Value,
    /// 缺省时为注册表中的全部链
    #[serde(default)]
    pub targets: Option<Vec<String>>,
}

#[utoipa::path(
    post,
    path = "/api/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "One result per target, in target order", body = [CrossChainResult]),
        (status = 400, description = "Empty query or invalid target")
    )
)]
pub async fn cross_chain_query(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<Vec<CrossChainResult>> {
    const EP: &str = "POST /api/query";
    if req.query.trim().is_empty() {
        return Err(fail(EP, &trace_id, AppError::bad_request("query must not be empty")));
    }

    let results = match req.targets {
        Some(targets) => {
            for target in &targets {
                IdentifierValidator::validate_chain_id(target)
                    .map_err(|e| fail(EP, &trace_id, e))?;
            }
            st.coordinator
                .dispatch(&targets, &req.query, &req.variables)
                .await
        }
        None => {
            st.coordinator
                .dispatch_to_registry(&st.registry, &req.query, &req.variables)
                .await
        }
    };

    crate::metrics::count_ok(EP);
    success_response(results)
}

#[utoipa::path(
    post,
    path = "/api/chains/provision",
    request_body = ProvisioningRequest,
    responses((status = 200, description = "Redirect to external tooling", body = ProvisioningOutcome))
)]
pub async fn provision_chain(
    State(st): State<Arc<AppState>>,
    body: Option<Json<ProvisioningRequest>>,
) -> ApiResult<ProvisioningOutcome> {
    crate::metrics::count_ok("POST /api/chains/provision");
    let request = body.map(|Json(r)| r).unwrap_or_default();
    success_response(st.provisioning.request_chain(&request).await)
}
