//! 集成测试公共工具：本地 stub 节点与发现源

#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chainscope::infrastructure::endpoint::DeploymentContext;
use serde_json::Value;

pub const APP_ID: &str = "e476187f6ddfeb9d588c7b45d3df334d5501d6499b3f9ad5595cae86cce16a65";

/// 64 位十六进制链 ID（同一字符重复）
pub fn hex_id(c: char) -> String {
    std::iter::repeat(c).take(64).collect()
}

/// stub 节点对某条链的应答方式
#[derive(Clone)]
pub enum StubReply {
    Json(Value),
    Status(u16),
    Delayed(Duration, Value),
    Raw(&'static str),
}

struct StubState {
    replies: HashMap<String, StubReply>,
    requests: Mutex<Vec<(String, Value)>>,
}

pub struct StubNode {
    pub addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubNode {
    pub fn context(&self) -> DeploymentContext {
        DeploymentContext::new("127.0.0.1", self.addr.port(), APP_ID)
    }

    /// 收到的 (chain_id, 请求体) 列表
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.state
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

async fn handle_chain(
    State(state): State<Arc<StubState>>,
    Path((chain_id, _app_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if let Ok(mut requests) = state.requests.lock() {
        requests.push((chain_id.clone(), body));
    }

    match state.replies.get(&chain_id).cloned() {
        Some(StubReply::Json(v)) => Json(v).into_response(),
        Some(StubReply::Status(code)) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Some(StubReply::Delayed(delay, v)) => {
            tokio::time::sleep(delay).await;
            Json(v).into_response()
        }
        Some(StubReply::Raw(text)) => text.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// 启动模拟链节点，按链 ID 决定应答
pub async fn spawn_chain_node(replies: Vec<(&str, StubReply)>) -> StubNode {
    let state = Arc::new(StubState {
        replies: replies
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/chains/:chain_id/applications/:app_id", post(handle_chain))
        .with_state(state.clone());

    let addr = serve(app).await;
    StubNode { addr, state }
}

/// 启动模拟发现源，GET / 返回固定状态与正文
pub async fn spawn_discovery(status: u16, body: String) -> String {
    let app = Router::new().route(
        "/",
        get(move || {
            let body = body.clone();
            async move {
                (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::OK),
                    body,
                )
            }
        }),
    );
    let addr = serve(app).await;
    format!("http://{}/", addr)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// 一个当前没有监听者的本地端口
pub async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// 不走系统代理的 HTTP 客户端
pub fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
