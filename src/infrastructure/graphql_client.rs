//! 单链 GraphQL 查询客户端
//!
//! POST `{query, variables}` 到链应用端点，响应形如 `{data?, errors?: [{message, ...}]}`。
//! 整个请求（发送 + 读取正文）受单次超时约束。

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

/// GraphQL 错误项
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// GraphQL 响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

impl GraphQlResponse {
    /// 第一条顶层错误消息；没有错误（或错误数组为空）时返回 None
    pub fn first_error(&self) -> Option<&str> {
        self.errors
            .as_ref()
            .and_then(|errs| errs.first())
            .map(|e| e.message.as_str())
    }

    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errs| !errs.is_empty())
    }
}

#[derive(Clone)]
pub struct GraphQlClient {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl GraphQlClient {
    /// 链端点是节点本地服务，不走系统代理
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(client, timeout)
    }

    pub fn with_client(http_client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            http_client,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 执行查询
    ///
    /// - 非 2xx → `TransportError::Status`
    /// - 超时 → `TransportError::Timeout`
    /// - 正文不是合法 JSON 响应 → `TransportError::Decode`
    pub async fn execute(
        &self,
        url: &str,
        query: &str,
        variables: &Value,
    ) -> Result<GraphQlResponse, TransportError> {
        match tokio::time::timeout(self.timeout, self.send(url, query, variables)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }

    async fn send(
        &self,
        url: &str,
        query: &str,
        variables: &Value,
    ) -> Result<GraphQlResponse, TransportError> {
        let resp = self
            .http_client
            .post(url)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(TransportError::from_reqwest)?;
        serde_json::from_slice::<GraphQlResponse>(&body)
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
