use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// 通用兜底错误消息（异常没有可读消息时使用）
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorCode {
    // HTTP 基础错误码
    BadRequest,

    // 业务错误码
    InvalidChainId,
    InvalidOwner,
    ChainNotFound,
    NoActiveChain,
    DiscoveryFailed,
    ConfigurationMissing,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::InvalidChainId => "invalid_chain_id",
            AppErrorCode::InvalidOwner => "invalid_owner",
            AppErrorCode::ChainNotFound => "chain_not_found",
            AppErrorCode::NoActiveChain => "no_active_chain",
            AppErrorCode::DiscoveryFailed => "discovery_failed",
            AppErrorCode::ConfigurationMissing => "configuration_missing",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub trace_id: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
            trace_id: self.trace_id.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}

impl AppError {
    fn with_code(code: AppErrorCode, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            status,
            trace_id: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(AppErrorCode::BadRequest, StatusCode::BAD_REQUEST, msg)
    }

    // 业务错误辅助函数
    pub fn invalid_chain_id(value: &str) -> Self {
        Self::with_code(
            AppErrorCode::InvalidChainId,
            StatusCode::BAD_REQUEST,
            format!("Invalid chain id: {}", value),
        )
    }

    pub fn invalid_owner(value: &str) -> Self {
        Self::with_code(
            AppErrorCode::InvalidOwner,
            StatusCode::BAD_REQUEST,
            format!("Invalid owner: {}", value),
        )
    }

    pub fn chain_not_found(chain_id: &str) -> Self {
        Self::with_code(
            AppErrorCode::ChainNotFound,
            StatusCode::NOT_FOUND,
            format!("Chain not found in registry: {}", chain_id),
        )
    }

    pub fn no_active_chain() -> Self {
        Self::with_code(
            AppErrorCode::NoActiveChain,
            StatusCode::NOT_FOUND,
            "No active chain selected",
        )
    }

    pub fn configuration_missing(msg: impl Into<String>) -> Self {
        Self::with_code(
            AppErrorCode::ConfigurationMissing,
            StatusCode::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    /// 设置追踪ID
    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

impl From<DiscoveryError> for AppError {
    fn from(err: DiscoveryError) -> Self {
        Self::with_code(
            AppErrorCode::DiscoveryFailed,
            StatusCode::BAD_GATEWAY,
            err.to_string(),
        )
    }
}

/// 链发现失败（获取发现源时的传输/状态错误）
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("Discovery source unreachable: {0}")]
    Fetch(String),

    #[error("Discovery source returned HTTP {0}")]
    Status(u16),
}

/// 单链查询的传输层错误
///
/// `Display` 输出即为写入 `CrossChainResult.error` 的消息。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("{0}")]
    Request(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}
