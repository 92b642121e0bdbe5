//! 跨链查询结果

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::UNKNOWN_ERROR;

/// 单链查询的终态，内部不重试
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DispatchState {
    Succeeded,
    Failed,
}

/// 单链查询结果
///
/// `data` 与 `error` 有且仅有一个存在，只能通过 `succeeded` / `failed` 构造。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrossChainResult {
    pub chain_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrossChainResult {
    pub fn succeeded(chain_id: impl Into<String>, data: Value) -> Self {
        Self {
            chain_id: chain_id.into(),
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// 空消息替换为通用兜底消息
    pub fn failed(chain_id: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            error
        };
        Self {
            chain_id: chain_id.into(),
            success: false,
            data: None,
            error: Some(error),
        }
    }

    pub fn state(&self) -> DispatchState {
        if self.success {
            DispatchState::Succeeded
        } else {
            DispatchState::Failed
        }
    }
}
