//! 会话上下文
//!
//! 调用方当前选中的链以显式参数传入发现流程，注册表保持为输入的纯函数。

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    #[serde(default)]
    pub active_chain_id: Option<String>,
    /// 活动链不在发现结果中时用作其 owner
    #[serde(default)]
    pub active_owner: Option<String>,
}

impl SessionContext {
    pub fn new(active_chain_id: Option<String>, active_owner: Option<String>) -> Self {
        Self {
            active_chain_id: active_chain_id.filter(|s| !s.is_empty()),
            active_owner: active_owner.filter(|s| !s.is_empty()),
        }
    }

    pub fn with_active(chain_id: impl Into<String>) -> Self {
        Self::new(Some(chain_id.into()), None)
    }
}
