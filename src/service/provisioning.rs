//! 链创建挂钩
//!
//! 核心不创建链，只把调用方引导到外部钱包/命令行工具。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 创建请求（仅用于生成提示，不会被执行）
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningRequest {
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProvisioningOutcome {
    /// 需要调用方到外部工具完成
    Redirect { instructions: String },
}

#[async_trait]
pub trait ProvisioningHook: Send + Sync {
    async fn request_chain(&self, request: &ProvisioningRequest) -> ProvisioningOutcome;
}

/// 默认实现：返回外部工具的操作说明
pub struct ExternalToolRedirect {
    tool: String,
}

impl ExternalToolRedirect {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }
}

impl Default for ExternalToolRedirect {
    fn default() -> Self {
        Self::new("linera")
    }
}

#[async_trait]
impl ProvisioningHook for ExternalToolRedirect {
    async fn request_chain(&self, request: &ProvisioningRequest) -> ProvisioningOutcome {
        let instructions = match request.owner.as_deref().filter(|o| !o.is_empty()) {
            Some(owner) => format!(
                "Chain creation is handled by the wallet tooling. Run `{} open-chain --owner {}` and refresh discovery once it completes.",
                self.tool, owner
            ),
            None => format!(
                "Chain creation is handled by the wallet tooling. Run `{} open-chain` and refresh discovery once it completes.",
                self.tool
            ),
        };
        tracing::info!(tool = %self.tool, "chain_provisioning_redirected");
        ProvisioningOutcome::Redirect { instructions }
    }
}
