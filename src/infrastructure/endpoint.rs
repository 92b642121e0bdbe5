//! 链端点解析
//!
//! (chain_id, application_id, port) → 链上托管应用的查询地址。
//! 纯函数：不做标识符校验，不做 I/O，不会失败。

use serde::{Deserialize, Serialize};

/// 节点服务默认主机
pub const DEFAULT_HOST: &str = "localhost";

/// 解析查询端点（默认主机）
pub fn resolve_endpoint(chain_id: &str, application_id: &str, port: u16) -> String {
    resolve_endpoint_on(DEFAULT_HOST, chain_id, application_id, port)
}

/// 解析查询端点（指定主机）
pub fn resolve_endpoint_on(host: &str, chain_id: &str, application_id: &str, port: u16) -> String {
    format!(
        "http://{}:{}/chains/{}/applications/{}",
        host, port, chain_id, application_id
    )
}

/// 部署上下文
///
/// 健康探测和跨链查询都依赖它；未配置应用 ID 时不存在部署上下文，
/// 相关操作直接返回空结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentContext {
    pub host: String,
    pub port: u16,
    pub application_id: String,
}

impl DeploymentContext {
    pub fn new(host: impl Into<String>, port: u16, application_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            application_id: application_id.into(),
        }
    }

    /// 某条链在当前部署下的查询地址
    pub fn endpoint_for(&self, chain_id: &str) -> String {
        resolve_endpoint_on(&self.host, chain_id, &self.application_id, self.port)
    }
}
