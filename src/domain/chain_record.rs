//! 链记录模型

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 链同步状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Synced,
    Syncing,
    /// 默认值，探测失败时的回退状态
    #[default]
    Offline,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次健康探测的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// 事件计数，作为区块高度的活性代理
    pub block_height: u64,
    pub sync_status: SyncStatus,
}

impl HealthReport {
    pub fn synced(block_height: u64) -> Self {
        Self {
            block_height,
            sync_status: SyncStatus::Synced,
        }
    }

    pub fn offline() -> Self {
        Self {
            block_height: 0,
            sync_status: SyncStatus::Offline,
        }
    }

    pub fn is_online(&self) -> bool {
        self.sync_status != SyncStatus::Offline
    }
}

/// 链记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainRecord {
    /// 64 位十六进制链 ID（唯一键）
    pub chain_id: String,
    /// 控制者标识，未知时为空串
    #[serde(default)]
    pub owner: String,
    /// 十进制字符串，核心不解析
    pub balance: String,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_count: Option<u32>,
}

impl ChainRecord {
    /// 发现源中出现的链（元数据未知）
    pub fn discovered(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            owner: String::new(),
            balance: "0".to_string(),
            is_active: false,
            block_height: None,
            sync_status: SyncStatus::Offline,
            application_count: None,
        }
    }

    /// 发现源缺失但会话正在使用的链，尽力补全元数据
    pub fn synthesized_active(chain_id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            is_active: true,
            ..Self::discovered(chain_id)
        }
    }

    /// 合并健康探测结果
    pub fn apply_health(&mut self, report: &HealthReport) {
        self.block_height = Some(report.block_height);
        self.sync_status = report.sync_status;
    }
}
