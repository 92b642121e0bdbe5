//! 链发现源
//!
//! 外部发现源返回的是无结构文本（目录页面、抓取结果等），这里是唯一按字符串处理的边界：
//! 扫描出候选链 ID 后，其余模块只处理强类型数据。

use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DiscoveryError;

/// `chains/<64 位小写十六进制>`，后面不能紧跟十六进制字符
static CHAIN_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"chains/([0-9a-f]{64})(?:[^0-9a-fA-F]|$)").expect("chain path pattern is valid")
});

/// 从发现源文本中提取候选链 ID（去重，保留首次出现顺序）
///
/// 没有匹配是正常结果，返回空列表。
pub fn extract_chain_ids(listing: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    CHAIN_PATH_PATTERN
        .captures_iter(listing)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// 发现源抽象
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    /// 获取原始列表文本
    async fn fetch_listing(&self) -> Result<String, DiscoveryError>;
}

/// HTTP 发现源：GET 指定地址，返回响应正文
pub struct HttpDiscoverySource {
    url: String,
    http_client: reqwest::Client,
}

impl HttpDiscoverySource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(url, client)
    }

    pub fn with_client(url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            http_client,
        }
    }
}

#[async_trait]
impl DiscoverySource for HttpDiscoverySource {
    async fn fetch_listing(&self) -> Result<String, DiscoveryError> {
        let resp = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Fetch(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status(status.as_u16()));
        }

        resp.text()
            .await
            .map_err(|e| DiscoveryError::Fetch(e.to_string()))
    }
}

/// 固定内容的发现源（本地目录快照、测试）
pub struct StaticDiscoverySource {
    listing: String,
}

impl StaticDiscoverySource {
    pub fn new(listing: impl Into<String>) -> Self {
        Self {
            listing: listing.into(),
        }
    }
}

#[async_trait]
impl DiscoverySource for StaticDiscoverySource {
    async fn fetch_listing(&self) -> Result<String, DiscoveryError> {
        Ok(self.listing.clone())
    }
}
