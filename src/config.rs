//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    infrastructure::endpoint::DeploymentContext,
    utils::identifier_validator::{is_valid_chain_id, is_valid_owner},
};

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 链节点服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
    /// 未配置时没有部署上下文
    pub application_id: Option<String>,
}

/// 链发现配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub source_url: String,
    pub interval_secs: u64,
    pub timeout_ms: u64,
}

/// 健康探测配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub interval_secs: u64,
    pub timeout_ms: u64,
    pub max_concurrency: usize,
}

/// 跨链查询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// 单链请求超时
    pub request_timeout_ms: u64,
    pub max_concurrency: usize,
}

/// 初始会话（活动链）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub active_chain_id: Option<String>,
    pub active_owner: Option<String>,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("CHAIN_HOST").unwrap_or_else(|_| "localhost".into()),
            port: env_or("CHAIN_PORT", 8080),
            application_id: env_opt("APPLICATION_ID"),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            source_url: std::env::var("DISCOVERY_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            interval_secs: env_or("DISCOVERY_INTERVAL_SECS", 30),
            timeout_ms: env_or("DISCOVERY_TIMEOUT_MS", 5000),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: env_or("HEALTH_INTERVAL_SECS", 15),
            timeout_ms: env_or("HEALTH_TIMEOUT_MS", 3000),
            max_concurrency: env_or("HEALTH_MAX_CONCURRENCY", 8),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: env_or("DISPATCH_TIMEOUT_MS", 5000),
            max_concurrency: env_or("DISPATCH_MAX_CONCURRENCY", 8),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            active_chain_id: env_opt("ACTIVE_CHAIN_ID"),
            active_owner: env_opt("ACTIVE_OWNER"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8090".into()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl NetworkConfig {
    /// 部署上下文；没有应用 ID 时为 None
    pub fn deployment_context(&self) -> Option<DeploymentContext> {
        self.application_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(|id| DeploymentContext::new(self.host.clone(), self.port, id))
    }
}

impl DiscoveryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl HealthConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl DispatchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            network: NetworkConfig::default(),
            discovery: DiscoveryConfig::default(),
            health: HealthConfig::default(),
            dispatch: DispatchConfig::default(),
            session: SessionConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// 从配置文件加载配置（缺失的段落取环境变量默认值）
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        if let Some(path) = path {
            if path.as_ref().exists() {
                return Self::from_file(path);
            }
            tracing::warn!(path = ?path.as_ref(), "config file not found, using environment");
        }
        Self::from_env()
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if self.network.port == 0 {
            anyhow::bail!("CHAIN_PORT must be non-zero");
        }

        if !self.discovery.source_url.starts_with("http://")
            && !self.discovery.source_url.starts_with("https://")
        {
            anyhow::bail!("DISCOVERY_URL must start with http:// or https://");
        }

        if self.discovery.interval_secs == 0 || self.health.interval_secs == 0 {
            anyhow::bail!("Refresh intervals must be at least 1 second");
        }

        if self.discovery.timeout_ms == 0
            || self.health.timeout_ms == 0
            || self.dispatch.request_timeout_ms == 0
        {
            anyhow::bail!("Timeouts must be greater than zero");
        }

        if self.health.max_concurrency == 0 || self.dispatch.max_concurrency == 0 {
            anyhow::bail!("Concurrency limits must be at least 1");
        }

        if let Some(chain_id) = &self.session.active_chain_id {
            if !is_valid_chain_id(chain_id) {
                anyhow::bail!("ACTIVE_CHAIN_ID is not a valid chain id: {}", chain_id);
            }
        }
        if let Some(owner) = &self.session.active_owner {
            if !is_valid_owner(owner) {
                anyhow::bail!("ACTIVE_OWNER is not a valid owner: {}", owner);
            }
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_config_from_env_is_valid() {
        let mut config = Config::from_env().unwrap();
        // 环境中可能残留其他测试设置的值，这里固定关键字段
        config.session = SessionConfig {
            active_chain_id: None,
            active_owner: None,
        };
        config.logging.level = "info".into();
        config.logging.format = "text".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let chain: String = std::iter::repeat('a').take(64).collect();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[network]
host = "127.0.0.1"
port = 9001
application_id = "e476187f"

[discovery]
source_url = "http://127.0.0.1:9001"
interval_secs = 10
timeout_ms = 2000

[health]
interval_secs = 5
timeout_ms = 1000
max_concurrency = 4

[dispatch]
request_timeout_ms = 1500
max_concurrency = 2

[session]
active_chain_id = "{chain}"

[server]
bind_addr = "127.0.0.1:9999"

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.network.port, 9001);
        assert_eq!(config.dispatch.max_concurrency, 2);
        assert_eq!(config.dispatch.request_timeout(), Duration::from_millis(1500));
        assert_eq!(config.session.active_chain_id.as_deref(), Some(chain.as_str()));
        assert!(config.validate().is_ok());

        let ctx = config.network.deployment_context().unwrap();
        assert_eq!(
            ctx.endpoint_for("c1"),
            "http://127.0.0.1:9001/chains/c1/applications/e476187f"
        );
    }

    #[test]
    fn test_partial_section_fills_from_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[network]
application_id = "e476187f"

[health]
max_concurrency = 3
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        let defaults = NetworkConfig::default();
        assert_eq!(config.network.application_id.as_deref(), Some("e476187f"));
        assert_eq!(config.network.host, defaults.host);
        assert_eq!(config.network.port, defaults.port);
        assert_eq!(config.health.max_concurrency, 3);
        assert_eq!(config.health.timeout_ms, HealthConfig::default().timeout_ms);
    }

    #[test]
    fn test_missing_application_id_means_no_context() {
        let network = NetworkConfig {
            host: "localhost".into(),
            port: 8080,
            application_id: None,
        };
        assert!(network.deployment_context().is_none());

        let blank = NetworkConfig {
            application_id: Some("  ".into()),
            ..network
        };
        assert!(blank.deployment_context().is_none());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::from_env().unwrap();
        config.session.active_chain_id = None;
        config.session.active_owner = None;
        config.logging.level = "info".into();
        config.logging.format = "text".into();

        let mut bad = config.clone();
        bad.dispatch.max_concurrency = 0;
        assert!(bad.validate().is_err());

        let mut bad = config.clone();
        bad.session.active_chain_id = Some("xyz".into());
        assert!(bad.validate().is_err());

        let mut bad = config;
        bad.logging.format = "yaml".into();
        assert!(bad.validate().is_err());
    }
}
