//! chainscope - 多链注册表与跨链查询协调核心
//!
//! 发现链、探测链健康状态，并把同一条查询分发到任意链子集，
//! 单链失败彼此隔离。

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod metrics;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{ChainRecord, ChainRegistry, CrossChainResult, HealthReport, SyncStatus},
        error::{AppError, AppErrorCode, DiscoveryError, TransportError},
        infrastructure::endpoint::{resolve_endpoint, DeploymentContext},
        service::{CrossChainCoordinator, HealthEvaluator},
    };
}
