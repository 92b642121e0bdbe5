//! Domain 模块
//!
//! 链记录、注册表快照与跨链查询结果

pub mod chain_record;
pub mod cross_chain_result;
pub mod registry;
pub mod session;

// 重新导出常用类型
pub use chain_record::{ChainRecord, HealthReport, SyncStatus};
pub use cross_chain_result::{CrossChainResult, DispatchState};
pub use registry::{discover, lookup_active, ChainRegistry, RegistrySnapshot};
pub use session::SessionContext;
