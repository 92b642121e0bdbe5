//! 链注册表
//!
//! 注册表内容是不可变快照：每次发现都整体重算并一次性替换（后完成者胜出，不做合并），
//! 读方拿到的永远是某个完整快照。活动链标记取安装时刻的会话，而不是发起发现时的会话。

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    domain::{
        chain_record::{ChainRecord, HealthReport},
        session::SessionContext,
    },
    error::DiscoveryError,
    infrastructure::discovery_source::{extract_chain_ids, DiscoverySource},
};

/// 由候选链 ID 生成链记录集合
///
/// - 候选去重，保留首次出现顺序
/// - 与 `active_chain_id` 相同的记录标记为活动链
/// - 活动链不在候选中时，合成一条记录插到最前面（owner 取 `active_owner_fallback`，余额 "0"）
pub fn discover<I, S>(
    candidates: I,
    active_chain_id: Option<&str>,
    active_owner_fallback: Option<&str>,
) -> Vec<ChainRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let active_chain_id = active_chain_id.filter(|id| !id.is_empty());
    let owner_fallback = active_owner_fallback.unwrap_or_default();

    let mut seen: HashSet<String> = HashSet::new();
    let mut chains = Vec::new();

    for candidate in candidates {
        let chain_id = candidate.as_ref();
        if chain_id.is_empty() || !seen.insert(chain_id.to_string()) {
            continue;
        }
        let mut record = ChainRecord::discovered(chain_id);
        if active_chain_id == Some(chain_id) {
            record.is_active = true;
            record.owner = owner_fallback.to_string();
        }
        chains.push(record);
    }

    if let Some(active) = active_chain_id {
        if !seen.contains(active) {
            chains.insert(0, ChainRecord::synthesized_active(active, owner_fallback));
        }
    }

    chains
}

/// 返回活动链记录
pub fn lookup_active(chains: &[ChainRecord]) -> Option<&ChainRecord> {
    chains.iter().find(|c| c.is_active)
}

/// 注册表快照（不可变）
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    pub chains: Vec<ChainRecord>,
    /// 每完成一次发现加一
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl RegistrySnapshot {
    pub fn active(&self) -> Option<&ChainRecord> {
        lookup_active(&self.chains)
    }

    pub fn get(&self, chain_id: &str) -> Option<&ChainRecord> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    pub fn chain_ids(&self) -> Vec<String> {
        self.chains.iter().map(|c| c.chain_id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

#[derive(Default)]
struct RegistryState {
    snapshot: Arc<RegistrySnapshot>,
    last_error: Option<String>,
}

/// 链注册表
#[derive(Default)]
pub struct ChainRegistry {
    state: RwLock<RegistryState>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前快照
    pub async fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.state.read().await.snapshot.clone()
    }

    /// 最近一次发现失败的消息（成功后清空）
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn active(&self) -> Option<ChainRecord> {
        self.snapshot().await.active().cloned()
    }

    pub async fn get(&self, chain_id: &str) -> Option<ChainRecord> {
        self.snapshot().await.get(chain_id).cloned()
    }

    pub async fn chain_ids(&self) -> Vec<String> {
        self.snapshot().await.chain_ids()
    }

    /// 用给定会话从发现源重新同步
    ///
    /// 获取失败时保留旧快照并记录错误；成功时整体替换。
    pub async fn refresh(
        &self,
        source: &dyn DiscoverySource,
        session: &SessionContext,
    ) -> Result<Arc<RegistrySnapshot>, DiscoveryError> {
        let candidates = self.fetch_candidates(source).await?;
        let mut state = self.state.write().await;
        Ok(Self::install_discovered(&mut state, &candidates, session))
    }

    /// 跟随共享会话从发现源重新同步
    ///
    /// 会话在注册表写锁内读取：获取期间会话被修改时，安装的快照仍以最新会话为准，
    /// 较慢的发现不会用旧会话覆盖新快照。
    pub async fn refresh_following(
        &self,
        source: &dyn DiscoverySource,
        session: &RwLock<SessionContext>,
    ) -> Result<Arc<RegistrySnapshot>, DiscoveryError> {
        let candidates = self.fetch_candidates(source).await?;
        let mut state = self.state.write().await;
        let session = session.read().await.clone();
        Ok(Self::install_discovered(&mut state, &candidates, &session))
    }

    async fn fetch_candidates(
        &self,
        source: &dyn DiscoverySource,
    ) -> Result<Vec<String>, DiscoveryError> {
        match source.fetch_listing().await {
            Ok(listing) => Ok(extract_chain_ids(&listing)),
            Err(e) => {
                crate::metrics::inc_discovery(false);
                tracing::warn!(error = %e, "chain_discovery_failed_keeping_previous_snapshot");
                self.state.write().await.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn install_discovered(
        state: &mut RegistryState,
        candidates: &[String],
        session: &SessionContext,
    ) -> Arc<RegistrySnapshot> {
        let chains = discover(
            candidates,
            session.active_chain_id.as_deref(),
            session.active_owner.as_deref(),
        );
        let snapshot = Self::swap(state, chains);

        crate::metrics::inc_discovery(true);
        tracing::info!(
            generation = snapshot.generation,
            chains = snapshot.len(),
            candidates = candidates.len(),
            "chain_discovery_completed"
        );
        snapshot
    }

    /// 用新的链集合整体替换快照
    pub async fn install(&self, chains: Vec<ChainRecord>) -> Arc<RegistrySnapshot> {
        let mut state = self.state.write().await;
        Self::swap(&mut state, chains)
    }

    fn swap(state: &mut RegistryState, chains: Vec<ChainRecord>) -> Arc<RegistrySnapshot> {
        let snapshot = Arc::new(RegistrySnapshot {
            chains,
            generation: state.snapshot.generation + 1,
            refreshed_at: Some(Utc::now()),
        });
        state.snapshot = snapshot.clone();
        state.last_error = None;
        snapshot
    }

    /// 把单条健康探测结果合并进当前快照（写时复制）
    ///
    /// 链已不在快照中时返回 false。
    pub async fn apply_health(&self, chain_id: &str, report: HealthReport) -> bool {
        self.apply_health_reports(vec![(chain_id.to_string(), report)])
            .await
            == 1
    }

    /// 批量合并健康探测结果，一次替换，返回实际合并的条数
    pub async fn apply_health_reports(&self, reports: Vec<(String, HealthReport)>) -> usize {
        if reports.is_empty() {
            return 0;
        }

        let mut state = self.state.write().await;
        let mut chains = state.snapshot.chains.clone();
        let mut applied = 0;
        for (chain_id, report) in &reports {
            if let Some(record) = chains.iter_mut().find(|c| &c.chain_id == chain_id) {
                record.apply_health(report);
                applied += 1;
            }
        }

        if applied > 0 {
            state.snapshot = Arc::new(RegistrySnapshot {
                chains,
                generation: state.snapshot.generation,
                refreshed_at: state.snapshot.refreshed_at,
            });
        }
        applied
    }
}
