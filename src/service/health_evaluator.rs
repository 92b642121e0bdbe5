//! 链健康探测
//!
//! 对单条链发送固定的健康查询，把结果归类为 synced / offline。
//! 探测是尽力而为的：任何传输问题都折叠成 offline，不向外抛错。

use std::{sync::Arc, time::Duration};

use futures::{stream, StreamExt};
use serde_json::Value;
use tokio::time::interval;

use crate::{
    config::HealthConfig,
    domain::{ChainRecord, ChainRegistry, HealthReport},
    infrastructure::{
        endpoint::DeploymentContext,
        graphql_client::{GraphQlClient, GraphQlResponse},
    },
};

/// 固定的健康查询
pub const HEALTH_QUERY: &str = "query { health { status totalEvents } }";

pub struct HealthEvaluator {
    context: Option<DeploymentContext>,
    client: GraphQlClient,
    max_concurrency: usize,
}

impl HealthEvaluator {
    pub fn new(context: Option<DeploymentContext>, config: &HealthConfig) -> Self {
        Self::with_client(
            context,
            GraphQlClient::new(config.timeout()),
            config.max_concurrency,
        )
    }

    pub fn with_client(
        context: Option<DeploymentContext>,
        client: GraphQlClient,
        max_concurrency: usize,
    ) -> Self {
        Self {
            context,
            client,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// 探测单条链
    ///
    /// 没有部署上下文时返回 None；其余情况总是返回报告。
    pub async fn probe_health(&self, chain: &ChainRecord) -> Option<HealthReport> {
        let ctx = self.context.as_ref()?;
        let url = ctx.endpoint_for(&chain.chain_id);

        let report = match self
            .client
            .execute(&url, HEALTH_QUERY, &Value::Object(Default::default()))
            .await
        {
            Ok(resp) => match parse_health(&resp) {
                Some(height) => {
                    tracing::debug!(chain_id = %chain.chain_id, block_height = height, "chain_health_synced");
                    HealthReport::synced(height)
                }
                None => {
                    tracing::warn!(chain_id = %chain.chain_id, reason = "malformed_response", "chain_health_offline");
                    HealthReport::offline()
                }
            },
            Err(e) => {
                tracing::warn!(chain_id = %chain.chain_id, error = %e, reason = "unreachable", "chain_health_offline");
                HealthReport::offline()
            }
        };

        crate::metrics::inc_probe(report.is_online());
        Some(report)
    }

    /// 并发探测当前快照中的所有链并合并结果，返回合并条数
    pub async fn probe_registry(&self, registry: &ChainRegistry) -> usize {
        if self.context.is_none() {
            return 0;
        }

        let snapshot = registry.snapshot().await;
        let reports: Vec<(String, HealthReport)> = stream::iter(snapshot.chains.clone())
            .map(|chain| async move {
                self.probe_health(&chain)
                    .await
                    .map(|report| (chain.chain_id, report))
            })
            .buffer_unordered(self.max_concurrency)
            .filter_map(|r| async move { r })
            .collect()
            .await;

        let applied = registry.apply_health_reports(reports).await;
        tracing::info!(
            generation = snapshot.generation,
            probed = snapshot.len(),
            applied,
            "chain_health_round_completed"
        );
        applied
    }

    /// 后台定时探测
    pub async fn start_background_probe(
        self: Arc<Self>,
        registry: Arc<ChainRegistry>,
        period: Duration,
    ) {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            self.probe_registry(&registry).await;
        }
    }
}

/// 提取 `data.health.totalEvents`；存在顶层错误或字段缺失时返回 None
fn parse_health(resp: &GraphQlResponse) -> Option<u64> {
    if resp.has_errors() {
        return None;
    }
    let total = resp.data.as_ref()?.get("health")?.get("totalEvents")?;
    match total {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
