//! 跨链查询协调器
//!
//! 同一条查询并发发往多条链，每条链独立成败：
//! 单链失败只体现在它自己的结果里，不影响兄弟链，也不中断整次分发。
//! 输出顺序与输入目标顺序一致（有序 `buffered`，与完成顺序无关）。

use std::time::{Duration, Instant};

use futures::{stream, StreamExt};
use serde_json::Value;

use crate::{
    config::DispatchConfig,
    domain::{ChainRegistry, CrossChainResult},
    error::TransportError,
    infrastructure::{
        endpoint::DeploymentContext,
        graphql_client::{GraphQlClient, GraphQlResponse},
    },
};

pub struct CrossChainCoordinator {
    context: Option<DeploymentContext>,
    client: GraphQlClient,
    max_concurrency: usize,
}

impl CrossChainCoordinator {
    pub fn new(context: Option<DeploymentContext>, config: &DispatchConfig) -> Self {
        Self::with_client(
            context,
            GraphQlClient::new(config.request_timeout()),
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

    pub fn request_timeout(&self) -> Duration {
        self.client.timeout()
    }

    /// 向每个目标链发送查询，每个目标恰好一条结果
    ///
    /// 没有部署上下文时返回空列表，不发起任何请求。
    pub async fn dispatch(
        &self,
        targets: &[String],
        query: &str,
        variables: &Value,
    ) -> Vec<CrossChainResult> {
        let Some(ctx) = self.context.as_ref() else {
            tracing::debug!(targets = targets.len(), "dispatch_skipped_no_deployment_context");
            return Vec::new();
        };

        let variables = if variables.is_null() {
            Value::Object(Default::default())
        } else {
            variables.clone()
        };
        let variables = &variables;

        let started = Instant::now();
        let results: Vec<CrossChainResult> = stream::iter(targets.iter().cloned())
            .map(|chain_id| async move {
                let url = ctx.endpoint_for(&chain_id);
                let call_started = Instant::now();
                let outcome = self.client.execute(&url, query, variables).await;
                let result = classify_response(&chain_id, outcome);
                crate::metrics::observe_dispatch_latency_ms(
                    call_started.elapsed().as_millis(),
                    result.success,
                );
                if let Some(err) = &result.error {
                    tracing::warn!(chain_id = %chain_id, error = %err, "cross_chain_query_failed");
                }
                result
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let failed = results.iter().filter(|r| !r.success).count();
        tracing::info!(
            targets = targets.len(),
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "cross_chain_dispatch_completed"
        );
        results
    }

    /// 以当前注册表快照中的全部链为目标
    pub async fn dispatch_to_registry(
        &self,
        registry: &ChainRegistry,
        query: &str,
        variables: &Value,
    ) -> Vec<CrossChainResult> {
        let targets = registry.chain_ids().await;
        self.dispatch(&targets, query, variables).await
    }
}

/// 把单链调用结果归类为 `CrossChainResult`
///
/// - 2xx 且无顶层错误 → 成功，`data` 缺失时为 JSON null
/// - 2xx 但有错误 → 失败，取第一条错误消息
/// - 传输错误 → 失败，消息即错误的 `Display`（空消息由 `failed` 兜底）
pub fn classify_response(
    chain_id: &str,
    outcome: Result<GraphQlResponse, TransportError>,
) -> CrossChainResult {
    match outcome {
        Ok(resp) => match resp.first_error() {
            Some(message) => CrossChainResult::failed(chain_id, message),
            None => CrossChainResult::succeeded(chain_id, resp.data.unwrap_or(Value::Null)),
        },
        Err(e) => CrossChainResult::failed(chain_id, e.to_string()),
    }
}
