use std::sync::Arc;

use tokio::{sync::RwLock, time::interval};

use crate::{
    config::Config,
    domain::{ChainRegistry, RegistrySnapshot, SessionContext},
    error::DiscoveryError,
    infrastructure::discovery_source::{DiscoverySource, HttpDiscoverySource},
    service::{CrossChainCoordinator, ExternalToolRedirect, HealthEvaluator, ProvisioningHook},
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ChainRegistry>,
    /// 当前会话（活动链），发现时显式传入注册表
    pub session: Arc<RwLock<SessionContext>>,
    pub discovery_source: Arc<dyn DiscoverySource>,
    pub health: Arc<HealthEvaluator>,
    pub coordinator: Arc<CrossChainCoordinator>,
    pub provisioning: Arc<dyn ProvisioningHook>,
}

impl AppState {
    /// 创建新的应用状态（HTTP 发现源）
    pub fn new(config: Arc<Config>) -> Self {
        let source = Arc::new(HttpDiscoverySource::new(
            config.discovery.source_url.clone(),
            config.discovery.timeout(),
        ));
        Self::with_discovery_source(config, source)
    }

    /// 使用指定发现源创建应用状态
    pub fn with_discovery_source(config: Arc<Config>, source: Arc<dyn DiscoverySource>) -> Self {
        let context = config.network.deployment_context();
        if context.is_none() {
            tracing::warn!("APPLICATION_ID not set, health probes and queries are disabled");
        }

        let health = Arc::new(HealthEvaluator::new(context.clone(), &config.health));
        let coordinator = Arc::new(CrossChainCoordinator::new(context, &config.dispatch));
        let session = SessionContext::new(
            config.session.active_chain_id.clone(),
            config.session.active_owner.clone(),
        );

        Self {
            registry: Arc::new(ChainRegistry::new()),
            session: Arc::new(RwLock::new(session)),
            discovery_source: source,
            health,
            coordinator,
            provisioning: Arc::new(ExternalToolRedirect::default()),
            config,
        }
    }

    /// 执行一次发现，活动链以安装快照时的会话为准
    pub async fn refresh_registry(&self) -> Result<Arc<RegistrySnapshot>, DiscoveryError> {
        self.registry
            .refresh_following(self.discovery_source.as_ref(), &self.session)
            .await
    }

    /// 启动后台发现与健康探测循环
    pub fn spawn_background_tasks(&self) {
        let state = self.clone();
        let discovery_period = self.config.discovery.interval();
        tokio::spawn(async move {
            let mut ticker = interval(discovery_period);
            loop {
                ticker.tick().await;
                if let Err(e) = state.refresh_registry().await {
                    tracing::warn!(error=?e, "periodic chain discovery failed");
                }
            }
        });

        let health = self.health.clone();
        let registry = self.registry.clone();
        let health_period = self.config.health.interval();
        tokio::spawn(async move {
            health.start_background_probe(registry, health_period).await;
        });
    }
}
