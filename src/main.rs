//! chainscope 主入口
//! 多链注册表、健康探测与跨链查询服务

use std::sync::Arc;

use anyhow::{Context, Result};
use chainscope::{api, app_state::AppState, config::Config, infrastructure::logging};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 加载配置（CONFIG_PATH 指定的配置文件优先）
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate().context("invalid configuration")?;

    // 3. 初始化日志
    logging::init_logging(&config.logging)?;
    tracing::info!(
        discovery_url = %config.discovery.source_url,
        application_id = ?config.network.application_id,
        "starting chainscope"
    );

    // 4. 初始化应用状态
    let config = Arc::new(config);
    let state = Arc::new(AppState::new(config.clone()));

    // 5. 首次发现（失败不致命，后台循环会重试）
    if let Err(e) = state.refresh_registry().await {
        tracing::warn!(error=?e, "initial chain discovery failed");
    }

    // 6. 后台发现与健康探测
    state.spawn_background_tasks();

    // 7. 启动 HTTP 服务
    let app = api::routes(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!(bind_addr = %config.server.bind_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
