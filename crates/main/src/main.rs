//! 主应用程序入口
//!
//! 加载配置、组装存储与应用层服务，启动清理任务和 Axum Web API。

use std::sync::Arc;

use anyhow::Context;
use application::{
    ChatService, ChatServiceDependencies, Clock, MessageRouter, MessageRouterDependencies,
    PresenceManager, PresenceManagerDependencies, Reaper, ReaperConfig, SystemClock,
};
use chrono::FixedOffset;
use config::{AppConfig, StorageBackend};
use infrastructure::{Infrastructure, InfrastructureConfig};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("加载配置失败")?;

    let storage = match config.storage.backend {
        StorageBackend::Memory => InfrastructureConfig::Memory,
        StorageBackend::Postgres => {
            tracing::info!(
                url = config.sanitized_database_url().as_deref().unwrap_or("unknown"),
                "连接数据库"
            );
            InfrastructureConfig::Postgres {
                database_url: config.storage.database_url.clone().unwrap_or_default(),
                max_connections: config.storage.max_connections,
            }
        }
    };
    let infrastructure = Infrastructure::connect(storage).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let utc_offset = FixedOffset::east_opt(config.messages.utc_offset_minutes * 60)
        .context("无效的 UTC 偏移")?;

    // 创建应用层服务
    let presence = Arc::new(PresenceManager::new(PresenceManagerDependencies {
        participant_repository: infrastructure.participants.clone(),
        clock: clock.clone(),
    }));
    let message_router = Arc::new(MessageRouter::new(MessageRouterDependencies {
        message_repository: infrastructure.messages.clone(),
        presence: presence.clone(),
        clock: clock.clone(),
        utc_offset,
    }));
    let chat_service = Arc::new(ChatService::new(ChatServiceDependencies {
        presence: presence.clone(),
        router: message_router.clone(),
    }));

    // 启动后台清理任务
    let reaper = Arc::new(Reaper::new(
        presence,
        message_router,
        clock,
        ReaperConfig {
            interval: config.presence.sweep_interval(),
            ttl: config.presence.ttl(),
        },
    ));
    let reaper_handle = reaper.start();

    // 启动 Web 服务器
    let app = router(AppState::new(chat_service));
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("无法监听 {address}"))?;

    tracing::info!("聊天室服务器启动在 http://{}", address);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    reaper_handle.stop().await;
    tracing::info!("服务器已停止");

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "无法监听退出信号");
    }
}
