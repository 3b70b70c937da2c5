//! 统一配置中心
//!
//! 提供应用的全局配置管理，包括：
//! - 服务监听地址
//! - 存储后端
//! - 在线状态超时与清理周期
//! - 消息时间展示

use std::time::Duration;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
}

/// 服务器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

/// 存储配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_url: None,
            max_connections: 5,
        }
    }
}

/// 在线状态配置，单位为毫秒
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceConfig {
    pub ttl_ms: u64,
    pub sweep_interval_ms: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 10_000,
            sweep_interval_ms: 15_000,
        }
    }
}

impl PresenceConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// 消息展示配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesConfig {
    /// 格式化消息时间时使用的 UTC 偏移（分钟）
    pub utc_offset_minutes: i32,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: -180,
        }
    }
}

impl AppConfig {
    /// 加载顺序：默认值 -> 可选配置文件（APP_CONFIG_FILE）-> 环境变量（APP_*）
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        let mut fig = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var("APP_CONFIG_FILE") {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                fig = fig.merge(Yaml::file(path));
            } else if path.ends_with(".json") {
                fig = fig.merge(Json::file(path));
            } else {
                fig = fig.merge(Toml::file(path));
            }
        }
        fig.merge(Env::prefixed("APP_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment
            .extract()
            .map_err(|err| ConfigError::Load(Box::new(err)))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidServerConfig(
                "host cannot be empty".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidServerConfig(
                "port must be greater than 0".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Postgres {
            let has_url = self
                .storage
                .database_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty());
            if !has_url {
                return Err(ConfigError::InvalidStorageConfig(
                    "database_url is required for the postgres backend".to_string(),
                ));
            }
            if self.storage.max_connections == 0 {
                return Err(ConfigError::InvalidStorageConfig(
                    "max_connections must be greater than 0".to_string(),
                ));
            }
        }

        if self.presence.ttl_ms == 0 || self.presence.sweep_interval_ms == 0 {
            return Err(ConfigError::InvalidPresenceConfig(
                "ttl_ms and sweep_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.presence.sweep_interval_ms <= self.presence.ttl_ms {
            tracing::warn!(
                ttl_ms = self.presence.ttl_ms,
                sweep_interval_ms = self.presence.sweep_interval_ms,
                "sweep interval does not exceed ttl; sweeps may overlap under load"
            );
        }

        if self.messages.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidMessagesConfig(
                "utc_offset_minutes must be within one day".to_string(),
            ));
        }

        Ok(())
    }

    /// 去掉数据库凭据后的连接串（用于日志）
    pub fn sanitized_database_url(&self) -> Option<String> {
        self.storage
            .database_url
            .as_deref()
            .map(|url| match url.rsplit_once('@') {
                Some((_, host)) => format!("***@{host}"),
                None => url.to_string(),
            })
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[source] Box<figment::Error>),
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
    #[error("Invalid storage configuration: {0}")]
    InvalidStorageConfig(String),
    #[error("Invalid presence configuration: {0}")]
    InvalidPresenceConfig(String),
    #[error("Invalid messages configuration: {0}")]
    InvalidMessagesConfig(String),
}
