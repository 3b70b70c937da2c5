use std::sync::Arc;

use domain::{MessageRepository, ParticipantRepository};
use thiserror::Error;

use crate::{
    memory::MemoryStore,
    migrations::MIGRATOR,
    postgres::{create_pg_pool, PgMessageRepository, PgParticipantRepository},
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InfrastructureConfig {
    #[default]
    Memory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// 组装好的存储，两个集合可以由同一个后端实现
#[derive(Clone)]
pub struct Infrastructure {
    pub participants: Arc<dyn ParticipantRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl Infrastructure {
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            participants: store.clone(),
            messages: store,
        }
    }

    pub async fn connect(config: InfrastructureConfig) -> Result<Self, InfrastructureError> {
        match config {
            InfrastructureConfig::Memory => {
                tracing::info!("使用内存存储");
                Ok(Self::in_memory())
            }
            InfrastructureConfig::Postgres {
                database_url,
                max_connections,
            } => {
                let pool = create_pg_pool(&database_url, max_connections).await?;
                MIGRATOR.run(&pool).await?;
                tracing::info!(max_connections, "PostgreSQL 存储已就绪");

                Ok(Self {
                    participants: Arc::new(PgParticipantRepository::new(pool.clone())),
                    messages: Arc::new(PgMessageRepository::new(pool)),
                })
            }
        }
    }
}
