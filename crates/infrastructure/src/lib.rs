//! 基础设施层实现。
//!
//! 提供内存与 PostgreSQL 两种存储，实现领域层定义的仓储接口。

pub mod builder;
pub mod memory;
pub mod migrations;
pub mod postgres;

pub use builder::{Infrastructure, InfrastructureConfig, InfrastructureError};
pub use memory::MemoryStore;
pub use migrations::MIGRATOR;
pub use postgres::{create_pg_pool, PgMessageRepository, PgParticipantRepository};
