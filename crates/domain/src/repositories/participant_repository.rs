use async_trait::async_trait;

use super::RepositoryResult;
use crate::participant::Participant;
use crate::value_objects::Timestamp;

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// 名称已存在时返回 `RepositoryError::Conflict`，检查与插入是同一个原子操作
    async fn insert(&self, participant: Participant) -> RepositoryResult<Participant>;

    async fn find(&self, name: &str) -> RepositoryResult<Option<Participant>>;

    async fn list(&self) -> RepositoryResult<Vec<Participant>>;

    /// 更新 `last_seen`，参与者不存在时返回 `RepositoryError::NotFound`
    async fn touch(&self, name: &str, at: Timestamp) -> RepositoryResult<()>;

    /// 原子地删除一个 `last_seen < threshold` 的参与者并返回它
    ///
    /// 并发调用不会删除同一条记录两次，也不会把同一个参与者返回给两个调用方。
    async fn delete_stale(&self, threshold: Timestamp) -> RepositoryResult<Option<Participant>>;
}
