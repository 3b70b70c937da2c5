use std::sync::Arc;
use std::time::Duration;

use domain::{Participant, ParticipantName, ParticipantRepository, Timestamp};

use crate::clock::{duration_millis, Clock};
use crate::error::ApplicationError;

pub struct PresenceManagerDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 在线状态管理器
///
/// 负责注册、心跳、查询以及过期参与者的清理。所有的并发保证都来自
/// 仓储的原子操作，这里不持有锁。
pub struct PresenceManager {
    deps: PresenceManagerDependencies,
}

impl PresenceManager {
    pub fn new(deps: PresenceManagerDependencies) -> Self {
        Self { deps }
    }

    /// 注册新的参与者，`last_seen` 取当前时间
    ///
    /// 进入房间的通知由调用方发送。
    pub async fn register(&self, name: &str) -> Result<Participant, ApplicationError> {
        let name = ParticipantName::parse(name)?;
        let participant = Participant::join(name, self.deps.clock.now());
        let subject = participant.name.as_str().to_owned();

        let stored = self
            .deps
            .participant_repository
            .insert(participant)
            .await
            .map_err(|err| ApplicationError::repository(err, &subject))?;

        tracing::info!(participant = %stored.name, "参与者注册");
        Ok(stored)
    }

    /// 刷新存活时间；找不到参与者意味着会话已经结束
    pub async fn heartbeat(&self, name: &str) -> Result<(), ApplicationError> {
        let name = ParticipantName::parse(name)
            .map_err(|_| ApplicationError::NotFound(name.to_owned()))?;

        self.deps
            .participant_repository
            .touch(name.as_str(), self.deps.clock.now())
            .await
            .map_err(|err| ApplicationError::repository(err, name.as_str()))?;

        tracing::trace!(participant = %name, "心跳");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Participant>, ApplicationError> {
        self.deps
            .participant_repository
            .list()
            .await
            .map_err(|err| ApplicationError::repository(err, "participants"))
    }

    pub async fn is_alive(&self, name: &str) -> Result<bool, ApplicationError> {
        let Ok(name) = ParticipantName::parse(name) else {
            return Ok(false);
        };

        let found = self
            .deps
            .participant_repository
            .find(name.as_str())
            .await
            .map_err(|err| ApplicationError::repository(err, name.as_str()))?;
        Ok(found.is_some())
    }

    /// 清除一个在 `now - ttl` 之前就沉默的参与者
    ///
    /// 每次调用最多清除一个；返回被清除的记录，由调用方发送离开通知。
    pub async fn sweep_once(
        &self,
        ttl: Duration,
        now: Timestamp,
    ) -> Result<Option<Participant>, ApplicationError> {
        let threshold = now.saturating_sub(duration_millis(ttl));

        self.deps
            .participant_repository
            .delete_stale(threshold)
            .await
            .map_err(|err| ApplicationError::repository(err, "stale participant"))
    }
}
