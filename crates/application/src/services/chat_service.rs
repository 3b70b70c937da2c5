use std::sync::Arc;

use domain::{Message, Participant};

use crate::{
    error::ApplicationError,
    messaging::{MessageRouter, SendMessageRequest, ENTERED_ROOM_TEXT},
    presence::PresenceManager,
};

pub struct ChatServiceDependencies {
    pub presence: Arc<PresenceManager>,
    pub router: Arc<MessageRouter>,
}

/// 面向 HTTP 层的用例组合
///
/// 注册与进入通知在这里组合，`PresenceManager` 本身不产生消息。
pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    pub fn presence(&self) -> &Arc<PresenceManager> {
        &self.deps.presence
    }

    pub fn router(&self) -> &Arc<MessageRouter> {
        &self.deps.router
    }

    pub async fn join(&self, name: &str) -> Result<Participant, ApplicationError> {
        let participant = self.deps.presence.register(name).await?;
        // 通知写入失败时参与者保持已注册，由心跳续期或等待清理
        if let Err(err) = self
            .deps
            .router
            .post_system_notice(&participant.name, ENTERED_ROOM_TEXT)
            .await
        {
            tracing::error!(
                participant = %participant.name,
                error = %err,
                "写入进入通知失败"
            );
            return Err(err);
        }
        Ok(participant)
    }

    pub async fn heartbeat(&self, name: &str) -> Result<(), ApplicationError> {
        self.deps.presence.heartbeat(name).await
    }

    pub async fn participants(&self) -> Result<Vec<Participant>, ApplicationError> {
        self.deps.presence.list().await
    }

    pub async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<Message, ApplicationError> {
        self.deps.router.send(request).await
    }

    pub async fn messages(
        &self,
        viewer: &str,
        limit: i64,
    ) -> Result<Vec<Message>, ApplicationError> {
        self.deps.router.query(viewer, limit).await
    }
}
