use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use domain::{
    DomainError, Message, MessageKind, MessageLimit, MessageRepository, MessageText,
    ParticipantName, Timestamp,
};

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::presence::PresenceManager;

/// 参与者加入时的系统通知
pub const ENTERED_ROOM_TEXT: &str = "entered the room";
/// 参与者被清除时的系统通知
pub const LEFT_ROOM_TEXT: &str = "left the room";

const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

pub struct MessageRouterDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub presence: Arc<PresenceManager>,
    pub clock: Arc<dyn Clock>,
    /// 消息展示时间使用的时区偏移
    pub utc_offset: FixedOffset,
}

pub struct MessageRouter {
    deps: MessageRouterDependencies,
}

impl MessageRouter {
    pub fn new(deps: MessageRouterDependencies) -> Self {
        Self { deps }
    }

    /// 发送用户消息
    ///
    /// 发送者必须在线；私信的收件人不做存在性检查。
    pub async fn send(&self, request: SendMessageRequest) -> Result<Message, ApplicationError> {
        if !request.kind.is_user_sendable() {
            return Err(DomainError::invalid_argument(
                "type",
                format!("`{}` messages cannot be sent by participants", request.kind),
            )
            .into());
        }

        let from = ParticipantName::parse(&request.from)
            .map_err(|_| ApplicationError::UnknownSender(request.from.clone()))?;
        if !self.deps.presence.is_alive(from.as_str()).await? {
            return Err(ApplicationError::UnknownSender(from.into_inner()));
        }

        let to = ParticipantName::parse(&request.to)
            .map_err(|_| DomainError::invalid_argument("to", "cannot be empty"))?;
        let text = MessageText::parse(&request.text)?;

        let now = self.deps.clock.now();
        let message = Message::new(
            &from,
            to.into_inner(),
            text,
            request.kind,
            self.format_time(now),
            now,
        );
        self.store(message.clone(), from.as_str()).await?;

        tracing::debug!(
            from = %message.from,
            to = %message.to,
            kind = %message.kind,
            "消息已发送"
        );
        Ok(message)
    }

    /// 写入一条系统状态消息，跳过发送者在线检查
    pub async fn post_system_notice(
        &self,
        name: &ParticipantName,
        text: &str,
    ) -> Result<Message, ApplicationError> {
        let text = MessageText::parse(text)?;
        let now = self.deps.clock.now();
        let message = Message::status(name, text, self.format_time(now), now);
        self.store(message.clone(), name.as_str()).await?;

        tracing::debug!(participant = %name, text = %message.text, "系统通知");
        Ok(message)
    }

    /// 查询 `for_user` 可见的最近消息，最新的在前
    pub async fn query(&self, for_user: &str, limit: i64) -> Result<Vec<Message>, ApplicationError> {
        let limit = MessageLimit::new(limit)?;
        let viewer = ParticipantName::parse(for_user)
            .map(ParticipantName::into_inner)
            .unwrap_or_default();

        self.deps
            .message_repository
            .query_visible(&viewer, limit)
            .await
            .map_err(|err| ApplicationError::repository(err, &viewer))
    }

    async fn store(&self, message: Message, subject: &str) -> Result<(), ApplicationError> {
        self.deps
            .message_repository
            .insert(message)
            .await
            .map_err(|err| ApplicationError::repository(err, subject))
    }

    fn format_time(&self, at: Timestamp) -> String {
        DateTime::from_timestamp_millis(at)
            .map(|utc| {
                utc.with_timezone(&self.deps.utc_offset)
                    .format(TIME_FORMAT)
                    .to_string()
            })
            .unwrap_or_default()
    }
}
