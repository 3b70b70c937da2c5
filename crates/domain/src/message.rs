use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{MessageText, ParticipantName, Timestamp, BROADCAST_TARGET};

/// 消息类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// 系统生成的进入/离开通知
    Status,
    /// 公共聊天消息
    Message,
    /// 私信
    Private,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Status => "status",
            MessageKind::Message => "message",
            MessageKind::Private => "private",
        }
    }

    /// 用户可以直接发送的类型
    pub fn is_user_sendable(self) -> bool {
        matches!(self, MessageKind::Message | MessageKind::Private)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(MessageKind::Status),
            "message" => Ok(MessageKind::Message),
            "private" => Ok(MessageKind::Private),
            other => Err(DomainError::invalid_argument(
                "type",
                format!("unknown message type `{other}`"),
            )),
        }
    }
}

/// 聊天消息，创建后不可变
///
/// `from`/`to` 仅以名称引用参与者，发送者被清除后消息依然保留。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub text: MessageText,
    pub kind: MessageKind,
    /// 展示用的格式化时间
    pub time: String,
    pub created_at: Timestamp,
}

impl Message {
    pub fn new(
        from: &ParticipantName,
        to: impl Into<String>,
        text: MessageText,
        kind: MessageKind,
        time: String,
        created_at: Timestamp,
    ) -> Self {
        Self {
            from: from.as_str().to_owned(),
            to: to.into(),
            text,
            kind,
            time,
            created_at,
        }
    }

    /// 系统通知总是发往广播目标
    pub fn status(
        subject: &ParticipantName,
        text: MessageText,
        time: String,
        created_at: Timestamp,
    ) -> Self {
        Self::new(
            subject,
            BROADCAST_TARGET,
            text,
            MessageKind::Status,
            time,
            created_at,
        )
    }

    /// 消息是否出现在 `viewer` 的消息列表中
    pub fn is_visible_to(&self, viewer: &str) -> bool {
        self.to == viewer
            || self.from == viewer
            || self.to == BROADCAST_TARGET
            || self.kind == MessageKind::Message
    }
}
