//! 对外输出的数据结构

use domain::{Message, MessageKind, Participant, Timestamp};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub name: String,
    pub last_seen: Timestamp,
}

impl From<Participant> for ParticipantDto {
    fn from(participant: Participant) -> Self {
        Self {
            name: participant.name.into_inner(),
            last_seen: participant.last_seen,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageDto {
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub time: String,
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self {
            from: message.from,
            to: message.to,
            text: message.text.as_str().to_owned(),
            kind: message.kind,
            time: message.time,
        }
    }
}
