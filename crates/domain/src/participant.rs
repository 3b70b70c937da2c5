use serde::{Deserialize, Serialize};

use crate::value_objects::{ParticipantName, Timestamp};

/// 已注册的聊天身份及其最近一次存活信号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: ParticipantName,
    pub last_seen: Timestamp,
}

impl Participant {
    pub fn join(name: ParticipantName, now: Timestamp) -> Self {
        Self {
            name,
            last_seen: now,
        }
    }

    /// 在 `threshold` 之前（严格早于）就没有再出现过
    pub fn is_stale(&self, threshold: Timestamp) -> bool {
        self.last_seen < threshold
    }
}
