//! 内存存储实现
//!
//! 参与者与消息各自由一把写锁保护，检查与修改在同一次加锁内完成。

use std::collections::HashMap;

use async_trait::async_trait;
use domain::{
    Message, MessageLimit, MessageRepository, Participant, ParticipantRepository,
    RepositoryError, RepositoryResult, Timestamp,
};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    participants: RwLock<HashMap<String, Participant>>,
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }
}

#[async_trait]
impl ParticipantRepository for MemoryStore {
    async fn insert(&self, participant: Participant) -> RepositoryResult<Participant> {
        let mut participants = self.participants.write().await;
        let key = participant.name.as_str().to_owned();
        if participants.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        participants.insert(key, participant.clone());
        Ok(participant)
    }

    async fn find(&self, name: &str) -> RepositoryResult<Option<Participant>> {
        let participants = self.participants.read().await;
        Ok(participants.get(name).cloned())
    }

    async fn list(&self) -> RepositoryResult<Vec<Participant>> {
        let participants = self.participants.read().await;
        Ok(participants.values().cloned().collect())
    }

    async fn touch(&self, name: &str, at: Timestamp) -> RepositoryResult<()> {
        let mut participants = self.participants.write().await;
        let participant = participants
            .get_mut(name)
            .ok_or(RepositoryError::NotFound)?;
        participant.last_seen = at;
        Ok(())
    }

    async fn delete_stale(&self, threshold: Timestamp) -> RepositoryResult<Option<Participant>> {
        let mut participants = self.participants.write().await;
        // 最久没有出现的先被清除
        let victim = participants
            .values()
            .filter(|participant| participant.is_stale(threshold))
            .min_by(|a, b| {
                a.last_seen
                    .cmp(&b.last_seen)
                    .then_with(|| a.name.cmp(&b.name))
            })
            .map(|participant| participant.name.as_str().to_owned());

        Ok(victim.and_then(|name| participants.remove(&name)))
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn insert(&self, message: Message) -> RepositoryResult<()> {
        self.messages.write().await.push(message);
        Ok(())
    }

    async fn query_visible(
        &self,
        viewer: &str,
        limit: MessageLimit,
    ) -> RepositoryResult<Vec<Message>> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .rev()
            .filter(|message| message.is_visible_to(viewer))
            .take(limit.get() as usize)
            .cloned()
            .collect())
    }
}
