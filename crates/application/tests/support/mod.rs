#![allow(dead_code)]

use std::sync::Arc;

use application::{
    ChatService, ChatServiceDependencies, Clock, ManualClock, MessageRouter,
    MessageRouterDependencies, PresenceManager, PresenceManagerDependencies, Reaper,
    ReaperConfig,
};
use chrono::FixedOffset;
use domain::{MessageRepository, ParticipantRepository};
use infrastructure::MemoryStore;

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub presence: Arc<PresenceManager>,
    pub router: Arc<MessageRouter>,
    pub chat: ChatService,
    pub reaper: Arc<Reaper>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_participants(store.clone(), store)
    }

    /// 参与者使用自定义仓储，消息仍写入内存存储
    pub fn with_participants(
        store: Arc<MemoryStore>,
        participants: Arc<dyn ParticipantRepository>,
    ) -> Self {
        Self::with_repositories(store.clone(), participants, store)
    }

    pub fn with_repositories(
        store: Arc<MemoryStore>,
        participants: Arc<dyn ParticipantRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(0));
        let presence = Arc::new(PresenceManager::new(PresenceManagerDependencies {
            participant_repository: participants,
            clock: clock.clone() as Arc<dyn Clock>,
        }));
        let router = Arc::new(MessageRouter::new(MessageRouterDependencies {
            message_repository: messages,
            presence: presence.clone(),
            clock: clock.clone() as Arc<dyn Clock>,
            utc_offset: FixedOffset::east_opt(0).expect("offset"),
        }));
        let chat = ChatService::new(ChatServiceDependencies {
            presence: presence.clone(),
            router: router.clone(),
        });
        let reaper = Arc::new(Reaper::new(
            presence.clone(),
            router.clone(),
            clock.clone() as Arc<dyn Clock>,
            ReaperConfig::default(),
        ));

        Self {
            store,
            clock,
            presence,
            router,
            chat,
            reaper,
        }
    }
}
