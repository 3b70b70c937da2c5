//! 应用层实现。
//!
//! 在领域存储接口之上提供在线状态、消息路由与后台清理任务。

pub mod clock;
pub mod dto;
pub mod error;
pub mod messaging;
pub mod presence;
pub mod reaper;
pub mod services;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dto::{MessageDto, ParticipantDto};
pub use error::ApplicationError;
pub use messaging::{
    MessageRouter, MessageRouterDependencies, SendMessageRequest, ENTERED_ROOM_TEXT,
    LEFT_ROOM_TEXT,
};
pub use presence::{PresenceManager, PresenceManagerDependencies};
pub use reaper::{Reaper, ReaperConfig, ReaperHandle, ReaperState, TickOutcome};
pub use services::{ChatService, ChatServiceDependencies};
