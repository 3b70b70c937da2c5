//! 存储接口
//!
//! 所有不变量（名称唯一、过期清理原子性）都由实现方在单个操作内保证，
//! 上层不持有任何锁。

mod message_repository;
mod participant_repository;

pub use message_repository::MessageRepository;
pub use participant_repository::ParticipantRepository;

#[cfg(feature = "testing")]
pub use message_repository::MockMessageRepository;
#[cfg(feature = "testing")]
pub use participant_repository::MockParticipantRepository;

use crate::errors::RepositoryError;

pub type RepositoryResult<T> = Result<T, RepositoryError>;
