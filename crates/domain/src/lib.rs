//! 聊天室系统核心领域模型
//!
//! 包含参与者、消息等核心实体，以及存储层需要实现的接口。

pub mod errors;
pub mod message;
pub mod participant;
pub mod repositories;
pub mod value_objects;

// 重新导出常用类型
pub use errors::*;
pub use message::*;
pub use participant::*;
pub use repositories::*;
pub use value_objects::*;
