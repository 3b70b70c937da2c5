use async_trait::async_trait;

use super::RepositoryResult;
use crate::message::Message;
use crate::value_objects::MessageLimit;

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 追加到消息日志末尾
    async fn insert(&self, message: Message) -> RepositoryResult<()>;

    /// 按插入顺序倒序返回 `viewer` 可见的最近消息
    ///
    /// 可见规则见 [`Message::is_visible_to`]。
    async fn query_visible(
        &self,
        viewer: &str,
        limit: MessageLimit,
    ) -> RepositoryResult<Vec<Message>>;
}
