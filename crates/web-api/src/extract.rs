//! 请求头 `User` 的提取

use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

pub const USER_HEADER: &str = "user";

/// 当前请求声明的参与者名称；缺失或不是合法 UTF-8 时为 `None`
#[derive(Debug, Clone)]
pub struct UserHeader(pub Option<String>);

impl UserHeader {
    /// 缺失时退化为空字符串，由应用层按无效名称处理
    pub fn into_name(self) -> String {
        self.0.unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for UserHeader
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        Ok(UserHeader(value))
    }
}
