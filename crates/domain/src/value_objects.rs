use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// 统一的时间戳类型：Unix 纪元以来的毫秒数。
pub type Timestamp = i64;

/// 广播目标：发往全体参与者的消息使用该收件人。
pub const BROADCAST_TARGET: &str = "Everyone";

/// 去掉字符串中的 HTML 标签，保留标签之间的文本。
///
/// 未闭合的 `<` 之后的内容被视为标签的一部分而丢弃。
pub fn strip_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => output.push(ch),
            _ => {}
        }
    }
    output
}

fn sanitize(value: &str) -> String {
    strip_html(value).trim().to_owned()
}

/// 经过清洗的参与者名称，区分大小写
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantName(String);

impl ParticipantName {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let value = sanitize(value.as_ref());
        if value.is_empty() {
            return Err(DomainError::invalid_argument("name", "cannot be empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ParticipantName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 经过清洗的消息正文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageText(String);

impl MessageText {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let value = sanitize(value.as_ref());
        if value.is_empty() {
            return Err(DomainError::invalid_argument("text", "cannot be empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 查询消息时的条数上限，保证至少为 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimit(u32);

impl MessageLimit {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value < 1 {
            return Err(DomainError::invalid_argument("limit", "must be at least 1"));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| DomainError::invalid_argument("limit", "is too large"))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}
