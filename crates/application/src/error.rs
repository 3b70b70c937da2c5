use domain::{DomainError, RepositoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("participant already exists: {0}")]
    Conflict(String),
    #[error("participant not found: {0}")]
    NotFound(String),
    #[error("unknown sender: {0}")]
    UnknownSender(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ApplicationError {
    /// 把仓储错误翻译成应用层错误，`subject` 是被操作的参与者名称
    pub fn repository(error: RepositoryError, subject: &str) -> Self {
        match error {
            RepositoryError::Conflict => ApplicationError::Conflict(subject.to_owned()),
            RepositoryError::NotFound => ApplicationError::NotFound(subject.to_owned()),
            RepositoryError::Storage { message } => ApplicationError::StoreUnavailable(message),
        }
    }
}
