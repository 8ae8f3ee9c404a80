use async_trait::async_trait;

use crate::shared::{DomainError, UserId};

/// Narrow view of the identity subsystem: does this user exist?
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, user_id: UserId) -> Result<bool, DomainError>;
}

/// Directory that accepts every id, for deployments where identity is
/// verified upstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenUserDirectory;

#[async_trait]
impl UserDirectory for OpenUserDirectory {
    async fn exists(&self, _user_id: UserId) -> Result<bool, DomainError> {
        Ok(true)
    }
}
