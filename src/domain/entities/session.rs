//! # Session Entity
//!
//! 録画セッションのドメインエンティティ

use std::fmt;

use crate::domain::error::SessionInitiationError;

/// サーバーが発行したセッションID（形式はサーバー側が所有）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 録画セッション
///
/// Session Initiator が一度だけ作成し、以後は不変
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    owner: String,
    session_id: SessionId,
}

impl Session {
    pub fn new(owner: impl Into<String>, session_id: SessionId) -> Self {
        Self {
            owner: owner.into(),
            session_id,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

/// Rejects owner identifiers that are empty once surrounding whitespace is removed.
pub fn validate_owner(owner: &str) -> Result<&str, SessionInitiationError> {
    let trimmed = owner.trim();
    if trimmed.is_empty() {
        return Err(SessionInitiationError::InvalidOwner);
    }
    Ok(trimmed)
}
