//! # Begin Session Use Case
//!
//! 録画セッション開始ユースケース

use std::sync::Arc;

use log::info;

use crate::domain::entities::session::{validate_owner, Session};
use crate::domain::error::SessionInitiationError;
use crate::domain::repositories::session_repository::SessionRepository;

/// 録画セッション開始ユースケース
///
/// オーナー識別子を検証してからサーバーにセッションIDを要求する
pub struct BeginSessionUseCase<S: SessionRepository> {
    session_repository: Arc<S>,
}

impl<S: SessionRepository> BeginSessionUseCase<S> {
    pub fn new(session_repository: Arc<S>) -> Self {
        Self { session_repository }
    }

    /// セッションを開始する
    ///
    /// # Errors
    ///
    /// オーナーが空の場合は通信せずに `SessionInitiationError::InvalidOwner` を返す
    pub async fn execute(&self, owner: &str) -> Result<Session, SessionInitiationError> {
        let owner = validate_owner(owner)?;

        let session = self.session_repository.start_session(owner).await?;
        info!(
            "Session {} started for {}",
            session.session_id(),
            session.owner()
        );

        Ok(session)
    }
}
