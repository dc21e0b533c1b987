//! # Session Repository Trait
//!
//! 録画セッションの開始を抽象化

use async_trait::async_trait;

use crate::domain::entities::session::Session;
use crate::domain::error::SessionInitiationError;

/// セッションリポジトリ
///
/// サーバーからセッションIDを取得するリポジトリ
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// セッションを開始する
    ///
    /// # Arguments
    ///
    /// * `owner` - 検証済みのオーナー識別子
    ///
    /// # Errors
    ///
    /// 通信失敗またはレスポンスが不正な場合に `SessionInitiationError` を返す
    async fn start_session(&self, owner: &str) -> Result<Session, SessionInitiationError>;
}
