//! # Chunk Repository Trait
//!
//! チャンクの送信を抽象化

use async_trait::async_trait;

use crate::domain::entities::chunk::Chunk;
use crate::domain::error::UploadError;

/// サーバーからの受領確認
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkAck {
    /// サーバーのメッセージ（例: "Chunk received successfully!"）
    pub message: Option<String>,
    /// 終端チャンクに対してサーバーが返す動画URL
    pub video_url: Option<String>,
    /// 成功までに要した試行回数
    pub attempts: u32,
}

/// チャンクリポジトリ
///
/// 1チャンクを1リクエストとして送信するリポジトリ
#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// チャンクを送信する
    ///
    /// リトライは実装側の責務。`Err` はリトライを使い切った後の最終結果。
    async fn upload_chunk(&self, chunk: &Chunk) -> Result<ChunkAck, UploadError>;
}
