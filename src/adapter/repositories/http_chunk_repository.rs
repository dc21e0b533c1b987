//! HTTP Chunk Repository Implementation
//!
//! ChunkRepositoryのHTTP実装（リトライ対応）

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::adapter::http::client::RecordingApi;
use crate::adapter::http::models::{parse_blob_ack, BlobUploadRequest};
use crate::adapter::http::retry::{retry_request, RetryPolicy};
use crate::domain::entities::chunk::Chunk;
use crate::domain::error::{TransportError, UploadError};
use crate::domain::repositories::chunk_repository::{ChunkAck, ChunkRepository};

/// Body of the 400 the server returns once a recording has been merged.
const ALREADY_PROCESSED: &str = "Recording already processed";

/// 終端チャンクの再送に対する「処理済み」応答
///
/// 最初の送信がクライアント側でタイムアウトしてもサーバーは結合を終えている
/// ことがあるため、再送で返るこの400は受領済みとして扱う。
fn is_already_processed(cause: &TransportError) -> bool {
    matches!(
        cause,
        TransportError::Status { status: 400, body } if body.contains(ALREADY_PROCESSED)
    )
}

/// HTTPチャンクリポジトリ
///
/// 1チャンクを1回の `/upload-blob/` リクエストとして送信する
pub struct HttpChunkRepository {
    api: Arc<dyn RecordingApi>,
    owner: String,
    retry: RetryPolicy,
}

impl HttpChunkRepository {
    pub fn new(api: Arc<dyn RecordingApi>, owner: String, retry: RetryPolicy) -> Self {
        Self { api, owner, retry }
    }
}

#[async_trait]
impl ChunkRepository for HttpChunkRepository {
    async fn upload_chunk(&self, chunk: &Chunk) -> Result<ChunkAck, UploadError> {
        let request = BlobUploadRequest::from_chunk(&self.owner, chunk);
        let label = format!("Chunk {}", chunk.index());

        match retry_request(&self.retry, &label, || self.api.upload_blob(&request)).await {
            Ok((body, attempts)) => {
                let ack = parse_blob_ack(&body);
                if let Some(message) = ack.message() {
                    debug!("Chunk {}: {}", chunk.index(), message);
                }
                println!(
                    "✓ Chunk {} uploaded ({} bytes{})",
                    chunk.index(),
                    chunk.len(),
                    if chunk.is_terminal() { ", last" } else { "" }
                );
                Ok(ChunkAck {
                    message: ack.message().map(str::to_string),
                    video_url: ack.video_url,
                    attempts,
                })
            }
            Err((cause, attempts))
                if chunk.is_terminal() && attempts > 1 && is_already_processed(&cause) =>
            {
                warn!(
                    "Chunk {} retry answered '{}', treating the last chunk as delivered",
                    chunk.index(),
                    cause
                );
                println!(
                    "⚠ Chunk {} (last) was already processed by the server, treating it as delivered",
                    chunk.index()
                );
                Ok(ChunkAck {
                    message: Some(ALREADY_PROCESSED.to_string()),
                    video_url: None,
                    attempts,
                })
            }
            Err((cause, attempts)) => {
                println!(
                    "✗ Failed to upload chunk {} after {} attempt(s): {}",
                    chunk.index(),
                    attempts,
                    cause
                );
                Err(UploadError::new(chunk.index(), attempts, cause))
            }
        }
    }
}
