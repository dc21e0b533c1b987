//! # Domain Errors
//!
//! アップロード処理のエラー分類

use thiserror::Error;

/// Failure of a single request against the recording server.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("upload task failed: {0}")]
    TaskFailed(String),
}

/// セッション開始エラー
///
/// セッションIDが無い状態ではチャンクを送信できないため、常に致命的
#[derive(Debug, Error)]
pub enum SessionInitiationError {
    #[error("owner identifier must not be empty")]
    InvalidOwner,

    #[error("start-recording request failed: {0}")]
    Request(#[source] TransportError),

    #[error("malformed start-recording response: {0}")]
    MalformedResponse(String),
}

/// チャンク単位のアップロードエラー（リトライ後）
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("chunk {index} failed after {attempts} attempt(s): {cause}")]
pub struct UploadError {
    pub index: u64,
    pub attempts: u32,
    #[source]
    pub cause: TransportError,
}

impl UploadError {
    pub fn new(index: u64, attempts: u32, cause: TransportError) -> Self {
        Self {
            index,
            attempts,
            cause,
        }
    }
}

/// ソース読み込みエラー（致命的）
#[derive(Debug, Error)]
#[error("failed to read source at chunk {index}: {source}")]
pub struct SourceReadError {
    /// 読み込み中だったチャンクのインデックス
    pub index: u64,
    #[source]
    pub source: std::io::Error,
}
