//! # Upload Report DTO
//!
//! アップロード結果のサマリー

use chrono::{DateTime, Utc};

use crate::domain::entities::session::SessionId;
use crate::domain::error::{SourceReadError, UploadError};

/// アップロード結果
///
/// 終端チャンクの送信が解決した時点（または中断時点）の結果。
/// `uploaded` と `failures` はインデックス昇順。
#[derive(Debug)]
pub struct UploadReport {
    pub session_id: SessionId,
    /// ソースから読み込んだチャンク数
    pub chunks_read: u64,
    /// 送信に成功したチャンクのインデックス
    pub uploaded: Vec<u64>,
    /// リトライを使い切ったチャンク
    pub failures: Vec<UploadError>,
    /// ソース読み込みエラー（発生した場合）
    pub source_error: Option<SourceReadError>,
    /// `FailurePolicy::Abort` により送信を打ち切ったか
    pub aborted: bool,
    /// 終端チャンクが受領されたか
    pub terminal_delivered: bool,
    /// 成功したチャンクのペイロード合計
    pub bytes_uploaded: u64,
    /// 終端チャンクの応答に含まれていた動画URL
    pub video_url: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl UploadReport {
    pub fn new(session_id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            chunks_read: 0,
            uploaded: Vec::new(),
            failures: Vec::new(),
            source_error: None,
            aborted: false,
            terminal_delivered: false,
            bytes_uploaded: 0,
            video_url: None,
            started_at: now,
            finished_at: now,
        }
    }

    /// 全チャンクが受領され、終端まで届いたかチェックします。
    ///
    /// # 例
    ///
    /// ```
    /// use blobsync::application::dto::upload_report::UploadReport;
    /// use blobsync::domain::entities::session::SessionId;
    ///
    /// let mut report = UploadReport::new(SessionId::new("vid-1"));
    /// assert!(!report.is_success()); // 終端未到達
    ///
    /// report.uploaded = vec![1, 2];
    /// report.terminal_delivered = true;
    /// assert!(report.is_success());
    /// ```
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
            && self.source_error.is_none()
            && !self.aborted
            && self.terminal_delivered
    }

    /// 送信を試みたチャンク数
    pub fn attempted(&self) -> u64 {
        (self.uploaded.len() + self.failures.len()) as u64
    }

    pub fn failed_indices(&self) -> Vec<u64> {
        self.failures.iter().map(|f| f.index).collect()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub(crate) fn record_success(&mut self, index: u64, size: usize) {
        self.uploaded.push(index);
        self.bytes_uploaded += size as u64;
    }

    pub(crate) fn record_failure(&mut self, error: UploadError) {
        self.failures.push(error);
    }

    /// 並列送信では完了順が前後するため、最後にインデックス順へ揃える
    pub(crate) fn finish(&mut self) {
        self.uploaded.sort_unstable();
        self.failures.sort_by_key(|f| f.index);
        self.finished_at = Utc::now();
    }
}
