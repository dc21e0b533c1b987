//! # Upload Configuration DTO
//!
//! アップロード設定のData Transfer Object

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default window size: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// リトライを使い切ったチャンクが出た後の振る舞い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// 以降のチャンクを送信せずにセッションを中断する
    #[default]
    Abort,
    /// 失敗を記録し、残りのチャンク（終端を含む）の送信を続ける
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(format!(
                "unknown failure policy '{}' (expected 'abort' or 'continue')",
                other
            )),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => f.write_str("abort"),
            Self::Continue => f.write_str("continue"),
        }
    }
}

/// アップロード設定
///
/// チャンク分割と送信スケジュールに必要な設定情報
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// オーナー識別子（username）
    pub owner: String,
    /// チャンクサイズ（バイト）
    pub chunk_size: NonZeroUsize,
    /// 同時に送信中にできるチャンク数（1 = 逐次）
    pub max_in_flight: NonZeroUsize,
    /// 失敗時のポリシー
    pub failure_policy: FailurePolicy,
}

impl UploadConfig {
    /// 新しいアップロード設定を作成します。
    ///
    /// # 例
    ///
    /// ```
    /// use std::num::NonZeroUsize;
    /// use blobsync::application::dto::upload_config::{FailurePolicy, UploadConfig};
    ///
    /// let config = UploadConfig::new(
    ///     "user13".to_string(),
    ///     NonZeroUsize::new(1024 * 1024).unwrap(),
    ///     NonZeroUsize::new(1).unwrap(),   // 逐次送信
    ///     FailurePolicy::Abort,
    /// );
    ///
    /// assert!(config.is_sequential());
    /// assert_eq!(config.chunk_size.get(), 1_048_576);
    /// ```
    pub fn new(
        owner: String,
        chunk_size: NonZeroUsize,
        max_in_flight: NonZeroUsize,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            owner,
            chunk_size,
            max_in_flight,
            failure_policy,
        }
    }

    pub fn is_sequential(&self) -> bool {
        self.max_in_flight.get() == 1
    }
}
