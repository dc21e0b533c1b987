//! Configuration
//!
//! JSON設定ファイルの読み込みと検証

use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapter::http::retry::{
    RetryPolicy, DEFAULT_INITIAL_RETRY_DELAY_MS, DEFAULT_MAX_RETRIES, DEFAULT_MAX_RETRY_DELAY_MS,
};
use crate::application::dto::upload_config::{FailurePolicy, UploadConfig, DEFAULT_CHUNK_SIZE};

pub const DEFAULT_CONFIG_PATH: &str = "./blobsync.json";
pub const DEFAULT_LOCAL_URL: &str = "http://127.0.0.1:8000/srce/api";
pub const DEFAULT_REMOTE_URL: &str = "http://web-02.cofucan.tech/srce/api";
pub const DEFAULT_USERNAME: &str = "user13";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// 設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// 接続先サーバー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Remote,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// 設定ファイルの内容
///
/// 省略されたキーはデフォルト値になる
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub local_url: String,
    pub remote_url: String,
    pub username: String,
    pub video_file_path: Option<String>,
    pub chunk_size: usize,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub initial_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    pub max_in_flight: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            local_url: DEFAULT_LOCAL_URL.to_string(),
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            video_file_path: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_retry_delay_ms: DEFAULT_INITIAL_RETRY_DELAY_MS,
            max_retry_delay_ms: DEFAULT_MAX_RETRY_DELAY_MS,
            max_in_flight: 1,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込む（ファイルが存在しなければエラー）
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let expanded = shellexpand::tilde(path).to_string();

        let content = fs::read_to_string(&expanded).map_err(|source| ConfigError::Read {
            path: expanded.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: expanded,
            source,
        })
    }

    /// 設定ファイルを読み込む（ファイルが無ければデフォルト値）
    pub fn load_optional(path: &str) -> Result<Self, ConfigError> {
        let expanded = shellexpand::tilde(path).to_string();

        if !Path::new(&expanded).exists() {
            info!("No config file at {}, using defaults", expanded);
            return Ok(Self::default());
        }

        Self::load(path)
    }

    pub fn base_url(&self, env: Environment) -> &str {
        match env {
            Environment::Local => &self.local_url,
            Environment::Remote => &self.remote_url,
        }
    }

    /// `~` を展開した動画ファイルのパス
    pub fn video_path(&self) -> Result<PathBuf, ConfigError> {
        match self.video_file_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(shellexpand::tilde(path).as_ref())),
            _ => Err(ConfigError::Invalid(
                "video_file_path is not set (use --file or the config file)".to_string(),
            )),
        }
    }

    /// 送信前に設定値を検証する
    pub fn validate(&self, env: Environment) -> Result<(), ConfigError> {
        let base_url = self.base_url(env);
        let url = Url::parse(base_url).map_err(|e| {
            ConfigError::Invalid(format!("{} URL '{}' is not valid: {}", env, base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "{} URL '{}' must use http or https",
                env, base_url
            )));
        }

        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid("username must not be empty".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::Invalid(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        self.video_path().map(|_| ())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay_ms: self.initial_retry_delay_ms,
            max_delay_ms: self.max_retry_delay_ms,
        }
    }

    pub fn upload_config(&self) -> Result<UploadConfig, ConfigError> {
        let chunk_size = NonZeroUsize::new(self.chunk_size).ok_or_else(|| {
            ConfigError::Invalid("chunk_size must be greater than 0".to_string())
        })?;
        let max_in_flight = NonZeroUsize::new(self.max_in_flight)
            .ok_or_else(|| ConfigError::Invalid("max_in_flight must be at least 1".to_string()))?;

        Ok(UploadConfig::new(
            self.username.trim().to_string(),
            chunk_size,
            max_in_flight,
            self.failure_policy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> String {
        let path = dir.path().join("blobsync.json");
        fs::write(&path, content).unwrap();
        path.to_string_lossy().to_string()
    }

    fn valid_config() -> Config {
        Config {
            video_file_path: Some("/tmp/video.mp4".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.local_url, "http://127.0.0.1:8000/srce/api");
        assert_eq!(config.remote_url, "http://web-02.cofucan.tech/srce/api");
        assert_eq!(config.username, "user13");
        assert_eq!(config.chunk_size, 1_048_576);
        assert_eq!(config.max_in_flight, 1);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(config.video_file_path.is_none());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{
  "username": "alice",
  "video_file_path": "/videos/demo.mp4",
  "chunk_size": 4096,
  "failure_policy": "continue"
}"#,
        );

        let config = Config::load(&path).unwrap();

        assert_eq!(config.username, "alice");
        assert_eq!(config.video_file_path.as_deref(), Some("/videos/demo.mp4"));
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.local_url, DEFAULT_LOCAL_URL);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.json");

        let err = Config::load(&path.to_string_lossy()).unwrap_err();

        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_invalid_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "{ not json");

        let err = Config::load(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_optional_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");

        let config = Config::load_optional(&path.to_string_lossy()).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_optional_present_but_invalid_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"chunk_size": "big"}"#);

        assert!(Config::load_optional(&path).is_err());
    }

    #[test]
    fn test_base_url_by_environment() {
        let config = Config::default();
        assert_eq!(config.base_url(Environment::Local), DEFAULT_LOCAL_URL);
        assert_eq!(config.base_url(Environment::Remote), DEFAULT_REMOTE_URL);
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate(Environment::Local).is_ok());
        assert!(valid_config().validate(Environment::Remote).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let config = Config {
            remote_url: "ftp://example.com/api".to_string(),
            ..valid_config()
        };

        let err = config.validate(Environment::Remote).unwrap_err();
        assert!(err.to_string().contains("http or https"));

        // Local URL is untouched and still valid
        assert!(config.validate(Environment::Local).is_ok());
    }

    #[test]
    fn test_validate_rejects_relative_url() {
        let config = Config {
            local_url: "srce/api".to_string(),
            ..valid_config()
        };

        assert!(config.validate(Environment::Local).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let config = Config {
            chunk_size: 0,
            ..valid_config()
        };

        assert!(matches!(
            config.validate(Environment::Local),
            Err(ConfigError::Invalid(_))
        ));
        assert!(config.upload_config().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_in_flight() {
        let config = Config {
            max_in_flight: 0,
            ..valid_config()
        };

        assert!(config.validate(Environment::Local).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_username() {
        let config = Config {
            username: "   ".to_string(),
            ..valid_config()
        };

        let err = config.validate(Environment::Local).unwrap_err();
        assert!(err.to_string().contains("username"));
    }

    #[test]
    fn test_validate_requires_video_path() {
        let err = Config::default().validate(Environment::Local).unwrap_err();
        assert!(err.to_string().contains("video_file_path"));
    }

    #[test]
    fn test_video_path_expands_tilde() {
        let config = Config {
            video_file_path: Some("~/videos/demo.mp4".to_string()),
            ..Config::default()
        };

        let path = config.video_path().unwrap();
        assert!(path.ends_with("videos/demo.mp4"));
    }

    #[test]
    fn test_upload_config_conversion() {
        let config = Config {
            username: " bob ".to_string(),
            chunk_size: 10,
            max_in_flight: 4,
            failure_policy: FailurePolicy::Continue,
            ..valid_config()
        };

        let upload = config.upload_config().unwrap();

        assert_eq!(upload.owner, "bob");
        assert_eq!(upload.chunk_size.get(), 10);
        assert_eq!(upload.max_in_flight.get(), 4);
        assert_eq!(upload.failure_policy, FailurePolicy::Continue);
        assert!(!upload.is_sequential());
    }

    #[test]
    fn test_retry_policy_and_timeout() {
        let config = Config {
            max_retries: 5,
            initial_retry_delay_ms: 100,
            max_retry_delay_ms: 1000,
            request_timeout_secs: 7,
            ..Config::default()
        };

        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay_ms, 100);
        assert_eq!(policy.max_delay_ms, 1000);
        assert_eq!(config.request_timeout(), Duration::from_secs(7));
    }
}
