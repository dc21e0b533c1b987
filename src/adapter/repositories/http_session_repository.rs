//! HTTP Session Repository Implementation
//!
//! SessionRepositoryのHTTP実装

use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use crate::adapter::http::client::RecordingApi;
use crate::adapter::http::models::parse_start_recording;
use crate::adapter::http::retry::{retry_request, RetryPolicy};
use crate::domain::entities::session::{Session, SessionId};
use crate::domain::error::SessionInitiationError;
use crate::domain::repositories::session_repository::SessionRepository;

/// HTTPセッションリポジトリ
pub struct HttpSessionRepository {
    api: Arc<dyn RecordingApi>,
    retry: RetryPolicy,
}

impl HttpSessionRepository {
    pub fn new(api: Arc<dyn RecordingApi>, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }
}

#[async_trait]
impl SessionRepository for HttpSessionRepository {
    async fn start_session(&self, owner: &str) -> Result<Session, SessionInitiationError> {
        let (body, attempts) = retry_request(&self.retry, "start-recording", || {
            self.api.start_recording(owner)
        })
        .await
        .map_err(|(e, _)| SessionInitiationError::Request(e))?;

        let started =
            parse_start_recording(&body).map_err(SessionInitiationError::MalformedResponse)?;

        if let Some(message) = &started.message {
            info!("Server: {} (after {} attempt(s))", message, attempts);
        }

        Ok(Session::new(owner, SessionId::new(started.video_id)))
    }
}
