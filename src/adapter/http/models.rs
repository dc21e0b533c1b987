//! Recording API Wire Models
//!
//! `/start-recording/` と `/upload-blob/` のリクエスト・レスポンス

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entities::chunk::Chunk;

#[derive(Debug, Serialize)]
pub struct StartRecordingRequest<'a> {
    pub username: &'a str,
}

#[derive(Debug, Deserialize)]
struct StartRecordingResponse {
    #[serde(default)]
    video_id: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// `/start-recording/` の解釈済みレスポンス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedRecording {
    pub video_id: String,
    pub message: Option<String>,
}

/// Parses the start-recording body. `video_id` may be a string or an integer.
pub fn parse_start_recording(body: &str) -> Result<StartedRecording, String> {
    let response: StartRecordingResponse =
        serde_json::from_str(body).map_err(|e| format!("{} (body: {})", e, truncate(body)))?;

    let video_id = match response.video_id {
        Some(Value::String(id)) if !id.trim().is_empty() => id,
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => return Err(format!("unexpected video_id value: {}", other)),
        None => return Err(format!("missing video_id (body: {})", truncate(body))),
    };

    Ok(StartedRecording {
        video_id,
        message: response.message,
    })
}

/// `/upload-blob/` のリクエストボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobUploadRequest {
    pub username: String,
    pub video_id: String,
    pub blob_index: u64,
    /// 標準Base64でエンコードしたペイロード
    pub blob_object: String,
    pub is_last: bool,
}

impl BlobUploadRequest {
    pub fn from_chunk(owner: &str, chunk: &Chunk) -> Self {
        Self {
            username: owner.to_string(),
            video_id: chunk.session_id().as_str().to_string(),
            blob_index: chunk.index(),
            blob_object: BASE64_STANDARD.encode(chunk.payload()),
            is_last: chunk.is_terminal(),
        }
    }

    pub fn decode_payload(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64_STANDARD.decode(self.blob_object.as_bytes())
    }
}

/// `/upload-blob/` の受領確認
///
/// 非終端: `{"msg": "Chunk received successfully!"}`
/// 終端: `{"message", "video_id", "video_url"}` をJSON文字列として二重エンコードしたもの
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BlobUploadResponse {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl BlobUploadResponse {
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().or(self.msg.as_deref())
    }
}

/// Acknowledgement bodies are server-defined; anything unrecognised yields an empty ack.
pub fn parse_blob_ack(body: &str) -> BlobUploadResponse {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(value) => value,
            Err(_) => {
                return BlobUploadResponse {
                    message: Some(inner),
                    ..Default::default()
                }
            }
        },
        Ok(value) => value,
        Err(e) => {
            debug!("Unrecognised upload acknowledgement ({}): {}", e, truncate(body));
            return BlobUploadResponse::default();
        }
    };

    serde_json::from_value(value).unwrap_or_default()
}

pub(crate) fn truncate(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.len() <= LIMIT {
        return body.to_string();
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::session::SessionId;

    #[test]
    fn test_parse_start_recording_string_id() {
        let body = r#"{"message": "Recording started successfully", "video_id": "xY3kQ9"}"#;

        let started = parse_start_recording(body).unwrap();

        assert_eq!(started.video_id, "xY3kQ9");
        assert_eq!(
            started.message.as_deref(),
            Some("Recording started successfully")
        );
    }

    #[test]
    fn test_parse_start_recording_numeric_id() {
        let started = parse_start_recording(r#"{"video_id": 42}"#).unwrap();
        assert_eq!(started.video_id, "42");
        assert!(started.message.is_none());
    }

    #[test]
    fn test_parse_start_recording_malformed() {
        assert!(parse_start_recording("not json").is_err());
        assert!(parse_start_recording(r#"{"message": "ok"}"#).is_err());
        assert!(parse_start_recording(r#"{"video_id": ""}"#).is_err());
        assert!(parse_start_recording(r#"{"video_id": null}"#).is_err());
        assert!(parse_start_recording(r#"{"video_id": ["a"]}"#).is_err());
    }

    #[test]
    fn test_blob_request_from_chunk() {
        let chunk = Chunk::new(SessionId::new("vid-9"), 3, b"hello world".to_vec(), true);

        let request = BlobUploadRequest::from_chunk("user13", &chunk);

        assert_eq!(request.username, "user13");
        assert_eq!(request.video_id, "vid-9");
        assert_eq!(request.blob_index, 3);
        assert_eq!(request.blob_object, "aGVsbG8gd29ybGQ=");
        assert!(request.is_last);
        assert_eq!(request.decode_payload().unwrap(), b"hello world");
    }

    #[test]
    fn test_blob_request_wire_format() {
        let chunk = Chunk::new(SessionId::new("vid-9"), 1, vec![0, 255], false);
        let request = BlobUploadRequest::from_chunk("user13", &chunk);

        let json: Value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "username": "user13",
                "video_id": "vid-9",
                "blob_index": 1,
                "blob_object": "AP8=",
                "is_last": false
            })
        );
    }

    #[test]
    fn test_parse_blob_ack_plain_object() {
        let ack = parse_blob_ack(r#"{"msg": "Chunk received successfully!"}"#);

        assert_eq!(ack.message(), Some("Chunk received successfully!"));
        assert!(ack.video_url.is_none());
    }

    #[test]
    fn test_parse_blob_ack_double_encoded_terminal() {
        let inner = serde_json::json!({
            "message": "Blobs received successfully, video is being processed",
            "video_id": "vid-9",
            "video_url": "http://127.0.0.1:8000/srce/api/video/vid-9.mp4"
        });
        let body = serde_json::to_string(&inner.to_string()).unwrap();

        let ack = parse_blob_ack(&body);

        assert_eq!(
            ack.video_url.as_deref(),
            Some("http://127.0.0.1:8000/srce/api/video/vid-9.mp4")
        );
        assert_eq!(
            ack.message(),
            Some("Blobs received successfully, video is being processed")
        );
    }

    #[test]
    fn test_parse_blob_ack_unrecognised() {
        assert_eq!(parse_blob_ack("OK"), BlobUploadResponse::default());
        assert_eq!(parse_blob_ack("[1, 2]"), BlobUploadResponse::default());
        assert_eq!(
            parse_blob_ack(r#""plain text""#).message(),
            Some("plain text")
        );
    }

    #[test]
    fn test_truncate_long_body() {
        let long = "é".repeat(300);
        let short = truncate(&long);
        assert!(short.ends_with("..."));
        assert!(short.len() <= 203);
    }
}
