//! # Use Cases
//!
//! アプリケーションのビジネスフロー（ユースケース）
//!
//! ## ユースケース
//!
//! - **BeginSessionUseCase**: 録画セッションの開始
//! - **UploadStreamUseCase**: ソースのチャンク分割と送信

pub mod begin_session;
pub mod upload_stream;
