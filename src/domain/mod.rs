//! # Domain Layer
//!
//! 録画アップロードの核心的なルールとエンティティを定義します。
//!
//! ## 特徴
//!
//! - HTTPやファイルシステムについて何も知らない
//! - 非同期I/Oは `tokio::io::AsyncRead` のみに依存
//! - 純粋なビジネスロジック
//!
//! ## 構成要素
//!
//! - **entities**: `Session`, `Chunk`
//! - **error**: エラー分類（セッション開始 / アップロード / ソース読み込み）
//! - **repositories**: Repository trait（インターフェース定義のみ）
//! - **services**: `ChunkReader`（ウィンドウ分割と終端検出）

pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
