//! Adapter Layer
//!
//! 外部システム（録画サーバー, ファイルシステム, 設定ファイル）との統合

pub mod config;
pub mod http;
pub mod repositories;
pub mod source;
