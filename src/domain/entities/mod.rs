//! # Domain Entities
//!
//! ビジネスエンティティとバリューオブジェクトを定義するモジュール
//!
//! ## エンティティ
//!
//! - **Session**: サーバーが割り当てた録画セッション
//! - **Chunk**: ソースストリームの1ウィンドウ

pub mod chunk;
pub mod session;
