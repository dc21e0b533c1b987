//! Repository Implementations
//!
//! Domain層のRepositoryトレイトの実装

pub mod http_chunk_repository;
pub mod http_session_repository;
