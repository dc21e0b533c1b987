//! # Domain Services
//!
//! エンティティに属さないビジネスルール

pub mod chunk_reader;
