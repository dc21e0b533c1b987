//! Recording API HTTP Modules
//!
//! 録画サーバーとのHTTP通信

pub mod client;
pub mod models;
pub mod retry;
