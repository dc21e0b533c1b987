//! # Data Transfer Objects

pub mod upload_config;
pub mod upload_report;
