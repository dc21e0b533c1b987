//! Blobsync - Chunked Video Uploader
//!
//! 動画ファイルを録画サーバーへチャンク単位でアップロード

// coverage_nightly cfg が設定されている場合のみ coverage_attribute を有効化
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use blobsync::adapter::config::{Config, DEFAULT_CONFIG_PATH};
use blobsync::driver::{Args, RecordingUploadWorkflow};

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init();

    let args = Args::parse();

    // Load configuration (an explicit path must exist)
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_optional(DEFAULT_CONFIG_PATH)?,
    };

    // Create workflow with injected configuration
    let workflow = RecordingUploadWorkflow::new(config);

    let outcome = workflow.execute(args).await?;

    Ok(ExitCode::from(outcome.exit_code()))
}
