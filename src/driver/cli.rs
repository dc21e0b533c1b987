//! CLI Argument Parsing
//!
//! CLIの引数解析

use clap::{ArgGroup, Parser};

use crate::adapter::config::Environment;
use crate::application::dto::upload_config::FailurePolicy;

/// 動画ファイルをチャンクに分割して録画サーバーへアップロードするCLI
#[derive(Parser, Debug, Clone)]
#[command(name = "blobsync")]
#[command(about = "Upload a video file to a recording server in chunks", long_about = None)]
#[command(group(ArgGroup::new("environment").required(true).multiple(false).args(["local", "remote"])))]
pub struct Args {
    /// Use the local server URL from the config
    #[arg(long)]
    pub local: bool,

    /// Use the remote server URL from the config
    #[arg(long)]
    pub remote: bool,

    /// Video file to upload (overrides video_file_path)
    #[arg(short, long)]
    pub file: Option<String>,

    /// Owner identifier sent with every request (overrides username)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Chunk size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Number of chunks allowed in flight at once (1 = sequential)
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// What to do after a chunk exhausts its retries: abort | continue
    #[arg(long)]
    pub failure_policy: Option<FailurePolicy>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Config file path (default: ./blobsync.json if present)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Dry run mode - show the chunk plan without contacting the server
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    pub fn environment(&self) -> Environment {
        if self.remote {
            Environment::Remote
        } else {
            Environment::Local
        }
    }
}
