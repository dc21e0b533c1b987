//! Workflow Orchestration
//!
//! ワークフローのオーケストレーション

use anyhow::Result;
use log::info;

use std::sync::Arc;

use crate::adapter::config::Config;
use crate::adapter::http::client::{RecordingApi, ReqwestRecordingApi};
use crate::adapter::repositories::http_chunk_repository::HttpChunkRepository;
use crate::adapter::repositories::http_session_repository::HttpSessionRepository;
use crate::adapter::source::FileSource;
use crate::application::dto::upload_config::UploadConfig;
use crate::application::dto::upload_report::UploadReport;
use crate::application::use_cases::begin_session::BeginSessionUseCase;
use crate::application::use_cases::upload_stream::UploadStreamUseCase;
use crate::domain::entities::chunk::expected_chunk_count;
use crate::domain::entities::session::SessionId;
use crate::domain::services::chunk_reader::ChunkReader;

use super::cli::Args;

/// 1回の実行結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 全チャンクが受領された
    Completed,
    /// ドライラン（サーバーには接続していない）
    DryRun,
    SessionFailed,
    PartialFailure,
    SourceFailed,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::DryRun)
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Apply CLI overrides on top of the file configuration.
pub fn merge_args(mut config: Config, args: &Args) -> Config {
    if let Some(file) = &args.file {
        config.video_file_path = Some(file.clone());
    }
    if let Some(username) = &args.username {
        config.username = username.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(max_in_flight) = args.max_in_flight {
        config.max_in_flight = max_in_flight;
    }
    if let Some(policy) = args.failure_policy {
        config.failure_policy = policy;
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = timeout;
    }
    config
}

/// Print the final summary line and classify the run.
pub fn summarize(report: &UploadReport, expected_chunks: u64) -> RunOutcome {
    let total = expected_chunks.max(report.chunks_read);

    if !report.failures.is_empty() {
        let indices = report
            .failed_indices()
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "✗ {} of {} chunks failed (indices: {})",
            report.failures.len(),
            total,
            indices
        );
        if report.aborted {
            println!(
                "  Upload aborted: {} chunk(s) were not sent",
                total.saturating_sub(report.attempted())
            );
        }
    }

    if let Some(e) = &report.source_error {
        println!("✗ Source read failed at chunk {}: {}", e.index, e.source);
        return RunOutcome::SourceFailed;
    }

    if !report.is_success() {
        if report.failures.is_empty() {
            println!("✗ Upload did not complete: the last chunk was not delivered");
        }
        return RunOutcome::PartialFailure;
    }

    println!(
        "✓ Upload complete! ({} chunks, {} bytes in {:.1}s)",
        report.uploaded.len(),
        report.bytes_uploaded,
        report.elapsed().num_milliseconds() as f64 / 1000.0
    );
    if let Some(url) = &report.video_url {
        println!("  Video URL: {}", url);
    }

    RunOutcome::Completed
}

/// Recording Upload Workflow
pub struct RecordingUploadWorkflow {
    config: Config,
}

impl RecordingUploadWorkflow {
    /// Create a new workflow instance with the loaded configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Execute the upload workflow
    ///
    /// 設定・ファイルの問題は `Err`、アップロードの失敗は `RunOutcome` で返す
    pub async fn execute(&self, args: Args) -> Result<RunOutcome> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let env = args.environment();

        info!("[{}] Starting blobsync...", run_id);
        info!("[{}] Dry run: {}", run_id, args.dry_run);

        let config = merge_args(self.config.clone(), &args);
        config.validate(env)?;
        let upload_config = config.upload_config()?;
        let base_url = config.base_url(env);

        let source = FileSource::open(&config.video_path()?).await?;
        let expected = expected_chunk_count(source.len(), upload_config.chunk_size.get());

        println!("✓ Using configuration:");
        println!("  Server: {} ({})", base_url, env);
        println!("  Username: {}", upload_config.owner);
        println!(
            "  File: {} ({} bytes)",
            source.path().display(),
            source.len()
        );
        println!(
            "  Chunks: {} x {} bytes ({} in flight, on failure: {})",
            expected,
            upload_config.chunk_size,
            upload_config.max_in_flight,
            upload_config.failure_policy
        );

        if args.dry_run {
            return Ok(Self::print_plan(source, &upload_config).await);
        }

        let api: Arc<dyn RecordingApi> =
            Arc::new(ReqwestRecordingApi::new(base_url, config.request_timeout())?);
        let retry = config.retry_policy();

        // Session
        let begin_session =
            BeginSessionUseCase::new(Arc::new(HttpSessionRepository::new(api.clone(), retry)));
        let session = match begin_session.execute(&upload_config.owner).await {
            Ok(session) => session,
            Err(e) => {
                println!("✗ Session could not start: {}", e);
                return Ok(RunOutcome::SessionFailed);
            }
        };
        println!("✓ Recording started: video_id {}", session.session_id());
        info!("[{}] Session {}", run_id, session.session_id());

        // Chunks
        let chunk_repository = Arc::new(HttpChunkRepository::new(
            api,
            upload_config.owner.clone(),
            retry,
        ));
        let upload_stream = UploadStreamUseCase::new(chunk_repository, upload_config);
        let report = upload_stream.execute(&session, source.into_reader()).await;

        info!(
            "[{}] Finished: {} uploaded, {} failed, aborted: {}",
            run_id,
            report.uploaded.len(),
            report.failures.len(),
            report.aborted
        );

        Ok(summarize(&report, expected))
    }

    /// ソースを読み切ってチャンク計画を表示する（送信しない）
    async fn print_plan(source: FileSource, upload_config: &UploadConfig) -> RunOutcome {
        println!("✓ Dry-run mode (not actually uploading)");

        let mut reader = ChunkReader::new(
            source.into_reader(),
            upload_config.chunk_size,
            SessionId::new("dry-run"),
        );
        loop {
            match reader.next_chunk().await {
                Ok(Some(chunk)) => {
                    println!(
                        "    - Chunk {} | {} bytes | is_last: {}",
                        chunk.index(),
                        chunk.len(),
                        chunk.is_terminal()
                    );
                }
                Ok(None) => return RunOutcome::DryRun,
                Err(e) => {
                    println!("✗ Source read failed at chunk {}: {}", e.index, e.source);
                    return RunOutcome::SourceFailed;
                }
            }
        }
    }
}
