//! # Upload Stream Use Case
//!
//! ソースをチャンクに分割して送信するユースケース

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::AsyncRead;
use tokio::task::{Id, JoinError, JoinSet};

use crate::application::dto::upload_config::{FailurePolicy, UploadConfig};
use crate::application::dto::upload_report::UploadReport;
use crate::domain::entities::chunk::Chunk;
use crate::domain::entities::session::Session;
use crate::domain::error::{TransportError, UploadError};
use crate::domain::repositories::chunk_repository::{ChunkAck, ChunkRepository};
use crate::domain::services::chunk_reader::ChunkReader;

/// チャンクアップロードユースケース
///
/// - `max_in_flight == 1`: 前のチャンクの送信が解決してから次を送る
/// - `max_in_flight > 1`: 非終端チャンクを最大K件まで並列に送る
///
/// どちらのモードでも、終端チャンクはそれ以前の全チャンクが解決してから送る。
pub struct UploadStreamUseCase<C: ChunkRepository + 'static> {
    chunk_repository: Arc<C>,
    config: UploadConfig,
}

impl<C: ChunkRepository + 'static> UploadStreamUseCase<C> {
    pub fn new(chunk_repository: Arc<C>, config: UploadConfig) -> Self {
        Self {
            chunk_repository,
            config,
        }
    }

    /// ソースを読み切るまで（または中断するまで）チャンクを送信する
    ///
    /// ソースはこの関数の中でドロップされる。エラーは全て `UploadReport` に記録される。
    pub async fn execute<R: AsyncRead + Unpin>(&self, session: &Session, source: R) -> UploadReport {
        let session_id = session.session_id().clone();
        let mut reader = ChunkReader::new(source, self.config.chunk_size, session_id.clone());
        let mut report = UploadReport::new(session_id);
        let mut in_flight = InFlight::default();

        info!(
            "Uploading session {} ({} byte chunks, {} in flight, policy: {})",
            session.session_id(),
            self.config.chunk_size,
            self.config.max_in_flight,
            self.config.failure_policy
        );

        loop {
            let chunk = match reader.next_chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    warn!("{}", e);
                    report.source_error = Some(e);
                    break;
                }
            };
            report.chunks_read += 1;

            if chunk.is_terminal() {
                in_flight.drain(&mut report).await;
                if self.halted(&report) {
                    report.aborted = true;
                    break;
                }
                self.upload_terminal(&chunk, &mut report).await;
                break;
            }

            // 既に終わった送信の結果を先に取り込み、失敗を見逃さない
            in_flight.collect_finished(&mut report);
            while in_flight.len() >= self.config.max_in_flight.get() {
                in_flight.join_one(&mut report).await;
            }
            if self.halted(&report) {
                report.aborted = true;
                break;
            }

            debug!("Dispatching chunk {} ({} bytes)", chunk.index(), chunk.len());
            in_flight.spawn(self.chunk_repository.clone(), chunk);
        }

        in_flight.drain(&mut report).await;
        drop(reader);

        if report.aborted {
            warn!(
                "Session {} aborted after {} failed chunk(s)",
                report.session_id,
                report.failures.len()
            );
        }

        report.finish();
        report
    }

    async fn upload_terminal(&self, chunk: &Chunk, report: &mut UploadReport) {
        debug!("Sending terminal chunk {} ({} bytes)", chunk.index(), chunk.len());
        match self.chunk_repository.upload_chunk(chunk).await {
            Ok(ack) => {
                report.record_success(chunk.index(), chunk.len());
                report.terminal_delivered = true;
                report.video_url = ack.video_url;
            }
            Err(e) => {
                warn!("{}", e);
                report.record_failure(e);
            }
        }
    }

    fn halted(&self, report: &UploadReport) -> bool {
        self.config.failure_policy == FailurePolicy::Abort && !report.failures.is_empty()
    }
}

/// 送信中のチャンク
///
/// タスクIDからチャンクのインデックスとサイズを引けるようにしておき、
/// タスクがパニックした場合でもどのチャンクが失敗したか報告できる。
#[derive(Default)]
struct InFlight {
    tasks: JoinSet<Result<ChunkAck, UploadError>>,
    pending: HashMap<Id, (u64, usize)>,
}

impl InFlight {
    fn len(&self) -> usize {
        self.tasks.len()
    }

    fn spawn<C: ChunkRepository + 'static>(&mut self, repository: Arc<C>, chunk: Chunk) {
        let meta = (chunk.index(), chunk.len());
        let handle = self
            .tasks
            .spawn(async move { repository.upload_chunk(&chunk).await });
        self.pending.insert(handle.id(), meta);
    }

    /// Waits for one upload to resolve. Returns `false` when nothing was in flight.
    async fn join_one(&mut self, report: &mut UploadReport) -> bool {
        match self.tasks.join_next_with_id().await {
            None => false,
            Some(joined) => {
                self.record(joined, report);
                true
            }
        }
    }

    /// Records every upload that already finished, without waiting.
    fn collect_finished(&mut self, report: &mut UploadReport) {
        while let Some(joined) = self.tasks.try_join_next_with_id() {
            self.record(joined, report);
        }
    }

    fn record(
        &mut self,
        joined: Result<(Id, Result<ChunkAck, UploadError>), JoinError>,
        report: &mut UploadReport,
    ) {
        let (id, result) = match joined {
            Ok((id, result)) => (id, result),
            Err(join_err) => {
                let id = join_err.id();
                let index = self.pending.get(&id).map(|(index, _)| *index).unwrap_or(0);
                (
                    id,
                    Err(UploadError::new(
                        index,
                        0,
                        TransportError::TaskFailed(join_err.to_string()),
                    )),
                )
            }
        };

        let Some((index, size)) = self.pending.remove(&id) else {
            warn!("Completed upload task {} was not tracked", id);
            return;
        };

        match result {
            Ok(ack) => {
                if ack.attempts > 1 {
                    debug!("Chunk {} succeeded after {} attempts", index, ack.attempts);
                }
                report.record_success(index, size);
            }
            Err(e) => {
                warn!("{}", e);
                report.record_failure(e);
            }
        }
    }

    async fn drain(&mut self, report: &mut UploadReport) {
        while self.join_one(report).await {}
    }
}
