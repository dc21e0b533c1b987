//! # Chunk Reader
//!
//! バイトストリームを固定サイズのウィンドウに分割し、終端チャンクを検出する

use std::io::ErrorKind;
use std::num::NonZeroUsize;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::domain::entities::chunk::Chunk;
use crate::domain::entities::session::SessionId;
use crate::domain::error::SourceReadError;

/// チャンクリーダー
///
/// 終端の判定は短い読み込みからの推測ではなく、1ウィンドウ先読みして
/// ソースが尽きたかどうかで行う。そのためソース長がチャンクサイズの
/// 倍数でも余分な空チャンクは生成されない。空のソースは空の終端チャンク
/// 1つになる。
///
/// 先読み中に読み込みエラーが起きた場合、読み終えたチャンクは非終端として
/// 返し、エラーは次の `next_chunk` 呼び出しで返す。
///
/// インデックスカウンタはこのリーダーだけが所有する。ソースはリーダーと
/// 一緒にドロップされる。
pub struct ChunkReader<R> {
    source: R,
    chunk_size: NonZeroUsize,
    session_id: SessionId,
    next_index: u64,
    lookahead: Option<Vec<u8>>,
    deferred_error: Option<SourceReadError>,
    finished: bool,
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    pub fn new(source: R, chunk_size: NonZeroUsize, session_id: SessionId) -> Self {
        Self {
            source,
            chunk_size,
            session_id,
            next_index: 1,
            lookahead: None,
            deferred_error: None,
            finished: false,
        }
    }

    /// 次のチャンクを返す。終端チャンクの後は `None`。
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, SourceReadError> {
        if self.finished {
            return Ok(None);
        }
        if let Some(e) = self.deferred_error.take() {
            self.finished = true;
            return Err(e);
        }

        let index = self.next_index;
        let current = match self.lookahead.take() {
            Some(window) => window,
            None => self.fill_window(index).await?,
        };

        // A short window means fill_window already hit end of stream.
        let is_terminal = if current.len() < self.chunk_size.get() {
            true
        } else {
            match self.fill_window(index + 1).await {
                Ok(next) if next.is_empty() => true,
                Ok(next) => {
                    self.lookahead = Some(next);
                    false
                }
                Err(e) => {
                    self.deferred_error = Some(e);
                    false
                }
            }
        };

        self.finished = is_terminal;
        self.next_index += 1;

        Ok(Some(Chunk::new(
            self.session_id.clone(),
            index,
            current,
            is_terminal,
        )))
    }

    /// Reads until the window is full or the source is exhausted.
    async fn fill_window(&mut self, index: u64) -> Result<Vec<u8>, SourceReadError> {
        let size = self.chunk_size.get();
        let mut window = vec![0u8; size];
        let mut filled = 0;

        while filled < size {
            match self.source.read(&mut window[filled..]).await {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => return Err(SourceReadError { index, source }),
            }
        }

        window.truncate(filled);
        Ok(window)
    }
}
