//! # Chunk Value Object
//!
//! ソースストリームの1ウィンドウを表すバリューオブジェクト

use super::session::SessionId;

/// アップロード単位のチャンク
///
/// インデックスは1から始まり、セッション内で1ずつ増加する。
/// 終端チャンクはセッション内に1つだけ存在し、最大のインデックスを持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    session_id: SessionId,
    index: u64,
    payload: Vec<u8>,
    is_terminal: bool,
}

impl Chunk {
    pub fn new(session_id: SessionId, index: u64, payload: Vec<u8>, is_terminal: bool) -> Self {
        Self {
            session_id,
            index,
            payload,
            is_terminal,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }
}

/// ソース長からチャンク数を計算します。
///
/// 空のソースは空の終端チャンク1つとして送信されるため `1` を返します。
///
/// # 例
///
/// ```
/// use blobsync::domain::entities::chunk::expected_chunk_count;
///
/// assert_eq!(expected_chunk_count(0, 1024), 1);
/// assert_eq!(expected_chunk_count(1024, 1024), 1);
/// assert_eq!(expected_chunk_count(2560, 1024), 3);
/// ```
pub fn expected_chunk_count(source_len: u64, chunk_size: usize) -> u64 {
    if source_len == 0 {
        return 1;
    }
    source_len.div_ceil(chunk_size.max(1) as u64)
}
