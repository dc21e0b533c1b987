//! File Byte Source
//!
//! アップロード対象ファイルを非同期バイトソースとして開く

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::debug;
use tokio::fs::File;

/// 開いた動画ファイル
///
/// `into_reader` で所有権ごとアップローダーに渡す
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    file: File,
    len: u64,
}

impl FileSource {
    pub async fn open(path: &Path) -> Result<Self> {
        let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());

        let file = File::open(&expanded)
            .await
            .with_context(|| format!("Failed to open video file: {}", expanded.display()))?;
        let metadata = file
            .metadata()
            .await
            .with_context(|| format!("Failed to stat video file: {}", expanded.display()))?;

        if !metadata.is_file() {
            bail!("Not a regular file: {}", expanded.display());
        }

        debug!("Opened {} ({} bytes)", expanded.display(), metadata.len());

        Ok(Self {
            path: expanded,
            file,
            len: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn into_reader(self) -> File {
        self.file
    }
}
