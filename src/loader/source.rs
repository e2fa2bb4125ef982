//! Where the card database comes from and where it is kept
//!
//! `CardDataSource` is the remote side: a freshness marker plus the full
//! database payload, fetched with byte-level progress. `CardStore` is the
//! local last-known-good snapshot. Both ship with file-system
//! implementations; anything that can "fetch bytes, report progress"
//! can stand in for the source.

use crate::core::CardData;
use crate::{FatesealError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncReadExt;

/// File name of the database payload
pub const CARDS_FILE: &str = "cards.json";
/// File name of the freshness marker
pub const VERSION_FILE: &str = "last-updated.json";
/// File name of the stored snapshot metadata
pub const META_FILE: &str = "meta.json";

const READ_CHUNK: usize = 64 * 1024;

/// Bytes received so far out of the advertised total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub received: u64,
    pub total: u64,
}

impl DownloadProgress {
    /// Percentage in 0..=100
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.received as f64 / self.total as f64 * 100.0).min(100.0)
    }
}

/// Freshness marker document: `{"lastUpdated": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub last_updated: String,
}

/// Metadata stored next to a cached snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMeta {
    pub version: String,
    /// Milliseconds since the Unix epoch
    pub last_checked: u64,
    pub card_count: usize,
}

/// Remote origin of the card database
pub trait CardDataSource: Send + Sync + 'static {
    /// Current version string of the published database
    fn fetch_version(&self) -> impl Future<Output = Result<String>> + Send;

    /// Download the full database; `on_progress` is called only when the
    /// total size is known
    fn fetch_card_data<F>(&self, on_progress: F) -> impl Future<Output = Result<CardData>> + Send
    where
        F: FnMut(DownloadProgress) + Send;
}

/// Local persistent snapshot of the card database
pub trait CardStore: Send + Sync + 'static {
    fn load_cards(&self) -> impl Future<Output = Result<Option<CardData>>> + Send;

    fn stored_version(&self) -> impl Future<Output = Result<Option<String>>> + Send;

    fn store(&self, data: &CardData, version: &str) -> impl Future<Output = Result<()>> + Send;

    fn clear(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Source reading `cards.json` and `last-updated.json` from a directory
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CardDataSource for FileSource {
    async fn fetch_version(&self) -> Result<String> {
        let path = self.root.join(VERSION_FILE);
        let contents = tokio::fs::read_to_string(&path).await?;
        let info: VersionInfo = serde_json::from_str(&contents)?;
        Ok(info.last_updated)
    }

    async fn fetch_card_data<F>(&self, mut on_progress: F) -> Result<CardData>
    where
        F: FnMut(DownloadProgress) + Send,
    {
        let path = self.root.join(CARDS_FILE);
        let mut file = tokio::fs::File::open(&path).await?;
        let total = file.metadata().await?.len();

        let mut bytes = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let n = file.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..n]);
            if total > 0 {
                on_progress(DownloadProgress {
                    received: bytes.len() as u64,
                    total,
                });
            }
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Store keeping `cards.json` and `meta.json` in a cache directory
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DiskStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the snapshot metadata, if any
    pub async fn meta(&self) -> Result<Option<CacheMeta>> {
        match read_optional(&self.dir.join(META_FILE)).await? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    /// Write through a temporary file so readers never see a partial file
    async fn write_replace(&self, name: &str, contents: Vec<u8>) -> Result<()> {
        let target = self.dir.join(name);
        let temp = self.dir.join(format!("{name}.tmp"));
        tokio::fs::write(&temp, contents).await?;
        tokio::fs::rename(&temp, &target).await?;
        Ok(())
    }
}

impl CardStore for DiskStore {
    async fn load_cards(&self) -> Result<Option<CardData>> {
        match read_optional(&self.dir.join(CARDS_FILE)).await? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    async fn stored_version(&self) -> Result<Option<String>> {
        Ok(self.meta().await?.map(|meta| meta.version))
    }

    async fn store(&self, data: &CardData, version: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let meta = CacheMeta {
            version: version.to_string(),
            last_checked: now_millis(),
            card_count: data.len(),
        };
        self.write_replace(CARDS_FILE, serde_json::to_vec(data)?)
            .await?;
        self.write_replace(META_FILE, serde_json::to_vec_pretty(&meta)?)
            .await
    }

    async fn clear(&self) -> Result<()> {
        for name in [CARDS_FILE, META_FILE] {
            match tokio::fs::remove_file(self.dir.join(name)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(FatesealError::IoError(e)),
            }
        }
        Ok(())
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FatesealError::IoError(e)),
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        let p = DownloadProgress {
            received: 50,
            total: 200,
        };
        assert_eq!(p.percent(), 25.0);

        let unknown = DownloadProgress {
            received: 50,
            total: 0,
        };
        assert_eq!(unknown.percent(), 0.0);
    }

    #[test]
    fn test_version_info_field_name() {
        let info: VersionInfo =
            serde_json::from_str(r#"{"lastUpdated": "2026-10-01T00:00:00Z"}"#).unwrap();
        assert_eq!(info.last_updated, "2026-10-01T00:00:00Z");
    }

    #[test]
    fn test_cache_meta_field_names() {
        let meta = CacheMeta {
            version: "v1".to_string(),
            last_checked: 5,
            card_count: 2,
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"version":"v1","lastChecked":5,"cardCount":2}"#);
    }
}
