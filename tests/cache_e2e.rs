//! Stale-while-revalidate behavior of the card database cache

use fateseal_rs::{
    core::CardData,
    loader::{
        source::{CARDS_FILE, VERSION_FILE},
        CardDataSource, CardStore, DatabaseCache, DiskStore, DownloadProgress, FileSource,
    },
    logger::Logger,
    FatesealError, Result,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const FIXTURE_VERSION: &str = "2024-06-01T00:00:00Z";

/// Scratch workspace with a source directory seeded from test_data/
struct Workspace {
    root: PathBuf,
}

impl Workspace {
    fn new(name: &str) -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let root = std::env::temp_dir().join(format!(
            "fateseal-cache-{name}-{}-{nanos}",
            std::process::id()
        ));
        let source = root.join("source");
        std::fs::create_dir_all(&source).expect("create source dir");

        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_data");
        for file in [CARDS_FILE, VERSION_FILE] {
            std::fs::copy(fixtures.join(file), source.join(file)).expect("copy fixture");
        }
        Workspace { root }
    }

    fn source_dir(&self) -> PathBuf {
        self.root.join("source")
    }

    fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    fn cache(&self, logger: &Arc<Logger>) -> DatabaseCache<FileSource, DiskStore> {
        DatabaseCache::new(
            FileSource::new(self.source_dir()),
            DiskStore::new(self.cache_dir()),
            Arc::clone(logger),
        )
    }

    /// Publish a new remote version with one extra card
    fn bump_version(&self, version: &str) {
        let source = self.source_dir();
        let text = std::fs::read_to_string(source.join(CARDS_FILE)).expect("read cards");
        let mut data: serde_json::Value = serde_json::from_str(&text).expect("parse cards");
        data["Mountain"] = serde_json::json!({
            "name": "Mountain",
            "prints": [{
                "id": "mtn-lea-295",
                "set": "lea",
                "collectorNumber": "295",
                "images": { "front": "https://cards.example/mtn-lea-295.jpg" }
            }]
        });
        std::fs::write(source.join(CARDS_FILE), data.to_string()).expect("write cards");
        write_version(&source, version);
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

fn write_version(dir: &Path, version: &str) {
    let json = serde_json::json!({ "lastUpdated": version });
    std::fs::write(dir.join(VERSION_FILE), json.to_string()).expect("write version");
}

#[tokio::test]
async fn test_first_load_downloads_and_stores() -> Result<()> {
    let ws = Workspace::new("first-load");
    let logger = Arc::new(Logger::capturing());
    let cache = ws.cache(&logger);
    assert!(cache.snapshot().is_none());
    assert!(cache.status().loading);

    let update_check = cache.initialize().await?;
    assert!(update_check.is_none(), "nothing cached: no background check");

    let loaded = cache.snapshot().expect("database published");
    assert_eq!(loaded.db.len(), 8);
    assert_eq!(loaded.version.as_deref(), Some(FIXTURE_VERSION));
    assert_eq!(loaded.index.len(), 8);

    let status = cache.status();
    assert!(!status.loading);
    assert!(!status.is_first_load);
    assert_eq!(status.progress, 100.0);
    assert_eq!(status.error, None);

    let meta = DiskStore::new(ws.cache_dir()).meta().await?.expect("meta stored");
    assert_eq!(meta.version, FIXTURE_VERSION);
    assert_eq!(meta.card_count, 8);
    assert!(meta.last_checked > 0);
    Ok(())
}

#[tokio::test]
async fn test_cached_snapshot_served_then_checked() -> Result<()> {
    let ws = Workspace::new("warm");
    let logger = Arc::new(Logger::capturing());
    ws.cache(&logger).initialize().await?;

    // Second run: served from cache, background check finds nothing new
    let cache = ws.cache(&logger);
    let update_check = cache.initialize().await?.expect("background check spawned");
    assert_eq!(cache.snapshot().map(|l| l.db.len()), Some(8));
    assert!(!update_check.await.map_err(FatesealError::from)?);
    assert!(logger.contains("Loaded 8 cards from cache"));
    Ok(())
}

#[tokio::test]
async fn test_new_version_swaps_snapshot() -> Result<()> {
    let ws = Workspace::new("update");
    let logger = Arc::new(Logger::capturing());
    ws.cache(&logger).initialize().await?;
    ws.bump_version("2024-07-01T00:00:00Z");

    let cache = ws.cache(&logger);
    let update_check = cache.initialize().await?.expect("background check spawned");
    let stale = cache.snapshot().expect("stale snapshot served");
    assert_eq!(stale.db.len(), 8);

    assert!(update_check.await.map_err(FatesealError::from)?);

    let fresh = cache.snapshot().expect("fresh snapshot");
    assert_eq!(fresh.db.len(), 9);
    assert!(fresh.db.contains("Mountain"));
    assert_eq!(fresh.version.as_deref(), Some("2024-07-01T00:00:00Z"));
    // Readers holding the old snapshot are unaffected
    assert_eq!(stale.db.len(), 8);

    let stored = DiskStore::new(ws.cache_dir());
    assert_eq!(
        stored.stored_version().await?.as_deref(),
        Some("2024-07-01T00:00:00Z")
    );
    Ok(())
}

/// Source whose freshness check always fails
struct UnreachableSource;

impl CardDataSource for UnreachableSource {
    async fn fetch_version(&self) -> Result<String> {
        Err(FatesealError::DatabaseUnavailable(
            "connection refused".to_string(),
        ))
    }

    async fn fetch_card_data<F>(&self, _on_progress: F) -> Result<CardData>
    where
        F: FnMut(DownloadProgress) + Send,
    {
        Err(FatesealError::DatabaseUnavailable(
            "connection refused".to_string(),
        ))
    }
}

#[tokio::test]
async fn test_failed_refresh_keeps_stale_snapshot() -> Result<()> {
    let ws = Workspace::new("offline");
    let logger = Arc::new(Logger::capturing());
    ws.cache(&logger).initialize().await?;

    let cache = DatabaseCache::new(
        UnreachableSource,
        DiskStore::new(ws.cache_dir()),
        Arc::clone(&logger),
    );
    let update_check = cache.initialize().await?.expect("background check spawned");
    assert!(!update_check.await.map_err(FatesealError::from)?);

    assert_eq!(cache.snapshot().map(|l| l.db.len()), Some(8));
    assert!(logger.contains("Failed to check for updates"));
    assert_eq!(cache.status().error, None);
    Ok(())
}

#[tokio::test]
async fn test_first_load_failure_is_reported() {
    let logger = Arc::new(Logger::capturing());
    let ws = Workspace::new("no-source");
    let cache = DatabaseCache::new(
        UnreachableSource,
        DiskStore::new(ws.cache_dir()),
        Arc::clone(&logger),
    );

    let result = cache.initialize().await;
    assert!(matches!(result, Err(FatesealError::DatabaseUnavailable(_))));
    assert!(cache.snapshot().is_none());

    let status = cache.status();
    assert!(!status.loading);
    assert!(status.error.is_some());
    assert!(logger.contains("Failed to download card data"));
}

/// File source that takes a while to answer the freshness check
struct SlowSource(FileSource);

impl CardDataSource for SlowSource {
    async fn fetch_version(&self) -> Result<String> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.0.fetch_version().await
    }

    async fn fetch_card_data<F>(&self, on_progress: F) -> Result<CardData>
    where
        F: FnMut(DownloadProgress) + Send,
    {
        self.0.fetch_card_data(on_progress).await
    }
}

#[tokio::test]
async fn test_overlapping_checks_are_skipped() -> Result<()> {
    let ws = Workspace::new("overlap");
    let logger = Arc::new(Logger::capturing());
    let cache = DatabaseCache::new(
        SlowSource(FileSource::new(ws.source_dir())),
        DiskStore::new(ws.cache_dir()),
        Arc::clone(&logger),
    );

    let (first, second) = tokio::join!(
        cache.check_for_updates(None),
        cache.check_for_updates(None)
    );
    assert!(first);
    assert!(!second);

    // Guard is released once the check finishes
    assert!(!cache.check_for_updates(Some(FIXTURE_VERSION.to_string())).await);
    assert!(logger.contains("up to date"));
    Ok(())
}

#[tokio::test]
async fn test_progress_and_clear() -> Result<()> {
    let ws = Workspace::new("progress");
    let source = FileSource::new(ws.source_dir());

    let mut reports = Vec::new();
    let data = source
        .fetch_card_data(|progress| reports.push(progress.percent()))
        .await?;
    assert_eq!(data.len(), 8);
    assert!(!reports.is_empty());
    assert!(reports.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(reports.last().copied(), Some(100.0));

    let logger = Arc::new(Logger::capturing());
    let cache = ws.cache(&logger);
    cache.initialize().await?;
    cache.clear().await?;

    let store = DiskStore::new(ws.cache_dir());
    assert!(store.load_cards().await?.is_none());
    assert!(store.meta().await?.is_none());
    // The published database stays usable
    assert!(cache.snapshot().is_some());
    Ok(())
}
