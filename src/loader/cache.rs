//! Stale-while-revalidate card database cache
//!
//! 1. `initialize` serves the stored snapshot immediately when one exists
//!    and spawns a background version check; otherwise it downloads the
//!    database (reporting progress) and stores it.
//! 2. A background check that finds a new version downloads it, stores it,
//!    and swaps in the new database + search index as one `Arc`. Readers
//!    holding the old snapshot keep using it until they ask again.
//! 3. Background failures are logged and ignored; the stale snapshot keeps
//!    serving.

use crate::core::CardData;
use crate::loader::database::CardDatabase;
use crate::loader::source::{CardDataSource, CardStore};
use crate::logger::Logger;
use crate::resolve::fuzzy::{FuzzyIndex, NameMatcher};
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;

const LOG_CATEGORY: &str = "cache";

/// A database together with the name index built from it
#[derive(Debug)]
pub struct LoadedDatabase {
    pub db: CardDatabase,
    pub index: FuzzyIndex,
    pub version: Option<String>,
}

impl LoadedDatabase {
    pub fn new(data: CardData, version: Option<String>) -> Result<Self> {
        Ok(Self::from_database(CardDatabase::from_card_data(data)?, version))
    }

    pub fn from_database(db: CardDatabase, version: Option<String>) -> Self {
        let index = FuzzyIndex::index(db.names());
        LoadedDatabase { db, index, version }
    }
}

/// Loading state as shown to a user
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatus {
    pub loading: bool,
    /// 0..=100
    pub progress: f64,
    pub error: Option<String>,
    /// True while a first-time download (nothing cached) is running
    pub is_first_load: bool,
}

impl Default for CacheStatus {
    fn default() -> Self {
        CacheStatus {
            loading: true,
            progress: 0.0,
            error: None,
            is_first_load: false,
        }
    }
}

/// Card database cache over a remote source and a local store
pub struct DatabaseCache<S, C> {
    source: Arc<S>,
    store: Arc<C>,
    logger: Arc<Logger>,
    current: Arc<RwLock<Option<Arc<LoadedDatabase>>>>,
    status: Arc<Mutex<CacheStatus>>,
    checking_updates: Arc<AtomicBool>,
}

impl<S: CardDataSource, C: CardStore> DatabaseCache<S, C> {
    pub fn new(source: S, store: C, logger: Arc<Logger>) -> Self {
        DatabaseCache {
            source: Arc::new(source),
            store: Arc::new(store),
            logger,
            current: Arc::new(RwLock::new(None)),
            status: Arc::new(Mutex::new(CacheStatus::default())),
            checking_updates: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a clone of the cache handle (shares all state)
    pub fn clone_handle(&self) -> Self {
        DatabaseCache {
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            logger: Arc::clone(&self.logger),
            current: Arc::clone(&self.current),
            status: Arc::clone(&self.status),
            checking_updates: Arc::clone(&self.checking_updates),
        }
    }

    /// Current database, if any has been loaded
    pub fn snapshot(&self) -> Option<Arc<LoadedDatabase>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn status(&self) -> CacheStatus {
        lock(&self.status).clone()
    }

    /// Serve the cached snapshot or download a fresh one
    ///
    /// Returns the handle of the background update check when the cached
    /// snapshot was served.
    pub async fn initialize(&self) -> Result<Option<JoinHandle<bool>>> {
        match self.store.load_cards().await {
            Ok(Some(data)) => {
                let version = match self.store.stored_version().await {
                    Ok(version) => version,
                    Err(e) => {
                        self.logger
                            .minimal(LOG_CATEGORY, &format!("Failed to read stored version: {e}"));
                        None
                    }
                };

                match LoadedDatabase::new(data, version.clone()) {
                    Ok(loaded) => {
                        self.logger.normal(
                            LOG_CATEGORY,
                            &format!("Loaded {} cards from cache", loaded.db.len()),
                        );
                        self.publish(loaded);
                        self.update_status(|s| {
                            s.loading = false;
                            s.progress = 100.0;
                            s.error = None;
                            s.is_first_load = false;
                        });

                        let handle = self.clone_handle();
                        return Ok(Some(tokio::spawn(async move {
                            handle.check_for_updates(version).await
                        })));
                    }
                    Err(e) => self.logger.minimal(
                        LOG_CATEGORY,
                        &format!("Cached card database is unusable: {e}"),
                    ),
                }
            }
            Ok(None) => self
                .logger
                .verbose(LOG_CATEGORY, "No cached card database, downloading"),
            Err(e) => self.logger.minimal(
                LOG_CATEGORY,
                &format!("Failed to read cached card database: {e}"),
            ),
        }

        self.download_and_store().await?;
        Ok(None)
    }

    /// Download, store and publish the database, reporting progress
    pub async fn download_and_store(&self) -> Result<()> {
        self.update_status(|s| {
            s.is_first_load = true;
            s.loading = true;
            s.progress = 0.0;
        });

        match self.download().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.logger.minimal(
                    LOG_CATEGORY,
                    &format!("Failed to download card data: {e}"),
                );
                self.update_status(|s| {
                    s.error = Some(e.to_string());
                    s.loading = false;
                    s.is_first_load = false;
                });
                Err(e)
            }
        }
    }

    /// Force a full re-download
    ///
    /// Must not be called while another download is in flight.
    pub async fn refresh(&self) -> Result<()> {
        self.update_status(|s| s.loading = true);
        self.download_and_store().await
    }

    /// Drop the stored snapshot (the in-memory database stays published)
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }

    /// Compare versions and swap in a newer database when one exists
    ///
    /// Returns whether a new database was published. Failures are logged
    /// and reported as `false`. Overlapping checks are skipped.
    pub async fn check_for_updates(&self, current_version: Option<String>) -> bool {
        if self.checking_updates.swap(true, Ordering::AcqRel) {
            return false;
        }

        let result = self.try_update(current_version.as_deref()).await;
        self.checking_updates.store(false, Ordering::Release);

        match result {
            Ok(updated) => updated,
            Err(e) => {
                self.logger
                    .minimal(LOG_CATEGORY, &format!("Failed to check for updates: {e}"));
                false
            }
        }
    }

    async fn try_update(&self, current_version: Option<&str>) -> Result<bool> {
        let remote_version = self.source.fetch_version().await?;
        if Some(remote_version.as_str()) == current_version {
            self.logger.verbose(
                LOG_CATEGORY,
                &format!("Card database is up to date ({remote_version})"),
            );
            return Ok(false);
        }

        self.logger.normal(
            LOG_CATEGORY,
            &format!(
                "Card database update available: {} -> {remote_version}",
                current_version.unwrap_or("none")
            ),
        );

        let data = self.source.fetch_card_data(|_| {}).await?;
        self.store.store(&data, &remote_version).await?;
        self.publish(LoadedDatabase::new(data, Some(remote_version))?);

        self.logger
            .normal(LOG_CATEGORY, "Card database updated successfully");
        Ok(true)
    }

    async fn download(&self) -> Result<()> {
        let status = Arc::clone(&self.status);
        let data = self
            .source
            .fetch_card_data(move |progress| lock(&status).progress = progress.percent())
            .await?;

        let version = self.source.fetch_version().await?;
        self.store.store(&data, &version).await?;

        let loaded = LoadedDatabase::new(data, Some(version))?;
        self.logger.normal(
            LOG_CATEGORY,
            &format!("Downloaded {} cards", loaded.db.len()),
        );
        self.publish(loaded);
        self.update_status(|s| {
            s.loading = false;
            s.is_first_load = false;
            s.progress = 100.0;
            s.error = None;
        });
        Ok(())
    }

    fn publish(&self, loaded: LoadedDatabase) {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Some(Arc::new(loaded));
    }

    fn update_status(&self, update: impl FnOnce(&mut CacheStatus)) {
        update(&mut lock(&self.status));
    }
}

fn lock(status: &Mutex<CacheStatus>) -> MutexGuard<'_, CacheStatus> {
    status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
