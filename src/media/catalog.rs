//! Snapshot of eligible media, refreshed on the blocking pool.
//!
//! Directory walks and metadata probes never run on an async worker or under
//! the session lock; rounds pick from the last snapshot in memory.

use std::{
    sync::{
        Arc, Mutex, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::media::{MediaItem, MediaResolver};

/// How long a snapshot is served before a background rescan is started.
pub const CATALOG_MAX_AGE: Duration = Duration::from_secs(10);

/// Cached view over a [`MediaResolver`].
pub struct MediaCatalog {
    resolver: Arc<dyn MediaResolver>,
    items: RwLock<Arc<[MediaItem]>>,
    refreshed_at: Mutex<Option<Instant>>,
    refreshing: AtomicBool,
    max_age: Duration,
}

impl MediaCatalog {
    /// Empty catalog; the first [`MediaCatalog::ensure_loaded`] fills it.
    pub fn new(resolver: Arc<dyn MediaResolver>) -> Self {
        Self::with_max_age(resolver, CATALOG_MAX_AGE)
    }

    /// Catalog rescanned once a snapshot is older than `max_age`.
    pub fn with_max_age(resolver: Arc<dyn MediaResolver>, max_age: Duration) -> Self {
        Self {
            resolver,
            items: RwLock::new(Arc::from(Vec::new())),
            refreshed_at: Mutex::new(None),
            refreshing: AtomicBool::new(false),
            max_age,
        }
    }

    /// Resolver behind the catalog.
    pub fn resolver(&self) -> &Arc<dyn MediaResolver> {
        &self.resolver
    }

    /// Latest snapshot.
    pub fn items(&self) -> Arc<[MediaItem]> {
        Arc::clone(&self.items.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Whether a scan has completed at least once.
    pub fn is_loaded(&self) -> bool {
        self.last_refresh().is_some()
    }

    /// Rescan on the blocking pool and publish the result. Returns the item count.
    ///
    /// A failed scan keeps the previous snapshot.
    pub async fn refresh(&self) -> usize {
        let resolver = Arc::clone(&self.resolver);
        let count = match tokio::task::spawn_blocking(move || resolver.eligible()).await {
            Ok(items) => {
                let count = items.len();
                *self.items.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(items);
                debug!(count, "media catalog refreshed");
                count
            }
            Err(err) => {
                warn!(error = %err, "media scan failed; keeping previous catalog");
                self.items().len()
            }
        };
        *self
            .refreshed_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        count
    }

    /// Wait for the first scan if none has completed yet.
    pub async fn ensure_loaded(&self) {
        if !self.is_loaded() {
            self.refresh().await;
        }
    }

    /// Start a background rescan when the snapshot is stale. Never waits for it.
    pub fn refresh_if_stale(self: &Arc<Self>) {
        let stale = self
            .last_refresh()
            .is_none_or(|at| at.elapsed() >= self.max_age);
        if !stale
            || self
                .refreshing
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            return;
        }

        let catalog = Arc::clone(self);
        tokio::spawn(async move {
            catalog.refresh().await;
            catalog.refreshing.store(false, Ordering::Release);
        });
    }

    fn last_refresh(&self) -> Option<Instant> {
        *self
            .refreshed_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
