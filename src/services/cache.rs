use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::models::AnalysisResult;

/// Analysis results are reused for 7 days.
pub const CACHE_TTL_SECS: u64 = 604_800;

/// Derive the cache key from the base64 payload.
///
/// Digest of the full payload; keying on a truncated prefix would collide
/// for distinct images that share encoder headers.
pub fn cache_key(image_base64: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_base64.as_bytes());
    hex::encode(hasher.finalize())
}

/// Key-value store for finished analyses.
///
/// The pipeline holds this as an `Option`, so "no cache configured" is
/// explicit rather than a permanent miss. Implementations may fail; the
/// pipeline treats a failed `get` as a miss and a failed `set` as
/// non-fatal.
#[async_trait::async_trait]
pub trait AnalysisCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<AnalysisResult>>;

    async fn set(&self, key: &str, result: &AnalysisResult, ttl_secs: u64) -> Result<()>;
}

struct CacheEntry {
    result: AnalysisResult,
    expires_at: DateTime<Utc>,
}

/// In-process cache with per-entry absolute expiry.
///
/// Entries expire lazily on read; the [`CacheSweeper`] reclaims the memory
/// of entries nobody asks for again.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait::async_trait]
impl AnalysisCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<AnalysisResult>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(Some(entry.result.clone())),
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, result: &AnalysisResult, ttl_secs: u64) -> Result<()> {
        let expires_at = Utc::now() + Duration::seconds(ttl_secs as i64);
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                result: result.clone(),
                expires_at,
            },
        );
        Ok(())
    }
}

/// Hourly purge of expired in-memory cache entries.
pub struct CacheSweeper {
    scheduler: JobScheduler,
}

impl CacheSweeper {
    pub async fn new(cache: Arc<MemoryCache>) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        let job = Job::new_async("0 0 * * * *", move |_uuid, _l| {
            let cache = cache.clone();

            Box::pin(async move {
                let purged = cache.purge_expired().await;
                if purged > 0 {
                    log::info!("🧹 Purged {} expired cache entries", purged);
                }
            })
        })?;
        scheduler.add(job).await?;

        Ok(Self { scheduler })
    }

    pub async fn start(&mut self) -> Result<()> {
        self.scheduler.start().await?;
        log::info!("✅ Cache sweeper started (hourly)");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        Ok(())
    }
}
