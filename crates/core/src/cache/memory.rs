use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::cache::{CacheStats, RecommendationCache};
use crate::config::Settings;
use crate::domain::recommendation::StockRecommendation;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: StockRecommendation,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(data: StockRecommendation) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// Process-wide recommendation cache keyed by normalized company name.
///
/// Entries expire after `ttl`. When `max_entries` is reached the oldest entry
/// is evicted to make room.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl InMemoryCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.cache_ttl, settings.max_cache_size)
    }
}

#[async_trait::async_trait]
impl RecommendationCache for InMemoryCache {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Option<StockRecommendation> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_stale(self.ttl) => {
                    debug!("cache hit");
                    return Some(entry.data.clone());
                }
                Some(_) => debug!("cache entry expired"),
                None => {
                    debug!("cache miss");
                    return None;
                }
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_stale(self.ttl)) {
            entries.remove(key);
        }
        None
    }

    #[instrument(skip(self, recommendation))]
    async fn put(&self, key: &str, recommendation: StockRecommendation) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| !e.is_stale(self.ttl));

        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.cached_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!(evicted = %oldest, "cache full; evicting oldest entry");
                entries.remove(&oldest);
            }
        }

        entries.insert(key.to_string(), CacheEntry::new(recommendation));
        debug!(size = entries.len(), "cached recommendation");
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }

    async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(_, e)| !e.is_stale(self.ttl))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        CacheStats {
            count: keys.len(),
            keys,
        }
    }
}
