use crate::cache::{CacheStats, RecommendationCache};
use crate::domain::recommendation::StockRecommendation;

/// Cache that stores nothing. Every lookup is a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait::async_trait]
impl RecommendationCache for NoopCache {
    async fn get(&self, _key: &str) -> Option<StockRecommendation> {
        None
    }

    async fn put(&self, _key: &str, _recommendation: StockRecommendation) {}

    async fn clear(&self) {}

    async fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}
