//! Result cache collaborators. The analysis core never touches these; the
//! binaries consult them around `analyze`.

mod memory;
mod noop;

pub use memory::InMemoryCache;
pub use noop::NoopCache;

use serde::{Deserialize, Serialize};

use crate::domain::recommendation::StockRecommendation;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub count: usize,
    /// Cached keys, sorted.
    pub keys: Vec<String>,
}

#[async_trait::async_trait]
pub trait RecommendationCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<StockRecommendation>;

    async fn put(&self, key: &str, recommendation: StockRecommendation);

    async fn clear(&self);

    async fn stats(&self) -> CacheStats;
}
