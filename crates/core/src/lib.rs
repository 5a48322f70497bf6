pub mod analysis;
pub mod cache;
pub mod domain;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod util;

pub use analysis::engine::{analyze, analyze_value, Analyzer, AnalyzerOptions};
pub use domain::recommendation::{Recommendation, ScoreBreakdown, StockRecommendation};
pub use domain::snapshot::{FinancialSnapshot, PeriodResult};
pub use extract::document::extract;

pub mod config {
    use std::time::Duration;

    const DEFAULT_HOST: &str = "127.0.0.1";
    const DEFAULT_PORT: u16 = 8000;
    const DEFAULT_BASE_URL: &str = "https://www.screener.in";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub host: String,
        pub port: u16,
        pub screener_base_url: String,
        pub request_timeout: Duration,
        pub max_retries: u32,
        pub rate_limit_delay: Duration,
        pub cache_ttl: Duration,
        pub max_cache_size: usize,
        pub min_quarters_for_analysis: usize,
        pub allowed_origins: Vec<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                screener_base_url: DEFAULT_BASE_URL.to_string(),
                request_timeout: Duration::from_secs(30),
                max_retries: 3,
                rate_limit_delay: Duration::from_millis(1000),
                cache_ttl: Duration::from_secs(3600),
                max_cache_size: 1000,
                min_quarters_for_analysis: 4,
                allowed_origins: vec!["*".to_string()],
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let mut out = Self::default();

            if let Ok(s) = std::env::var("HOST") {
                if !s.trim().is_empty() {
                    out.host = s.trim().to_string();
                }
            }
            if let Some(port) = env_parse::<u16>("PORT") {
                out.port = port;
            }
            if let Ok(s) = std::env::var("SCREENER_BASE_URL") {
                if !s.trim().is_empty() {
                    out.screener_base_url = s.trim().trim_end_matches('/').to_string();
                }
            }
            if let Some(secs) = env_parse::<u64>("REQUEST_TIMEOUT_SECS") {
                out.request_timeout = Duration::from_secs(secs);
            }
            if let Some(n) = env_parse::<u32>("MAX_RETRIES") {
                out.max_retries = n;
            }
            if let Some(ms) = env_parse::<u64>("RATE_LIMIT_DELAY_MS") {
                out.rate_limit_delay = Duration::from_millis(ms);
            }
            if let Some(secs) = env_parse::<u64>("CACHE_TTL_SECS") {
                out.cache_ttl = Duration::from_secs(secs);
            }
            if let Some(n) = env_parse::<usize>("MAX_CACHE_SIZE") {
                out.max_cache_size = n;
            }
            if let Some(n) = env_parse::<usize>("MIN_QUARTERS_FOR_ANALYSIS") {
                out.min_quarters_for_analysis = n;
            }
            if let Ok(s) = std::env::var("ALLOWED_ORIGINS") {
                let origins = parse_origins(&s);
                if !origins.is_empty() {
                    out.allowed_origins = origins;
                }
            }
            out.sentry_dsn = std::env::var("SENTRY_DSN")
                .ok()
                .filter(|s| !s.trim().is_empty());

            anyhow::ensure!(out.max_retries >= 1, "MAX_RETRIES must be >= 1");
            anyhow::ensure!(out.max_cache_size >= 1, "MAX_CACHE_SIZE must be >= 1");

            Ok(out)
        }

        pub fn allows_any_origin(&self) -> bool {
            self.allowed_origins.iter().any(|o| o == "*")
        }
    }

    fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
    }

    fn parse_origins(s: &str) -> Vec<String> {
        s.split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }

}
