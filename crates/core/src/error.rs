use thiserror::Error;

/// Failures surfaced by the collaborators around the core (fetch layer, API, CLI).
///
/// The extraction and scoring core never returns these; it degrades instead.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("company not found: {0}")]
    CompanyNotFound(String),

    #[error("scraping failed: HTTP {status} for {url}")]
    Scraping { status: u16, url: String },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("rate limited by {provider}")]
    RateLimited { provider: String },
}

impl ServiceError {
    /// Rate limiting and server-side HTTP errors may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Scraping { status, .. } => *status >= 500,
            Self::CompanyNotFound(_) | Self::Validation(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraping(status: u16) -> ServiceError {
        ServiceError::Scraping {
            status,
            url: "https://screener.test/company/X/".to_string(),
        }
    }

    #[test]
    fn only_throttling_and_server_errors_are_retryable() {
        assert!(ServiceError::RateLimited {
            provider: "screener".to_string()
        }
        .is_retryable());
        assert!(scraping(500).is_retryable());
        assert!(scraping(503).is_retryable());
        assert!(!scraping(404).is_retryable());
        assert!(!scraping(403).is_retryable());
        assert!(!ServiceError::CompanyNotFound("X".to_string()).is_retryable());
    }
}
