pub mod screener;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use screener::ScreenerClient;

/// Raw pages for one company, as fetched. Parsing happens later, off the
/// async path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyPages {
    pub url: String,
    pub company_html: String,
    pub investors_html: Option<String>,
}

#[async_trait::async_trait]
pub trait CompanyPageSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// `Ok(None)` when the source has no company matching `company_name`.
    async fn fetch_company_pages(&self, company_name: &str) -> Result<Option<CompanyPages>>;
}
