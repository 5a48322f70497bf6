use crate::config::Settings;
use crate::error::ServiceError;
use crate::ingest::{CompanyPageSource, CompanyPages};
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;

const PROVIDER_NAME: &str = "screener";
const SEARCH_PATH: &str = "/api/company/search/";
const INVESTORS_SUFFIX: &str = "investors/";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug)]
pub struct ScreenerClient {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
    min_interval: Duration,

    // Time of the last outgoing request, shared by every call on this client.
    last_request: tokio::sync::Mutex<Option<Instant>>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchHit {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: Option<String>,
}

impl ScreenerClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build screener http client")?;

        Ok(Self {
            http,
            base_url: settings.screener_base_url.trim_end_matches('/').to_string(),
            retries: settings.max_retries.max(1),
            min_interval: settings.rate_limit_delay,
            last_request: tokio::sync::Mutex::new(None),
        })
    }

    /// Resolve a company name to its page URL through the search endpoint.
    pub async fn search(&self, company_name: &str) -> Result<Option<String>> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        let text = self
            .get_with_retry(&url, &[("q", company_name)])
            .await
            .with_context(|| format!("company search failed for {company_name}"))?;
        let path = parse_search_results(&text)?;
        Ok(path.map(|p| self.absolute(&p)))
    }

    fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Wait until at least `min_interval` has passed since the previous request.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get_once(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        self.pace().await;

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("screener request failed: {url}"))?;

        let status = res.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ServiceError::RateLimited {
                provider: PROVIDER_NAME.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            return Err(ServiceError::Scraping {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        res.text()
            .await
            .with_context(|| format!("failed to read screener response: {url}"))
    }

    async fn get_with_retry(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.get_once(url, query).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    if attempt >= self.retries || !is_retryable(&err) {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, url, error = %err, "screener fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl CompanyPageSource for ScreenerClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch_company_pages(&self, company_name: &str) -> Result<Option<CompanyPages>> {
        let Some(url) = self.search(company_name).await? else {
            tracing::info!(company = company_name, "no search match");
            return Ok(None);
        };
        tracing::info!(company = company_name, %url, "found company page");

        let company_html = self
            .get_with_retry(&url, &[])
            .await
            .with_context(|| format!("failed to fetch company page for {company_name}"))?;

        let investors_url = investors_url(&url);
        let investors_html = match self.get_with_retry(&investors_url, &[]).await {
            Ok(html) => Some(html),
            Err(err) => {
                tracing::warn!(
                    company = company_name,
                    url = %investors_url,
                    error = %err,
                    "investors page unavailable; using the main page for shareholding"
                );
                None
            }
        };

        Ok(Some(CompanyPages {
            url,
            company_html,
            investors_html,
        }))
    }
}

/// Transport failures have no typed status and are retried.
fn is_retryable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ServiceError>()
        .map_or(true, ServiceError::is_retryable)
}

fn investors_url(company_url: &str) -> String {
    format!("{}/{}", company_url.trim_end_matches('/'), INVESTORS_SUFFIX)
}

/// First search hit with a usable URL.
fn parse_search_results(text: &str) -> Result<Option<String>> {
    let hits: Vec<SearchHit> =
        serde_json::from_str(text).context("search response is not a JSON array of hits")?;
    let found = hits.into_iter().find_map(|hit| {
        let url = hit.url?.trim().to_string();
        if url.is_empty() {
            return None;
        }
        tracing::debug!(name = %hit.name, %url, "search hit");
        Some(url)
    });
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serve one response per connection from `respond(path)` and count requests.
    async fn spawn_site(respond: fn(&str) -> (&'static str, String)) -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = vec![0u8; 8192];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let (status_line, body) = respond(&path);
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        (format!("http://{addr}"), hits)
    }

    fn local_client(base_url: &str, retries: u32) -> ScreenerClient {
        let settings = Settings {
            screener_base_url: base_url.to_string(),
            max_retries: retries,
            rate_limit_delay: Duration::ZERO,
            ..Settings::default()
        };
        ScreenerClient::from_settings(&settings).unwrap()
    }

    fn client() -> ScreenerClient {
        let settings = Settings {
            screener_base_url: "https://screener.test/".to_string(),
            rate_limit_delay: Duration::ZERO,
            ..Settings::default()
        };
        ScreenerClient::from_settings(&settings).unwrap()
    }

    #[test]
    fn first_hit_with_url_wins() {
        let text = r#"[
            {"name": "Search everywhere: infy", "url": ""},
            {"id": 1, "name": "Infosys Ltd", "url": "/company/INFY/consolidated/"},
            {"name": "Infosys BPO", "url": "/company/INFYBPO/"}
        ]"#;
        assert_eq!(
            parse_search_results(text).unwrap().as_deref(),
            Some("/company/INFY/consolidated/")
        );
    }

    #[test]
    fn empty_search_is_not_found() {
        assert_eq!(parse_search_results("[]").unwrap(), None);
        assert_eq!(parse_search_results(r#"[{"name": "x"}]"#).unwrap(), None);
    }

    #[test]
    fn malformed_search_response_is_an_error() {
        assert!(parse_search_results("<html>").is_err());
        assert!(parse_search_results(r#"{"url": "/company/X/"}"#).is_err());
    }

    #[test]
    fn relative_paths_join_base_url() {
        let c = client();
        assert_eq!(
            c.absolute("/company/INFY/"),
            "https://screener.test/company/INFY/"
        );
        assert_eq!(c.absolute("company/INFY/"), "https://screener.test/company/INFY/");
        assert_eq!(
            c.absolute("https://other.test/company/INFY/"),
            "https://other.test/company/INFY/"
        );
    }

    #[test]
    fn investors_page_is_a_sub_path() {
        assert_eq!(
            investors_url("https://screener.test/company/INFY/consolidated/"),
            "https://screener.test/company/INFY/consolidated/investors/"
        );
        assert_eq!(
            investors_url("https://screener.test/company/INFY"),
            "https://screener.test/company/INFY/investors/"
        );
    }

    #[tokio::test]
    async fn pace_spaces_out_requests() {
        let settings = Settings {
            rate_limit_delay: Duration::from_millis(50),
            ..Settings::default()
        };
        let c = ScreenerClient::from_settings(&settings).unwrap();
        let start = Instant::now();
        c.pace().await;
        c.pace().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let (base, hits) = spawn_site(|_| ("404 Not Found", String::new())).await;
        let c = local_client(&base, 3);
        let start = Instant::now();

        let err = c
            .get_with_retry(&format!("{base}/company/X/investors/"), &[])
            .await
            .unwrap_err();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_millis(900));
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::Scraping { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_attempts_run_out() {
        let (base, hits) = spawn_site(|_| ("503 Service Unavailable", String::new())).await;
        let c = local_client(&base, 2);

        let err = c
            .get_with_retry(&format!("{base}/company/X/"), &[])
            .await
            .unwrap_err();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::Scraping { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn missing_investors_page_costs_one_request() {
        let (base, hits) = spawn_site(|path| {
            if path.starts_with(SEARCH_PATH) {
                ("200 OK", r#"[{"name": "Acme Ltd", "url": "/company/ACME/"}]"#.to_string())
            } else if path == "/company/ACME/" {
                ("200 OK", "<html><h1>Acme Ltd</h1></html>".to_string())
            } else {
                ("404 Not Found", String::new())
            }
        })
        .await;
        let c = local_client(&base, 3);

        let pages = c.fetch_company_pages("Acme").await.unwrap().unwrap();

        assert_eq!(pages.url, format!("{base}/company/ACME/"));
        assert!(pages.company_html.contains("Acme Ltd"));
        assert!(pages.investors_html.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
