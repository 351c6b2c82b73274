//! Google Scholar search client.
//!
//! [`ScholarClient`] fetches author-search and publication-search pages and
//! yields their results as lazy streams of [`Record`]s. A page is requested
//! only when the consumer has drained the previous one, so stopping early
//! stops the scraping too.

use crate::cookies::CookieManager;
use crate::error::{ScholarError, Result};
use crate::parse;
use crate::record::Record;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default Google Scholar URL
pub const DEFAULT_SCHOLAR_URL: &str = "https://scholar.google.com";

/// User agent string for requests
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Results per publication-search page
const PUBLICATION_PAGE_SIZE: usize = 10;

/// Lazy sequence of upstream records
pub type RecordStream<'a> = BoxStream<'a, Result<Record>>;

/// Anything that can answer author and publication searches.
pub trait ScholarSource {
    /// Authors matching `name`, in Scholar's order
    fn search_authors<'a>(&'a self, name: &'a str) -> RecordStream<'a>;

    /// Publications matching `query`, in Scholar's order
    fn search_publications<'a>(&'a self, query: &'a str) -> RecordStream<'a>;
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ScholarConfig {
    /// Scholar base URL (mirror sites allowed)
    pub base_url: String,
    /// Proxy URL (e.g., "socks5h://127.0.0.1:9050")
    pub proxy: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Bounds of the random pause before each follow-up page
    pub min_page_delay: Duration,
    pub max_page_delay: Duration,
    /// Cookie file override; `None` uses `~/.gscholar_cookies.json`
    pub cookie_file: Option<PathBuf>,
}

impl Default for ScholarConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SCHOLAR_URL.to_string(),
            proxy: None,
            timeout: Duration::from_secs(30),
            min_page_delay: Duration::from_millis(500),
            max_page_delay: Duration::from_millis(2000),
            cookie_file: None,
        }
    }
}

/// Which result page layout a request returns
#[derive(Debug, Clone, Copy)]
enum SearchKind {
    Authors,
    Publications,
}

/// Pagination state threaded through the record stream
struct Pager<'a> {
    kind: SearchKind,
    query: &'a str,
    buffered: VecDeque<Record>,
    next: Option<Url>,
    pages_fetched: usize,
    records_seen: usize,
}

/// One fetched and parsed page
struct Page {
    records: Vec<Record>,
    next: Option<Url>,
}

/// HTTP scraper for Google Scholar
pub struct ScholarClient {
    client: reqwest::Client,
    config: ScholarConfig,
    base_url: String,
    cookie_header: Option<String>,
}

impl ScholarClient {
    /// Build a client; fails on an invalid proxy or base URL
    pub fn new(config: ScholarConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| ScholarError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;

        let client = build_http_client(&config)?;

        let cookies = match &config.cookie_file {
            Some(path) => CookieManager::with_path(path.clone()),
            None => CookieManager::default(),
        };
        let cookie_header = cookies.google_header();
        if cookie_header.is_none() {
            debug!(path = ?cookies.path(), "No Google cookies loaded");
        }

        info!(url = %base_url, proxy = ?config.proxy, "Scholar client ready");

        Ok(Self {
            client,
            config,
            base_url,
            cookie_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn author_search_url(&self, name: &str) -> Result<Url> {
        let mut url = self.join("/citations")?;
        url.query_pairs_mut()
            .append_pair("view_op", "search_authors")
            .append_pair("mauthors", name)
            .append_pair("hl", "en");
        Ok(url)
    }

    fn publication_search_url(&self, query: &str, start: usize) -> Result<Url> {
        let mut url = self.join("/scholar")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("hl", "en")
            .append_pair("as_sdt", "0,33")
            .append_pair("start", &start.to_string());
        Ok(url)
    }

    fn join(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ScholarError::Config(format!("Invalid URL for {}: {}", path, e)))
    }

    fn paginate<'a>(
        &'a self,
        kind: SearchKind,
        query: &'a str,
        first: Result<Url>,
    ) -> RecordStream<'a> {
        let first = match first {
            Ok(url) => url,
            Err(e) => return stream::once(async move { Err::<Record, _>(e) }).boxed(),
        };

        let pager = Pager {
            kind,
            query,
            buffered: VecDeque::new(),
            next: Some(first),
            pages_fetched: 0,
            records_seen: 0,
        };

        stream::try_unfold(pager, move |mut pager| async move {
            loop {
                if let Some(record) = pager.buffered.pop_front() {
                    pager.records_seen += 1;
                    return Ok(Some((record, pager)));
                }

                let Some(url) = pager.next.take() else {
                    debug!(kind = ?pager.kind, records = pager.records_seen, "Search exhausted");
                    return Ok(None);
                };

                if pager.pages_fetched > 0 {
                    self.pause().await;
                }

                let page = self.fetch_page(&pager, &url).await?;
                pager.pages_fetched += 1;
                pager.buffered.extend(page.records);
                pager.next = page.next;
            }
        })
        .boxed()
    }

    async fn fetch_page(&self, pager: &Pager<'_>, url: &Url) -> Result<Page> {
        debug!(kind = ?pager.kind, page = pager.pages_fetched + 1, url = %url, "Fetching page");

        let html = self.fetch_html(url).await?;
        if parse::is_captcha(&html) {
            warn!(page = pager.pages_fetched + 1, "CAPTCHA detected");
            return Err(ScholarError::Captcha);
        }

        let page = match pager.kind {
            SearchKind::Authors => {
                let parsed = parse::parse_author_page(&html, &self.base_url)?;
                let next = parsed.next.map(|path| self.join(&path)).transpose()?;
                Page {
                    records: parsed.records,
                    next,
                }
            }
            SearchKind::Publications => {
                let records = parse::parse_publication_page(
                    &html,
                    &self.base_url,
                    pager.query,
                    pager.records_seen,
                )?;
                let next = if records.is_empty() {
                    None
                } else {
                    let start = pager.pages_fetched * PUBLICATION_PAGE_SIZE + PUBLICATION_PAGE_SIZE;
                    Some(self.publication_search_url(pager.query, start)?)
                };
                Page { records, next }
            }
        };

        info!(kind = ?pager.kind, count = page.records.len(), "Parsed results");
        Ok(page)
    }

    async fn fetch_html(&self, url: &Url) -> Result<String> {
        let mut request = self
            .client
            .get(url.as_str())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9");

        if let Some(cookie) = &self.cookie_header {
            request = request.header("Cookie", cookie);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScholarError::RateLimited(60));
        }

        if !status.is_success() {
            return Err(ScholarError::Api {
                code: i32::from(status.as_u16()),
                message: format!("HTTP error: {}", status),
            });
        }

        Ok(response.text().await?)
    }

    /// Random delay between page fetches
    async fn pause(&self) {
        let min = self.config.min_page_delay.as_millis() as u64;
        let max = self.config.max_page_delay.as_millis() as u64;
        if max == 0 {
            return;
        }
        let delay = min + rand::random::<u64>() % (max.saturating_sub(min) + 1);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

impl ScholarSource for ScholarClient {
    fn search_authors<'a>(&'a self, name: &'a str) -> RecordStream<'a> {
        info!(author = name, "Starting author search");
        self.paginate(SearchKind::Authors, name, self.author_search_url(name))
    }

    fn search_publications<'a>(&'a self, query: &'a str) -> RecordStream<'a> {
        info!(query, "Starting publication search");
        self.paginate(
            SearchKind::Publications,
            query,
            self.publication_search_url(query, 0),
        )
    }
}

/// Build HTTP client with optional proxy
fn build_http_client(config: &ScholarConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .cookie_store(true);

    if let Some(proxy_url) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            ScholarError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e))
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ScholarError::Config(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ScholarClient {
        ScholarClient::new(ScholarConfig {
            cookie_file: Some(PathBuf::from("/nonexistent/cookies.json")),
            ..Default::default()
        })
        .expect("client builds")
    }

    #[test]
    fn test_author_search_url() {
        let url = client().author_search_url("Jane Doe").expect("Failed to build URL");
        assert_eq!(url.path(), "/citations");
        assert!(url.as_str().contains("view_op=search_authors"));
        assert!(url.as_str().contains("mauthors=Jane+Doe"));
    }

    #[test]
    fn test_publication_search_url() {
        let url = client()
            .publication_search_url("machine learning", 20)
            .expect("Failed to build URL");
        assert!(url.as_str().contains("q=machine+learning"));
        assert!(url.as_str().contains("start=20"));
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let result = ScholarClient::new(ScholarConfig {
            proxy: Some("not a url".to_string()),
            cookie_file: Some(PathBuf::from("/nonexistent/cookies.json")),
            ..Default::default()
        });
        assert!(matches!(result, Err(ScholarError::Config(_))));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = ScholarClient::new(ScholarConfig {
            base_url: "https://scholar.example.org/".to_string(),
            cookie_file: Some(PathBuf::from("/nonexistent/cookies.json")),
            ..Default::default()
        })
        .expect("client builds");
        assert_eq!(client.base_url(), "https://scholar.example.org");
    }
}
