use crate::error::{Result, ScanError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

pub const USER_AGENT: &str = concat!(
    "pyscout/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/trapdoorsec/pyscout)"
);

/// A fetched HTTP response, detached from the connection it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Body decoded as UTF-8, whatever charset the server declared.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Storage for responses that survives between runs.
///
/// Implementations swallow their own storage errors: a failed lookup is a miss
/// and a failed store is logged and forgotten.
pub trait CacheStore: Send + Sync {
    fn lookup(&self, method: &str, url: &str) -> Option<Page>;
    fn store(&self, method: &str, url: &str, page: &Page);
}

pub struct Session {
    client: Client,
    cache: Option<Arc<dyn CacheStore>>,
}

impl Session {
    pub fn new() -> Result<Self> {
        Self::with_timeout(30)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs / 2))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            cache: None,
        })
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// GET `url`, answering from the cache when an entry exists.
    ///
    /// Only 2xx responses are written back to the cache.
    pub async fn fetch(&self, url: &str) -> Result<Page> {
        if let Some(cache) = &self.cache
            && let Some(page) = cache.lookup("GET", url)
        {
            debug!(%url, "Cache hit");
            return Ok(page);
        }

        debug!(%url, "Fetching");
        let response = self.client.get(url).send().await?;

        let status_code = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        let page = Page {
            url: url.to_string(),
            status_code,
            headers,
            body,
        };

        if page.is_success()
            && let Some(cache) = &self.cache
        {
            cache.store("GET", url, &page);
        }

        Ok(page)
    }

    /// Fetch a page, turning every failure into `None`.
    ///
    /// Transport errors are logged with a backtrace. Non-2xx responses are
    /// logged as warnings and also come back as `None`.
    pub async fn get_response(&self, url: &str) -> Option<Page> {
        match self.fetch(url).await {
            Ok(page) if page.is_success() => Some(page),
            Ok(page) => {
                warn!(%url, status = page.status_code, "Page returned an error status");
                None
            }
            Err(e) => {
                error!(
                    %url,
                    error = %e,
                    backtrace = %Backtrace::force_capture(),
                    "Failed to load page"
                );
                None
            }
        }
    }
}

/// Resolve `href` against the page it was found on.
pub fn resolve_url(base: &str, href: &str) -> Result<String> {
    let base_url =
        Url::parse(base).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base, e)))?;
    let resolved = base_url
        .join(href)
        .map_err(|e| ScanError::InvalidUrl(format!("{} relative to {}: {}", href, base, e)))?;
    Ok(resolved.to_string())
}

/// Final path segment of a URL, used as a local file name.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
}
