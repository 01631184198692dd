use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use tracing::debug;

use crate::error::{PreviewError, Result};

const BROWSER_UA: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/112.0";

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Anything that can hand back the HTML of a page. The cache and gateway only
/// see this trait so tests can swap in canned pages.
pub trait PageSource: Send + Sync {
    fn fetch_page(&self, url: &str) -> Result<String>;
}

pub fn http_client(timeout_secs: u64) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PreviewError::source_unavailable("-", format!("failed to build http client: {e}")))
    })
}

pub struct HttpPageSource {
    client: &'static Client,
}

impl HttpPageSource {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
        })
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&self, url: &str) -> Result<String> {
        debug!(url, "requesting page");
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_UA)
            .send()
            .map_err(|e| PreviewError::source_unavailable(url, format!("request failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| PreviewError::source_unavailable(url, format!("failed reading body: {e}")))?;
        if !status.is_success() {
            return Err(PreviewError::source_unavailable(url, format!("http {status}")));
        }
        if body.trim().is_empty() {
            return Err(PreviewError::source_unavailable(url, "empty page"));
        }
        Ok(body)
    }
}
