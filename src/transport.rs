//! HTTP collaborator for the search page

use anyhow::{Context, Result};
use std::time::Duration;

/// Fetches pages and posts forms. One attempt per call; retrying is the caller's business.
pub trait Transport {
    fn fetch(&mut self, url: &str) -> Result<String>;
    fn submit(&mut self, url: &str, payload: &[(String, String)]) -> Result<String>;
}

/// Blocking reqwest client holding the ASP.NET session cookie between requests
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; DeedScraper/1.0)")
            .cookie_store(true)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn fetch(&mut self, url: &str) -> Result<String> {
        self.client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("Failed to fetch: {}", url))?
            .text()
            .with_context(|| format!("Failed to read response: {}", url))
    }

    fn submit(&mut self, url: &str, payload: &[(String, String)]) -> Result<String> {
        self.client
            .post(url)
            .form(payload)
            .send()
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("Failed to submit form: {}", url))?
            .text()
            .with_context(|| format!("Failed to read response: {}", url))
    }
}
