use crate::error::PageError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Raw HTML over HTTP, one request per page.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, PageError>;
}

pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, PageError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| PageError::Launch(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HtmlFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PageError> {
        if url.is_empty() {
            return Err(PageError::load(url, "missing URL"));
        }

        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PageError::load(url, e))?;

        if !response.status().is_success() {
            return Err(PageError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|e| PageError::load(url, e))
    }
}
