use anyhow::{Result, bail};
use async_trait::async_trait;

use super::PageFetcher;

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            bail!("{url} responded with {}", res.status());
        }
        let body = res.text().await?;
        Ok(body)
    }
}
