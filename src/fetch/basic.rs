use super::HttpClient;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// [`HttpClient`] backed by a plain `reqwest::Client`.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    /// Builds a client with a 30 s request timeout and a 10 s connect timeout.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
