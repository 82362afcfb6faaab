//! HTTP plumbing shared by the open-data clients.
//!
//! [`HttpClient`] is the seam: [`BasicClient`] talks to the network, and
//! wrappers such as [`AppToken`] decorate requests before delegating.

mod app_token;
mod basic;

pub use app_token::AppToken;
pub use basic::BasicClient;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Method, Request, Response, Url};
use serde::de::DeserializeOwned;

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// GETs `url` and decodes the JSON body.
///
/// # Errors
///
/// Returns an error on transport failure, on a non-success status (with the
/// response body in the message), or if the body is not the expected JSON.
pub async fn fetch_json<C: HttpClient, T: DeserializeOwned>(client: &C, url: Url) -> Result<T> {
    let req = Request::new(Method::GET, url.clone());

    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("request to {url} failed"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("{url} returned status {status}: {body}");
    }

    resp.json()
        .await
        .with_context(|| format!("failed to decode response from {url}"))
}
