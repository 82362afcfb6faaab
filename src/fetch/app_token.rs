use super::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::warn;

/// Header Socrata reads application tokens from.
pub const APP_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-app-token");

/// An [`HttpClient`] wrapper that sends a Socrata application token.
///
/// Requests go through unchanged when no token is configured, since the
/// open-data endpoints also serve anonymous (throttled) traffic.
pub struct AppToken<C> {
    inner: C,
    token: Option<HeaderValue>,
}

impl<C> AppToken<C> {
    pub fn new(inner: C, token: Option<String>) -> Self {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .and_then(|t| match HeaderValue::from_str(t.trim()) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    Some(value)
                }
                Err(_) => {
                    warn!("App token is not a valid header value, sending requests without it");
                    None
                }
            });
        Self { inner, token }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn apply(&self, req: &mut reqwest::Request) {
        if let Some(token) = &self.token {
            req.headers_mut().insert(APP_TOKEN_HEADER, token.clone());
        }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for AppToken<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.apply(&mut req);
        self.inner.execute(req).await
    }
}
