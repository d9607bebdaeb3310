//! Where profile stats come from.
//!
//! The controller only talks to a [`StatsSource`]; the HTTP implementation is
//! the default backend and tests plug in scripted ones.

use crate::model::ProfileResponse;
use crate::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A backend able to look up stats for a profile URL.
///
/// Implementations must observe `cancel`: once it fires, the returned future
/// should resolve promptly with [`crate::Error::Cancelled`].
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Resolve `subject_url` to a profile. A missing record is
    /// [`crate::Error::NotFound`], not an empty profile.
    async fn fetch_profile(
        &self,
        subject_url: &str,
        cancel: CancellationToken,
    ) -> Result<ProfileResponse>;
}

#[cfg(feature = "http")]
pub use http::HttpStatsSource;

#[cfg(feature = "http")]
mod http {
    use super::*;
    use crate::model::LookupRequest;
    use crate::{Error, OverlayConfig};
    use log::debug;
    use reqwest::header::ACCEPT;
    use reqwest::{Client, RequestBuilder, StatusCode};
    use std::collections::HashMap;
    use std::time::Duration;

    /// `reqwest`-backed source that POSTs to the lookup endpoint.
    #[derive(Clone)]
    pub struct HttpStatsSource {
        client: Client,
        api_url: String,
        recent_searches_url: String,
        timeout: Duration,
        headers: HashMap<String, String>,
    }

    impl HttpStatsSource {
        pub fn new(config: &OverlayConfig) -> Result<Self> {
            let client = Client::builder()
                .user_agent(config.user_agent.clone())
                .build()
                .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

            Ok(Self {
                client,
                api_url: config.api_url.clone(),
                recent_searches_url: config.recent_searches_url.clone(),
                timeout: Duration::from_millis(config.timeout_ms),
                headers: config.headers.clone(),
            })
        }

        pub(crate) fn client(&self) -> &Client {
            &self.client
        }

        pub(crate) fn recent_searches_url(&self) -> &str {
            &self.recent_searches_url
        }

        pub(crate) fn timeout(&self) -> Duration {
            self.timeout
        }

        pub(crate) fn with_headers(&self, mut req: RequestBuilder) -> RequestBuilder {
            for (name, value) in &self.headers {
                req = req.header(name.as_str(), value.as_str());
            }
            req
        }

        /// Like `Error::from`, but a client-side timeout reports the
        /// configured limit.
        pub(crate) fn request_error(&self, err: reqwest::Error) -> Error {
            if err.is_timeout() {
                Error::Timeout(self.timeout.as_millis() as u64)
            } else {
                err.into()
            }
        }

        async fn lookup(&self, subject_url: &str) -> Result<ProfileResponse> {
            let req = self
                .client
                .post(&self.api_url)
                .header(ACCEPT, "application/json")
                .timeout(self.timeout)
                .json(&LookupRequest::new(subject_url));

            let resp = self
                .with_headers(req)
                .send()
                .await
                .map_err(|e| self.request_error(e))?;
            let status = resp.status();

            if status == StatusCode::NOT_FOUND {
                return Err(Error::NotFound);
            }
            if !status.is_success() {
                // FastAPI-style `{"detail": "..."}` bodies, when present
                let detail = resp
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));
                return Err(Error::Status {
                    status: status.as_u16(),
                    detail,
                });
            }

            let body = resp.bytes().await.map_err(|e| self.request_error(e))?;
            ProfileResponse::from_slice(&body)
        }
    }

    #[async_trait]
    impl StatsSource for HttpStatsSource {
        async fn fetch_profile(
            &self,
            subject_url: &str,
            cancel: CancellationToken,
        ) -> Result<ProfileResponse> {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("lookup for {} cancelled", subject_url);
                    Err(Error::Cancelled)
                }
                res = self.lookup(subject_url) => res,
            }
        }
    }
}
