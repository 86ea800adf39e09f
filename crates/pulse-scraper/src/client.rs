//! Authenticated fetch of the group page.

use std::time::Duration;

use pulse_core::SessionCredentials;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, UPGRADE_INSECURE_REQUESTS};
use reqwest::{Client, StatusCode};

use crate::error::ScraperError;
use crate::extract::CountExtractor;

const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Result of one fetch attempt. Lives only for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200. `None` means the page loaded but no count could be found.
    Success(Option<u32>),
    /// HTTP 401/403: the session cookies are no longer accepted.
    AuthFailure { status: u16 },
    /// Any other status, a timeout, or a connection error.
    TransientFailure(String),
}

/// Coarse bucket for an HTTP status, independent of the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Ok,
    Auth,
    Other,
}

#[must_use]
pub fn classify_status(status: StatusCode) -> StatusClass {
    match status {
        StatusCode::OK => StatusClass::Ok,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StatusClass::Auth,
        _ => StatusClass::Other,
    }
}

/// Issues a single browser-like GET per call. There is no retry here; the
/// external scheduler decides when the next attempt happens.
pub struct PageFetcher {
    client: Client,
    accept_language: String,
    extractor: CountExtractor,
}

impl PageFetcher {
    /// Creates a `PageFetcher` with the given overall timeout and browser
    /// identity.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        accept_language: &str,
        extractor: CountExtractor,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            accept_language: accept_language.to_string(),
            extractor,
        })
    }

    /// Fetches `url` with `credentials` attached as cookies and classifies
    /// the response. Never returns an error: every failure mode maps to a
    /// [`FetchOutcome`] variant.
    pub async fn fetch(&self, url: &str, credentials: &SessionCredentials) -> FetchOutcome {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, BROWSER_ACCEPT)
            .header(ACCEPT_LANGUAGE, &self.accept_language)
            .header(UPGRADE_INSECURE_REQUESTS, "1")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none");

        if !credentials.is_empty() {
            request = request.header(COOKIE, credentials.cookie_header());
        }

        tracing::info!(%url, cookies = credentials.len(), "fetching group page");

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = describe_transport_error(&e);
                tracing::warn!(%url, %reason, "group page request failed");
                return FetchOutcome::TransientFailure(reason);
            }
        };

        let status = response.status();
        match classify_status(status) {
            StatusClass::Auth => {
                tracing::error!(
                    status = status.as_u16(),
                    "group page rejected the session cookies"
                );
                FetchOutcome::AuthFailure {
                    status: status.as_u16(),
                }
            }
            StatusClass::Other => {
                tracing::warn!(status = status.as_u16(), "unexpected HTTP status");
                FetchOutcome::TransientFailure(format!("unexpected HTTP status {status}"))
            }
            StatusClass::Ok => match response.text().await {
                Ok(body) => {
                    tracing::debug!(bytes = body.len(), "group page loaded");
                    FetchOutcome::Success(self.extractor.extract(&body))
                }
                Err(e) => {
                    let reason = format!(
                        "failed to read response body: {}",
                        describe_transport_error(&e)
                    );
                    tracing::warn!(%reason, "group page body unreadable");
                    FetchOutcome::TransientFailure(reason)
                }
            },
        }
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        format!("request failed: {err}")
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
