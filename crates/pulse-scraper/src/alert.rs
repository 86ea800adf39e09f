//! Operator alert delivered as a bare GET to a webhook URL.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::ScraperError;

pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(timeout_secs: u64) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// Hits `url` once. Only HTTP 200 counts as delivered; no payload is sent.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::AlertRejected`] for any status other than 200.
    /// - [`ScraperError::Http`] on timeout or transport failure.
    pub async fn notify(&self, url: &str) -> Result<(), ScraperError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ScraperError::AlertRejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
