use crate::SessionCredentials;

/// Fully validated job configuration, built once in `main` and passed down
/// by reference.
#[derive(Clone)]
pub struct AppConfig {
    /// Group page that shows the online member count.
    pub url: String,
    pub cookies: SessionCredentials,
    pub database_url: String,
    /// Operator alert endpoint hit with a bare GET on auth failure.
    pub error_webhook: Option<String>,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub alert_timeout_secs: u64,
    /// Scheduler unit stopped when the session expires.
    pub timer_unit: String,
    pub user_agent: String,
    pub accept_language: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("url", &self.url)
            .field("cookies", &self.cookies)
            .field("database_url", &"[redacted]")
            .field(
                "error_webhook",
                &self.error_webhook.as_ref().map(|_| "[redacted]"),
            )
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("alert_timeout_secs", &self.alert_timeout_secs)
            .field("timer_unit", &self.timer_unit)
            .field("user_agent", &self.user_agent)
            .field("accept_language", &self.accept_language)
            .finish()
    }
}

/// Settings for the database-only commands (`db`, `report`).
#[derive(Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub log_level: String,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .finish()
    }
}
