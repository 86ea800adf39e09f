//! The measurement run: fetch the group page, extract the online count, and
//! store it. Every failure ends in a [`RunOutcome`] and a process exit code.

use std::fmt;

use chrono::Utc;
use pulse_core::{AppConfig, Measurement};
use pulse_db::DbError;
use pulse_scraper::{CountExtractor, ExtractorRules, FetchOutcome, PageFetcher, WebhookNotifier};

use crate::responder::{FailureResponder, SystemdTimer, TriggerControl};

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_FAILURE: u8 = 1;
pub(crate) const EXIT_AUTH_FAILURE: u8 = 2;

/// Terminal state of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunOutcome {
    Recorded { record_id: i64, count: u32 },
    /// The session was rejected; the failure responder has already run.
    AuthFailure { status: u16 },
    FetchFailed(String),
    /// The page loaded but carried no recognizable count.
    CountNotFound,
    WriteFailed(String),
    /// The HTTP client could not be constructed.
    SetupFailed(String),
}

impl RunOutcome {
    pub(crate) fn exit_code(&self) -> u8 {
        match self {
            Self::Recorded { .. } => EXIT_SUCCESS,
            Self::AuthFailure { .. } => EXIT_AUTH_FAILURE,
            Self::FetchFailed(_)
            | Self::CountNotFound
            | Self::WriteFailed(_)
            | Self::SetupFailed(_) => EXIT_FAILURE,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recorded { record_id, count } => {
                write!(f, "recorded {count} online members (record id {record_id})")
            }
            Self::AuthFailure { status } => {
                write!(f, "session rejected with HTTP {status}; cookies must be refreshed")
            }
            Self::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
            Self::CountNotFound => write!(f, "online member count not found on the page"),
            Self::WriteFailed(reason) => write!(f, "measurement not stored: {reason}"),
            Self::SetupFailed(reason) => write!(f, "run could not start: {reason}"),
        }
    }
}

/// Where a successful measurement goes. Returns the new record id.
pub(crate) trait MeasurementStore {
    async fn write(&self, measurement: &Measurement) -> Result<i64, DbError>;
}

/// Writes to Postgres on a connection opened for this one insert.
pub(crate) struct PgMeasurementStore<'a> {
    database_url: &'a str,
}

impl<'a> PgMeasurementStore<'a> {
    pub(crate) fn new(database_url: &'a str) -> Self {
        Self { database_url }
    }
}

impl MeasurementStore for PgMeasurementStore<'_> {
    async fn write(&self, measurement: &Measurement) -> Result<i64, DbError> {
        let row = pulse_db::write_measurement(self.database_url, measurement).await?;
        Ok(row.id)
    }
}

/// Wires the production collaborators together, performs one run, and
/// prints the summary line.
pub(crate) async fn run_job(config: &AppConfig) -> RunOutcome {
    let extractor = CountExtractor::new(ExtractorRules::default());
    let fetcher = match PageFetcher::new(
        config.request_timeout_secs,
        &config.user_agent,
        &config.accept_language,
        extractor,
    ) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!(error = %e, "failed to build HTTP client");
            let outcome = RunOutcome::SetupFailed(format!("failed to build HTTP client: {e}"));
            println!("{outcome}");
            return outcome;
        }
    };

    // Without a notifier the responder records the alert as failed.
    let notifier = match WebhookNotifier::new(config.alert_timeout_secs) {
        Ok(notifier) => Some(notifier),
        Err(e) => {
            tracing::warn!(error = %e, "failed to build alert client");
            None
        }
    };
    let trigger = SystemdTimer::new(&config.timer_unit);
    let responder = FailureResponder::new(
        notifier.as_ref(),
        config.error_webhook.as_deref(),
        &trigger,
    );
    let store = PgMeasurementStore::new(&config.database_url);

    let outcome = run_once(config, &fetcher, &store, &responder).await;
    println!("{outcome}");
    outcome
}

/// One fetch, then exactly one of: store, respond to auth failure, or give up.
///
/// The measurement timestamp is taken before the request goes out. A write
/// is attempted only after a count was extracted, and the responder runs
/// only for an auth failure.
pub(crate) async fn run_once<S, T>(
    config: &AppConfig,
    fetcher: &PageFetcher,
    store: &S,
    responder: &FailureResponder<'_, T>,
) -> RunOutcome
where
    S: MeasurementStore,
    T: TriggerControl,
{
    let timestamp = Utc::now();

    match fetcher.fetch(&config.url, &config.cookies).await {
        FetchOutcome::Success(Some(count)) => {
            tracing::info!(count, "online member count extracted");
            let measurement = Measurement::new(timestamp, count);
            match store.write(&measurement).await {
                Ok(record_id) => {
                    tracing::info!(record_id, count, %timestamp, "measurement stored");
                    RunOutcome::Recorded { record_id, count }
                }
                Err(e) => {
                    tracing::error!(error = %e, count, "failed to store measurement");
                    RunOutcome::WriteFailed(e.to_string())
                }
            }
        }
        FetchOutcome::Success(None) => {
            tracing::error!("page loaded but the online member count was not found");
            RunOutcome::CountNotFound
        }
        FetchOutcome::AuthFailure { status } => {
            let report = responder.respond().await;
            tracing::debug!(?report, "auth failure handled");
            RunOutcome::AuthFailure { status }
        }
        FetchOutcome::TransientFailure(reason) => {
            tracing::error!(%reason, "could not fetch the group page");
            RunOutcome::FetchFailed(reason)
        }
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
