use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One observation of the online member count, captured by the job.
///
/// `timestamp` is taken on the client before the page is requested; the
/// store assigns its own id and insert time when the row is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub timestamp: DateTime<Utc>,
    pub online_count: u32,
}

impl Measurement {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, online_count: u32) -> Self {
        Self {
            timestamp,
            online_count,
        }
    }
}

/// Session cookies copied from a logged-in browser.
///
/// Read-only for the whole run. Expiry is managed by the platform; the job can
/// only notice it through a 401/403 response.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SessionCredentials(BTreeMap<String, String>);

impl SessionCredentials {
    #[must_use]
    pub fn new(cookies: BTreeMap<String, String>) -> Self {
        Self(cookies)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Renders the jar as a single `Cookie` request header value
    /// (`name=value; name=value`), ordered by cookie name.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        self.0
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl<K, V> FromIterator<(K, V)> for SessionCredentials
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("names", &self.0.keys().collect::<Vec<_>>())
            .field("values", &"[redacted]")
            .finish()
    }
}
