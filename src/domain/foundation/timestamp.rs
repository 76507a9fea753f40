//! UTC instants stored on records (answers, grants, plan requests).

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// `None` when the seconds fall outside chrono's range.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn is_before(&self, other: &Timestamp) -> bool {
        self < other
    }

    pub fn is_after(&self, other: &Timestamp) -> bool {
        self > other
    }

    pub fn add_days(&self, days: i64) -> Self {
        self.shifted(Duration::days(days))
    }

    pub fn minus_days(&self, days: i64) -> Self {
        self.shifted(-Duration::days(days))
    }

    pub fn minus_hours(&self, hours: i64) -> Self {
        self.shifted(-Duration::hours(hours))
    }

    fn shifted(&self, by: Duration) -> Self {
        Self(self.0 + by)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}
