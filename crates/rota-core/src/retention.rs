#![forbid(unsafe_code)]

//! Retention policy for change-log entries.
//!
//! The policy itself is pure: it turns "keep entries for N days" into a
//! cutoff timestamp. The purge operation that applies the cutoff lives with
//! the change-log store in `rota-sync` and removes entries strictly older
//! than the cutoff.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Duration-based retention of change-log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// How many days of history to keep.
    pub keep_days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { keep_days: 365 }
    }
}

impl RetentionPolicy {
    /// Keep entries for the given number of days.
    #[must_use]
    pub const fn days(keep_days: i64) -> Self {
        Self { keep_days }
    }

    /// The cutoff for the given moment: entries with a timestamp strictly
    /// before it are eligible for purge.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.keep_days)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_is_keep_days_before_now() {
        let now = Utc::now();
        let policy = RetentionPolicy::days(30);
        assert_eq!(policy.cutoff(now), now - Duration::days(30));
    }

    #[test]
    fn default_keeps_a_year() {
        assert_eq!(RetentionPolicy::default().keep_days, 365);
    }
}
