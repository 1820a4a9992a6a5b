use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_QUERY_LIMIT: u32 = 5;
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// How many accepted requests a caller gets per window.
///
/// The window is fixed: it opens with the first accepted request and lasts
/// `window`. A record whose window has elapsed counts as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub limit: u32,
    pub window: Duration,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_QUERY_LIMIT,
            window: Duration::hours(DEFAULT_WINDOW_HOURS),
        }
    }
}

impl QuotaPolicy {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    /// Start of the oldest window still considered live at `now`
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }
}

/// Per-caller usage record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryQuota {
    pub user_id: String,
    pub count: u32,
    pub window_started_at: DateTime<Utc>,
    pub last_query: Option<DateTime<Utc>>,
}

impl QueryQuota {
    /// First accepted request of a new window
    pub fn first(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            count: 1,
            window_started_at: now,
            last_query: Some(now),
        }
    }

    pub fn is_live(&self, policy: &QuotaPolicy, now: DateTime<Utc>) -> bool {
        self.window_started_at > policy.cutoff(now)
    }

    /// Count that applies at `now` (zero once the window has elapsed)
    pub fn effective_count(&self, policy: &QuotaPolicy, now: DateTime<Utc>) -> u32 {
        if self.is_live(policy, now) {
            self.count
        } else {
            0
        }
    }

    /// Record one more accepted request, opening a new window if needed.
    ///
    /// Returns `false` without touching the record when the ceiling is
    /// already reached.
    pub fn try_increment(&mut self, policy: &QuotaPolicy, now: DateTime<Utc>) -> bool {
        if !self.is_live(policy, now) {
            if policy.limit == 0 {
                return false;
            }
            self.count = 1;
            self.window_started_at = now;
            self.last_query = Some(now);
            return true;
        }
        if self.count >= policy.limit {
            return false;
        }
        self.count += 1;
        self.last_query = Some(now);
        true
    }
}

/// Read-only usage view returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub user_id: String,
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
}

impl QuotaStatus {
    pub fn from_record(
        user_id: &str,
        record: Option<&QueryQuota>,
        policy: &QuotaPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let live = record.filter(|q| q.is_live(policy, now));
        let used = live.map(|q| q.count).unwrap_or(0);
        Self {
            user_id: user_id.to_string(),
            used,
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(used),
            resets_at: live.map(|q| q.window_started_at + policy.window),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> QuotaPolicy {
        QuotaPolicy::default()
    }

    #[test]
    fn test_increment_below_limit() {
        let now = Utc::now();
        let mut quota = QueryQuota::first("u1", now);
        assert!(quota.try_increment(&policy(), now));
        assert_eq!(quota.count, 2);
    }

    #[test]
    fn test_increment_refused_at_limit() {
        let now = Utc::now();
        let mut quota = QueryQuota {
            count: 5,
            ..QueryQuota::first("u1", now)
        };
        assert!(!quota.try_increment(&policy(), now));
        assert_eq!(quota.count, 5);
    }

    #[test]
    fn test_elapsed_window_resets() {
        let now = Utc::now();
        let mut quota = QueryQuota {
            count: 5,
            ..QueryQuota::first("u1", now - Duration::hours(25))
        };

        assert_eq!(quota.effective_count(&policy(), now), 0);
        assert!(quota.try_increment(&policy(), now));
        assert_eq!(quota.count, 1);
        assert_eq!(quota.window_started_at, now);
    }

    #[test]
    fn test_status_without_record() {
        let status = QuotaStatus::from_record("u1", None, &policy(), Utc::now());
        assert_eq!(status.used, 0);
        assert_eq!(status.remaining, 5);
        assert!(status.resets_at.is_none());
        assert!(!status.is_exhausted());
    }

    #[test]
    fn test_status_exhausted() {
        let now = Utc::now();
        let record = QueryQuota {
            count: 5,
            ..QueryQuota::first("u1", now)
        };
        let status = QuotaStatus::from_record("u1", Some(&record), &policy(), now);
        assert!(status.is_exhausted());
        assert_eq!(status.remaining, 0);
        assert_eq!(status.resets_at, Some(now + Duration::hours(24)));
    }
}
