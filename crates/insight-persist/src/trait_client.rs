use async_trait::async_trait;
use chrono::{DateTime, Utc};
use insight_types::{QueryQuota, QuotaPolicy, Row};

use crate::error::Result;

/// Storage for per-caller quota records
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Current record for a caller, if any
    async fn get_quota(&self, user_id: &str) -> Result<Option<QueryQuota>>;

    /// Atomically record one accepted request.
    ///
    /// Must be a single conditional update: the count is incremented only if
    /// the caller is below `policy.limit` for the live window (a new window is
    /// opened when the previous one has elapsed). Returns the updated record,
    /// or `None` when the ceiling was already reached. An update that cannot
    /// be settled is an error, never `None`.
    async fn try_increment(
        &self,
        user_id: &str,
        policy: &QuotaPolicy,
        now: DateTime<Utc>,
    ) -> Result<Option<QueryQuota>>;
}

/// Read-only access to the tables backing the datasets
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// All rows of `table` in source order, capped at `limit`.
    ///
    /// A table that does not exist or has no rows yields an empty vector.
    async fn fetch_rows(&self, table: &str, limit: Option<usize>) -> Result<Vec<Row>>;

    /// Lightweight reachability check
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
