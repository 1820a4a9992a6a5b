use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use insight_persist::QuotaStore;
use insight_types::{QueryQuota, QuotaPolicy, QuotaStatus};

use crate::error::RelayError;

/// Checks and records per-caller usage against a [`QuotaPolicy`]
pub struct QuotaGate {
    store: Arc<dyn QuotaStore>,
    policy: QuotaPolicy,
}

impl QuotaGate {
    pub fn new(store: Arc<dyn QuotaStore>, policy: QuotaPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    pub async fn status(&self, user_id: &str, now: DateTime<Utc>) -> Result<QuotaStatus, RelayError> {
        let record = self.store.get_quota(user_id).await?;
        Ok(QuotaStatus::from_record(user_id, record.as_ref(), &self.policy, now))
    }

    /// Read-only gate; no side effect on success
    pub async fn check(&self, user_id: &str, now: DateTime<Utc>) -> Result<QuotaStatus, RelayError> {
        let status = self.status(user_id, now).await?;
        if status.is_exhausted() {
            tracing::info!(user_id = %user_id, used = status.used, "Quota exhausted");
            return Err(RelayError::QuotaExceeded {
                limit: self.policy.limit,
            });
        }
        Ok(status)
    }

    /// Charge one accepted request.
    ///
    /// Fails with `QuotaExceeded` if another request took the last slot since
    /// [`QuotaGate::check`].
    pub async fn record(&self, user_id: &str, now: DateTime<Utc>) -> Result<QueryQuota, RelayError> {
        self.store
            .try_increment(user_id, &self.policy, now)
            .await?
            .ok_or(RelayError::QuotaExceeded {
                limit: self.policy.limit,
            })
    }
}

/// One async lock per caller identity, so a caller's requests run one at a
/// time while different callers proceed independently.
#[derive(Default)]
pub struct CallerLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl CallerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only the map still references are idle
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(user_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use insight_persist::{InMemoryStore, PersistError};
    use std::time::Duration;

    /// Store whose conditional writes never settle
    struct ContendedStore;

    #[async_trait]
    impl QuotaStore for ContendedStore {
        async fn get_quota(&self, _user_id: &str) -> insight_persist::Result<Option<QueryQuota>> {
            Ok(None)
        }

        async fn try_increment(
            &self,
            _user_id: &str,
            _policy: &QuotaPolicy,
            _now: DateTime<Utc>,
        ) -> insight_persist::Result<Option<QueryQuota>> {
            Err(PersistError::Internal("quota update contention".to_string()))
        }
    }

    #[tokio::test]
    async fn test_check_passes_without_record() {
        let gate = QuotaGate::new(Arc::new(InMemoryStore::new()), QuotaPolicy::default());
        let status = gate.check("u1", Utc::now()).await.unwrap();
        assert_eq!(status.remaining, 5);
    }

    #[tokio::test]
    async fn test_check_rejects_at_limit() {
        let now = Utc::now();
        let store = InMemoryStore::new().with_quota(QueryQuota {
            count: 5,
            ..QueryQuota::first("u1", now)
        });
        let gate = QuotaGate::new(Arc::new(store), QuotaPolicy::default());

        let err = gate.check("u1", now).await.unwrap_err();
        assert!(matches!(err, RelayError::QuotaExceeded { limit: 5 }));
    }

    #[tokio::test]
    async fn test_record_increments() {
        let gate = QuotaGate::new(Arc::new(InMemoryStore::new()), QuotaPolicy::default());
        let now = Utc::now();
        gate.record("u1", now).await.unwrap();
        let quota = gate.record("u1", now).await.unwrap();
        assert_eq!(quota.count, 2);
    }

    #[tokio::test]
    async fn test_unsettled_record_is_a_storage_error() {
        let gate = QuotaGate::new(Arc::new(ContendedStore), QuotaPolicy::default());
        let err = gate.record("u1", Utc::now()).await.unwrap_err();
        assert!(matches!(err, RelayError::Storage(PersistError::Internal(_))));
    }

    #[tokio::test]
    async fn test_same_caller_is_serialized() {
        let locks = Arc::new(CallerLocks::new());
        let guard = locks.acquire("u1").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("u1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_callers_do_not_block() {
        let locks = CallerLocks::new();
        let _u1 = locks.acquire("u1").await;
        let acquired = tokio::time::timeout(Duration::from_millis(100), locks.acquire("u2")).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_idle_locks_are_pruned() {
        let locks = CallerLocks::new();
        drop(locks.acquire("u1").await);
        drop(locks.acquire("u2").await);
        let _u3 = locks.acquire("u3").await;
        assert_eq!(locks.tracked(), 1);
    }
}
