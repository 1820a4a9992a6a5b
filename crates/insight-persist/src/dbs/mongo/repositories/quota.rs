#[cfg(feature = "mongodb")]
use chrono::{DateTime, Utc};
#[cfg(feature = "mongodb")]
use mongodb::{
    bson::{self, doc},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Client, Collection, IndexModel,
};

#[cfg(feature = "mongodb")]
use insight_types::{QueryQuota, QuotaPolicy};

#[cfg(feature = "mongodb")]
use crate::dbs::mongo::models::MongoQuota;
#[cfg(feature = "mongodb")]
use crate::error::{PersistError, Result};

#[cfg(feature = "mongodb")]
const DUPLICATE_KEY: i32 = 11000;
/// Rounds of conditional writes before giving up under contention
#[cfg(feature = "mongodb")]
const MAX_UPSERT_ATTEMPTS: usize = 3;

#[cfg(feature = "mongodb")]
#[derive(Clone)]
pub struct MongoQuotaRepository {
    collection: Collection<MongoQuota>,
}

#[cfg(feature = "mongodb")]
impl MongoQuotaRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("user_queries");
        Self { collection }
    }

    /// One record per caller
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    pub async fn find(&self, user_id: &str) -> Result<Option<MongoQuota>> {
        Ok(self.collection.find_one(doc! { "user_id": user_id }).await?)
    }

    /// Conditional increment-with-ceiling.
    ///
    /// Each step is a single server-side conditional write, so two writers can
    /// never both take the last slot.
    pub async fn try_increment(
        &self,
        user_id: &str,
        policy: &QuotaPolicy,
        now: DateTime<Utc>,
    ) -> Result<Option<QueryQuota>> {
        if policy.limit == 0 {
            return Ok(None);
        }

        let now_bson = bson::DateTime::from_chrono(now);
        let cutoff = bson::DateTime::from_chrono(policy.cutoff(now));

        for _ in 0..MAX_UPSERT_ATTEMPTS {
            // 1. Live window with room left
            let live = self
                .collection
                .find_one_and_update(
                    doc! {
                        "user_id": user_id,
                        "window_started_at": { "$gt": cutoff },
                        "count": { "$lt": i64::from(policy.limit) },
                    },
                    doc! {
                        "$inc": { "count": 1_i64 },
                        "$set": { "last_query": now_bson },
                    },
                )
                .return_document(ReturnDocument::After)
                .await?;
            if let Some(doc) = live {
                return Ok(Some(doc.into()));
            }

            // 2. Elapsed window: start a new one
            let renewed = self
                .collection
                .find_one_and_update(
                    doc! {
                        "user_id": user_id,
                        "window_started_at": { "$lte": cutoff },
                    },
                    doc! {
                        "$set": {
                            "count": 1_i64,
                            "window_started_at": now_bson,
                            "last_query": now_bson,
                        },
                    },
                )
                .return_document(ReturnDocument::After)
                .await?;
            if let Some(doc) = renewed {
                return Ok(Some(doc.into()));
            }

            // 3. Either no record yet, or a live record at the ceiling
            if let Some(existing) = self.find(user_id).await? {
                let existing = QueryQuota::from(existing);
                if existing.is_live(policy, now) && existing.count >= policy.limit {
                    return Ok(None);
                }
                // Changed under us between the conditional updates
                continue;
            }

            let first = QueryQuota::first(user_id, now);
            match self.collection.insert_one(MongoQuota::from(&first)).await {
                Ok(_) => return Ok(Some(first)),
                Err(e) if is_duplicate_key(&e) => {
                    tracing::debug!(user_id = %user_id, "Concurrent quota insert, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(user_id = %user_id, "Quota update lost every race");
        Err(PersistError::Internal("quota update contention".to_string()))
    }
}

#[cfg(feature = "mongodb")]
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}
