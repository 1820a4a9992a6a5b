#[cfg(feature = "mongodb")]
use async_trait::async_trait;
#[cfg(feature = "mongodb")]
use chrono::{DateTime, Utc};
#[cfg(feature = "mongodb")]
use mongodb::Client;

#[cfg(feature = "mongodb")]
use insight_types::{QueryQuota, QuotaPolicy, Row};

#[cfg(feature = "mongodb")]
use crate::dbs::mongo::repositories::{MongoDatasetRepository, MongoQuotaRepository};
#[cfg(feature = "mongodb")]
use crate::error::{PersistError, Result};
#[cfg(feature = "mongodb")]
use crate::trait_client::{DatasetStore, QuotaStore};

#[cfg(feature = "mongodb")]
pub struct MongoPersistenceClient {
    quota_repo: MongoQuotaRepository,
    dataset_repo: MongoDatasetRepository,
}

#[cfg(feature = "mongodb")]
impl MongoPersistenceClient {
    /// Connect to MongoDB, ensure the quota index exists, and create client
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let quota_repo = MongoQuotaRepository::new(&client, database);
        let dataset_repo = MongoDatasetRepository::new(&client, database);

        quota_repo.ensure_indexes().await?;

        Ok(Self {
            quota_repo,
            dataset_repo,
        })
    }
}

#[cfg(feature = "mongodb")]
#[async_trait]
impl QuotaStore for MongoPersistenceClient {
    async fn get_quota(&self, user_id: &str) -> Result<Option<QueryQuota>> {
        Ok(self.quota_repo.find(user_id).await?.map(Into::into))
    }

    async fn try_increment(
        &self,
        user_id: &str,
        policy: &QuotaPolicy,
        now: DateTime<Utc>,
    ) -> Result<Option<QueryQuota>> {
        self.quota_repo.try_increment(user_id, policy, now).await
    }
}

#[cfg(feature = "mongodb")]
#[async_trait]
impl DatasetStore for MongoPersistenceClient {
    async fn fetch_rows(&self, table: &str, limit: Option<usize>) -> Result<Vec<Row>> {
        self.dataset_repo.fetch_rows(table, limit).await
    }

    async fn ping(&self) -> Result<()> {
        self.dataset_repo.ping().await
    }
}
