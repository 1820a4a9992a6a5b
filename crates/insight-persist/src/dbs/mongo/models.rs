#[cfg(feature = "mongodb")]
use mongodb::bson::{self, oid::ObjectId};
#[cfg(feature = "mongodb")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "mongodb")]
use insight_types::QueryQuota;

/// MongoDB-specific quota document (`user_queries` collection)
#[cfg(feature = "mongodb")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuota {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub count: i64,
    pub window_started_at: bson::DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_query: Option<bson::DateTime>,
}

#[cfg(feature = "mongodb")]
impl From<MongoQuota> for QueryQuota {
    fn from(doc: MongoQuota) -> Self {
        Self {
            user_id: doc.user_id,
            count: u32::try_from(doc.count.max(0)).unwrap_or(u32::MAX),
            window_started_at: doc.window_started_at.to_chrono(),
            last_query: doc.last_query.map(|d| d.to_chrono()),
        }
    }
}

#[cfg(feature = "mongodb")]
impl From<&QueryQuota> for MongoQuota {
    fn from(quota: &QueryQuota) -> Self {
        Self {
            id: None,
            user_id: quota.user_id.clone(),
            count: i64::from(quota.count),
            window_started_at: bson::DateTime::from_chrono(quota.window_started_at),
            last_query: quota.last_query.map(bson::DateTime::from_chrono),
        }
    }
}
