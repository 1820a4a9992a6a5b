use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::{Mutex, RwLock};

use insight_types::{QueryQuota, QuotaPolicy, Row};

use crate::error::{PersistError, Result};
use crate::trait_client::{DatasetStore, QuotaStore};

/// Process-local store for development and tests.
///
/// Tables can be seeded from a directory of JSON fixtures: each `<table>.json`
/// file holds an array of row objects.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    quotas: Mutex<HashMap<String, QueryQuota>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: impl Into<String>, rows: Vec<Row>) -> Self {
        self.tables.get_mut().insert(table.into(), rows);
        self
    }

    pub fn with_quota(mut self, quota: QueryQuota) -> Self {
        self.quotas.get_mut().insert(quota.user_id.clone(), quota);
        self
    }

    /// Load every `*.json` file in `dir` as a table named after the file stem
    pub fn from_fixture_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut store = Self::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(table) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let contents = std::fs::read_to_string(&path)?;
            let rows = parse_rows(&contents)
                .map_err(|e| PersistError::Fixture(format!("{}: {}", path.display(), e)))?;

            tracing::debug!(table = %table, rows = rows.len(), "Loaded fixture table");
            store.tables.get_mut().insert(table, rows);
        }

        Ok(store)
    }

    pub async fn insert_rows(&self, table: &str, rows: Vec<Row>) {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub async fn set_quota(&self, quota: QueryQuota) {
        self.quotas.lock().await.insert(quota.user_id.clone(), quota);
    }

    pub async fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

fn parse_rows(contents: &str) -> std::result::Result<Vec<Row>, String> {
    let value: serde_json::Value = serde_json::from_str(contents).map_err(|e| e.to_string())?;
    let items = value
        .as_array()
        .ok_or_else(|| "expected a JSON array of objects".to_string())?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.as_object()
                .cloned()
                .ok_or_else(|| format!("element {} is not an object", idx))
        })
        .collect()
}

#[async_trait]
impl QuotaStore for InMemoryStore {
    async fn get_quota(&self, user_id: &str) -> Result<Option<QueryQuota>> {
        Ok(self.quotas.lock().await.get(user_id).cloned())
    }

    async fn try_increment(
        &self,
        user_id: &str,
        policy: &QuotaPolicy,
        now: DateTime<Utc>,
    ) -> Result<Option<QueryQuota>> {
        let mut quotas = self.quotas.lock().await;

        match quotas.get_mut(user_id) {
            Some(quota) => {
                if quota.try_increment(policy, now) {
                    Ok(Some(quota.clone()))
                } else {
                    Ok(None)
                }
            }
            None if policy.limit == 0 => Ok(None),
            None => {
                let quota = QueryQuota::first(user_id, now);
                quotas.insert(user_id.to_string(), quota.clone());
                Ok(Some(quota))
            }
        }
    }
}

#[async_trait]
impl DatasetStore for InMemoryStore {
    async fn fetch_rows(&self, table: &str, limit: Option<usize>) -> Result<Vec<Row>> {
        let tables = self.tables.read().await;
        let rows = tables.get(table).map(Vec::as_slice).unwrap_or_default();
        let take = limit.unwrap_or(rows.len());
        Ok(rows.iter().take(take).cloned().collect())
    }
}
