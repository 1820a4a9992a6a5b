#[cfg(feature = "mongodb")]
use futures::TryStreamExt;
#[cfg(feature = "mongodb")]
use mongodb::{
    bson::{doc, Bson, Document},
    Client, Database,
};

#[cfg(feature = "mongodb")]
use insight_types::Row;

#[cfg(feature = "mongodb")]
use crate::error::Result;

/// Generic row reader: every dataset table is a collection of flat documents
#[cfg(feature = "mongodb")]
#[derive(Clone)]
pub struct MongoDatasetRepository {
    database: Database,
}

#[cfg(feature = "mongodb")]
impl MongoDatasetRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        Self {
            database: client.database(db_name),
        }
    }

    /// Rows in insertion order, `_id` stripped
    pub async fn fetch_rows(&self, table: &str, limit: Option<usize>) -> Result<Vec<Row>> {
        let collection = self.database.collection::<Document>(table);
        let mut find = collection
            .find(doc! {})
            .sort(doc! { "_id": 1 });

        if let Some(limit) = limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let documents: Vec<Document> = find.await?.try_collect().await?;
        Ok(documents.into_iter().filter_map(document_to_row).collect())
    }

    pub async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[cfg(feature = "mongodb")]
fn document_to_row(mut document: Document) -> Option<Row> {
    document.remove("_id");
    match Bson::Document(document).into_relaxed_extjson() {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}
