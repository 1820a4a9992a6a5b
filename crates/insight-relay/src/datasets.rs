use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use insight_persist::DatasetStore;
use insight_types::{DatasetDescriptor, DatasetId, Row};

use crate::error::RelayError;

const BATTLE_SIDES: [&str; 2] = ["First_pokemon", "Second_pokemon"];

/// Maps dataset identifiers to their backing tables and fetches rows
pub struct DatasetResolver {
    store: Arc<dyn DatasetStore>,
    max_rows: Option<usize>,
}

impl DatasetResolver {
    pub fn new(store: Arc<dyn DatasetStore>, max_rows: Option<usize>) -> Self {
        Self { store, max_rows }
    }

    /// Match a caller-supplied identifier against the closed set. Pure, no I/O.
    pub fn parse(identifier: &str) -> Result<DatasetId, RelayError> {
        Ok(identifier.parse::<DatasetId>()?)
    }

    pub async fn resolve(&self, id: DatasetId) -> Result<DatasetDescriptor, RelayError> {
        let mut rows = self.store.fetch_rows(id.table(), self.max_rows).await?;

        if let Some(joined) = id.joined_table() {
            // The join must see every battle, not a page of them
            let battles = self.store.fetch_rows(joined, None).await?;
            attach_battles(&mut rows, &battles, joined);
        }

        tracing::debug!(dataset = %id, rows = rows.len(), "Dataset resolved");
        Ok(DatasetDescriptor::new(id, rows))
    }

    pub async fn ping(&self) -> Result<(), RelayError> {
        Ok(self.store.ping().await?)
    }
}

/// Attach to every creature row the battles it took part in, on either side,
/// in source order.
fn attach_battles(rows: &mut [Row], battles: &[Row], column: &str) {
    let mut by_creature: HashMap<i64, Vec<Value>> = HashMap::new();
    for battle in battles {
        let mut seen: Vec<i64> = Vec::with_capacity(2);
        for side in BATTLE_SIDES {
            if let Some(id) = battle.get(side).and_then(integer_key) {
                if !seen.contains(&id) {
                    seen.push(id);
                    by_creature
                        .entry(id)
                        .or_default()
                        .push(Value::Object(battle.clone()));
                }
            }
        }
    }

    for row in rows.iter_mut() {
        let fought = row
            .get("id")
            .and_then(integer_key)
            .and_then(|id| by_creature.get(&id))
            .cloned()
            .unwrap_or_default();
        row.insert(column.to_string(), Value::Array(fought));
    }
}

/// Integer identifiers may arrive as floats from document stores
fn integer_key(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}
