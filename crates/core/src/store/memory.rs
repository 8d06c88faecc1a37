use crate::domain::EntityId;
use crate::store::{Collection, CrmStore, StoreHttpError};
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-process store over json-server's `db.json` layout. Used for offline
/// reports and tests; answers missing ids with the same 404 the REST store
/// would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<Collection, Vec<Value>>>,
}

impl MemoryStore {
    pub fn from_db_json(text: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(text).context("db.json is not valid JSON")?;
        let obj = doc
            .as_object()
            .context("db.json must be an object keyed by collection")?;

        let mut rows = HashMap::new();
        for collection in Collection::ALL {
            let items = match obj.get(collection.path()) {
                Some(Value::Array(items)) => items.clone(),
                Some(_) => anyhow::bail!("db.json key {:?} is not an array", collection.path()),
                None => Vec::new(),
            };
            rows.insert(collection, items);
        }

        Ok(Self {
            rows: Mutex::new(rows),
        })
    }

    fn with_rows<T>(&self, f: impl FnOnce(&mut HashMap<Collection, Vec<Value>>) -> Result<T>) -> Result<T> {
        let mut guard = self
            .rows
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        f(&mut guard)
    }
}

fn row_id(row: &Value) -> Option<EntityId> {
    row.get("id")
        .and_then(|v| serde_json::from_value::<EntityId>(v.clone()).ok())
}

fn not_found(collection: Collection, method: &'static str, id: &EntityId) -> anyhow::Error {
    StoreHttpError {
        collection,
        method,
        status: 404,
        body: format!("no row with id {id}"),
    }
    .into()
}

fn next_id(rows: &[Value]) -> i64 {
    rows.iter()
        .filter_map(row_id)
        .filter_map(|id| id.as_str().parse::<i64>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

#[async_trait::async_trait]
impl CrmStore for MemoryStore {
    fn store_name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        self.with_rows(|rows| Ok(rows.get(&collection).cloned().unwrap_or_default()))
    }

    async fn create(&self, collection: Collection, body: &Value) -> Result<Value> {
        let mut row = body.clone();
        let obj = row
            .as_object_mut()
            .context("created rows must be JSON objects")?;

        self.with_rows(|rows| {
            let items = rows.entry(collection).or_default();
            let has_id = obj.get("id").is_some_and(|v| !v.is_null());
            if !has_id {
                obj.insert("id".to_string(), json!(next_id(items)));
            }
            items.push(Value::Object(obj.clone()));
            Ok(Value::Object(obj.clone()))
        })
    }

    async fn update(&self, collection: Collection, id: &EntityId, body: &Value) -> Result<Value> {
        let mut row = body.clone();
        let obj = row
            .as_object_mut()
            .context("updated rows must be JSON objects")?;

        self.with_rows(|rows| {
            let items = rows.entry(collection).or_default();
            let slot = items
                .iter_mut()
                .find(|r| row_id(r).as_ref() == Some(id))
                .ok_or_else(|| not_found(collection, "PUT", id))?;

            // Keep the stored id representation (number vs string).
            let stored_id = slot.get("id").cloned().unwrap_or_else(|| json!(id.as_str()));
            obj.insert("id".to_string(), stored_id);
            *slot = Value::Object(obj.clone());
            Ok(slot.clone())
        })
    }

    async fn delete(&self, collection: Collection, id: &EntityId) -> Result<()> {
        self.with_rows(|rows| {
            let items = rows.entry(collection).or_default();
            let before = items.len();
            items.retain(|r| row_id(r).as_ref() != Some(id));
            if items.len() == before {
                return Err(not_found(collection, "DELETE", id));
            }
            Ok(())
        })
    }
}
