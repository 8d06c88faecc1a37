pub mod error;
pub mod http;
pub mod memory;
pub mod targets;

use crate::domain::{CrmSnapshot, EntityId};
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use error::StoreHttpError;
pub use http::HttpJsonStore;
pub use memory::MemoryStore;

/// Collections exposed by the REST store, one endpoint each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Rms,
    ChannelPartners,
    Meetings,
    Sales,
    Targets,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Rms,
        Collection::ChannelPartners,
        Collection::Meetings,
        Collection::Sales,
        Collection::Targets,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Collection::Rms => "rms",
            Collection::ChannelPartners => "channel_partners",
            Collection::Meetings => "meetings",
            Collection::Sales => "sales",
            Collection::Targets => "targets",
        }
    }
}

/// Generic CRUD access to the CRM collections.
#[async_trait::async_trait]
pub trait CrmStore: Send + Sync {
    fn store_name(&self) -> &'static str;

    async fn list(&self, collection: Collection) -> Result<Vec<Value>>;

    /// Returns the stored row, including the id the store assigned.
    async fn create(&self, collection: Collection, body: &Value) -> Result<Value>;

    async fn update(&self, collection: Collection, id: &EntityId, body: &Value) -> Result<Value>;

    async fn delete(&self, collection: Collection, id: &EntityId) -> Result<()>;

    /// Reads all five collections concurrently and decodes them.
    async fn fetch_snapshot(&self) -> Result<CrmSnapshot> {
        let (rms, channel_partners, meetings, sales, targets) = tokio::try_join!(
            self.list(Collection::Rms),
            self.list(Collection::ChannelPartners),
            self.list(Collection::Meetings),
            self.list(Collection::Sales),
            self.list(Collection::Targets),
        )?;

        let snapshot = CrmSnapshot {
            rms: decode_rows(Collection::Rms, rms),
            channel_partners: decode_rows(Collection::ChannelPartners, channel_partners),
            meetings: decode_rows(Collection::Meetings, meetings),
            sales: decode_rows(Collection::Sales, sales),
            targets: decode_rows(Collection::Targets, targets),
        };

        tracing::debug!(
            store = self.store_name(),
            rms = snapshot.rms.len(),
            channel_partners = snapshot.channel_partners.len(),
            meetings = snapshot.meetings.len(),
            sales = snapshot.sales.len(),
            targets = snapshot.targets.len(),
            "fetched CRM snapshot"
        );

        Ok(snapshot)
    }
}

/// Decodes rows one by one; a row that cannot be decoded is skipped so one
/// bad record does not blank the whole dashboard.
pub fn decode_rows<T: DeserializeOwned>(collection: Collection, rows: Vec<Value>) -> Vec<T> {
    let mut out = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<T>(row) {
            Ok(v) => out.push(v),
            Err(err) => {
                tracing::warn!(collection = collection.path(), idx, error = %err, "skipping undecodable row");
            }
        }
    }
    out
}
