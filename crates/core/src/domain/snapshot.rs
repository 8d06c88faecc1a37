use crate::domain::entities::{ChannelPartner, Meeting, RelationshipManager, Sale, Target};
use serde::{Deserialize, Serialize};

/// One consistent read of the five CRM collections.
///
/// The field names match the top-level keys of a json-server `db.json`, so a
/// database file decodes straight into this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrmSnapshot {
    #[serde(default)]
    pub rms: Vec<RelationshipManager>,
    #[serde(default)]
    pub channel_partners: Vec<ChannelPartner>,
    #[serde(default)]
    pub meetings: Vec<Meeting>,
    #[serde(default)]
    pub sales: Vec<Sale>,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl CrmSnapshot {
    pub fn from_db_json(text: &str) -> anyhow::Result<Self> {
        use anyhow::Context;
        serde_json::from_str(text).context("db.json does not match the CRM collection layout")
    }
}
