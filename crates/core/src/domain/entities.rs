use crate::domain::ids::{optional_id, EntityId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RmStatus {
    #[default]
    Active,
    Inactive,
}

impl<'de> Deserialize<'de> for RmStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = optional_text(deserializer)?;
        Ok(match raw.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("inactive") => RmStatus::Inactive,
            _ => RmStatus::Active,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingOutcome {
    Interested,
    NotInterested,
    FollowUp,
    DealWin,
    Other,
}

impl MeetingOutcome {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "interested" => Self::Interested,
            "not_interested" => Self::NotInterested,
            "follow_up" | "followup" => Self::FollowUp,
            "deal_win" | "dealwin" | "won" => Self::DealWin,
            _ => Self::Other,
        }
    }
}

impl<'de> Deserialize<'de> for MeetingOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = optional_text(deserializer)?;
        Ok(raw.as_deref().map_or(Self::Other, Self::parse))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipManager {
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub email: Option<String>,
    #[serde(default)]
    pub status: RmStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelPartner {
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, deserialize_with = "optional_id")]
    pub rm_id: Option<EntityId>,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub cp_name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub onboard_date: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, deserialize_with = "optional_id")]
    pub rm_id: Option<EntityId>,
    #[serde(default, deserialize_with = "optional_id")]
    pub cp_id: Option<EntityId>,
    #[serde(default, deserialize_with = "optional_text")]
    pub meeting_date: Option<String>,
    #[serde(default)]
    pub outcome: Option<MeetingOutcome>,
    #[serde(default, deserialize_with = "optional_text")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, deserialize_with = "optional_id")]
    pub rm_id: Option<EntityId>,
    #[serde(default, deserialize_with = "optional_id")]
    pub cp_id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub sale_amount: f64,
    #[serde(default, deserialize_with = "optional_text")]
    pub sale_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub commission_amount: f64,
}

/// Per-RM, per-period quota. `period` is a key such as `"march-2026"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, deserialize_with = "optional_id")]
    pub rm_id: Option<EntityId>,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub period: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub cp_onboarding_target: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub active_cp_target: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub meetings_target: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub revenue_target: f64,
}

impl Target {
    pub fn matches_period(&self, key: &str) -> bool {
        self.period.trim().eq_ignore_ascii_case(key)
    }
}

/// Clamps a stored quantity to a usable non-negative finite number.
pub fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

// Form posts often store numbers as strings, and older rows may hold nulls.
// Anything that is not a number or a numeric string decodes as 0.
fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_text(deserializer)?.unwrap_or_default())
}
