use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Canonical record identifier.
///
/// json-server hands ids back as numbers or strings depending on how the row
/// was created, so every id is normalized to a trimmed string at decode time.
/// Integral numbers render without a fractional part (`1`, `1.0` and `"1"`
/// are the same id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_f64(v: f64) -> Self {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 {
            Self((v as i64).to_string())
        } else {
            Self(v.to_string())
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct EntityIdVisitor;

impl<'de> Visitor<'de> for EntityIdVisitor {
    type Value = EntityId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or numeric id")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<EntityId, E> {
        Ok(EntityId::new(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<EntityId, E> {
        Ok(EntityId(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<EntityId, E> {
        Ok(EntityId(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<EntityId, E> {
        Ok(EntityId::from_f64(v))
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EntityIdVisitor)
    }
}

/// Decodes an optional foreign key. `null`, a missing field and a blank
/// string all mean "no reference".
pub(crate) fn optional_id<'de, D>(deserializer: D) -> Result<Option<EntityId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<EntityId>::deserialize(deserializer)?;
    Ok(raw.filter(|id| !id.is_empty()))
}
