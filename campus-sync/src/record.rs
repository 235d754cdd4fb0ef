//! Record identity and field-level merging.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{ResourceError, Result};

/// Name of the identifier field on every record.
pub const ID_FIELD: &str = "id";

/// Opaque record identifier.
///
/// The server may send ids as numbers or strings. Two ids are equal when
/// their textual forms match, so `7` and `"7"` address the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl RecordId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Int),
            Value::String(s) if !s.is_empty() => Some(RecordId::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Str(id) => f.write_str(id),
        }
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RecordId::Int(a), RecordId::Int(b)) => a == b,
            (RecordId::Str(a), RecordId::Str(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        id.parse().unwrap_or_else(|_| RecordId::Str(id.to_string()))
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId::from(id.as_str())
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(n) => RecordId::Int(n),
            Err(_) => RecordId::Str(s.to_string()),
        })
    }
}

/// Fields returned by the server after a field toggle.
///
/// May be a full record or only the fields that changed. Only the keys
/// present here are applied to the local record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordPatch(Map<String, Value>);

impl RecordPatch {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Identifier echoed by the server, if any.
    pub fn id(&self) -> Option<RecordId> {
        self.0.get(ID_FIELD).and_then(RecordId::from_value)
    }
}

impl From<Map<String, Value>> for RecordPatch {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// A value held in a resource collection.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identifier used to match local and server copies.
    fn id(&self) -> RecordId;

    /// Return a copy of `self` with the patch's fields written over it.
    ///
    /// The identifier is never rewritten. Fields absent from the patch keep
    /// their current values.
    fn apply_patch(&self, patch: &RecordPatch) -> Result<Self> {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                return Err(ResourceError::Decode(
                    "record does not serialize to an object".to_string(),
                ));
            }
            Err(e) => return Err(ResourceError::Decode(e.to_string())),
        };
        for (key, value) in patch.fields() {
            if key != ID_FIELD {
                fields.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| ResourceError::Decode(format!("cannot apply patch: {}", e)))
    }
}

/// Schema-less record: any JSON object with an `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct DynamicRecord {
    id: RecordId,
    fields: Map<String, Value>,
}

impl DynamicRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Map<String, Value>> for DynamicRecord {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let id = fields
            .get(ID_FIELD)
            .and_then(RecordId::from_value)
            .ok_or_else(|| "record has no usable `id` field".to_string())?;
        Ok(Self { id, fields })
    }
}

impl From<DynamicRecord> for Map<String, Value> {
    fn from(record: DynamicRecord) -> Self {
        record.fields
    }
}

impl Record for DynamicRecord {
    fn id(&self) -> RecordId {
        self.id.clone()
    }

    fn apply_patch(&self, patch: &RecordPatch) -> Result<Self> {
        let mut fields = self.fields.clone();
        for (key, value) in patch.fields() {
            if key != ID_FIELD {
                fields.insert(key.clone(), value.clone());
            }
        }
        Ok(Self {
            id: self.id.clone(),
            fields,
        })
    }
}
