//! Values pushed to, and received from, the renderer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const FIELD_NUMBER: &str = "number";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_IS_PERSONAL: &str = "isPersonal";
pub const FIELD_NAME: &str = "name";

/// Call status label carried in the `status` field of a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    Ringing,
    Active,
    Dialing,
}

impl CallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Ringing => "RINGING",
            CallStatus::Active => "ACTIVE",
            CallStatus::Dialing => "DIALING",
        }
    }
}

/// Field map exchanged with the renderer.
///
/// Fields are loosely typed on purpose: a field with an unexpected type is
/// reported as absent by the accessors rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayPayload {
    fields: BTreeMap<String, Value>,
}

impl OverlayPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_call(number: impl Into<String>, status: CallStatus) -> Self {
        let mut payload = Self::new();
        payload.set(FIELD_NUMBER, number.into());
        payload.set(FIELD_STATUS, status.as_str());
        payload
    }

    /// Accepts only JSON objects; anything else is not a payload.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::from(map)),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn number(&self) -> Option<&str> {
        self.str_field(FIELD_NUMBER)
    }

    pub fn status(&self) -> Option<&str> {
        self.str_field(FIELD_STATUS)
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field(FIELD_NAME)
    }

    pub fn is_personal(&self) -> Option<bool> {
        self.fields.get(FIELD_IS_PERSONAL).and_then(Value::as_bool)
    }

    /// Copies the caller-identity fields (`name`, `isPersonal`) from `other`
    /// without touching number or status.
    pub fn adopt_identity(&mut self, other: &OverlayPayload) {
        for key in [FIELD_NAME, FIELD_IS_PERSONAL] {
            if let Some(value) = other.fields.get(key) {
                self.fields.insert(key.to_string(), value.clone());
            }
        }
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl From<Map<String, Value>> for OverlayPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            fields: map.into_iter().collect(),
        }
    }
}
