//! `serde_json` interop: converting state to and from JSON, typed snapshots,
//! and decoding actions from their wire form.
//!
//! Wire form of an action:
//!
//! ```json
//! {"type": "UPDATE", "key": "count", "value": 3}
//! {"type": "DEEP_UPDATE", "path": "user.tags[0]", "value": "admin"}
//! {"type": "BULK_UPDATE", "updates": {"a": 1, "b": 2}}
//! {"type": "RESET", "newState": {"a": 0}}
//! ```

use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Number};

use crate::action::{Action, Assign};
use crate::error::{StateError, StateResult};
use crate::path::Path;
use crate::value::{Record, Sequence, Value};

/// Integral numbers below 2^53 in magnitude, where every integer is exactly
/// representable as `f64`, are written as integers.
fn as_integer(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15).then_some(n as i64)
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::Seq(items.into_iter().map(Value::from).collect::<Sequence>())
            }
            serde_json::Value::Object(map) => Value::Map(record_from_map(map)),
        }
    }
}

fn record_from_map(map: Map<String, serde_json::Value>) -> Record {
    map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => match as_integer(*n) {
                Some(i) => serde_json::Value::Number(i.into()),
                None => Number::from_f64(*n).map_or(serde_json::Value::Null, serde_json::Value::Number),
            },
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Seq(s) => serde_json::Value::Array(s.iter().map(serde_json::Value::from).collect()),
            Value::Map(m) => m.to_json(),
        }
    }
}

impl Record {
    pub fn from_json(json: serde_json::Value) -> StateResult<Record> {
        match json {
            serde_json::Value::Object(map) => Ok(record_from_map(map)),
            other => Err(StateError::NotAMapping {
                found: Value::from(other).type_name(),
            }),
        }
    }

    /// Record from any serializable struct or map.
    pub fn from_typed<T: Serialize>(value: &T) -> StateResult<Record> {
        Record::from_json(serde_json::to_value(value)?)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(k, v)| (k.to_owned(), serde_json::Value::from(v)))
                .collect(),
        )
    }

    /// Deserialize this snapshot into a typed view.
    pub fn to_typed<T: DeserializeOwned>(&self) -> StateResult<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => match as_integer(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Value::String(s) => serializer.serialize_str(s),
            Value::Seq(s) => {
                let mut seq = serializer.serialize_seq(Some(s.len()))?;
                for item in s.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(m) => m.serialize(serializer),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Action {
    /// Decode an action from its wire form. Unknown `type` tags decode to
    /// [`Action::Unrecognized`], which the reducer ignores.
    pub fn from_json(json: &serde_json::Value) -> StateResult<Action> {
        let obj = json.as_object().ok_or(StateError::InvalidField {
            field: "action",
            expected: "an object",
        })?;
        let tag = obj
            .get("type")
            .ok_or(StateError::MissingField("type"))?
            .as_str()
            .ok_or(StateError::InvalidField {
                field: "type",
                expected: "a string",
            })?;

        let action = match tag {
            "UPDATE" => Action::Update {
                key: str_field(obj, "key")?.to_owned(),
                assign: value_field(obj)?,
            },
            "DEEP_UPDATE" => Action::DeepUpdate {
                path: Path::parse(str_field(obj, "path")?),
                assign: value_field(obj)?,
            },
            "BULK_UPDATE" => Action::BulkUpdate {
                updates: record_field(obj, "updates")?.ok_or(StateError::MissingField("updates"))?,
            },
            "RESET" => Action::Reset {
                new_state: record_field(obj, "newState")?,
            },
            other => Action::Unrecognized(other.to_owned()),
        };
        Ok(action)
    }
}

fn str_field<'a>(obj: &'a Map<String, serde_json::Value>, field: &'static str) -> StateResult<&'a str> {
    obj.get(field)
        .ok_or(StateError::MissingField(field))?
        .as_str()
        .ok_or(StateError::InvalidField {
            field,
            expected: "a string",
        })
}

fn value_field(obj: &Map<String, serde_json::Value>) -> StateResult<Assign> {
    let value = obj.get("value").ok_or(StateError::MissingField("value"))?;
    Ok(Assign::Literal(Value::from(value.clone())))
}

/// Absent or `null` is `None`; anything other than an object is an error.
fn record_field(
    obj: &Map<String, serde_json::Value>,
    field: &'static str,
) -> StateResult<Option<Record>> {
    match obj.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Object(map)) => Ok(Some(record_from_map(map.clone()))),
        Some(_) => Err(StateError::InvalidField {
            field,
            expected: "an object",
        }),
    }
}
