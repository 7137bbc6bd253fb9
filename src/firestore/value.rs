use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Document payload: field name -> typed value.
pub type Fields = BTreeMap<String, FieldValue>;

/// A Firestore typed value, serialized exactly as the REST API expects it:
/// `{"stringValue": "..."}`, `{"integerValue": "42"}`, and so on.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    NullValue(#[serde(with = "null_value")] ()),
    BooleanValue(bool),
    /// int64 travels as a decimal string on the wire.
    IntegerValue(#[serde(with = "int64_string")] i64),
    DoubleValue(f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct MapValue {
    #[serde(default)]
    pub fields: Fields,
}

impl FieldValue {
    pub fn null() -> Self {
        Self::NullValue(())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::NullValue(()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::StringValue(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::IntegerValue(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value regardless of integer/double encoding.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::IntegerValue(n) => Some(*n as f64),
            Self::DoubleValue(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::TimestampValue(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_millis(&self) -> Option<i64> {
        self.as_timestamp().map(|ts| ts.timestamp_millis())
    }

    /// Convert an untyped JSON value. Objects become maps, numbers become
    /// integers when they fit in i64.
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::null(),
            Value::Bool(b) => Self::BooleanValue(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::IntegerValue(i),
                None => Self::DoubleValue(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::StringValue(s),
            Value::Array(items) => Self::ArrayValue(ArrayValue {
                values: items.into_iter().map(Self::from_json).collect(),
            }),
            Value::Object(map) => Self::MapValue(MapValue {
                fields: map
                    .into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            }),
        }
    }
}

/// Build a payload from a JSON object. Non-object input yields an empty payload.
pub fn fields_from_json(value: serde_json::Value) -> Fields {
    match FieldValue::from_json(value) {
        FieldValue::MapValue(map) => map.fields,
        _ => Fields::new(),
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::StringValue(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::StringValue(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::IntegerValue(n)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::DoubleValue(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::BooleanValue(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::TimestampValue(ts)
    }
}

mod null_value {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(_: &(), s: S) -> Result<S::Ok, S::Error> {
        s.serialize_unit()
    }

    // Accepts both `null` and the enum spelling `"NULL_VALUE"`.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<(), D::Error> {
        serde::de::IgnoredAny::deserialize(d).map(|_| ())
    }
}

mod int64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(n: &i64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&n.to_string())
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Str(String),
        Num(i64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Num(n) => Ok(n),
            Repr::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
