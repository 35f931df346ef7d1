use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value in the representation the preference store persists natively.
///
/// This mirrors the property-list model of platform preference databases: strings, numbers,
/// blobs, timestamps and collections of those. There is deliberately no URL variant, URLs are
/// persisted as their string form by the layers above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum StoredValue {
    /// A boolean number.
    Bool(bool),
    /// A signed integer number.
    Integer(i64),
    /// A floating point number. Single precision values are widened on write.
    Real(#[serde(with = "real")] f64),
    /// A UTF-8 string.
    String(String),
    /// An opaque binary blob.
    Data(#[serde(with = "b64")] Vec<u8>),
    /// A point in time.
    Date(DateTime<Utc>),
    /// An ordered list of values.
    Array(Vec<StoredValue>),
    /// A string-keyed mapping of values.
    Dictionary(BTreeMap<String, StoredValue>),
}

impl StoredValue {
    /// Short name of the variant, used in log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            StoredValue::Bool(_) => "bool",
            StoredValue::Integer(_) => "integer",
            StoredValue::Real(_) => "real",
            StoredValue::String(_) => "string",
            StoredValue::Data(_) => "data",
            StoredValue::Date(_) => "date",
            StoredValue::Array(_) => "array",
            StoredValue::Dictionary(_) => "dictionary",
        }
    }

    /// Returns `true` for the variants the platform treats as a number.
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            StoredValue::Bool(_) | StoredValue::Integer(_) | StoredValue::Real(_)
        )
    }
}

/// Blobs are written as standard base64 so the persisted form stays plain text.
mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

/// JSON has no representation for NaN or the infinities, so those are written as strings.
mod real {
    use serde::{Deserialize, Deserializer, Serializer};

    const NAN: &str = "NaN";
    const INFINITY: &str = "inf";
    const NEG_INFINITY: &str = "-inf";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str(NAN)
        } else if value.is_sign_positive() {
            serializer.serialize_str(INFINITY)
        } else {
            serializer.serialize_str(NEG_INFINITY)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => match text.as_str() {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                other => Err(serde::de::Error::custom(format!(
                    "invalid real value: {other}"
                ))),
            },
        }
    }
}
