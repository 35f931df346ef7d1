//! Dynamically typed values for the untyped, name-keyed API.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use chrono::{DateTime, Utc};
use thiserror::Error;
use typed_defaults_store::StoredValue;
use url::Url;

use crate::Data;

/// A value of any shape, as accepted by
/// [`UserDefaults::set_object`](crate::UserDefaults::set_object).
///
/// Only a subset of the values this enum can express may actually be stored: scalars, and arrays
/// or dictionaries whose members are all scalars of the same [`Shape`]. See [`Value::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Integer(i64),
    /// A single precision number, widened when stored.
    Float(f32),
    /// A double precision number.
    Double(f64),
    /// A text string.
    String(String),
    /// A binary blob.
    Data(Data),
    /// A point in time.
    Date(DateTime<Utc>),
    /// Persisted as its string form.
    Url(Url),
    /// An ordered list of scalars sharing one shape.
    Array(Vec<Value>),
    /// String-keyed scalars sharing one shape.
    Dictionary(BTreeMap<String, Value>),
}

/// The category a [`Value`] belongs to.
///
/// All numeric variants share [`Shape::Number`], so an array may mix booleans, integers and
/// floating point numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Booleans, integers and floating point numbers.
    Number,
    /// Text strings.
    String,
    /// Binary blobs.
    Data,
    /// Points in time.
    Date,
    /// URLs.
    Url,
    /// Arrays.
    Array,
    /// Dictionaries.
    Dictionary,
}

impl Shape {
    fn is_collection(self) -> bool {
        matches!(self, Shape::Array | Shape::Dictionary)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Number => "number",
            Shape::String => "string",
            Shape::Data => "data",
            Shape::Date => "date",
            Shape::Url => "URL",
            Shape::Array => "array",
            Shape::Dictionary => "dictionary",
        };
        f.write_str(name)
    }
}

/// A value whose shape cannot be stored.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValueShapeError {
    /// A collection contains another collection.
    #[error("Collections may only contain scalar values")]
    NestedCollection,

    /// A collection contains scalars of more than one shape.
    #[error("Collection mixes {expected} and {found} values")]
    Mixed {
        /// Shape of the first member.
        expected: Shape,
        /// Shape of the first member that differs from it.
        found: Shape,
    },
}

impl Value {
    /// The shape of this value.
    pub fn shape(&self) -> Shape {
        match self {
            Value::Bool(_) | Value::Integer(_) | Value::Float(_) | Value::Double(_) => {
                Shape::Number
            }
            Value::String(_) => Shape::String,
            Value::Data(_) => Shape::Data,
            Value::Date(_) => Shape::Date,
            Value::Url(_) => Shape::Url,
            Value::Array(_) => Shape::Array,
            Value::Dictionary(_) => Shape::Dictionary,
        }
    }

    /// Check that this value can be stored.
    ///
    /// Scalars are always accepted. Arrays and dictionaries are accepted when every member is a
    /// scalar and all members share one shape. Empty collections are accepted.
    pub fn validate(&self) -> Result<(), ValueShapeError> {
        match self {
            Value::Array(items) => homogeneous(items.iter()),
            Value::Dictionary(entries) => homogeneous(entries.values()),
            _ => Ok(()),
        }
    }

    /// Returns the string if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the number as an integer if this is a numeric value.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Bool(value) => Some(i64::from(value)),
            Value::Integer(value) => Some(value),
            Value::Float(value) => Some(value as i64),
            Value::Double(value) => Some(value as i64),
            _ => None,
        }
    }

    /// Returns the number as a double if this is a numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Bool(value) => Some(f64::from(u8::from(value))),
            Value::Integer(value) => Some(value as f64),
            Value::Float(value) => Some(f64::from(value)),
            Value::Double(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the members if this is a [`Value::Array`].
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a [`Value::Dictionary`].
    pub fn as_dictionary(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }
}

pub(crate) fn homogeneous<'a>(
    members: impl Iterator<Item = &'a Value>,
) -> Result<(), ValueShapeError> {
    let mut expected = None;
    for member in members {
        let found = member.shape();
        if found.is_collection() {
            return Err(ValueShapeError::NestedCollection);
        }
        match expected {
            None => expected = Some(found),
            Some(expected) if expected != found => {
                return Err(ValueShapeError::Mixed { expected, found });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

impl From<Value> for StoredValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(value) => StoredValue::Bool(value),
            Value::Integer(value) => StoredValue::Integer(value),
            Value::Float(value) => StoredValue::Real(f64::from(value)),
            Value::Double(value) => StoredValue::Real(value),
            Value::String(value) => StoredValue::String(value),
            Value::Data(value) => StoredValue::Data(value.into_bytes()),
            Value::Date(value) => StoredValue::Date(value),
            Value::Url(value) => StoredValue::String(value.into()),
            Value::Array(items) => StoredValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Dictionary(entries) => StoredValue::Dictionary(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.into()))
                    .collect(),
            ),
        }
    }
}

/// Stored values carry no URL marker, so URLs come back as [`Value::String`] and reals as
/// [`Value::Double`].
impl From<StoredValue> for Value {
    fn from(value: StoredValue) -> Self {
        match value {
            StoredValue::Bool(value) => Value::Bool(value),
            StoredValue::Integer(value) => Value::Integer(value),
            StoredValue::Real(value) => Value::Double(value),
            StoredValue::String(value) => Value::String(value),
            StoredValue::Data(value) => Value::Data(value.into()),
            StoredValue::Date(value) => Value::Date(value),
            StoredValue::Array(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            StoredValue::Dictionary(entries) => Value::Dictionary(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.into()))
                    .collect(),
            ),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i64 => Integer,
    i32 => Integer,
    u32 => Integer,
    f32 => Float,
    f64 => Double,
    String => String,
    &str => String,
    Data => Data,
    DateTime<Utc> => Date,
    Url => Url,
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(entries: BTreeMap<String, T>) -> Self {
        Value::Dictionary(
            entries
                .into_iter()
                .map(|(key, value)| (key, value.into()))
                .collect(),
        )
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(entries: HashMap<String, T>) -> Self {
        Value::Dictionary(
            entries
                .into_iter()
                .map(|(key, value)| (key, value.into()))
                .collect(),
        )
    }
}
