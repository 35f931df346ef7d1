//! Type dispatch between Rust values and the store's native representation.
//!
//! The set of types that can be stored through a [`Key`](crate::Key) is closed. The traits in this
//! module are sealed; they exist so that [`UserDefaults`](crate::UserDefaults) can pick the right
//! encoding and return type at compile time.

use std::{
    any::type_name,
    collections::{BTreeMap, HashMap},
    path::Path,
};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::warn;
use typed_defaults_store::StoredValue;
use url::Url;

use crate::{
    object::{homogeneous, ValueShapeError},
    Value,
};

/// URL returned by [`UserDefaults::value`](crate::UserDefaults::value) when no URL is stored.
pub const PLACEHOLDER_URL: &str = "about:blank";

/// An error preventing a value from being converted into its stored form.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A structured value could not be serialized.
    #[error("Failed to serialize value: {0}")]
    Json(#[from] serde_json::Error),

    /// A dynamic value has a shape the store does not accept.
    #[error(transparent)]
    Shape(#[from] ValueShapeError),
}

/// An opaque binary blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Data(Vec<u8>);

impl Data {
    /// Wrap the given bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Data(bytes.into())
    }

    /// The wrapped bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Unwrap into the owned bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the blob holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Data {
    fn from(bytes: Vec<u8>) -> Self {
        Data(bytes)
    }
}

impl From<&[u8]> for Data {
    fn from(bytes: &[u8]) -> Self {
        Data(bytes.to_vec())
    }
}

impl From<Data> for Vec<u8> {
    fn from(data: Data) -> Self {
        data.0
    }
}

impl AsRef<[u8]> for Data {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A structured value stored as a JSON-encoded blob.
///
/// Any type implementing `Serialize` and `DeserializeOwned` can be kept in the store this way.
/// Values that fail to decode, for example after the type definition changed, read as absent.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use typed_defaults::{Json, Key, UserDefaults};
///
/// #[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
/// struct Window {
///     width: u32,
///     height: u32,
/// }
///
/// const WINDOW: Key<Json<Window>> = Key::new("window");
///
/// let defaults = UserDefaults::in_memory();
/// defaults.set(WINDOW, Json(Window { width: 800, height: 600 }));
///
/// assert_eq!(defaults.value(WINDOW).into_inner(), Window { width: 800, height: 600 });
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwrap the structured value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

mod private {
    pub trait Sealed {}
}

/// A type that can be stored under a [`Key`](crate::Key).
pub trait DefaultsValue: Sized + private::Sealed {
    /// What [`UserDefaults::get`](crate::UserDefaults::get) returns for this type.
    ///
    /// Primitive numbers and booleans return `Self`, with absent or unreadable values replaced by
    /// zero. Every other type returns `Option<Self>`.
    type Output;

    /// Convert into the store's native representation.
    fn to_stored(&self) -> Result<StoredValue, EncodeError>;

    /// Interpret a stored value, or `None` when it does not have a usable shape.
    fn from_stored(stored: StoredValue) -> Option<Self>;

    /// Build the [`Output`](DefaultsValue::Output) from the result of a read.
    fn output(value: Option<Self>) -> Self::Output;
}

/// A [`DefaultsValue`] with an empty value to substitute for absence.
pub trait Fallback: DefaultsValue {
    /// The value reported when nothing usable is stored.
    fn fallback() -> Self;
}

/// A scalar that can be a member of a stored array or dictionary.
pub trait Element: Sized + private::Sealed {
    /// Convert into the store's native representation.
    fn to_element(&self) -> StoredValue;

    /// Interpret a collection member. Numbers convert between numeric types; nothing else is
    /// converted.
    fn from_element(stored: StoredValue) -> Option<Self>;

    /// Check that `members` can be stored together in one collection. Typed scalars always can.
    fn validate_members<'a>(_members: impl Iterator<Item = &'a Self>) -> Result<(), ValueShapeError>
    where
        Self: 'a,
    {
        Ok(())
    }
}

fn read_bool(stored: &StoredValue) -> Option<bool> {
    match stored {
        StoredValue::Bool(value) => Some(*value),
        StoredValue::Integer(value) => Some(*value != 0),
        StoredValue::Real(value) => Some(*value != 0.0),
        StoredValue::String(text) => {
            let text = text.trim();
            if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("yes") {
                Some(true)
            } else if text.eq_ignore_ascii_case("false") || text.eq_ignore_ascii_case("no") {
                Some(false)
            } else {
                text.parse::<f64>().ok().map(|value| value != 0.0)
            }
        }
        _ => None,
    }
}

fn read_i64(stored: &StoredValue) -> Option<i64> {
    match stored {
        StoredValue::Bool(value) => Some(i64::from(*value)),
        StoredValue::Integer(value) => Some(*value),
        StoredValue::Real(value) => Some(*value as i64),
        StoredValue::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(|value| value as i64))
        }
        _ => None,
    }
}

fn read_f64(stored: &StoredValue) -> Option<f64> {
    match stored {
        StoredValue::Bool(value) => Some(f64::from(u8::from(*value))),
        StoredValue::Integer(value) => Some(*value as f64),
        StoredValue::Real(value) => Some(*value),
        StoredValue::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn read_f32(stored: &StoredValue) -> Option<f32> {
    read_f64(stored).map(|value| value as f32)
}

/// Accepts absolute URLs, and absolute filesystem paths as `file://` URLs.
fn parse_url(text: &str) -> Option<Url> {
    match Url::parse(text) {
        Ok(url) => Some(url),
        Err(_) if Path::new(text).is_absolute() => Url::from_file_path(text).ok(),
        Err(_) => None,
    }
}

macro_rules! primitive {
    ($ty:ty, $read:ident, |$value:ident| $stored:expr) => {
        impl private::Sealed for $ty {}

        impl Element for $ty {
            fn to_element(&self) -> StoredValue {
                let $value = *self;
                $stored
            }

            fn from_element(stored: StoredValue) -> Option<Self> {
                if stored.is_number() {
                    $read(&stored)
                } else {
                    None
                }
            }
        }

        impl DefaultsValue for $ty {
            type Output = $ty;

            fn to_stored(&self) -> Result<StoredValue, EncodeError> {
                Ok(self.to_element())
            }

            fn from_stored(stored: StoredValue) -> Option<Self> {
                $read(&stored)
            }

            fn output(value: Option<Self>) -> Self {
                value.unwrap_or_default()
            }
        }

        impl Fallback for $ty {
            fn fallback() -> Self {
                <$ty>::default()
            }
        }
    };
}

primitive!(bool, read_bool, |value| StoredValue::Bool(value));
primitive!(i64, read_i64, |value| StoredValue::Integer(value));
primitive!(f32, read_f32, |value| StoredValue::Real(f64::from(value)));
primitive!(f64, read_f64, |value| StoredValue::Real(value));

macro_rules! reference {
    ($ty:ty, fallback = $fallback:expr) => {
        impl DefaultsValue for $ty {
            type Output = Option<$ty>;

            fn to_stored(&self) -> Result<StoredValue, EncodeError> {
                Ok(self.to_element())
            }

            fn from_stored(stored: StoredValue) -> Option<Self> {
                Self::from_element(stored)
            }

            fn output(value: Option<Self>) -> Option<Self> {
                value
            }
        }

        impl Fallback for $ty {
            fn fallback() -> Self {
                $fallback
            }
        }
    };
}

impl private::Sealed for String {}
impl Element for String {
    fn to_element(&self) -> StoredValue {
        StoredValue::String(self.clone())
    }

    fn from_element(stored: StoredValue) -> Option<Self> {
        match stored {
            StoredValue::String(value) => Some(value),
            _ => None,
        }
    }
}
reference!(String, fallback = String::new());

impl private::Sealed for Data {}
impl Element for Data {
    fn to_element(&self) -> StoredValue {
        StoredValue::Data(self.0.clone())
    }

    fn from_element(stored: StoredValue) -> Option<Self> {
        match stored {
            StoredValue::Data(bytes) => Some(Data(bytes)),
            _ => None,
        }
    }
}
reference!(Data, fallback = Data::default());

impl private::Sealed for DateTime<Utc> {}
impl Element for DateTime<Utc> {
    fn to_element(&self) -> StoredValue {
        StoredValue::Date(*self)
    }

    fn from_element(stored: StoredValue) -> Option<Self> {
        match stored {
            StoredValue::Date(value) => Some(value),
            _ => None,
        }
    }
}
// The Unix epoch.
reference!(DateTime<Utc>, fallback = DateTime::<Utc>::default());

impl private::Sealed for Url {}
impl Element for Url {
    fn to_element(&self) -> StoredValue {
        StoredValue::String(self.as_str().to_string())
    }

    fn from_element(stored: StoredValue) -> Option<Self> {
        match stored {
            StoredValue::String(text) => parse_url(&text),
            _ => None,
        }
    }
}
reference!(
    Url,
    fallback = Url::parse(PLACEHOLDER_URL).expect("Placeholder URL should be valid")
);

impl<T: Element> private::Sealed for Vec<T> {}
impl<T: Element> DefaultsValue for Vec<T> {
    type Output = Option<Self>;

    fn to_stored(&self) -> Result<StoredValue, EncodeError> {
        T::validate_members(self.iter())?;
        Ok(StoredValue::Array(self.iter().map(T::to_element).collect()))
    }

    fn from_stored(stored: StoredValue) -> Option<Self> {
        match stored {
            StoredValue::Array(items) => items.into_iter().map(T::from_element).collect(),
            _ => None,
        }
    }

    fn output(value: Option<Self>) -> Option<Self> {
        value
    }
}
impl<T: Element> Fallback for Vec<T> {
    fn fallback() -> Self {
        Vec::new()
    }
}

macro_rules! dictionary {
    ($map:ident) => {
        impl<T: Element> private::Sealed for $map<String, T> {}
        impl<T: Element> DefaultsValue for $map<String, T> {
            type Output = Option<Self>;

            fn to_stored(&self) -> Result<StoredValue, EncodeError> {
                T::validate_members(self.values())?;
                Ok(StoredValue::Dictionary(
                    self.iter()
                        .map(|(key, value)| (key.clone(), value.to_element()))
                        .collect(),
                ))
            }

            fn from_stored(stored: StoredValue) -> Option<Self> {
                match stored {
                    StoredValue::Dictionary(entries) => entries
                        .into_iter()
                        .map(|(key, value)| T::from_element(value).map(|value| (key, value)))
                        .collect(),
                    _ => None,
                }
            }

            fn output(value: Option<Self>) -> Option<Self> {
                value
            }
        }
        impl<T: Element> Fallback for $map<String, T> {
            fn fallback() -> Self {
                $map::new()
            }
        }
    };
}

dictionary!(BTreeMap);
dictionary!(HashMap);

impl<T> private::Sealed for Json<T> {}
impl<T: Serialize + DeserializeOwned> DefaultsValue for Json<T> {
    type Output = Option<Self>;

    fn to_stored(&self) -> Result<StoredValue, EncodeError> {
        Ok(StoredValue::Data(serde_json::to_vec(&self.0)?))
    }

    fn from_stored(stored: StoredValue) -> Option<Self> {
        let StoredValue::Data(bytes) = stored else {
            return None;
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(Json(value)),
            Err(e) => {
                warn!("Failed to deserialize {}: {:?}", type_name::<T>(), e);
                None
            }
        }
    }

    fn output(value: Option<Self>) -> Option<Self> {
        value
    }
}
impl<T: Serialize + DeserializeOwned + Default> Fallback for Json<T> {
    fn fallback() -> Self {
        Json(T::default())
    }
}

// Any storable shape. Reads never fail; writes are checked with `Value::validate`.
impl private::Sealed for Value {}
impl DefaultsValue for Value {
    type Output = Option<Self>;

    fn to_stored(&self) -> Result<StoredValue, EncodeError> {
        self.validate()?;
        Ok(self.clone().into())
    }

    fn from_stored(stored: StoredValue) -> Option<Self> {
        Some(stored.into())
    }

    fn output(value: Option<Self>) -> Option<Self> {
        value
    }
}

// Members of untyped collections. Any stored member reads back; on write the members must be
// scalars of a single shape.
impl Element for Value {
    fn to_element(&self) -> StoredValue {
        self.clone().into()
    }

    fn from_element(stored: StoredValue) -> Option<Self> {
        Some(stored.into())
    }

    fn validate_members<'a>(members: impl Iterator<Item = &'a Self>) -> Result<(), ValueShapeError>
    where
        Self: 'a,
    {
        homogeneous(members)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde::Deserialize;

    use super::*;

    #[test]
    fn test_primitives_read_any_number() {
        assert!(bool::from_stored(StoredValue::Integer(2)).unwrap());
        assert!(!bool::from_stored(StoredValue::Real(0.0)).unwrap());
        assert_eq!(i64::from_stored(StoredValue::Bool(true)), Some(1));
        assert_eq!(i64::from_stored(StoredValue::Real(42.9)), Some(42));
        assert_eq!(f64::from_stored(StoredValue::Integer(3)), Some(3.0));
        assert_eq!(f32::from_stored(StoredValue::Real(0.5)), Some(0.5));
    }

    #[test]
    fn test_primitives_parse_strings() {
        let text = |text: &str| StoredValue::String(text.to_string());

        assert_eq!(bool::from_stored(text("YES")), Some(true));
        assert_eq!(bool::from_stored(text("true")), Some(true));
        assert_eq!(bool::from_stored(text("no")), Some(false));
        assert_eq!(bool::from_stored(text("1")), Some(true));
        assert_eq!(bool::from_stored(text("maybe")), None);
        assert_eq!(i64::from_stored(text(" 42 ")), Some(42));
        assert_eq!(i64::from_stored(text("4.2")), Some(4));
        assert_eq!(i64::from_stored(text("many")), None);
        assert_eq!(f64::from_stored(text("1.5")), Some(1.5));
    }

    #[test]
    fn test_primitive_output_defaults_to_zero() {
        assert!(!bool::output(bool::from_stored(StoredValue::Data(vec![1]))));
        assert_eq!(i64::output(None), 0);
        assert_eq!(f32::output(None), 0.0);
        assert_eq!(f64::output(None), 0.0);
    }

    #[test]
    fn test_references_are_strict() {
        assert_eq!(String::from_stored(StoredValue::Integer(1)), None);
        assert_eq!(Data::from_stored(StoredValue::String("a".into())), None);
        assert_eq!(DateTime::<Utc>::from_stored(StoredValue::Integer(0)), None);
        assert_eq!(Url::from_stored(StoredValue::String("not a url".into())), None);
    }

    #[test]
    fn test_url_from_path() {
        let url = Url::from_stored(StoredValue::String("/tmp/prefs".into())).unwrap();
        assert_eq!(url.scheme(), "file");
        assert_eq!(url.path(), "/tmp/prefs");
    }

    #[test]
    fn test_array_with_wrong_member_is_absent() {
        let stored = StoredValue::Array(vec![
            StoredValue::String("a".into()),
            StoredValue::Integer(1),
        ]);
        assert_eq!(Vec::<String>::from_stored(stored), None);
    }

    #[test]
    fn test_array_members_do_not_parse_strings() {
        let stored = StoredValue::Array(vec![StoredValue::String("1".into())]);
        assert_eq!(Vec::<i64>::from_stored(stored), None);

        let stored = StoredValue::Array(vec![StoredValue::Bool(true), StoredValue::Integer(0)]);
        assert_eq!(Vec::<bool>::from_stored(stored), Some(vec![true, false]));
    }

    #[test]
    fn test_dictionary_of_dates() {
        let date = Utc.with_ymd_and_hms(2015, 10, 21, 16, 29, 0).unwrap();
        let value = HashMap::from([("key".to_string(), date)]);

        let stored = value.to_stored().unwrap();
        assert_eq!(
            stored,
            StoredValue::Dictionary(BTreeMap::from([(
                "key".to_string(),
                StoredValue::Date(date)
            )]))
        );
        assert_eq!(
            HashMap::<String, DateTime<Utc>>::from_stored(stored),
            Some(value)
        );
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(String::fallback(), "");
        assert!(Data::fallback().is_empty());
        assert_eq!(DateTime::<Utc>::fallback().timestamp(), 0);
        assert_eq!(Url::fallback().as_str(), PLACEHOLDER_URL);
        assert!(Vec::<Url>::fallback().is_empty());
        assert!(BTreeMap::<String, f64>::fallback().is_empty());
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
    struct SomeCodable {
        string: String,
        integer: i64,
    }

    #[test]
    fn test_json_value() {
        let value = Json(SomeCodable {
            string: "StringValue".to_string(),
            integer: 42,
        });

        let stored = value.to_stored().unwrap();
        assert!(matches!(stored, StoredValue::Data(_)));
        assert_eq!(Json::<SomeCodable>::from_stored(stored), Some(value));
    }

    #[test]
    fn test_json_decode_failure_is_absent() {
        let stored = StoredValue::Data(br#"{"string": 42}"#.to_vec());
        assert_eq!(Json::<SomeCodable>::from_stored(stored), None);
        assert_eq!(
            Json::<SomeCodable>::from_stored(StoredValue::String("{}".into())),
            None
        );
    }

    #[test]
    fn test_value_members_roundtrip() {
        let items = vec![Value::from("a"), Value::from("b")];
        let stored = items.to_stored().unwrap();
        assert_eq!(Vec::<Value>::from_stored(stored), Some(items));

        let entries = BTreeMap::from([
            ("flag".to_string(), Value::Bool(true)),
            ("count".to_string(), Value::Integer(3)),
        ]);
        let stored = entries.to_stored().unwrap();
        assert_eq!(BTreeMap::<String, Value>::from_stored(stored), Some(entries));
    }

    #[test]
    fn test_value_members_must_share_a_shape() {
        let mixed = vec![Value::from("a"), Value::from(1)];
        assert!(matches!(
            mixed.to_stored(),
            Err(EncodeError::Shape(ValueShapeError::Mixed { .. }))
        ));

        let nested = HashMap::from([("inner".to_string(), Value::from(vec![1, 2]))]);
        assert!(matches!(
            nested.to_stored(),
            Err(EncodeError::Shape(ValueShapeError::NestedCollection))
        ));
    }

    #[test]
    fn test_value_validates_on_write() {
        let mixed = Value::from(vec![Value::from("a"), Value::from(1)]);
        assert!(matches!(mixed.to_stored(), Err(EncodeError::Shape(_))));
    }
}
