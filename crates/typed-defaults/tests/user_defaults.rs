//! Integration tests for typed access through every store backend

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use typed_defaults::{
    register_defaults_key, Data, DefaultsSettings, Json, Key, MemoryStore, SqliteStore,
    StoreConfiguration, UserDefaults, Url, Value,
};

register_defaults_key!(const BOOL: bool = "bool");
register_defaults_key!(const INT: i64 = "integer");
register_defaults_key!(const FLOAT: f32 = "float");
register_defaults_key!(const DOUBLE: f64 = "double");
register_defaults_key!(const STRING: String = "string");
register_defaults_key!(const DATA: Data = "data");
register_defaults_key!(const DATE: DateTime<Utc> = "date");
register_defaults_key!(const URL: Url = "url");

register_defaults_key!(const BOOL_ARRAY: Vec<bool> = "boolArray");
register_defaults_key!(const INT_ARRAY: Vec<i64> = "intArray");
register_defaults_key!(const FLOAT_ARRAY: Vec<f32> = "floatArray");
register_defaults_key!(const DOUBLE_ARRAY: Vec<f64> = "doubleArray");
register_defaults_key!(const STRING_ARRAY: Vec<String> = "stringArray");
register_defaults_key!(const DATA_ARRAY: Vec<Data> = "dataArray");
register_defaults_key!(const DATE_ARRAY: Vec<DateTime<Utc>> = "dateArray");
register_defaults_key!(const URL_ARRAY: Vec<Url> = "urlArray");

register_defaults_key!(const BOOL_DICTIONARY: HashMap<String, bool> = "boolDictionary");
register_defaults_key!(const INT_DICTIONARY: HashMap<String, i64> = "intDictionary");
register_defaults_key!(const FLOAT_DICTIONARY: HashMap<String, f32> = "floatDictionary");
register_defaults_key!(const DOUBLE_DICTIONARY: HashMap<String, f64> = "doubleDictionary");
register_defaults_key!(const STRING_DICTIONARY: BTreeMap<String, String> = "stringDictionary");
register_defaults_key!(const DATA_DICTIONARY: BTreeMap<String, Data> = "dataDictionary");
register_defaults_key!(const DATE_DICTIONARY: BTreeMap<String, DateTime<Utc>> = "dateDictionary");
register_defaults_key!(const URL_DICTIONARY: BTreeMap<String, Url> = "urlDictionary");

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
struct SomeCodable {
    string: String,
    integer: i64,
}

register_defaults_key!(const CODABLE: Json<SomeCodable> = "codable");

/// One accessor per backend, each over an empty store.
fn backends() -> Vec<UserDefaults> {
    vec![
        UserDefaults::new(Arc::new(MemoryStore::new("com.example.tests").unwrap())),
        UserDefaults::new(Arc::new(
            SqliteStore::open_in_memory("com.example.tests").unwrap(),
        )),
    ]
}

fn date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 10, 21, 16, 29, 0).unwrap()
        + chrono::Duration::nanoseconds(123_456_789)
}

fn url(text: &str) -> Url {
    Url::parse(text).unwrap()
}

fn map<T>(value: T) -> BTreeMap<String, T> {
    BTreeMap::from([("key".to_string(), value)])
}

fn hash_map<T>(value: T) -> HashMap<String, T> {
    HashMap::from([("key".to_string(), value)])
}

#[test]
fn test_count_roundtrip() {
    for defaults in backends() {
        let count: Key<i64> = Key::new("count");
        defaults.set(count, 42);
        assert_eq!(defaults.get(count), 42);
    }
}

#[test]
fn test_missing_string() {
    for defaults in backends() {
        let missing: Key<String> = Key::new("missing");
        assert_eq!(defaults.get(missing), None);
        assert_eq!(defaults.value(missing), "");
    }
}

#[test]
fn test_tags_keep_order() {
    for defaults in backends() {
        let tags: Key<Vec<String>> = Key::new("tags");
        defaults.set(tags, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            defaults.get(tags),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }
}

#[test]
fn test_url_is_stored_as_string() {
    for defaults in backends() {
        let site: Key<Url> = Key::new("site");
        defaults.set(site, url("https://example.com"));

        assert_eq!(defaults.get(site), Some(url("https://example.com")));
        assert_eq!(
            defaults.object("site"),
            Some(Value::String("https://example.com/".to_string()))
        );
    }
}

#[test]
fn test_clear_all() {
    for defaults in backends() {
        defaults.set(BOOL, true);
        defaults.set(INT, 42);
        defaults.set(STRING, "String".to_string());
        defaults.set(URL_ARRAY, vec![url("https://github.com/")]);

        defaults.clear_all();

        assert!(!defaults.get(BOOL));
        assert_eq!(defaults.get(INT), 0);
        assert_eq!(defaults.get(STRING), None);
        assert_eq!(defaults.get(URL_ARRAY), None);
        assert!(defaults.keys().is_empty());
    }
}

#[test]
fn test_single_values() {
    for defaults in backends() {
        defaults.set(BOOL, true);
        defaults.set(INT, 42);
        defaults.set(FLOAT, 42.0);
        defaults.set(DOUBLE, 42.0);
        defaults.set(STRING, "String".to_string());
        defaults.set(DATA, Data::new(vec![1, 0, 1, 0]));
        defaults.set(DATE, date());
        defaults.set(URL, url("https://github.com/"));

        assert!(defaults.get(BOOL));
        assert_eq!(defaults.get(INT), 42);
        assert_eq!(defaults.get(FLOAT), 42.0);
        assert_eq!(defaults.get(DOUBLE), 42.0);
        assert_eq!(defaults.get(STRING), Some("String".to_string()));
        assert_eq!(defaults.get(DATA), Some(Data::new(vec![1, 0, 1, 0])));
        assert_eq!(defaults.get(DATE), Some(date()));
        assert_eq!(defaults.get(URL), Some(url("https://github.com/")));
    }
}

#[test]
fn test_float_precision_is_kept() {
    for defaults in backends() {
        defaults.set(FLOAT, 0.1);
        defaults.set(DOUBLE, 0.1);

        assert_eq!(defaults.get(FLOAT), 0.1f32);
        assert_eq!(defaults.get(DOUBLE), 0.1f64);
    }
}

#[test]
fn test_arrays() {
    for defaults in backends() {
        defaults.set(BOOL_ARRAY, vec![true, false]);
        defaults.set(INT_ARRAY, vec![42, 11]);
        defaults.set(FLOAT_ARRAY, vec![42.0, 11.0]);
        defaults.set(DOUBLE_ARRAY, vec![42.0, 11.0]);
        defaults.set(
            STRING_ARRAY,
            vec!["String".to_string(), "Array".to_string()],
        );
        defaults.set(
            DATA_ARRAY,
            vec![Data::new(vec![1, 0, 1, 0]), Data::new(vec![0, 1, 0, 1])],
        );
        defaults.set(DATE_ARRAY, vec![date(), date()]);
        defaults.set(
            URL_ARRAY,
            vec![url("https://github.com/"), url("https://example.com/")],
        );

        assert_eq!(defaults.get(BOOL_ARRAY), Some(vec![true, false]));
        assert_eq!(defaults.get(INT_ARRAY), Some(vec![42, 11]));
        assert_eq!(defaults.get(FLOAT_ARRAY), Some(vec![42.0, 11.0]));
        assert_eq!(defaults.get(DOUBLE_ARRAY), Some(vec![42.0, 11.0]));
        assert_eq!(
            defaults.get(STRING_ARRAY),
            Some(vec!["String".to_string(), "Array".to_string()])
        );
        assert_eq!(
            defaults.get(DATA_ARRAY),
            Some(vec![Data::new(vec![1, 0, 1, 0]), Data::new(vec![0, 1, 0, 1])])
        );
        assert_eq!(defaults.get(DATE_ARRAY), Some(vec![date(), date()]));
        assert_eq!(
            defaults.get(URL_ARRAY),
            Some(vec![url("https://github.com/"), url("https://example.com/")])
        );
    }
}

#[test]
fn test_dictionaries() {
    for defaults in backends() {
        defaults.set(BOOL_DICTIONARY, hash_map(true));
        defaults.set(INT_DICTIONARY, hash_map(42));
        defaults.set(FLOAT_DICTIONARY, hash_map(42.0));
        defaults.set(DOUBLE_DICTIONARY, hash_map(42.0));
        defaults.set(STRING_DICTIONARY, map("String".to_string()));
        defaults.set(DATA_DICTIONARY, map(Data::new(vec![1, 0, 1, 0])));
        defaults.set(DATE_DICTIONARY, map(date()));
        defaults.set(URL_DICTIONARY, map(url("https://github.com/")));

        assert_eq!(defaults.get(BOOL_DICTIONARY), Some(hash_map(true)));
        assert_eq!(defaults.get(INT_DICTIONARY), Some(hash_map(42)));
        assert_eq!(defaults.get(FLOAT_DICTIONARY), Some(hash_map(42.0)));
        assert_eq!(defaults.get(DOUBLE_DICTIONARY), Some(hash_map(42.0)));
        assert_eq!(
            defaults.get(STRING_DICTIONARY),
            Some(map("String".to_string()))
        );
        assert_eq!(
            defaults.get(DATA_DICTIONARY),
            Some(map(Data::new(vec![1, 0, 1, 0])))
        );
        assert_eq!(defaults.get(DATE_DICTIONARY), Some(map(date())));
        assert_eq!(
            defaults.get(URL_DICTIONARY),
            Some(map(url("https://github.com/")))
        );
    }
}

#[test]
fn test_absent_after_remove() {
    for defaults in backends() {
        defaults.set(BOOL, true);
        defaults.set(DOUBLE, 1.5);
        defaults.set(DATA, Data::new(vec![1]));
        defaults.set(INT_ARRAY, vec![1]);

        defaults.remove(BOOL);
        defaults.remove(DOUBLE);
        defaults.remove(DATA);
        defaults.remove(INT_ARRAY);

        assert!(!defaults.get(BOOL));
        assert_eq!(defaults.get(DOUBLE), 0.0);
        assert_eq!(defaults.get(DATA), None);
        assert_eq!(defaults.get(INT_ARRAY), None);
    }
}

#[test]
fn test_remove_absent_key_leaves_store_unchanged() {
    for defaults in backends() {
        defaults.set(STRING, "kept".to_string());
        let before = defaults.dictionary_representation();

        defaults.remove(INT);
        defaults.remove(INT);

        assert_eq!(defaults.dictionary_representation(), before);
    }
}

#[test]
fn test_codable() {
    for defaults in backends() {
        let value = SomeCodable {
            string: "StringValue".to_string(),
            integer: 42,
        };

        assert_eq!(defaults.get(CODABLE), None);
        assert_eq!(defaults.value(CODABLE).into_inner(), SomeCodable::default());

        defaults.set(CODABLE, Json(value.clone()));
        assert_eq!(defaults.get(CODABLE), Some(Json(value)));
    }
}

#[test]
fn test_codable_with_changed_type_reads_as_absent() {
    for defaults in backends() {
        defaults.set(Key::<Json<Vec<i64>>>::new("codable"), Json(vec![1, 2]));
        assert_eq!(defaults.get(CODABLE), None);
    }
}

#[test]
fn test_untyped_dictionary_of_urls() {
    for defaults in backends() {
        let urls = map(url("https://github.com/"));
        defaults.set_object("links", urls.clone());

        assert_eq!(
            defaults.get_named::<BTreeMap<String, Url>>("links"),
            Some(urls)
        );
    }
}

#[test]
fn test_untyped_value_key() {
    for defaults in backends() {
        let any: Key<Value> = Key::new("any");
        defaults.set(any, Value::from(vec![true, false]));

        assert_eq!(
            defaults.get(any),
            Some(Value::Array(vec![Value::Bool(true), Value::Bool(false)]))
        );
    }
}

#[test]
fn test_open_with_settings_persists() {
    let dir = tempfile::tempdir().unwrap();
    let settings = DefaultsSettings {
        domain: "com.example.tests".to_string(),
        store: StoreConfiguration::Sqlite {
            file_path: dir.path().join("preferences.sqlite"),
        },
        synchronize_on_write: true,
    };

    {
        let defaults = UserDefaults::open(settings.clone()).unwrap();
        defaults.set(STRING_ARRAY, vec!["persisted".to_string()]);
        defaults.set(DATE, date());
    }

    let defaults = UserDefaults::open(settings).unwrap();
    assert_eq!(defaults.domain(), "com.example.tests");
    assert_eq!(
        defaults.get(STRING_ARRAY),
        Some(vec!["persisted".to_string()])
    );
    assert_eq!(defaults.get(DATE), Some(date()));
}
