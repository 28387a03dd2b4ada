use redis_store::{
    ConfigOverrides, KvBackend, MemoryBackend, RedisStore, StoreConfig, StoredValue,
    RECREATE_FROM_ENV,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn memory_store() -> (RedisStore, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let config = StoreConfig {
        host: "localhost".to_string(),
        port: 6379,
        ..Default::default()
    };
    let store = RedisStore::with_backend(config, backend.clone());
    (store, backend)
}

fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
    vars.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

#[tokio::test]
async fn test_round_trip_json_values() {
    let (store, _) = memory_store();

    let values = [
        json!(null),
        json!(true),
        json!(42),
        json!(-3.5),
        json!("text"),
        json!([1, "two", null, [3]]),
        json!({"a": 1, "b": "test", "nested": {"list": [1, 2, 3]}}),
    ];

    for (i, value) in values.iter().enumerate() {
        let key = format!("key{}", i);
        assert_ok!(store.set(&key, value).await);
        assert_eq!(
            store.get(&key).await.unwrap(),
            Some(StoredValue::Json(value.clone()))
        );
    }
}

#[tokio::test]
async fn test_set_overwrites() {
    let (store, _) = memory_store();
    store.set("k", "first").await.unwrap();
    store.set("k", &json!({"second": true})).await.unwrap();

    assert_eq!(
        store.get("k").await.unwrap(),
        Some(StoredValue::Json(json!({"second": true})))
    );
}

#[tokio::test]
async fn test_absent_key_is_not_an_error() {
    let (store, _) = memory_store();
    assert_eq!(assert_ok!(store.get("missing").await), None);
}

#[tokio::test]
async fn test_legacy_raw_value_returned_unchanged() {
    let (store, backend) = memory_store();
    backend.set_raw("legacy", "written by another system");

    assert_eq!(
        store.get("legacy").await.unwrap(),
        Some(StoredValue::Text("written by another system".to_string()))
    );
}

#[tokio::test]
async fn test_has() {
    let (store, _) = memory_store();
    store.set("test_key", "value").await.unwrap();

    assert!(store.has("test_key").await.unwrap());
    assert!(!store.has("missing_key").await.unwrap());
}

#[tokio::test]
async fn test_items() {
    let (store, _) = memory_store();
    store.set("k1", "v1").await.unwrap();
    store.set("k2", &json!({"deep": "value"})).await.unwrap();

    let items = store.items().await.unwrap();

    let mut expected = HashMap::new();
    expected.insert("k1".to_string(), StoredValue::Json(json!("v1")));
    expected.insert("k2".to_string(), StoredValue::Json(json!({"deep": "value"})));
    assert_eq!(items, expected);
}

#[tokio::test]
async fn test_items_includes_legacy_values() {
    let (store, backend) = memory_store();
    store.set("json", &json!([1, 2])).await.unwrap();
    backend.set_raw("raw", "plain");

    let items = store.items().await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items["json"], json!([1, 2]));
    assert_eq!(items["raw"], StoredValue::Text("plain".to_string()));
}

#[tokio::test]
async fn test_client_injection() {
    let backend = Arc::new(MemoryBackend::new());
    let store = RedisStore::with_backend(StoreConfig::default(), backend.clone());

    store.set("test", &123).await.unwrap();
    assert_eq!(backend.get("test").await.unwrap(), Some(b"123".to_vec()));

    backend.set("external", "\"seen\"").await.unwrap();
    assert_eq!(store.get("external").await.unwrap(), Some(StoredValue::Json(json!("seen"))));
}

#[tokio::test]
async fn test_unserializable_value_fails_before_write() {
    let (store, backend) = memory_store();

    let mut bad: HashMap<(u8, u8), &str> = HashMap::new();
    bad.insert((1, 2), "tuple keys are not strings");

    assert_err!(store.set("bad", &bad).await);
    assert!(!store.has("bad").await.unwrap());
    assert!(backend.is_empty());
}

#[test]
fn test_reconstruction_info_is_env_sentinel() {
    let (store, _) = memory_store();
    assert_eq!(
        Value::Object(store.to_reconstruction_info()),
        json!({ "recreate_from_env": true })
    );

    let config = StoreConfig {
        host: "manual-host".to_string(),
        username: Some("admin".to_string()),
        password: Some("hunter2".to_string()),
        ..Default::default()
    };
    let store = RedisStore::with_backend(config, Arc::new(MemoryBackend::new()));
    let info = store.to_reconstruction_info();

    assert_eq!(info.len(), 1);
    assert!(!info.contains_key("password"));
    assert!(!serde_json::to_string(&info).unwrap().contains("hunter2"));
}

#[test]
fn test_recreate_from_env_sentinel() {
    let (store, _) = memory_store();
    let info = store.to_reconstruction_info();
    assert_eq!(info.get(RECREATE_FROM_ENV), Some(&Value::Bool(true)));
    let vars = env(&[("REDIS_HOST", "env-host")]);

    let rebuilt = RedisStore::recreate_with(&info, &vars).unwrap();
    assert_eq!(rebuilt.config().host, "env-host");
    assert_eq!(rebuilt.backend().name(), "redis");
}

#[test]
fn test_from_env_with_override() {
    let vars = env(&[("REDIS_HOST", "env-host"), ("REDIS_PORT", "9999")]);
    let store = RedisStore::from_env_with(&vars, ConfigOverrides::new().db(5)).unwrap();

    assert_eq!(store.config().host, "env-host");
    assert_eq!(store.config().port, 9999);
    assert_eq!(store.config().db, 5);
}

#[test]
fn test_from_env_override_beats_environment() {
    let vars = env(&[("REDIS_DB", "2"), ("REDIS_SSL", "TrUe")]);
    let store = RedisStore::from_env_with(&vars, ConfigOverrides::new().db(7)).unwrap();

    assert_eq!(store.config().db, 7);
    assert!(store.config().ssl);
    assert!(store.config().decode_responses);
}

#[test]
fn test_from_env_bad_port_is_config_error() {
    let vars = env(&[("REDIS_PORT", "sixty-three-seventy-nine")]);
    let err = RedisStore::from_env_with(&vars, ConfigOverrides::default()).unwrap_err();
    assert!(matches!(err, redis_store::StoreError::Config(_)));
}

#[test]
fn test_recreate_without_env() {
    let info = object(json!({
        "host": "remote-host",
        "port": 1234,
        "db": 1,
        "ssl": true
    }));
    // The environment must not leak into an explicit descriptor
    let vars = env(&[("REDIS_HOST", "env-host"), ("REDIS_PORT", "9999")]);

    let store = RedisStore::recreate_with(&info, &vars).unwrap();
    assert_eq!(store.config().host, "remote-host");
    assert_eq!(store.config().port, 1234);
    assert_eq!(store.config().db, 1);
    assert!(store.config().ssl);
}

#[test]
fn test_recreate_false_sentinel_uses_fields() {
    let info = object(json!({ "recreate_from_env": false, "host": "explicit" }));
    let store = RedisStore::recreate_with(&info, &env(&[("REDIS_HOST", "env-host")])).unwrap();
    assert_eq!(store.config().host, "explicit");
}

#[test]
fn test_recreate_rejects_mistyped_fields() {
    let info = object(json!({ "db": "zero" }));
    let err = RedisStore::recreate_with(&info, &HashMap::<String, String>::new()).unwrap_err();
    assert!(matches!(err, redis_store::StoreError::Config(_)));
}

#[test]
fn test_injected_backend_keeps_config_for_introspection() {
    let config = StoreConfig {
        host: "recorded-only".to_string(),
        db: 11,
        ..Default::default()
    };
    let store = RedisStore::with_backend(config.clone(), Arc::new(MemoryBackend::new()));

    assert_eq!(store.config(), &config);
    assert_eq!(store.backend().name(), "memory");
}

#[tokio::test]
async fn test_non_finite_floats_fail_before_write() {
    let (store, backend) = memory_store();

    let err = store
        .set("k", &vec![1.0, f64::NAN, f64::INFINITY])
        .await
        .unwrap_err();
    assert!(matches!(err, redis_store::StoreError::Serialization(_)));
    assert!(backend.is_empty());
    assert_eq!(store.get("k").await.unwrap(), None);

    assert_ok!(store.set("k", &json!({"finite": 1.0})).await);
    assert_eq!(backend.len(), 1);
}

/// Backend whose scan reports a key that is already gone when read.
struct VanishingBackend {
    inner: MemoryBackend,
}

#[async_trait::async_trait]
impl KvBackend for VanishingBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, redis_store::BackendError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), redis_store::BackendError> {
        self.inner.set(key, value).await
    }

    async fn exists(&self, key: &str) -> Result<u64, redis_store::BackendError> {
        self.inner.exists(key).await
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, redis_store::BackendError> {
        let mut keys = self.inner.scan_keys(pattern).await?;
        keys.push("deleted-mid-scan".to_string());
        Ok(keys)
    }

    fn name(&self) -> &'static str {
        "vanishing"
    }
}

#[tokio::test]
async fn test_items_omits_keys_gone_before_read() {
    let backend = Arc::new(VanishingBackend {
        inner: MemoryBackend::new(),
    });
    let store = RedisStore::with_backend(StoreConfig::default(), backend);
    store.set("kept", "v").await.unwrap();

    let items = store.items().await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items["kept"], json!("v"));
    assert!(!items.contains_key("deleted-mid-scan"));
}

#[test]
fn test_recreate_truthy_non_bool_sentinel_is_explicit() {
    let info = object(json!({ "recreate_from_env": 1 }));
    let store = RedisStore::recreate_with(&info, &env(&[("REDIS_HOST", "env-host")])).unwrap();

    assert_eq!(store.config().host, "localhost");
    assert_eq!(store.config().extra.get("recreate_from_env"), Some(&json!(1)));
}
