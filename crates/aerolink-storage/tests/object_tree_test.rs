//! Object tree store tests.
//!
//! Tests include:
//! - Persistence across reopen on a redb file
//! - Metadata merge through create_or_extend
//! - Prefix listing

use aerolink_core::{PointMetadata, PointValue, StatePath, StateStore, ValueKind};
use aerolink_storage::{create_backend, memory_object_store, open_object_store};
use serde_json::json;

#[tokio::test]
async fn test_values_survive_reopen() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("state.redb");
    let path = StatePath::from("NN2-EU-KKA0717A.Sensor.Temperature");

    {
        let store = open_object_store(&db_path).expect("Failed to open store");
        let mut meta = PointMetadata::new("Temperature", ValueKind::Number);
        meta.unit = "°C".to_string();
        store.create_or_extend(&path, &meta).await.unwrap();
        store
            .set_value(&path, &PointValue::Float(21.35))
            .await
            .unwrap();
    }

    let store = open_object_store(&db_path).expect("Failed to reopen store");
    assert!(store.exists(&path).await.unwrap());
    let node = store.get(&path).unwrap().expect("node persisted");
    assert_eq!(node.value, Some(PointValue::Float(21.35)));
    assert_eq!(node.metadata.unwrap().unit, "°C");
}

#[tokio::test]
async fn test_create_or_extend_twice_is_stable() {
    let store = memory_object_store();
    let path = StatePath::from("dev.FanSpeed");
    let mut meta = PointMetadata::new("FanSpeed", ValueKind::Number);
    meta.write = true;
    meta.states.insert("AUTO".to_string(), "Auto".to_string());

    store.create_or_extend(&path, &meta).await.unwrap();
    let first = store.get(&path).unwrap();
    store.create_or_extend(&path, &meta).await.unwrap();
    let second = store.get(&path).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_list_by_device_prefix() {
    let store = memory_object_store();
    for path in ["a.MainPower", "a.Sensor.PM25", "b.MainPower"] {
        store
            .set_value(&StatePath::from(path), &PointValue::Integer(1))
            .await
            .unwrap();
    }

    let listed: Vec<String> = store
        .list("a.")
        .unwrap()
        .into_iter()
        .map(|(path, _)| path.to_string())
        .collect();
    assert_eq!(listed, vec!["a.MainPower", "a.Sensor.PM25"]);
}

#[tokio::test]
async fn test_factory_backends_share_behavior() {
    let dir = tempfile::tempdir().unwrap();
    let redb_config = json!({ "path": dir.path().join("f.redb").to_string_lossy() });

    for (kind, config) in [("memory", json!({})), ("redb", redb_config)] {
        let backend = create_backend(kind, &config).unwrap();
        let store = aerolink_storage::ObjectTreeStore::new(backend);
        let path = StatePath::from("dev.Sensor.Humidity");
        let value = PointValue::Integer(41);
        store.set_value(&path, &value).await.unwrap();
        assert!(store.exists(&path).await.unwrap(), "backend {}", kind);
    }
}
