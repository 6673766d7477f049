//! Hierarchical object store.
//!
//! Every data point is one node record keyed by its full dot-separated path
//! in the `objects` table. Parents are implied by the path; there are no
//! separate folder records.

use std::sync::Arc;

use aerolink_core::state::{PointMetadata, PointValue, StatePath, StateStore};
use aerolink_core::storage::{Result, StorageBackend};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

const OBJECTS_TABLE: &str = "objects";

/// Stored node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectNode {
    /// `None` for nodes that were written before any metadata was known
    #[serde(default)]
    pub metadata: Option<PointMetadata>,
    #[serde(default)]
    pub value: Option<PointValue>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Registered for external write-back
    #[serde(default)]
    pub subscribed: bool,
}

/// Merge `incoming` into `existing`. Non-empty incoming fields replace,
/// enumeration labels are unioned.
fn merge_metadata(existing: &mut PointMetadata, incoming: &PointMetadata) {
    existing.name = incoming.name.clone();
    existing.kind = incoming.kind;
    existing.read = incoming.read;
    existing.write = incoming.write;
    if !incoming.description.is_empty() {
        existing.description = incoming.description.clone();
    }
    if !incoming.role.is_empty() {
        existing.role = incoming.role.clone();
    }
    if !incoming.unit.is_empty() {
        existing.unit = incoming.unit.clone();
    }
    existing
        .states
        .extend(incoming.states.iter().map(|(k, v)| (k.clone(), v.clone())));
}

/// [`StateStore`] over any key/value [`StorageBackend`].
pub struct ObjectTreeStore {
    backend: Arc<dyn StorageBackend>,
    /// Serializes read-modify-write cycles on node records.
    write_lock: Mutex<()>,
}

impl ObjectTreeStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    /// Read one node.
    pub fn get(&self, path: &StatePath) -> Result<Option<ObjectNode>> {
        match self.backend.read(OBJECTS_TABLE, path.as_str())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All nodes whose path starts with `prefix`, in path order.
    pub fn list(&self, prefix: &str) -> Result<Vec<(StatePath, ObjectNode)>> {
        let mut nodes = Vec::new();
        for (key, bytes) in self.backend.scan(OBJECTS_TABLE, prefix)? {
            match serde_json::from_slice::<ObjectNode>(&bytes) {
                Ok(node) => nodes.push((StatePath::from(key), node)),
                Err(e) => tracing::warn!(path = %key, error = %e, "Skipping unreadable node"),
            }
        }
        Ok(nodes)
    }

    fn put(&self, path: &StatePath, node: &ObjectNode) -> Result<()> {
        let bytes = serde_json::to_vec(node)?;
        self.backend.write(OBJECTS_TABLE, path.as_str(), &bytes)
    }

    fn update<F>(&self, path: &StatePath, f: F) -> Result<()>
    where
        F: FnOnce(&mut ObjectNode),
    {
        let _guard = self.write_lock.lock();
        let mut node = self.get(path)?.unwrap_or_default();
        f(&mut node);
        self.put(path, &node)
    }
}

#[async_trait]
impl StateStore for ObjectTreeStore {
    async fn exists(&self, path: &StatePath) -> Result<bool> {
        Ok(self.backend.read(OBJECTS_TABLE, path.as_str())?.is_some())
    }

    async fn create_or_extend(&self, path: &StatePath, metadata: &PointMetadata) -> Result<()> {
        self.update(path, |node| match node.metadata.as_mut() {
            Some(existing) => merge_metadata(existing, metadata),
            None => node.metadata = Some(metadata.clone()),
        })
    }

    async fn set_value(&self, path: &StatePath, value: &PointValue) -> Result<()> {
        self.update(path, |node| {
            node.value = Some(value.clone());
            node.updated_at = Some(Utc::now());
        })
    }

    async fn subscribe_for_writes(&self, path: &StatePath) -> Result<()> {
        self.update(path, |node| node.subscribed = true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryBackend;
    use aerolink_core::ValueKind;

    fn store() -> ObjectTreeStore {
        ObjectTreeStore::new(Arc::new(MemoryBackend::default()))
    }

    #[tokio::test]
    async fn test_create_then_set() {
        let store = store();
        let path = StatePath::from("dev.FanSpeed");
        assert!(!store.exists(&path).await.unwrap());

        let meta = PointMetadata::new("FanSpeed", ValueKind::Number);
        store.create_or_extend(&path, &meta).await.unwrap();
        let value = PointValue::Integer(4);
        store.set_value(&path, &value).await.unwrap();

        let node = store.get(&path).unwrap().unwrap();
        assert!(store.exists(&path).await.unwrap());
        assert_eq!(node.metadata, Some(meta));
        assert_eq!(node.value, Some(value));
        assert!(node.updated_at.is_some());
        assert!(!node.subscribed);
    }

    #[test]
    fn test_merge_keeps_prior_fields() {
        let mut existing = PointMetadata::new("Temperature", ValueKind::Number);
        existing.description = "Current temperature".to_string();
        existing.unit = "°C".to_string();
        existing.states.insert("OFF".to_string(), "Off".to_string());

        let mut incoming = PointMetadata::new("Temperature", ValueKind::Number);
        incoming.unit = "°F".to_string();
        incoming.states.insert("ON".to_string(), "On".to_string());

        merge_metadata(&mut existing, &incoming);
        assert_eq!(existing.description, "Current temperature");
        assert_eq!(existing.unit, "°F");
        assert_eq!(existing.states.len(), 2);
    }

    #[tokio::test]
    async fn test_set_value_without_metadata_creates_bare_node() {
        let store = store();
        let path = StatePath::from("dev.Sensor.PM25");
        let value = PointValue::Integer(12);
        store.set_value(&path, &value).await.unwrap();

        let node = store.get(&path).unwrap().unwrap();
        assert!(node.metadata.is_none());
        assert_eq!(node.value, Some(value));
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent() {
        let store = store();
        let path = StatePath::from("dev.MainPower");
        store.subscribe_for_writes(&path).await.unwrap();
        store.subscribe_for_writes(&path).await.unwrap();

        let listed = store.list("dev.").unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].1.subscribed);
    }
}
