//! Hierarchical state vocabulary.
//!
//! A device's data points live in a tree addressed by dot-separated paths
//! (`<serial>.Sensor.PM25`). The engine produces [`PointValue`]s with
//! [`PointMetadata`] and hands them to a [`StateStore`].

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::storage::Result;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// Dot-separated path of a node in the state tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatePath(String);

impl StatePath {
    /// Root path for a device.
    pub fn device(device_id: impl Into<String>) -> Self {
        Self(device_id.into())
    }

    /// Append one segment.
    pub fn child(&self, segment: &str) -> Self {
        let mut path = String::with_capacity(self.0.len() + segment.len() + 1);
        path.push_str(&self.0);
        path.push(PATH_SEPARATOR);
        path.push_str(segment);
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment of the path.
    pub fn name(&self) -> &str {
        self.0.rsplit(PATH_SEPARATOR).next().unwrap_or(&self.0)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StatePath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StatePath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Semantic kind of a data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Number,
    Text,
    Boolean,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Text => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// Value stored at a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Null,
}

impl PointValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert a JSON scalar. Arrays and objects are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::Null
                }
            }
            Value::String(s) => Self::String(s.clone()),
            Value::Bool(b) => Self::Boolean(*b),
            Value::Null => Self::Null,
            Value::Array(_) | Value::Object(_) => Self::String(value.to_string()),
        }
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<i64> for PointValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for PointValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for PointValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for PointValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<bool> for PointValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

/// Metadata attached to a node when it is created or extended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMetadata {
    /// Display name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Value kind
    pub kind: ValueKind,
    /// Presentation role (e.g. "switch", "value.temperature")
    #[serde(default)]
    pub role: String,
    /// Display unit, empty when unitless
    #[serde(default)]
    pub unit: String,
    #[serde(default = "default_true")]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    /// Wire value -> display label
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub states: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl PointMetadata {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind,
            role: String::new(),
            unit: String::new(),
            read: true,
            write: false,
            states: BTreeMap::new(),
        }
    }
}

/// Hierarchical object store consumed by the state reconciler.
///
/// All operations must be idempotent: repeating a call with the same
/// arguments leaves the store in the same observable state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Whether a node exists at `path`.
    async fn exists(&self, path: &StatePath) -> Result<bool>;

    /// Create the node, or merge `metadata` into the existing one.
    async fn create_or_extend(&self, path: &StatePath, metadata: &PointMetadata) -> Result<()>;

    /// Write the node's value.
    async fn set_value(&self, path: &StatePath, value: &PointValue) -> Result<()>;

    /// Register the node for external write-back.
    async fn subscribe_for_writes(&self, path: &StatePath) -> Result<()>;
}
