//! Per-device context.

use aerolink_core::StatePath;
use serde::{Deserialize, Serialize};

use crate::air_quality::QualityIndices;
use crate::transform::TemperatureUnit;

/// Product type codes of known appliance models.
const PRODUCT_NAMES: &[(&str, &str)] = &[
    ("358", "Pure Humidify+Cool"),
    ("358E", "Pure Humidify+Cool Formaldehyde"),
    ("438", "Pure Cool Tower"),
    ("438E", "Pure Cool Tower Formaldehyde"),
    ("455", "Pure Hot+Cool Link"),
    ("469", "Pure Cool Link Desk"),
    ("475", "Pure Cool Link Tower"),
    ("520", "Pure Cool Desk"),
    ("527", "Pure Hot+Cool"),
    ("527E", "Pure Hot+Cool Formaldehyde"),
];

/// State the engine keeps for one device.
///
/// Identity is fixed at construction. The temperature unit may change at
/// runtime and is read on every decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceContext {
    serial: String,
    product_type: String,
    #[serde(default)]
    temperature_unit: TemperatureUnit,
    #[serde(skip)]
    indices: QualityIndices,
}

impl DeviceContext {
    pub fn new(serial: impl Into<String>, product_type: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            product_type: product_type.into(),
            temperature_unit: TemperatureUnit::default(),
            indices: QualityIndices::default(),
        }
    }

    pub fn with_temperature_unit(mut self, unit: TemperatureUnit) -> Self {
        self.temperature_unit = unit;
        self
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn product_type(&self) -> &str {
        &self.product_type
    }

    /// Model name for the product type, when known.
    pub fn product_name(&self) -> Option<&'static str> {
        PRODUCT_NAMES
            .iter()
            .find(|(code, _)| *code == self.product_type)
            .map(|(_, name)| *name)
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.temperature_unit
    }

    pub fn set_temperature_unit(&mut self, unit: TemperatureUnit) {
        self.temperature_unit = unit;
    }

    pub fn indices(&self) -> &QualityIndices {
        &self.indices
    }

    pub(crate) fn indices_mut(&mut self) -> &mut QualityIndices {
        &mut self.indices
    }

    /// Root of this device in the state tree.
    pub fn root_path(&self) -> StatePath {
        StatePath::device(self.serial.as_str())
    }
}
