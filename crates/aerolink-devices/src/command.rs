//! Outbound command encoding.

use std::collections::BTreeMap;

use aerolink_core::PointValue;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::DeviceContext;
use crate::schema::{DataPointDescriptor, SchemaRegistry};
use crate::transform::{self, COMMAND_NUMBER_WIDTH};

const FAN_SPEED_CODE: &str = "fnsp";
const AUTO_MODE_CODE: &str = "auto";
const AUTO_TOKEN: &str = "AUTO";

/// Flat wire code -> encoded value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireCommand(BTreeMap<String, String>);

impl WireCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, value: impl Into<String>) {
        self.0.insert(code.into(), value.into());
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Encode a value for a field with no schema entry.
fn encode_raw(value: &PointValue) -> String {
    match value {
        PointValue::Boolean(true) => "ON".to_string(),
        PointValue::Boolean(false) => "OFF".to_string(),
        PointValue::Integer(_) | PointValue::Float(_) => {
            transform::zero_fill(value, COMMAND_NUMBER_WIDTH)
        }
        PointValue::String(s) => s.clone(),
        PointValue::Null => String::new(),
    }
}

/// Turns state changes into wire commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandEncoder {
    registry: SchemaRegistry,
}

impl CommandEncoder {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    fn resolve(&self, name: &str) -> Option<&'static DataPointDescriptor> {
        self.registry
            .descriptor_by_semantic_name(name)
            .or_else(|| self.registry.lookup_by_wire_code(name))
    }

    /// Encode a change of `name` to `value`.
    ///
    /// `name` is a semantic name; names without a schema entry are sent as
    /// wire codes verbatim. Values that cannot be encoded yield an empty
    /// command.
    pub fn encode_command(
        &self,
        ctx: &DeviceContext,
        name: &str,
        value: &PointValue,
    ) -> WireCommand {
        let mut command = WireCommand::new();

        let Some(descriptor) = self.resolve(name) else {
            let encoded = encode_raw(value);
            if !encoded.is_empty() {
                command.insert(name, encoded);
            }
            return command;
        };

        if !descriptor.writable {
            debug!(
                device = %ctx.serial(),
                point = %descriptor.semantic_name,
                "Encoding command for a read-only point"
            );
        }

        let encoded = transform::encode(descriptor, value, ctx.temperature_unit());
        if encoded.is_empty() {
            debug!(
                device = %ctx.serial(),
                point = %descriptor.semantic_name,
                value = %value,
                "Value cannot be encoded"
            );
            return command;
        }

        if descriptor.wire_code == FAN_SPEED_CODE && encoded == AUTO_TOKEN {
            let on = self
                .registry
                .lookup_by_wire_code(AUTO_MODE_CODE)
                .map(transform::on_token)
                .unwrap_or("ON");
            command.insert(AUTO_MODE_CODE, on);
        }
        command.insert(descriptor.wire_code, encoded);
        command
    }
}
