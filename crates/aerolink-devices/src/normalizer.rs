//! Inbound message normalization.
//!
//! Turns one device envelope into an ordered list of [`NormalizedUpdate`]s.
//!
//! ## Envelopes
//!
//! Device messages nest their payload under reserved keys:
//!
//! | Key | Unwrapped at |
//! |-----|--------------|
//! | `product-state` | the same path |
//! | `data` | `<path>.Sensor` |
//!
//! A kind never nests inside itself and at most [`MAX_UNWRAP_DEPTH`] wrappers
//! are unwrapped per branch. Anything else is a malformed envelope and the
//! whole message is rejected before any device state is touched.
//!
//! ## Ordering
//!
//! Updates come out in application order: each pollutant reading is
//! followed by its index, and a section's `AirQuality` update follows all of
//! the section's readings.

use aerolink_core::{PointMetadata, PointValue, StatePath};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::air_quality::PollutantCategory;
use crate::context::DeviceContext;
use crate::error::{DeviceError, Result};
use crate::schema::{derived, DataPointDescriptor, SchemaRegistry};
use crate::transform;

/// Maximum number of wrappers unwrapped on one branch.
pub const MAX_UNWRAP_DEPTH: usize = 2;

/// Sub-path added by the `data` wrapper.
pub const SENSOR_SEGMENT: &str = "Sensor";

/// Top-level key holding the message kind.
pub const MESSAGE_KIND_KEY: &str = "msg";

/// Envelope bookkeeping keys that carry no data point.
const ENVELOPE_METADATA_KEYS: &[&str] = &[MESSAGE_KIND_KEY, "time", "mode-reason", "state-reason"];

/// Reserved wrapper keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    ProductState,
    Data,
}

impl EnvelopeKind {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "product-state" => Some(Self::ProductState),
            "data" => Some(Self::Data),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::ProductState => "product-state",
            Self::Data => "data",
        }
    }

    fn sub_path(&self) -> Option<&'static str> {
        match self {
            Self::ProductState => None,
            Self::Data => Some(SENSOR_SEGMENT),
        }
    }
}

/// Value carried by an update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    Set(PointValue),
    /// Delta whose before and after are equal; nothing to write
    Unchanged,
}

impl UpdateValue {
    pub fn as_value(&self) -> Option<&PointValue> {
        match self {
            Self::Set(value) => Some(value),
            Self::Unchanged => None,
        }
    }
}

/// One decoded data point ready for the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedUpdate {
    pub path: StatePath,
    pub descriptor: &'static DataPointDescriptor,
    pub value: UpdateValue,
    /// Display unit resolved for this message
    pub unit: &'static str,
}

impl NormalizedUpdate {
    pub fn metadata(&self) -> PointMetadata {
        self.descriptor.metadata(self.unit)
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self.value, UpdateValue::Unchanged)
    }

    pub fn writable(&self) -> bool {
        self.descriptor.writable
    }
}

/// Result of normalizing one message.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// `msg` of the envelope, when present
    pub message_kind: Option<String>,
    pub updates: Vec<NormalizedUpdate>,
    /// Keys with no schema entry
    pub unknown_fields: Vec<String>,
    /// Known keys whose value could not be decoded
    pub skipped_fields: Vec<String>,
}

impl Normalized {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Update for `path`, if the message produced one.
    pub fn update_for(&self, path: &str) -> Option<&NormalizedUpdate> {
        self.updates.iter().find(|u| u.path.as_str() == path)
    }
}

/// A flat group of fields found under one wrapper.
struct Section<'a> {
    path: StatePath,
    in_data: bool,
    fields: &'a Map<String, Value>,
}

/// Walk the wrappers, validating every branch before anything is decoded.
fn collect_sections<'a>(
    fields: &'a Map<String, Value>,
    path: StatePath,
    in_data: bool,
    unwrapped: &mut Vec<EnvelopeKind>,
    out: &mut Vec<Section<'a>>,
) -> Result<()> {
    out.push(Section {
        path: path.clone(),
        in_data,
        fields,
    });

    for (key, value) in fields {
        let Some(kind) = EnvelopeKind::from_key(key) else {
            continue;
        };
        if unwrapped.contains(&kind) {
            return Err(DeviceError::MalformedEnvelope(format!("'{}' nested inside itself", key)));
        }
        if unwrapped.len() >= MAX_UNWRAP_DEPTH {
            return Err(DeviceError::MalformedEnvelope(format!(
                "'{}' exceeds the unwrap depth of {}",
                key, MAX_UNWRAP_DEPTH
            )));
        }
        let inner = value.as_object().ok_or_else(|| {
            DeviceError::MalformedEnvelope(format!("'{}' does not contain an object", key))
        })?;
        let inner_path = match kind.sub_path() {
            Some(segment) => path.child(segment),
            None => path.clone(),
        };

        unwrapped.push(kind);
        collect_sections(
            inner,
            inner_path,
            in_data || kind == EnvelopeKind::Data,
            unwrapped,
            out,
        )?;
        unwrapped.pop();
    }

    Ok(())
}

/// `Some(after)` for a changed value, `None` for an equal `[before, after]` pair.
fn resolve_delta(raw: &Value) -> Option<&Value> {
    match raw {
        Value::Array(pair) if pair.len() == 2 => {
            if pair[0] == pair[1] {
                None
            } else {
                Some(&pair[1])
            }
        }
        other => Some(other),
    }
}

/// Converts device envelopes into state updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageNormalizer {
    registry: SchemaRegistry,
}

impl MessageNormalizer {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Normalize one envelope for the device in `ctx`.
    ///
    /// Index state in `ctx` is updated for pollutant readings found in
    /// `data` sections. A malformed envelope returns an error and leaves
    /// `ctx` untouched.
    pub fn normalize(&self, ctx: &mut DeviceContext, envelope: &Value) -> Result<Normalized> {
        let fields = envelope.as_object().ok_or_else(|| {
            DeviceError::MalformedEnvelope("message is not a JSON object".to_string())
        })?;

        let mut sections = Vec::new();
        collect_sections(
            fields,
            ctx.root_path(),
            false,
            &mut Vec::new(),
            &mut sections,
        )?;

        let mut normalized = Normalized {
            message_kind: fields
                .get(MESSAGE_KIND_KEY)
                .and_then(Value::as_str)
                .map(str::to_string),
            ..Default::default()
        };

        for section in &sections {
            self.normalize_section(ctx, section, &mut normalized);
        }

        debug!(
            device = %ctx.serial(),
            kind = normalized.message_kind.as_deref().unwrap_or("-"),
            updates = normalized.updates.len(),
            unknown = normalized.unknown_fields.len(),
            skipped = normalized.skipped_fields.len(),
            "Normalized message"
        );
        Ok(normalized)
    }

    fn normalize_section(
        &self,
        ctx: &mut DeviceContext,
        section: &Section<'_>,
        out: &mut Normalized,
    ) {
        let mut indices_touched = false;

        for (key, raw) in section.fields {
            if EnvelopeKind::from_key(key).is_some()
                || ENVELOPE_METADATA_KEYS.contains(&key.as_str())
            {
                continue;
            }

            let Some(descriptor) = self.registry.lookup_by_wire_code(key) else {
                debug!(device = %ctx.serial(), field = %key, "Unknown field");
                out.unknown_fields.push(key.clone());
                continue;
            };

            let path = section.path.child(descriptor.semantic_name);
            let unit = ctx.temperature_unit();

            let (value, display_unit) = match resolve_delta(raw) {
                None => {
                    let display_unit = if descriptor.is_temperature() {
                        unit.display_unit()
                    } else {
                        descriptor.unit
                    };
                    (UpdateValue::Unchanged, display_unit)
                }
                Some(after) => match transform::decode(descriptor, after, unit) {
                    Some(decoded) => (UpdateValue::Set(decoded.value), decoded.unit),
                    None => {
                        debug!(
                            device = %ctx.serial(),
                            field = %key,
                            value = %after,
                            "Skipping field with invalid encoding"
                        );
                        out.skipped_fields.push(key.clone());
                        continue;
                    }
                },
            };

            trace!("Decoded {} -> {} = {:?}", key, path, value);

            if descriptor.semantic_name == derived::FILTER_LIFE {
                if let Some(percent) = self.filter_life_percent(&section.path, &value) {
                    out.updates.push(NormalizedUpdate {
                        path,
                        descriptor,
                        value,
                        unit: display_unit,
                    });
                    out.updates.push(percent);
                    continue;
                }
            }

            let reading = value.as_value().and_then(PointValue::as_f64);
            out.updates.push(NormalizedUpdate {
                path,
                descriptor,
                value,
                unit: display_unit,
            });

            let category = PollutantCategory::from_wire_code(key).filter(|_| section.in_data);
            let Some((category, reading)) = category.zip(reading) else {
                continue;
            };
            let Some(index_descriptor) = self.registry.derived(category.index_name()) else {
                continue;
            };

            let (index, _) = ctx.indices_mut().record(category, reading);
            indices_touched = true;
            trace!("{} reading {} -> index {}", category, reading, index);
            out.updates.push(NormalizedUpdate {
                path: section.path.child(index_descriptor.semantic_name),
                descriptor: index_descriptor,
                value: UpdateValue::Set(PointValue::Integer(i64::from(index))),
                unit: index_descriptor.unit,
            });
        }

        if indices_touched {
            if let Some(descriptor) = self.registry.derived(derived::AIR_QUALITY) {
                let aggregate = ctx.indices().aggregate();
                out.updates.push(NormalizedUpdate {
                    path: ctx.root_path().child(descriptor.semantic_name),
                    descriptor,
                    value: UpdateValue::Set(PointValue::Integer(i64::from(aggregate))),
                    unit: descriptor.unit,
                });
            }
        }
    }

    /// Derived percentage update for a filter life reading.
    fn filter_life_percent(
        &self,
        section: &StatePath,
        value: &UpdateValue,
    ) -> Option<NormalizedUpdate> {
        let descriptor = self.registry.derived(derived::FILTER_LIFE_PERCENT)?;
        let value = match value {
            UpdateValue::Unchanged => UpdateValue::Unchanged,
            UpdateValue::Set(hours) => {
                let percent = transform::filter_life_percent(hours.as_f64()?);
                UpdateValue::Set(PointValue::Float(percent))
            }
        };
        Some(NormalizedUpdate {
            path: section.child(descriptor.semantic_name),
            descriptor,
            value,
            unit: descriptor.unit,
        })
    }
}
