//! Data point schema.
//!
//! Static table of every field the supported appliance generations put on
//! the wire, plus the derived points the engine computes itself.
//!
//! ## Lookup policy
//!
//! Lookups scan the table in order and the first matching row wins. Some
//! wire codes legitimately appear more than once (`sltm` is reported both in
//! the product state and, by some firmware, in sensor data); the later rows
//! are kept for documentation but are never returned by a lookup.

use std::collections::BTreeMap;

use aerolink_core::{PointMetadata, ValueKind};
use serde::Serialize;

/// Wire value -> display label.
pub type Enumeration = &'static [(&'static str, &'static str)];

/// Static description of one wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataPointDescriptor {
    /// Identifier used on the wire (e.g. "fnsp")
    pub wire_code: &'static str,
    /// Path segment in the state tree
    pub semantic_name: &'static str,
    pub description: &'static str,
    pub value_kind: ValueKind,
    /// Accepts write-back from the state store
    pub writable: bool,
    /// Presentation role
    pub role: &'static str,
    /// Display unit; temperatures are rewritten at decode time
    pub unit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Enumeration>,
}

impl DataPointDescriptor {
    const fn new(
        wire_code: &'static str,
        semantic_name: &'static str,
        description: &'static str,
        value_kind: ValueKind,
        writable: bool,
        role: &'static str,
        unit: &'static str,
        enumeration: Option<Enumeration>,
    ) -> Self {
        Self {
            wire_code,
            semantic_name,
            description,
            value_kind,
            writable,
            role,
            unit,
            enumeration,
        }
    }

    /// Whether the wire value is deci-Kelvin.
    pub fn is_temperature(&self) -> bool {
        self.value_kind == ValueKind::Number && self.role == TEMPERATURE_ROLE
    }

    /// Canonical enumeration key matching `token` by key or label, ignoring case.
    pub fn enumeration_key(&self, token: &str) -> Option<&'static str> {
        self.enumeration?
            .iter()
            .find(|(key, label)| {
                key.eq_ignore_ascii_case(token) || label.eq_ignore_ascii_case(token)
            })
            .map(|(key, _)| *key)
    }

    /// Store metadata for this point with the given display unit.
    pub fn metadata(&self, unit: &str) -> PointMetadata {
        let states: BTreeMap<String, String> = self
            .enumeration
            .unwrap_or_default()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        PointMetadata {
            name: self.semantic_name.to_string(),
            description: self.description.to_string(),
            kind: self.value_kind,
            role: self.role.to_string(),
            unit: unit.to_string(),
            read: true,
            write: self.writable,
            states,
        }
    }
}

pub const TEMPERATURE_ROLE: &str = "value.temperature";

/// Semantic names of derived points.
pub mod derived {
    pub const FILTER_LIFE: &str = "FilterLife";
    pub const FILTER_LIFE_PERCENT: &str = "FilterLifePercent";
    pub const AIR_QUALITY: &str = "AirQuality";
}

const ON_OFF: Enumeration = &[("OFF", "Off"), ("ON", "On")];

const FAN_SPEED: Enumeration = &[
    ("AUTO", "Auto"),
    ("0001", "1"),
    ("0002", "2"),
    ("0003", "3"),
    ("0004", "4"),
    ("0005", "5"),
    ("0006", "6"),
    ("0007", "7"),
    ("0008", "8"),
    ("0009", "9"),
    ("0010", "10"),
];

const QUALITY_LEVELS: Enumeration = &[
    ("0", "Good"),
    ("1", "Medium"),
    ("2", "Bad"),
    ("3", "Very bad"),
    ("4", "Extremely bad"),
    ("5", "Worrying"),
];

use ValueKind::{Boolean, Number, Text};

type D = DataPointDescriptor;

#[rustfmt::skip]
static DATA_POINTS: &[DataPointDescriptor] = &[
    // Connectivity and diagnostics
    D::new("channel", "WIFIchannel", "Number of the used Wi-Fi channel", Number, false, "value", "", None),
    D::new("rssi", "RSSI", "Received signal strength of the Wi-Fi connection", Number, false, "value", "dBm", None),
    D::new("ercd", "LastErrorCode", "Error code of the last error occurred on this device", Text, false, "text", "", None),
    D::new("wacd", "LastWarningCode", "Warning code of the last warning occurred on this device", Text, false, "text", "", None),
    D::new("ver", "Firmware", "Firmware version of the device", Text, false, "text", "", None),
    // Fan
    D::new("fpwr", "MainPower", "Main power of the fan", Boolean, true, "switch.power", "", Some(ON_OFF)),
    D::new("fmod", "Mode", "Operating mode of older devices", Text, true, "switch", "", Some(&[("FAN", "Manual"), ("AUTO", "Auto"), ("OFF", "Off")])),
    D::new("fnst", "FanStatus", "Current fan state, follows the automatic mode", Text, false, "text", "", Some(&[("OFF", "Off"), ("FAN", "On")])),
    D::new("fnsp", "FanSpeed", "Current fan speed", Number, true, "value", "", Some(FAN_SPEED)),
    D::new("auto", "AutomaticMode", "Fan is in automatic mode", Boolean, true, "switch", "", Some(ON_OFF)),
    D::new("nmod", "Nightmode", "Night mode", Boolean, true, "switch.mode.moonlight", "", Some(ON_OFF)),
    D::new("nmdv", "NightModeMaxFan", "Maximum fan speed in night mode", Number, false, "value", "", None),
    D::new("sltm", "Sleeptimer", "Sleep timer", Number, true, "value", "Min", Some(&[("OFF", "Off")])),
    D::new("qtar", "AirQualityTarget", "Target air quality for automatic mode", Text, true, "value", "", Some(&[("0001", "Good"), ("0002", "Normal"), ("0003", "Bad"), ("0004", "Very bad")])),
    D::new("rhtm", "ContinuousMonitoring", "Continuous monitoring of environmental sensors even if the device is off", Boolean, true, "switch", "", Some(ON_OFF)),
    D::new("fdir", "FanDirection", "Direction the fan blows to (on = front, off = back)", Boolean, true, "switch", "", Some(&[("OFF", "Back"), ("ON", "Front")])),
    D::new("ffoc", "JetFocus", "Jet focus airflow", Boolean, true, "switch", "", Some(ON_OFF)),
    D::new("corf", "DisplayCelsius", "Device display shows Celsius", Boolean, true, "switch", "", Some(ON_OFF)),
    // Oscillation
    D::new("oson", "Oscillation", "Oscillation of the fan", Boolean, true, "switch", "", Some(ON_OFF)),
    D::new("oscs", "OscillationActive", "Fan is currently oscillating", Text, false, "text", "", Some(&[("IDLE", "Idle"), ("OFF", "Off"), ("ON", "On")])),
    D::new("osal", "OscillationLeft", "Oscillation angle lower boundary", Number, true, "value", "°", None),
    D::new("osau", "OscillationRight", "Oscillation angle upper boundary", Number, true, "value", "°", None),
    D::new("ancp", "OscillationAngle", "Oscillation angle preset", Number, true, "value", "°", Some(&[("CUST", "Custom"), ("0045", "45"), ("0090", "90"), ("0180", "180"), ("0350", "350")])),
    // Filters
    D::new("cflr", "CarbonfilterLifetime", "Remaining lifetime of the activated carbon filter", Number, false, "value", "%", None),
    D::new("hflr", "HEPA-FilterLifetime", "Remaining lifetime of the HEPA filter", Number, false, "value", "%", None),
    D::new("cflt", "Carbonfilter", "Filter type installed in the carbon filter port", Text, false, "text", "", Some(&[("CARF", "Activated carbon"), ("SCOF", "Combined"), ("NONE", "None")])),
    D::new("hflt", "HEPA-Filter", "Filter type installed in the HEPA filter port", Text, false, "text", "", Some(&[("GHEP", "Glass HEPA"), ("GCOM", "Combined"), ("NONE", "None")])),
    D::new("filf", "FilterLife", "Estimated remaining filter life in hours", Number, false, "value", "hrs", None),
    // Heating
    D::new("hmod", "HeaterMode", "Heating mode", Boolean, true, "switch", "", Some(&[("OFF", "Off"), ("HEAT", "Heating")])),
    D::new("hmax", "TemperatureTarget", "Target temperature for heating", Number, true, TEMPERATURE_ROLE, "", None),
    D::new("hsta", "HeatingState", "Heating is active or idle", Text, false, "text", "", Some(&[("OFF", "Idle"), ("HEAT", "Heating")])),
    D::new("tilt", "TiltState", "Device has been tipped over", Text, false, "text", "", Some(&[("OK", "Upright"), ("TILT", "Tilted")])),
    // Humidification
    D::new("hume", "HumidificationMode", "Humidification mode", Boolean, true, "switch", "", Some(&[("OFF", "Off"), ("HUMD", "On")])),
    D::new("haut", "HumidifyAutoMode", "Automatic humidification", Boolean, true, "switch", "", Some(ON_OFF)),
    D::new("humt", "HumidificationTarget", "Manual humidification target", Number, true, "value", "%", Some(&[("0030", "30"), ("0040", "40"), ("0050", "50"), ("0060", "60"), ("0070", "70")])),
    D::new("rect", "AutoHumidificationTarget", "Humidification target chosen by automatic mode", Number, false, "value", "%", None),
    D::new("msta", "HumidificationState", "Humidification is active or idle", Text, false, "text", "", Some(&[("OFF", "Idle"), ("HUMD", "Humidifying")])),
    D::new("wath", "WaterHardness", "Water hardness setting", Text, true, "value", "", Some(&[("0675", "Hard"), ("1350", "Medium"), ("2025", "Soft")])),
    D::new("cdrr", "CleanDurationRemaining", "Time remaining in the deep clean cycle", Number, false, "value", "Min", None),
    D::new("cltr", "CleanTimeRemaining", "Time remaining until the next cleaning cycle", Number, false, "value", "h", None),
    D::new("clcr", "DeepCleanCycle", "State of the deep clean cycle", Text, false, "text", "", Some(&[("CLNO", "Inactive"), ("CLAC", "Active"), ("CLCM", "Completed")])),
    // Sensor data
    D::new("tact", "Temperature", "Current temperature", Number, false, TEMPERATURE_ROLE, "", None),
    D::new("hact", "Humidity", "Current relative humidity", Number, false, "value.humidity", "%", None),
    D::new("pm25", "PM25", "Particulate matter 2.5µm", Number, false, "value", "µg/m³", None),
    D::new("pm10", "PM10", "Particulate matter 10µm", Number, false, "value", "µg/m³", None),
    D::new("p25r", "PM25R", "Particulate matter 2.5µm, recirculation sensor", Number, false, "value", "µg/m³", None),
    D::new("p10r", "PM10R", "Particulate matter 10µm, recirculation sensor", Number, false, "value", "µg/m³", None),
    D::new("va10", "VOC", "Volatile organic compounds", Number, false, "value", "", None),
    D::new("vact", "VOC", "Volatile organic compounds (older sensor generation)", Number, false, "value", "", None),
    D::new("noxl", "NO2", "Nitrogen dioxide", Number, false, "value", "", None),
    D::new("pact", "Dust", "Dust", Number, false, "value", "", None),
    D::new("hcho", "Formaldehyde", "Formaldehyde", Number, false, "value", "mg/m³", None),
    D::new("hchr", "FormaldehydeR", "Formaldehyde, raw reading", Number, false, "value", "", None),
    // Shadowed by the product-state row above; never returned by lookup.
    D::new("sltm", "SleeptimerRemaining", "Remaining sleep time reported with sensor data", Number, false, "value", "s", None),
];

#[rustfmt::skip]
static DERIVED_POINTS: &[DataPointDescriptor] = &[
    D::new(derived::FILTER_LIFE_PERCENT, derived::FILTER_LIFE_PERCENT, "Remaining filter life in percent of the nominal lifetime", Number, false, "value", "%", None),
    D::new("PM25Index", "PM25Index", "PM2.5 quality index", Number, false, "value", "", Some(QUALITY_LEVELS)),
    D::new("PM10Index", "PM10Index", "PM10 quality index", Number, false, "value", "", Some(QUALITY_LEVELS)),
    D::new("VOCIndex", "VOCIndex", "VOC quality index", Number, false, "value", "", Some(QUALITY_LEVELS)),
    D::new("NO2Index", "NO2Index", "NO2 quality index", Number, false, "value", "", Some(QUALITY_LEVELS)),
    D::new("DustIndex", "DustIndex", "Dust quality index", Number, false, "value", "", Some(QUALITY_LEVELS)),
    D::new(derived::AIR_QUALITY, derived::AIR_QUALITY, "Overall air quality, the worst of all known indices", Number, false, "value", "", Some(QUALITY_LEVELS)),
];

/// Immutable view over the data point tables.
#[derive(Debug, Clone, Copy)]
pub struct SchemaRegistry {
    points: &'static [DataPointDescriptor],
    derived: &'static [DataPointDescriptor],
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SchemaRegistry {
    /// Registry over the built-in tables.
    pub const fn builtin() -> Self {
        Self {
            points: DATA_POINTS,
            derived: DERIVED_POINTS,
        }
    }

    /// Descriptor for a wire code. First match in table order.
    pub fn lookup_by_wire_code(&self, code: &str) -> Option<&'static DataPointDescriptor> {
        self.points.iter().find(|d| d.wire_code == code)
    }

    /// Wire code for a semantic name. First match in table order.
    pub fn lookup_by_semantic_name(&self, name: &str) -> Option<&'static str> {
        self.descriptor_by_semantic_name(name).map(|d| d.wire_code)
    }

    pub fn descriptor_by_semantic_name(&self, name: &str) -> Option<&'static DataPointDescriptor> {
        self.points.iter().find(|d| d.semantic_name == name)
    }

    /// Descriptor of a point the engine computes (never on the wire).
    pub fn derived(&self, name: &str) -> Option<&'static DataPointDescriptor> {
        self.derived.iter().find(|d| d.semantic_name == name)
    }

    pub fn descriptors(&self) -> &'static [DataPointDescriptor] {
        self.points
    }

    pub fn derived_descriptors(&self) -> &'static [DataPointDescriptor] {
        self.derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_wire_code() {
        let registry = SchemaRegistry::builtin();
        let fnsp = registry.lookup_by_wire_code("fnsp").unwrap();
        assert_eq!(fnsp.semantic_name, "FanSpeed");
        assert!(fnsp.writable);
        assert!(registry.lookup_by_wire_code("zzzz").is_none());
    }

    #[test]
    fn test_duplicate_wire_code_first_match() {
        let registry = SchemaRegistry::builtin();
        let rows: Vec<_> = registry
            .descriptors()
            .iter()
            .filter(|d| d.wire_code == "sltm")
            .collect();
        assert_eq!(rows.len(), 2);

        let found = registry.lookup_by_wire_code("sltm").unwrap();
        assert_eq!(found, rows[0]);
        assert_eq!(found.unit, "Min");
    }

    #[test]
    fn test_lookup_by_semantic_name() {
        let registry = SchemaRegistry::builtin();
        assert_eq!(registry.lookup_by_semantic_name("MainPower"), Some("fpwr"));
        assert_eq!(
            registry.lookup_by_semantic_name("TemperatureTarget"),
            Some("hmax")
        );
        // Two generations share the name; the newer code comes first.
        assert_eq!(registry.lookup_by_semantic_name("VOC"), Some("va10"));
        assert_eq!(registry.lookup_by_semantic_name("NoSuchPoint"), None);
    }

    #[test]
    fn test_derived_not_reachable_by_wire_code() {
        let registry = SchemaRegistry::builtin();
        assert!(registry.derived(derived::AIR_QUALITY).is_some());
        assert!(registry
            .lookup_by_wire_code(derived::AIR_QUALITY)
            .is_none());
        assert_eq!(
            registry.lookup_by_semantic_name(derived::FILTER_LIFE_PERCENT),
            None
        );
    }

    #[test]
    fn test_enumeration_key_matches_key_or_label() {
        let registry = SchemaRegistry::builtin();
        let fnsp = registry.lookup_by_wire_code("fnsp").unwrap();
        assert_eq!(fnsp.enumeration_key("auto"), Some("AUTO"));
        assert_eq!(fnsp.enumeration_key("Auto"), Some("AUTO"));
        assert_eq!(fnsp.enumeration_key("fast"), None);
    }

    #[test]
    fn test_metadata_from_descriptor() {
        let registry = SchemaRegistry::builtin();
        let meta = registry.lookup_by_wire_code("fpwr").unwrap().metadata("");
        assert_eq!(meta.name, "MainPower");
        assert!(meta.write);
        assert_eq!(meta.states.get("ON").map(String::as_str), Some("On"));
    }

    #[test]
    fn test_temperature_points() {
        let registry = SchemaRegistry::builtin();
        let temps: Vec<_> = registry
            .descriptors()
            .iter()
            .filter(|d| d.is_temperature())
            .map(|d| d.wire_code)
            .collect();
        assert_eq!(temps, vec!["hmax", "tact"]);
    }
}
