//! Value transforms between wire encodings and semantic values.
//!
//! Wire values are mostly strings: zero-padded integers (`"0005"`),
//! switch tokens (`"ON"`, `"HEAT"`) and deci-Kelvin temperatures (`"2982"`).
//! Decoding never fails loudly; a value that cannot be interpreted yields
//! `None` and the caller skips the field.

use std::fmt;
use std::str::FromStr;

use aerolink_core::{PointValue, ValueKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DeviceError;
use crate::schema::DataPointDescriptor;

/// Nominal filter lifetime in hours.
pub const NOMINAL_FILTER_LIFE_HOURS: f64 = 4300.0;

/// Width of zero-padded numeric command values.
pub const COMMAND_NUMBER_WIDTH: usize = 4;

const KELVIN_OFFSET: f64 = 273.15;
const DECI_KELVIN_OFFSET: f64 = 2731.5;

const OFF_TOKEN: &str = "OFF";
const ON_TOKEN: &str = "ON";

/// Temperature display unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[serde(alias = "K", alias = "k")]
    Kelvin,
    #[default]
    #[serde(alias = "C", alias = "c")]
    Celsius,
    #[serde(alias = "F", alias = "f")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn display_unit(&self) -> &'static str {
        match self {
            Self::Kelvin => "K",
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    fn from_kelvin(&self, kelvin: f64) -> f64 {
        match self {
            Self::Kelvin => kelvin,
            Self::Celsius => kelvin - KELVIN_OFFSET,
            Self::Fahrenheit => (kelvin - KELVIN_OFFSET) * 9.0 / 5.0 + 32.0,
        }
    }

    fn to_celsius(&self, value: f64) -> f64 {
        match self {
            Self::Kelvin => value - KELVIN_OFFSET,
            Self::Celsius => value,
            Self::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kelvin => write!(f, "kelvin"),
            Self::Celsius => write!(f, "celsius"),
            Self::Fahrenheit => write!(f, "fahrenheit"),
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "k" | "kelvin" => Ok(Self::Kelvin),
            "c" | "celsius" | "°c" => Ok(Self::Celsius),
            "f" | "fahrenheit" | "°f" => Ok(Self::Fahrenheit),
            other => {
                Err(DeviceError::Configuration(format!("Unknown temperature unit: {}", other)))
            }
        }
    }
}

/// Result of decoding one wire value.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub value: PointValue,
    /// Display unit for this call; differs from the descriptor for temperatures
    pub unit: &'static str,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Left-pad an integer with zeros to `width` digits.
///
/// The sign is placed before the padding and is not counted.
pub fn zero_fill_int(number: i64, width: usize) -> String {
    let digits = number.unsigned_abs().to_string();
    let sign = if number < 0 { "-" } else { "" };
    format!("{}{:0>width$}", sign, digits, width = width)
}

/// Zero-fill any value that reads as an integer; anything else gives `""`.
///
/// Fractional numbers are truncated toward zero.
pub fn zero_fill(value: &PointValue, width: usize) -> String {
    let number = match value {
        PointValue::Integer(n) => Some(*n),
        PointValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        PointValue::String(s) => parse_integer(s),
        _ => None,
    };
    number.map(|n| zero_fill_int(n, width)).unwrap_or_default()
}

/// Inverse of [`zero_fill_int`].
pub fn decode_zero_fill(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

fn parse_integer(text: &str) -> Option<i64> {
    decode_zero_fill(text).or_else(|| {
        text.trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

fn parse_number(raw: &Value) -> Option<PointValue> {
    match raw {
        Value::Number(_) => Some(PointValue::from_json(raw)),
        Value::String(s) => {
            if let Some(n) = decode_zero_fill(s) {
                Some(PointValue::Integer(n))
            } else {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(PointValue::Float)
            }
        }
        _ => None,
    }
}

/// Remaining filter life as a share of the nominal lifetime.
pub fn filter_life_percent(hours: f64) -> f64 {
    hours * 100.0 / NOMINAL_FILTER_LIFE_HOURS
}

/// Convert a deci-Kelvin reading to `unit`, rounded to two decimals.
pub fn decode_temperature(deci_kelvin: f64, unit: TemperatureUnit) -> f64 {
    round2(unit.from_kelvin(deci_kelvin / 10.0))
}

/// Convert a temperature in `unit` to whole deci-Kelvin.
pub fn encode_temperature(value: f64, unit: TemperatureUnit) -> i64 {
    (unit.to_celsius(value) * 10.0 + DECI_KELVIN_OFFSET).round() as i64
}

/// Wire token that switches a boolean point on.
pub fn on_token(descriptor: &DataPointDescriptor) -> &'static str {
    descriptor
        .enumeration
        .unwrap_or_default()
        .iter()
        .map(|(key, _)| *key)
        .find(|key| *key != OFF_TOKEN)
        .unwrap_or(ON_TOKEN)
}

/// Decode a raw wire value for `descriptor`.
pub fn decode(
    descriptor: &DataPointDescriptor,
    raw: &Value,
    unit: TemperatureUnit,
) -> Option<Decoded> {
    let value = match descriptor.value_kind {
        ValueKind::Number => match parse_number(raw) {
            Some(number) if descriptor.is_temperature() => {
                let deci_kelvin = number.as_f64()?;
                return Some(Decoded {
                    value: PointValue::Float(decode_temperature(deci_kelvin, unit)),
                    unit: unit.display_unit(),
                });
            }
            Some(number) => number,
            // Non-numeric tokens such as "AUTO" or "OFF" are legal when enumerated.
            None => match raw {
                Value::String(s) => PointValue::String(descriptor.enumeration_key(s)?.to_string()),
                _ => return None,
            },
        },
        ValueKind::Boolean => match raw {
            Value::Bool(b) => PointValue::Boolean(*b),
            Value::String(s) if !s.trim().is_empty() => {
                PointValue::Boolean(!s.trim().eq_ignore_ascii_case(OFF_TOKEN))
            }
            Value::Number(n) => PointValue::Boolean(n.as_f64()? != 0.0),
            _ => return None,
        },
        ValueKind::Text => match raw {
            Value::Null => return None,
            other => PointValue::from_json(other),
        },
    };

    Some(Decoded {
        value,
        unit: descriptor.unit,
    })
}

/// Encode a semantic value for the wire.
///
/// Returns an empty string when the value cannot be expressed.
pub fn encode(
    descriptor: &DataPointDescriptor,
    value: &PointValue,
    unit: TemperatureUnit,
) -> String {
    match descriptor.value_kind {
        ValueKind::Number if descriptor.is_temperature() => {
            let number = match value {
                PointValue::String(s) => s.trim().parse::<f64>().ok(),
                other => other.as_f64(),
            };
            number
                .filter(|n| n.is_finite())
                .map(|n| zero_fill_int(encode_temperature(n, unit), COMMAND_NUMBER_WIDTH))
                .unwrap_or_default()
        }
        ValueKind::Number => match value {
            PointValue::String(s) if parse_integer(s).is_none() => descriptor
                .enumeration_key(s)
                .map(str::to_string)
                .unwrap_or_default(),
            other => zero_fill(other, COMMAND_NUMBER_WIDTH),
        },
        ValueKind::Boolean => {
            let on = match value {
                PointValue::Boolean(b) => *b,
                PointValue::Integer(n) => *n != 0,
                PointValue::String(s) => {
                    if let Some(key) = descriptor.enumeration_key(s) {
                        return key.to_string();
                    }
                    !s.eq_ignore_ascii_case(OFF_TOKEN) && !s.eq_ignore_ascii_case("false")
                }
                _ => return String::new(),
            };
            if on {
                on_token(descriptor).to_string()
            } else {
                OFF_TOKEN.to_string()
            }
        }
        ValueKind::Text => match value {
            PointValue::String(s) => descriptor
                .enumeration_key(s)
                .map(str::to_string)
                .unwrap_or_else(|| s.clone()),
            PointValue::Null => String::new(),
            other => other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;
    use serde_json::json;
    use TemperatureUnit::{Celsius, Fahrenheit, Kelvin};

    fn descriptor(code: &str) -> &'static DataPointDescriptor {
        SchemaRegistry::builtin().lookup_by_wire_code(code).unwrap()
    }

    /// Decoded value in Celsius, `Null` when the field would be skipped.
    fn decoded(code: &str, raw: Value) -> PointValue {
        decode(descriptor(code), &raw, Celsius).map_or(PointValue::Null, |d| d.value)
    }

    fn close_to(value: &PointValue, expected: f64) -> bool {
        (value.as_f64().unwrap() - expected).abs() < 1e-9
    }

    #[test]
    fn test_zero_fill_examples() {
        assert_eq!(zero_fill_int(5, 4), "0005");
        assert_eq!(zero_fill_int(-5, 4), "-0005");
        assert_eq!(zero_fill_int(734, 8), "00000734");
        assert_eq!(zero_fill_int(12345, 4), "12345");
        assert_eq!(zero_fill(&PointValue::from("äöüß"), 50), "");
        assert_eq!(zero_fill(&PointValue::from("7"), 4), "0007");
        assert_eq!(zero_fill(&PointValue::Float(7.9), 4), "0007");
        assert_eq!(zero_fill(&PointValue::Boolean(true), 4), "");
    }

    #[test]
    fn test_zero_fill_inverse() {
        for n in [-9999_i64, -5, 0, 1, 42, 734, 2982] {
            for width in [4_usize, 6, 8] {
                assert_eq!(decode_zero_fill(&zero_fill_int(n, width)), Some(n));
            }
        }
        assert_eq!(decode_zero_fill("INIT"), None);
    }

    #[test]
    fn test_temperature_decode_celsius() {
        let decoded = decode(descriptor("tact"), &json!("2982"), Celsius).unwrap();
        assert!(close_to(&decoded.value, 25.05));
        assert_eq!(decoded.unit, "°C");
    }

    #[test]
    fn test_temperature_decode_other_units() {
        let tact = descriptor("tact");

        let kelvin = decode(tact, &json!("2982"), Kelvin).unwrap();
        assert!(close_to(&kelvin.value, 298.2));
        assert_eq!(kelvin.unit, "K");

        let fahrenheit = decode(tact, &json!("2982"), Fahrenheit).unwrap();
        assert!(close_to(&fahrenheit.value, 77.09));
        assert_eq!(fahrenheit.unit, "°F");
    }

    #[test]
    fn test_temperature_encode_roundtrip() {
        let hmax = descriptor("hmax");
        assert_eq!(encode(hmax, &PointValue::Integer(25), Celsius), "2982");
        assert_eq!(encode(hmax, &PointValue::Float(298.2), Kelvin), "2982");
        assert_eq!(encode(hmax, &PointValue::Float(77.09), Fahrenheit), "2982");
        assert_eq!(encode(hmax, &PointValue::from("warm"), Celsius), "");

        let back = decode(hmax, &json!("2982"), Celsius).unwrap();
        assert!((back.value.as_f64().unwrap() - 25.0).abs() <= 0.1);
    }

    #[test]
    fn test_number_decode() {
        assert_eq!(decoded("fnsp", json!("0005")), PointValue::Integer(5));
        assert_eq!(decoded("fnsp", json!("AUTO")), PointValue::from("AUTO"));
        assert_eq!(decoded("pm25", json!("INIT")), PointValue::Null);
        assert_eq!(decoded("pm25", json!(17)), PointValue::Integer(17));
    }

    #[test]
    fn test_boolean_decode_tokens() {
        assert_eq!(decoded("hmod", json!("HEAT")), PointValue::Boolean(true));
        assert_eq!(decoded("hmod", json!("OFF")), PointValue::Boolean(false));
        assert_eq!(decoded("hmod", json!(true)), PointValue::Boolean(true));
        assert_eq!(decoded("hmod", json!("")), PointValue::Null);
    }

    #[test]
    fn test_boolean_encode_uses_on_token() {
        let on = PointValue::Boolean(true);
        assert_eq!(encode(descriptor("hmod"), &on, Celsius), "HEAT");
        assert_eq!(encode(descriptor("hume"), &on, Celsius), "HUMD");
        assert_eq!(encode(descriptor("fpwr"), &on, Celsius), "ON");

        let fpwr = descriptor("fpwr");
        assert_eq!(encode(fpwr, &PointValue::Boolean(false), Celsius), "OFF");
        assert_eq!(encode(fpwr, &PointValue::from("on"), Celsius), "ON");
    }

    #[test]
    fn test_enumerated_text_passes_through() {
        let fmod = descriptor("fmod");
        assert_eq!(decoded("fmod", json!("AUTO")), PointValue::from("AUTO"));
        assert_eq!(encode(fmod, &PointValue::from("AUTO"), Celsius), "AUTO");
        // Unknown tokens are not rejected by the transformer.
        assert_eq!(decoded("fmod", json!("TURBO")), PointValue::from("TURBO"));
    }

    #[test]
    fn test_number_encode() {
        let fnsp = descriptor("fnsp");
        assert_eq!(encode(fnsp, &PointValue::Integer(7), Celsius), "0007");
        assert_eq!(encode(fnsp, &PointValue::from("auto"), Celsius), "AUTO");
        assert_eq!(encode(fnsp, &PointValue::from("turbo"), Celsius), "");

        let sltm = descriptor("sltm");
        assert_eq!(encode(sltm, &PointValue::Integer(90), Celsius), "0090");
    }

    #[test]
    fn test_filter_life_percent() {
        assert!((filter_life_percent(4300.0) - 100.0).abs() < f64::EPSILON);
        assert!((filter_life_percent(2150.0) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_temperature_unit_parse() {
        assert_eq!("F".parse::<TemperatureUnit>().unwrap(), Fahrenheit);
        assert_eq!("celsius".parse::<TemperatureUnit>().unwrap(), Celsius);
        assert_eq!(" k ".parse::<TemperatureUnit>().unwrap(), Kelvin);
        assert!("rankine".parse::<TemperatureUnit>().is_err());
    }
}
