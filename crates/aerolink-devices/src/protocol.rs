//! Device wire protocol framing.
//!
//! Commands and requests are JSON objects published on the device's command
//! topic:
//!
//! ```text
//! {"msg":"STATE-SET","time":"2024-05-01T10:00:00.000Z","mode-reason":"LAPP","state-reason":"MODE","data":{"fnsp":"0004"}}
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::WireCommand;
use crate::context::DeviceContext;
use crate::error::{DeviceError, Result};
use crate::normalizer::MESSAGE_KIND_KEY;

/// Reason tag for changes requested by a local application.
pub const MODE_REASON_APP: &str = "LAPP";
/// State reason attached to state-set commands.
pub const STATE_REASON_MODE: &str = "MODE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "CURRENT-STATE")]
    CurrentState,
    #[serde(rename = "STATE-CHANGE")]
    StateChange,
    #[serde(rename = "ENVIRONMENTAL-CURRENT-SENSOR-DATA")]
    EnvironmentalSensorData,
    #[serde(rename = "STATE-SET")]
    StateSet,
    #[serde(rename = "REQUEST-CURRENT-STATE")]
    RequestCurrentState,
    #[serde(rename = "REQUEST-PRODUCT-ENVIRONMENT-CURRENT-SENSOR-DATA")]
    RequestSensorData,
}

impl MessageKind {
    pub const ALL: [MessageKind; 6] = [
        MessageKind::CurrentState,
        MessageKind::StateChange,
        MessageKind::EnvironmentalSensorData,
        MessageKind::StateSet,
        MessageKind::RequestCurrentState,
        MessageKind::RequestSensorData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentState => "CURRENT-STATE",
            Self::StateChange => "STATE-CHANGE",
            Self::EnvironmentalSensorData => "ENVIRONMENTAL-CURRENT-SENSOR-DATA",
            Self::StateSet => "STATE-SET",
            Self::RequestCurrentState => "REQUEST-CURRENT-STATE",
            Self::RequestSensorData => "REQUEST-PRODUCT-ENVIRONMENT-CURRENT-SENSOR-DATA",
        }
    }

    /// Sent by the device rather than by us.
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            Self::CurrentState | Self::StateChange | Self::EnvironmentalSensorData
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DeviceError::Serialization(format!("Unknown message kind: {}", s)))
    }
}

/// Kind of an inbound envelope, if it carries a known `msg`.
pub fn message_kind(envelope: &Value) -> Option<MessageKind> {
    envelope
        .get(MESSAGE_KIND_KEY)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

/// Topic commands for the device are published on.
pub fn command_topic(ctx: &DeviceContext) -> String {
    format!("{}/{}/command", ctx.product_type(), ctx.serial())
}

/// Topic the device reports its state on.
pub fn status_topic(ctx: &DeviceContext) -> String {
    format!("{}/{}/status/current", ctx.product_type(), ctx.serial())
}

/// Envelope timestamp: UTC, millisecond precision.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Message sent to a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub msg: MessageKind,
    pub time: String,
    #[serde(rename = "mode-reason")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_reason: Option<String>,
    #[serde(rename = "state-reason")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<WireCommand>,
}

impl OutboundMessage {
    fn new(msg: MessageKind, at: DateTime<Utc>) -> Self {
        Self {
            msg,
            time: timestamp(at),
            mode_reason: None,
            state_reason: None,
            data: None,
        }
    }

    /// Set one or more data points.
    pub fn state_set(command: WireCommand, at: DateTime<Utc>) -> Self {
        Self {
            mode_reason: Some(MODE_REASON_APP.to_string()),
            state_reason: Some(STATE_REASON_MODE.to_string()),
            data: Some(command),
            ..Self::new(MessageKind::StateSet, at)
        }
    }

    /// Ask the device to report its full product state.
    pub fn request_current_state(at: DateTime<Utc>) -> Self {
        Self::new(MessageKind::RequestCurrentState, at)
    }

    /// Ask the device to report its sensor data.
    pub fn request_sensor_data(at: DateTime<Utc>) -> Self {
        Self::new(MessageKind::RequestSensorData, at)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
