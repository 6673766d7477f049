//! Aerolink device engine.
//!
//! Translates the messages networked air-treatment appliances (purifiers,
//! heaters, humidifiers) publish into hierarchical state, and state changes
//! back into device commands.
//!
//! ## Architecture
//!
//! - **SchemaRegistry**: static table of wire codes and their semantics
//! - **transform**: deci-Kelvin temperatures, zero-filled integers, switch tokens
//! - **air_quality**: pollutant readings bucketed into quality indices
//! - **MessageNormalizer**: envelope -> ordered [`NormalizedUpdate`]s
//! - **StateReconciler**: idempotent application of updates to a [`StateStore`]
//! - **CommandEncoder**: semantic change -> [`WireCommand`]
//!
//! Inbound: `message -> MessageNormalizer -> StateReconciler -> store`.
//! Outbound: `change -> CommandEncoder -> OutboundMessage -> transport`.
//!
//! [`StateStore`]: aerolink_core::StateStore

pub mod air_quality;
pub mod command;
pub mod context;
pub mod error;
pub mod normalizer;
pub mod protocol;
pub mod reconciler;
pub mod schema;
pub mod transform;

pub use air_quality::{classify, PollutantCategory, QualityIndices};
pub use command::{CommandEncoder, WireCommand};
pub use context::DeviceContext;
pub use error::{DeviceError, Result};
pub use normalizer::{
    EnvelopeKind, MessageNormalizer, Normalized, NormalizedUpdate, UpdateValue, MAX_UNWRAP_DEPTH,
};
pub use protocol::{command_topic, status_topic, MessageKind, OutboundMessage};
pub use reconciler::{ReconcileOutcome, ReconcileReport, StateReconciler, WarmupPhase};
pub use schema::{DataPointDescriptor, SchemaRegistry};
pub use transform::{Decoded, TemperatureUnit};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
