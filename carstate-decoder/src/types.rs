//! Core types for the car state decoder
//!
//! This module defines the error type, the raw frame type consumed by the
//! reference signal source, and the [`VehicleState`] snapshot the decoder
//! produces once per control tick.

use crate::enums::GearShifter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that can occur while configuring the decoder or its collaborators
///
/// The per-tick decode path never produces one of these; every variant is
/// raised at initialization time.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Unknown vehicle variant: {0}")]
    UnknownVariant(String),

    #[error("Signal group not available for subscription: {group} on bus {bus}")]
    MissingSubscription { bus: String, group: String },

    #[error("Enumeration table not found: {group}.{field}")]
    MissingEnumTable { group: String, field: String },

    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Raw CAN frame as handed to [`crate::CanSignalSource`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanFrame {
    /// Receive time in nanoseconds since epoch
    pub timestamp_ns: u64,
    /// Bus index the frame arrived on (0 = powertrain, 2 = camera)
    pub bus: u8,
    /// CAN arbitration ID
    pub address: u32,
    /// Frame payload
    pub data: Vec<u8>,
}

impl CanFrame {
    pub fn new(timestamp_ns: u64, bus: u8, address: u32, data: Vec<u8>) -> Self {
        Self {
            timestamp_ns,
            bus,
            address,
            data,
        }
    }

    /// Convert timestamp from nanoseconds to DateTime<Utc>
    pub fn timestamp(&self) -> Timestamp {
        let secs = (self.timestamp_ns / 1_000_000_000) as i64;
        let nsecs = (self.timestamp_ns % 1_000_000_000) as u32;
        DateTime::from_timestamp(secs, nsecs).unwrap_or_default()
    }
}

/// Per-wheel speeds in m/s
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelSpeeds {
    pub fl: f64,
    pub fr: f64,
    pub rl: f64,
    pub rr: f64,
}

/// Adaptive cruise control status as reported on the camera bus
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CruiseState {
    /// Cruise main switch is on
    pub available: bool,
    /// Cruise is actively controlling
    pub enabled: bool,
    /// Cruise is holding the car at standstill
    pub standstill: bool,
    /// Set speed in m/s, corrected from the cluster reading to ground speed
    pub speed: f64,
    /// Set speed in m/s as displayed on the instrument cluster
    pub speed_cluster: f64,
    pub non_adaptive: bool,
}

/// Blind spot monitor approach warnings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindSpot {
    pub left: bool,
    pub right: bool,
}

/// Unified vehicle state, rebuilt from scratch on every tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleState {
    // kinematics
    pub v_ego_raw: f64,
    pub v_ego: f64,
    pub a_ego: f64,
    pub v_ego_cluster: f64,
    pub wheel_speeds: WheelSpeeds,
    pub standstill: bool,

    pub gear_shifter: GearShifter,

    // pedals
    pub gas: f64,
    pub gas_pressed: bool,
    pub brake: f64,
    pub brake_pressed: bool,
    pub brake_hold_active: bool,

    // steering
    pub steering_angle_deg: f64,
    pub steering_torque: f64,
    /// Driver torque measured by the EPS, signed by steering direction
    pub steering_torque_eps: f64,
    pub steering_pressed: bool,

    pub cruise_state: CruiseState,

    // body
    pub door_open: bool,
    pub seatbelt_unlatched: bool,
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub generic_toggle: bool,
    pub esp_disabled: bool,
    /// `None` when blind spot monitoring is not enabled for this car
    pub blind_spot: Option<BlindSpot>,

    // not yet wired to a real signal
    pub stock_aeb: bool,
    pub stock_fcw: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timestamp() {
        let frame = CanFrame::new(1_700_000_000_500_000_000, 0, 0x1F0, vec![0; 8]);
        let ts = frame.timestamp();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let state = VehicleState::default();
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("vEgoRaw").is_some());
        assert!(json["cruiseState"].get("speedCluster").is_some());
        assert!(json["blindSpot"].is_null());
    }
}
