//! Signal source interface
//!
//! The decoder never touches frames itself. It reads the latest value of
//! each (bus, group, field) through [`SignalSource`], which must answer
//! without blocking and fall back to a default when nothing was received.

use crate::registry::{Bus, Subscription};
use crate::types::Result;
use std::collections::HashMap;

/// Value reported for fields that were never received
pub const DEFAULT_SIGNAL_VALUE: f64 = 0.0;

/// Latest-value view over decoded bus traffic
pub trait SignalSource {
    /// Register the signal groups the decoder will read
    ///
    /// Called once at startup; an error here is fatal for the decoder.
    fn subscribe(&mut self, subscriptions: &[Subscription]) -> Result<()>;

    /// Most recent value of a field, or [`DEFAULT_SIGNAL_VALUE`]
    fn latest_value(&self, bus: Bus, group: &str, field: &str) -> f64;
}

/// In-memory signal source holding explicitly set values
///
/// Useful for replaying recorded state or driving the decoder in tests.
#[derive(Debug, Clone, Default)]
pub struct SignalSnapshot {
    /// bus -> group -> field -> value
    values: HashMap<Bus, HashMap<String, HashMap<String, f64>>>,
}

impl SignalSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, bus: Bus, group: &str, field: &str, value: f64) {
        self.values
            .entry(bus)
            .or_default()
            .entry(group.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    /// Builder method: set a value
    pub fn with(mut self, bus: Bus, group: &str, field: &str, value: f64) -> Self {
        self.set(bus, group, field, value);
        self
    }

    /// Builder method: set a boolean value as 0.0 / 1.0
    pub fn with_flag(self, bus: Bus, group: &str, field: &str, on: bool) -> Self {
        self.with(bus, group, field, if on { 1.0 } else { 0.0 })
    }

    /// Forget every value, as if nothing had been received
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl SignalSource for SignalSnapshot {
    fn subscribe(&mut self, subscriptions: &[Subscription]) -> Result<()> {
        log::debug!("Snapshot source accepting {} subscriptions", subscriptions.len());
        Ok(())
    }

    fn latest_value(&self, bus: Bus, group: &str, field: &str) -> f64 {
        self.values
            .get(&bus)
            .and_then(|groups| groups.get(group))
            .and_then(|fields| fields.get(field))
            .copied()
            .unwrap_or(DEFAULT_SIGNAL_VALUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_fields_default() {
        let snapshot = SignalSnapshot::new().with(Bus::Powertrain, "PEDAL", "GAS_PEDAL", 0.4);
        assert_eq!(snapshot.latest_value(Bus::Powertrain, "PEDAL", "GAS_PEDAL"), 0.4);
        assert_eq!(snapshot.latest_value(Bus::Powertrain, "PEDAL", "BRAKE_PEDAL"), 0.0);
        // same group name on the other bus is a different group
        assert_eq!(snapshot.latest_value(Bus::Camera, "PEDAL", "GAS_PEDAL"), 0.0);
    }

    #[test]
    fn test_flags_and_overwrite() {
        let mut snapshot = SignalSnapshot::new().with_flag(Bus::Camera, "ACC_CMD", "STANDSTILL_STATE", true);
        assert_eq!(snapshot.latest_value(Bus::Camera, "ACC_CMD", "STANDSTILL_STATE"), 1.0);
        snapshot.set(Bus::Camera, "ACC_CMD", "STANDSTILL_STATE", 0.0);
        assert_eq!(snapshot.latest_value(Bus::Camera, "ACC_CMD", "STANDSTILL_STATE"), 0.0);
        snapshot.clear();
        assert_eq!(snapshot.latest_value(Bus::Camera, "ACC_CMD", "STANDSTILL_STATE"), 0.0);
    }

    #[test]
    fn test_lookup_with_borrowed_names() {
        let snapshot = SignalSnapshot::new().with(Bus::Powertrain, "WHEEL_SPEED", "WHEELSPEED_FL", 12.0);
        let group = String::from("WHEEL_SPEED");
        let field = String::from("WHEELSPEED_FL");
        assert_eq!(snapshot.latest_value(Bus::Powertrain, &group, &field), 12.0);
        assert_eq!(snapshot.latest_value(Bus::Camera, &group, &field), 0.0);
    }
}
