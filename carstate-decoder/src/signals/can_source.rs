//! Frame-fed signal source
//!
//! [`CanSignalSource`] decodes raw CAN frames with a DBC-derived
//! [`SignalDatabase`] and keeps the latest physical value of every field of
//! every subscribed signal group. Frames for groups nobody subscribed to are
//! ignored.

use crate::message_decoder::MessageDecoder;
use crate::registry::{Bus, Subscription};
use crate::signals::database::SignalDatabase;
use crate::signals::source::{SignalSource, DEFAULT_SIGNAL_VALUE};
use crate::types::{CanFrame, DecoderError, Result};
use std::collections::HashMap;

/// Latest values of one subscribed signal group
#[derive(Debug, Clone)]
struct GroupState {
    name: String,
    frequency_hz: u32,
    values: HashMap<String, f64>,
    last_seen_ns: Option<u64>,
    frames: u64,
}

/// Signal source that decodes CAN frames as they arrive
#[derive(Debug, Clone)]
pub struct CanSignalSource {
    database: SignalDatabase,
    /// Subscribed groups by (bus, CAN address)
    groups: HashMap<(Bus, u32), GroupState>,
    /// bus -> group name -> CAN address
    addresses: HashMap<Bus, HashMap<String, u32>>,
}

impl CanSignalSource {
    pub fn new(database: SignalDatabase) -> Self {
        Self {
            database,
            groups: HashMap::new(),
            addresses: HashMap::new(),
        }
    }

    /// Decode one frame into the latest-value store
    ///
    /// Returns `true` when the frame belonged to a subscribed group and was
    /// decoded. A payload too short for its layout is dropped and the
    /// group keeps its previous values.
    pub fn feed(&mut self, frame: &CanFrame) -> bool {
        let Some(bus) = Bus::from_index(frame.bus) else {
            return false;
        };
        let Some(state) = self.groups.get_mut(&(bus, frame.address)) else {
            return false;
        };
        let Some(message) = self.database.get_message(frame.address) else {
            return false;
        };

        match MessageDecoder::decode_message(&frame.data, message) {
            Some(values) => {
                state.values.extend(values);
                state.last_seen_ns = Some(frame.timestamp_ns);
                state.frames += 1;
                true
            }
            None => {
                log::warn!(
                    "Dropping {} frame on {}: {} bytes does not fit layout",
                    state.name,
                    bus,
                    frame.data.len()
                );
                false
            }
        }
    }

    /// Subscribed groups that have not received a single frame yet
    pub fn missing_groups(&self) -> Vec<(Bus, &str)> {
        let mut missing: Vec<(Bus, &str)> = self
            .groups
            .iter()
            .filter(|(_, state)| state.last_seen_ns.is_none())
            .map(|((bus, _), state)| (*bus, state.name.as_str()))
            .collect();
        missing.sort_by(|a, b| a.1.cmp(b.1));
        missing
    }

    /// Periodic groups whose last frame is older than `tolerance` periods at `now_ns`
    pub fn stale_groups(&self, now_ns: u64, tolerance: f64) -> Vec<(Bus, &str)> {
        let mut stale: Vec<(Bus, &str)> = self
            .groups
            .iter()
            .filter(|(_, state)| state.frequency_hz > 0)
            .filter(|(_, state)| match state.last_seen_ns {
                Some(seen) => {
                    let period_ns = 1e9 / state.frequency_hz as f64;
                    now_ns.saturating_sub(seen) as f64 > period_ns * tolerance
                }
                None => true,
            })
            .map(|((bus, _), state)| (*bus, state.name.as_str()))
            .collect();
        stale.sort_by(|a, b| a.1.cmp(b.1));
        stale
    }

    fn group(&self, bus: Bus, group: &str) -> Option<&GroupState> {
        let address = self.addresses.get(&bus)?.get(group)?;
        self.groups.get(&(bus, *address))
    }

    /// Number of frames decoded for a group
    pub fn frame_count(&self, bus: Bus, group: &str) -> u64 {
        self.group(bus, group).map(|state| state.frames).unwrap_or(0)
    }
}

impl SignalSource for CanSignalSource {
    fn subscribe(&mut self, subscriptions: &[Subscription]) -> Result<()> {
        for sub in subscriptions {
            let message = self.database.get_message_by_name(sub.group).ok_or_else(|| {
                DecoderError::MissingSubscription {
                    bus: sub.bus.to_string(),
                    group: sub.group.to_string(),
                }
            })?;

            log::debug!(
                "Subscribed {} (0x{:X}) on {} at {} Hz",
                sub.group,
                message.address,
                sub.bus,
                sub.frequency_hz
            );

            self.addresses
                .entry(sub.bus)
                .or_default()
                .insert(sub.group.to_string(), message.address);
            self.groups.insert(
                (sub.bus, message.address),
                GroupState {
                    name: sub.group.to_string(),
                    frequency_hz: sub.frequency_hz,
                    values: HashMap::new(),
                    last_seen_ns: None,
                    frames: 0,
                },
            );
        }
        Ok(())
    }

    fn latest_value(&self, bus: Bus, group: &str, field: &str) -> f64 {
        self.group(bus, group)
            .and_then(|state| state.values.get(field))
            .copied()
            .unwrap_or(DEFAULT_SIGNAL_VALUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::dbc::parse_dbc_str;

    const DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: XXX

BO_ 834 PEDAL: 8 XXX
 SG_ GAS_PEDAL : 0|8@1+ (0.01,0) [0|1] "" XXX
 SG_ BRAKE_PEDAL : 8|8@1+ (0.01,0) [0|1] "" XXX

BO_ 815 ACC_CMD: 8 XXX
 SG_ STANDSTILL_STATE : 0|1@1+ (1,0) [0|1] "" XXX
 SG_ ACC_CONTROLLABLE_AND_ON : 1|1@1+ (1,0) [0|1] "" XXX
"#;

    fn subs() -> [Subscription; 2] {
        [
            Subscription { bus: Bus::Powertrain, group: "PEDAL", frequency_hz: 50 },
            Subscription { bus: Bus::Camera, group: "ACC_CMD", frequency_hz: 50 },
        ]
    }

    fn source() -> CanSignalSource {
        let mut source = CanSignalSource::new(parse_dbc_str(DBC).unwrap());
        source.subscribe(&subs()).unwrap();
        source
    }

    #[test]
    fn test_feed_and_read() {
        let mut source = source();
        assert!(source.feed(&CanFrame::new(1, 0, 834, vec![50, 5, 0, 0, 0, 0, 0, 0])));

        let gas = source.latest_value(Bus::Powertrain, "PEDAL", "GAS_PEDAL");
        let brake = source.latest_value(Bus::Powertrain, "PEDAL", "BRAKE_PEDAL");
        assert!((gas - 0.5).abs() < 1e-9);
        assert!((brake - 0.05).abs() < 1e-9);
        assert_eq!(source.frame_count(Bus::Powertrain, "PEDAL"), 1);
    }

    #[test]
    fn test_lookup_with_borrowed_names() {
        let mut source = source();
        source.feed(&CanFrame::new(1, 0, 834, vec![50, 0, 0, 0, 0, 0, 0, 0]));
        let group = String::from("PEDAL");
        let field = String::from("GAS_PEDAL");
        assert!((source.latest_value(Bus::Powertrain, &group, &field) - 0.5).abs() < 1e-9);
        // same name on the other bus is not subscribed
        assert_eq!(source.latest_value(Bus::Camera, &group, &field), 0.0);
        assert_eq!(source.frame_count(Bus::Camera, &group), 0);
    }

    #[test]
    fn test_never_received_defaults_to_zero() {
        let source = source();
        assert_eq!(source.latest_value(Bus::Powertrain, "PEDAL", "GAS_PEDAL"), 0.0);
        assert_eq!(source.latest_value(Bus::Camera, "NOT_SUBSCRIBED", "X"), 0.0);
    }

    #[test]
    fn test_frames_filtered_by_bus() {
        let mut source = source();
        // ACC_CMD is subscribed on the camera bus only
        assert!(!source.feed(&CanFrame::new(1, 0, 815, vec![0x03, 0, 0, 0, 0, 0, 0, 0])));
        assert!(!source.feed(&CanFrame::new(1, 1, 815, vec![0x03, 0, 0, 0, 0, 0, 0, 0])));
        assert_eq!(source.latest_value(Bus::Camera, "ACC_CMD", "STANDSTILL_STATE"), 0.0);

        assert!(source.feed(&CanFrame::new(1, 2, 815, vec![0x03, 0, 0, 0, 0, 0, 0, 0])));
        assert_eq!(source.latest_value(Bus::Camera, "ACC_CMD", "STANDSTILL_STATE"), 1.0);
        assert_eq!(source.latest_value(Bus::Camera, "ACC_CMD", "ACC_CONTROLLABLE_AND_ON"), 1.0);
    }

    #[test]
    fn test_short_frame_keeps_previous_values() {
        let mut source = source();
        source.feed(&CanFrame::new(1, 0, 834, vec![20, 0, 0, 0, 0, 0, 0, 0]));
        assert!(!source.feed(&CanFrame::new(2, 0, 834, vec![90])));
        assert!((source.latest_value(Bus::Powertrain, "PEDAL", "GAS_PEDAL") - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_missing_subscription_is_fatal() {
        let mut source = CanSignalSource::new(parse_dbc_str(DBC).unwrap());
        let err = source
            .subscribe(&[Subscription { bus: Bus::Powertrain, group: "WHEEL_SPEED", frequency_hz: 50 }])
            .unwrap_err();
        assert!(matches!(err, DecoderError::MissingSubscription { ref group, .. } if group == "WHEEL_SPEED"));
    }

    #[test]
    fn test_missing_and_stale_groups() {
        let mut source = source();
        assert_eq!(source.missing_groups().len(), 2);

        source.feed(&CanFrame::new(1_000_000_000, 0, 834, vec![0; 8]));
        assert_eq!(source.missing_groups(), vec![(Bus::Camera, "ACC_CMD")]);

        // 50 Hz -> 20 ms period; 30 ms later is within 2 periods, 100 ms is not
        let stale = source.stale_groups(1_030_000_000, 2.0);
        assert_eq!(stale, vec![(Bus::Camera, "ACC_CMD")]);
        let stale = source.stale_groups(1_100_000_000, 2.0);
        assert_eq!(stale.len(), 2);
    }
}
