//! Bus group registry
//!
//! Static, per-variant declaration of which signal groups the decoder reads
//! on which bus, and how often each group is expected to refresh. The list is
//! handed to the signal source once at startup.

use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical CAN bus the decoder listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bus {
    /// Main powertrain bus
    Powertrain,
    /// Camera / ADAS bus
    Camera,
}

impl Bus {
    /// Panda bus index this bus is wired to
    pub fn index(self) -> u8 {
        match self {
            Bus::Powertrain => 0,
            Bus::Camera => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Bus> {
        match index {
            0 => Some(Bus::Powertrain),
            2 => Some(Bus::Camera),
            _ => None,
        }
    }
}

impl fmt::Display for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bus::Powertrain => write!(f, "pt"),
            Bus::Camera => write!(f, "cam"),
        }
    }
}

/// Supported vehicle variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleVariant {
    #[serde(rename = "BYD_ATTO3")]
    Atto3,
}

impl VehicleVariant {
    pub fn id(self) -> &'static str {
        match self {
            VehicleVariant::Atto3 => "BYD_ATTO3",
        }
    }

    /// Name of the DBC the variant's messages and value tables live in
    pub fn dbc_name(self) -> &'static str {
        match self {
            VehicleVariant::Atto3 => "byd_general_pt",
        }
    }

    pub fn wheel_speed_channels(self) -> WheelSpeedChannels {
        match self {
            // Only the left-side sensors are decoded on this car; each one
            // stands in for its right-side partner.
            VehicleVariant::Atto3 => WheelSpeedChannels {
                group: groups::WHEEL_SPEED,
                fl: "WHEELSPEED_FL",
                fr: "WHEELSPEED_FL",
                rl: "WHEELSPEED_BL",
                rr: "WHEELSPEED_BL",
            },
        }
    }
}

impl FromStr for VehicleVariant {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "BYD_ATTO3" | "BYD ATTO3" => Ok(VehicleVariant::Atto3),
            other => Err(DecoderError::UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for VehicleVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Source fields for each wheel position within the wheel speed group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelSpeedChannels {
    pub group: &'static str,
    pub fl: &'static str,
    pub fr: &'static str,
    pub rl: &'static str,
    pub rr: &'static str,
}

/// One signal group the decoder needs from the signal source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub bus: Bus,
    pub group: &'static str,
    /// Expected refresh rate in Hz; 0 means event driven
    pub frequency_hz: u32,
}

impl Subscription {
    const fn new(bus: Bus, group: &'static str, frequency_hz: u32) -> Self {
        Self {
            bus,
            group,
            frequency_hz,
        }
    }

    pub fn is_event_driven(&self) -> bool {
        self.frequency_hz == 0
    }
}

/// Signal group names
pub mod groups {
    pub const DRIVE_STATE: &str = "DRIVE_STATE";
    pub const WHEEL_SPEED: &str = "WHEEL_SPEED";
    pub const PEDAL: &str = "PEDAL";
    pub const METER_CLUSTER: &str = "METER_CLUSTER";
    pub const STEER_MODULE_2: &str = "STEER_MODULE_2";
    pub const STEERING_TORQUE: &str = "STEERING_TORQUE";
    pub const STALKS: &str = "STALKS";
    pub const BSM: &str = "BSM";
    pub const PCM_BUTTONS: &str = "PCM_BUTTONS";

    pub const ACC_HUD_ADAS: &str = "ACC_HUD_ADAS";
    pub const ACC_CMD: &str = "ACC_CMD";
    pub const LKAS_HUD_ADAS: &str = "LKAS_HUD_ADAS";
    pub const STEERING_MODULE_ADAS: &str = "STEERING_MODULE_ADAS";
}

const ATTO3_SUBSCRIPTIONS: &[Subscription] = &[
    Subscription::new(Bus::Powertrain, groups::DRIVE_STATE, 50),
    Subscription::new(Bus::Powertrain, groups::WHEEL_SPEED, 50),
    Subscription::new(Bus::Powertrain, groups::PEDAL, 50),
    Subscription::new(Bus::Powertrain, groups::METER_CLUSTER, 20),
    Subscription::new(Bus::Powertrain, groups::STEER_MODULE_2, 100),
    Subscription::new(Bus::Powertrain, groups::STEERING_TORQUE, 50),
    Subscription::new(Bus::Powertrain, groups::STALKS, 0),
    Subscription::new(Bus::Powertrain, groups::BSM, 20),
    Subscription::new(Bus::Powertrain, groups::PCM_BUTTONS, 0),
    Subscription::new(Bus::Camera, groups::ACC_HUD_ADAS, 50),
    Subscription::new(Bus::Camera, groups::ACC_CMD, 50),
    Subscription::new(Bus::Camera, groups::LKAS_HUD_ADAS, 50),
    Subscription::new(Bus::Camera, groups::STEERING_MODULE_ADAS, 50),
];

/// All signal groups a variant's decoder reads
pub fn subscriptions(variant: VehicleVariant) -> &'static [Subscription] {
    match variant {
        VehicleVariant::Atto3 => ATTO3_SUBSCRIPTIONS,
    }
}

/// Subscriptions for a variant given by its identifier
///
/// Fails with [`DecoderError::UnknownVariant`] for identifiers the registry
/// has no entry for.
pub fn subscriptions_for(variant_id: &str) -> Result<&'static [Subscription]> {
    let variant: VehicleVariant = variant_id.parse()?;
    Ok(subscriptions(variant))
}
