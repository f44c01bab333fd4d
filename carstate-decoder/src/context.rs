//! Cross-tick memory owned by the state decoder

use crate::enums::{FollowDistance, Resolution};
use serde::Serialize;

/// Lane support and HUD values read from the camera bus
///
/// Retained every tick for HUD/alert rendering; none of it feeds
/// [`crate::VehicleState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AuxiliaryStatus {
    pub lss_state: f64,
    pub lss_alert: f64,
    pub tsr: f64,
    /// Raw lane keep active flag (active low)
    pub lka_on: f64,
    pub lkas_button: bool,
    pub high_beam_assist: f64,
    pub passthrough: f64,
    pub hma: f64,
    pub eps_ok: bool,
    pub set_distance: Resolution<FollowDistance>,
}

/// State carried from one decode to the next
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeContext {
    prev_angle: f64,
    auxiliary: AuxiliaryStatus,
}

impl DecodeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direction of steering travel since the previous call, +1.0 or -1.0
    ///
    /// Records `angle` as the new previous angle. An unchanged angle
    /// resolves to -1.0.
    pub fn steer_direction(&mut self, angle: f64) -> f64 {
        let direction = if angle - self.prev_angle > 0.0 { 1.0 } else { -1.0 };
        self.prev_angle = angle;
        direction
    }

    pub fn prev_angle(&self) -> f64 {
        self.prev_angle
    }

    pub fn retain_auxiliary(&mut self, status: AuxiliaryStatus) {
        self.auxiliary = status;
    }

    pub fn auxiliary(&self) -> &AuxiliaryStatus {
        &self.auxiliary
    }
}
