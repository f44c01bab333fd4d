//! State decoder
//!
//! [`StateDecoder`] is the per-tick entry point. Each call to
//! [`StateDecoder::update`] reads the latest value of every subscribed group
//! from a [`SignalSource`], derives a fresh [`VehicleState`] and updates the
//! decoder's private [`DecodeContext`].
//!
//! The update path is total: it returns a state for any input, never an
//! error, and never blocks.

use crate::config::CarStateConfig;
use crate::context::{AuxiliaryStatus, DecodeContext};
use crate::enums::{EnumCatalog, EnumResolver, GearShifter};
use crate::estimator::MotionEstimator;
use crate::registry::{self, groups, Bus, Subscription, VehicleVariant};
use crate::signals::SignalSource;
use crate::types::{BlindSpot, CruiseState, Result, VehicleState, WheelSpeeds};
use crate::units::KPH_TO_MS;

/// Ratio between the speed shown on the meter cluster and ground speed
pub const HUD_MULTIPLIER: f64 = 1.068;

/// Below this raw speed (m/s) the car is at standstill
pub const STANDSTILL_THRESHOLD: f64 = 0.01;

/// Gas pedal fraction at or above which the pedal counts as pressed
pub const GAS_PRESSED_THRESHOLD: f64 = 0.01;

/// Brake pedal fraction above which the pedal counts as pressed
pub const BRAKE_PRESSED_THRESHOLD: f64 = 0.01;

/// Driver EPS torque magnitude above which the driver is steering
pub const STEERING_PRESSED_THRESHOLD: f64 = 6.0;

/// Lowest set speed (km/h) the cluster displays while cruise is available
pub const MIN_SET_SPEED_KPH: f64 = 30.0;

/// True if any of the inputs is set
pub fn any_of<const N: usize>(flags: [bool; N]) -> bool {
    flags.iter().any(|&flag| flag)
}

fn flag(value: f64) -> bool {
    value != 0.0
}

/// Cluster set speed (m/s) for a reported HUD set speed (km/h)
///
/// Zero while cruise is unavailable; otherwise floored at
/// [`MIN_SET_SPEED_KPH`].
pub fn cluster_set_speed(available: bool, reported_kph: f64) -> f64 {
    if available {
        // NaN.max(x) is x, so a garbage reading lands on the floor
        reported_kph.trunc().max(MIN_SET_SPEED_KPH) * KPH_TO_MS
    } else {
        0.0
    }
}

/// Decodes bus signals into one [`VehicleState`] per control tick
#[derive(Debug, Clone)]
pub struct StateDecoder {
    config: CarStateConfig,
    variant: VehicleVariant,
    resolver: EnumResolver,
    context: DecodeContext,
}

impl StateDecoder {
    /// Create a decoder for the configured variant
    ///
    /// Fails if the variant is unknown or the catalog lacks a required
    /// enumeration table.
    pub fn new<C: EnumCatalog + ?Sized>(config: CarStateConfig, catalog: &C) -> Result<Self> {
        let variant = config.vehicle_variant()?;
        let resolver = EnumResolver::load(catalog, variant)?;

        log::info!(
            "State decoder ready for {} (blind spot monitor: {})",
            variant,
            if config.enable_bsm { "on" } else { "off" }
        );

        Ok(Self {
            config,
            variant,
            resolver,
            context: DecodeContext::new(),
        })
    }

    /// Variant resolved from the configuration at construction
    pub fn variant(&self) -> VehicleVariant {
        self.variant
    }

    /// Configuration the decoder was built with
    pub fn config(&self) -> &CarStateConfig {
        &self.config
    }

    /// Signal groups this decoder reads
    pub fn subscriptions(&self) -> &'static [Subscription] {
        registry::subscriptions(self.variant)
    }

    /// Register this decoder's signal groups with a source
    pub fn subscribe<S: SignalSource + ?Sized>(&self, source: &mut S) -> Result<()> {
        let subscriptions = self.subscriptions();
        source.subscribe(subscriptions)?;
        log::info!("Subscribed to {} signal groups", subscriptions.len());
        Ok(())
    }

    /// Lane support / HUD values retained from the latest tick
    pub fn auxiliary(&self) -> &AuxiliaryStatus {
        self.context.auxiliary()
    }

    /// Decode one tick
    ///
    /// `source` stays borrowed for the whole call, so every field is derived
    /// from the same set of signal values. `estimator` is fed exactly one
    /// raw speed sample.
    pub fn update<S, E>(&mut self, source: &S, estimator: &mut E) -> VehicleState
    where
        S: SignalSource + ?Sized,
        E: MotionEstimator + ?Sized,
    {
        let pt = |group: &str, field: &str| source.latest_value(Bus::Powertrain, group, field);
        let cam = |group: &str, field: &str| source.latest_value(Bus::Camera, group, field);

        let mut ret = VehicleState::default();

        // wheel speeds and ego speed
        let wheels = self.variant.wheel_speed_channels();
        ret.wheel_speeds = WheelSpeeds {
            fl: pt(wheels.group, wheels.fl) * KPH_TO_MS,
            fr: pt(wheels.group, wheels.fr) * KPH_TO_MS,
            rl: pt(wheels.group, wheels.rl) * KPH_TO_MS,
            rr: pt(wheels.group, wheels.rr) * KPH_TO_MS,
        };
        ret.v_ego_raw = (ret.wheel_speeds.rl + ret.wheel_speeds.fl) / 2.0;

        let (v_ego, a_ego) = estimator.update(ret.v_ego_raw);
        ret.v_ego = v_ego;
        ret.a_ego = a_ego;
        ret.v_ego_cluster = ret.v_ego;
        ret.standstill = ret.v_ego_raw < STANDSTILL_THRESHOLD;

        // gear
        let gear_code = pt(groups::DRIVE_STATE, "GEAR") as i64;
        let gear = self.resolver.gear(gear_code);
        if gear.is_unknown() {
            log::debug!("Unmapped gear code {}", gear_code);
        }
        ret.gear_shifter = GearShifter::from_resolution(gear);

        // doors and seatbelt
        ret.door_open = any_of([
            flag(pt(groups::METER_CLUSTER, "BACK_LEFT_DOOR")),
            flag(pt(groups::METER_CLUSTER, "FRONT_LEFT_DOOR")),
            flag(pt(groups::METER_CLUSTER, "BACK_RIGHT_DOOR")),
            flag(pt(groups::METER_CLUSTER, "FRONT_RIGHT_DOOR")),
        ]);
        ret.seatbelt_unlatched = pt(groups::METER_CLUSTER, "SEATBELT_DRIVER") == 0.0;

        // pedals
        ret.gas = pt(groups::PEDAL, "GAS_PEDAL");
        ret.gas_pressed = ret.gas >= GAS_PRESSED_THRESHOLD;

        ret.brake = pt(groups::PEDAL, "BRAKE_PEDAL");
        ret.brake_pressed = any_of([
            flag(pt(groups::DRIVE_STATE, "BRAKE_PRESSED")),
            ret.brake > BRAKE_PRESSED_THRESHOLD,
        ]);
        // electric drivetrain, no auto hold
        ret.brake_hold_active = false;

        // steering
        ret.steering_angle_deg = pt(groups::STEER_MODULE_2, "STEER_ANGLE_2");
        let steer_dir = self.context.steer_direction(ret.steering_angle_deg);
        ret.steering_torque = pt(groups::STEERING_TORQUE, "MAIN_TORQUE");
        ret.steering_torque_eps = pt(groups::STEER_MODULE_2, "DRIVER_EPS_TORQUE") * steer_dir;
        ret.steering_pressed = ret.steering_torque_eps.abs() > STEERING_PRESSED_THRESHOLD;

        // cruise
        let available = any_of([
            flag(cam(groups::ACC_HUD_ADAS, "ACC_ON1")),
            flag(cam(groups::ACC_HUD_ADAS, "ACC_ON2")),
        ]);
        let speed_cluster = cluster_set_speed(available, cam(groups::ACC_HUD_ADAS, "SET_SPEED"));
        ret.cruise_state = CruiseState {
            available,
            enabled: flag(cam(groups::ACC_CMD, "ACC_CONTROLLABLE_AND_ON")),
            standstill: flag(cam(groups::ACC_CMD, "STANDSTILL_STATE")),
            speed: speed_cluster / HUD_MULTIPLIER,
            speed_cluster,
            non_adaptive: false,
        };

        // stalks
        ret.left_blinker = flag(pt(groups::STALKS, "LEFT_BLINKER"));
        ret.right_blinker = flag(pt(groups::STALKS, "RIGHT_BLINKER"));
        ret.generic_toggle = flag(pt(groups::STALKS, "GENERIC_TOGGLE"));
        ret.esp_disabled = false;

        // blind spot
        ret.blind_spot = self.config.enable_bsm.then(|| BlindSpot {
            left: flag(pt(groups::BSM, "LEFT_APPROACH")),
            right: flag(pt(groups::BSM, "RIGHT_APPROACH")),
        });

        // lane support / HUD, kept for the HUD path only
        self.context.retain_auxiliary(AuxiliaryStatus {
            lss_state: cam(groups::LKAS_HUD_ADAS, "LSS_STATE"),
            lss_alert: cam(groups::LKAS_HUD_ADAS, "SETTINGS"),
            tsr: cam(groups::LKAS_HUD_ADAS, "TSR"),
            lka_on: cam(groups::LKAS_HUD_ADAS, "STEER_ACTIVE_ACTIVE_LOW"),
            lkas_button: flag(pt(groups::PCM_BUTTONS, "LKAS_ON_BTN")),
            high_beam_assist: cam(groups::LKAS_HUD_ADAS, "SET_ME_XFF"),
            passthrough: cam(groups::LKAS_HUD_ADAS, "SET_ME_X5F"),
            hma: cam(groups::LKAS_HUD_ADAS, "HMA"),
            eps_ok: flag(cam(groups::STEERING_MODULE_ADAS, "EPS_OK")),
            set_distance: self
                .resolver
                .set_distance(cam(groups::ACC_HUD_ADAS, "SET_DISTANCE") as i64),
        });

        // TODO: wire to the real AEB/FCW signals once they are identified on the camera bus
        ret.stock_aeb = false;
        ret.stock_fcw = false;

        log::trace!(
            "tick: v_ego_raw={:.3} gear={} angle={:.1} cruise={}",
            ret.v_ego_raw,
            ret.gear_shifter,
            ret.steering_angle_deg,
            ret.cruise_state.available
        );

        ret
    }
}
