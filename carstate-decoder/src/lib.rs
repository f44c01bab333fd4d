//! BYD Car State Decoder Library
//!
//! Turns the latest values of periodically arriving CAN signals into one
//! consistent [`VehicleState`] per control tick.
//!
//! # Architecture
//!
//! - [`registry`]: which signal groups each variant reads, on which bus
//! - [`enums`]: typed gear / HUD enumeration tables with an explicit unknown
//! - [`StateDecoder`]: the per-tick decode, owning its [`context::DecodeContext`]
//! - [`signals`]: the [`SignalSource`] interface plus a DBC-driven,
//!   frame-fed implementation and an in-memory snapshot
//! - [`estimator`]: the [`MotionEstimator`] interface and a Kalman speed filter
//!
//! The library does NOT:
//! - Transport or capture frames
//! - Persist anything
//! - Send commands to the car
//!
//! # Example Usage
//!
//! ```no_run
//! use carstate_decoder::{
//!     CanFrame, CanSignalSource, CarStateConfig, DbcCatalog, SpeedKalmanFilter, StateDecoder,
//! };
//! use carstate_decoder::signals::dbc::parse_dbc_file;
//! use std::path::Path;
//!
//! let database = parse_dbc_file(Path::new("byd_general_pt.dbc")).unwrap();
//! let config = CarStateConfig::new("BYD_ATTO3").with_bsm(true);
//! let catalog = DbcCatalog::from_database(config.vehicle_variant().unwrap(), &database);
//!
//! let mut decoder = StateDecoder::new(config, &catalog).unwrap();
//! let mut source = CanSignalSource::new(database);
//! decoder.subscribe(&mut source).unwrap();
//! let mut estimator = SpeedKalmanFilter::new();
//!
//! // every received frame
//! source.feed(&CanFrame::new(0, 0, 0x1F0, vec![0; 8]));
//!
//! // every control tick
//! let state = decoder.update(&source, &mut estimator);
//! println!("v_ego = {:.2} m/s, gear = {}", state.v_ego, state.gear_shifter);
//! ```

// Public modules
pub mod config;
pub mod context;
pub mod decoder;
pub mod enums;
pub mod estimator;
pub mod registry;
pub mod signals;
pub mod types;
pub mod units;

// Internal modules (not exposed in public API)
mod message_decoder;

// Re-export main types for convenience
pub use config::CarStateConfig;
pub use context::AuxiliaryStatus;
pub use decoder::StateDecoder;
pub use enums::{EnumCatalog, FollowDistance, GearShifter, Resolution};
pub use estimator::{MotionEstimator, SpeedKalmanFilter};
pub use registry::{Bus, Subscription, VehicleVariant};
pub use signals::{CanSignalSource, DbcCatalog, SignalSnapshot, SignalSource};
pub use types::{
    BlindSpot, CanFrame, CruiseState, DecoderError, Result, Timestamp, VehicleState, WheelSpeeds,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: an empty catalog cannot build a decoder
        let catalog = DbcCatalog::new(VehicleVariant::Atto3);
        assert!(StateDecoder::new(CarStateConfig::new("BYD_ATTO3"), &catalog).is_err());
        assert!(!VERSION.is_empty());
    }
}
