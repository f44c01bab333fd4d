//! Decoder configuration types
//!
//! The car-level configuration the decoder needs at startup: which vehicle
//! variant it decodes for, and which optional features that car has.

use crate::registry::VehicleVariant;
use crate::types::Result;
use serde::{Deserialize, Serialize};

/// Configuration for one [`crate::StateDecoder`]
///
/// There is deliberately no default variant: a decoder must never run
/// against a car it was not configured for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarStateConfig {
    /// Vehicle variant identifier, e.g. "BYD_ATTO3"
    pub variant: String,

    /// Blind spot monitor is fitted and should be decoded
    #[serde(default)]
    pub enable_bsm: bool,
}

impl CarStateConfig {
    /// Create a configuration for a variant with all optional features off
    pub fn new(variant: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            enable_bsm: false,
        }
    }

    /// Builder method: enable or disable blind spot monitoring
    pub fn with_bsm(mut self, enabled: bool) -> Self {
        self.enable_bsm = enabled;
        self
    }

    /// Resolve the configured variant identifier
    pub fn vehicle_variant(&self) -> Result<VehicleVariant> {
        self.variant.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = CarStateConfig::new("BYD_ATTO3").with_bsm(true);
        assert_eq!(config.variant, "BYD_ATTO3");
        assert!(config.enable_bsm);
        assert_eq!(config.vehicle_variant().unwrap(), VehicleVariant::Atto3);
    }

    #[test]
    fn test_bsm_defaults_off() {
        let config: CarStateConfig = serde_json::from_str(r#"{"variant": "BYD_ATTO3"}"#).unwrap();
        assert!(!config.enable_bsm);
    }

    #[test]
    fn test_variant_is_required() {
        let result: std::result::Result<CarStateConfig, _> = serde_json::from_str(r#"{"enable_bsm": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_variant() {
        assert!(CarStateConfig::new("SOMETHING_ELSE").vehicle_variant().is_err());
    }
}
