//! Unit conversion constants

/// km/h to m/s
pub const KPH_TO_MS: f64 = 1.0 / 3.6;

/// m/s to km/h
pub const MS_TO_KPH: f64 = 3.6;
