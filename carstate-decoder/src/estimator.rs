//! Longitudinal speed estimation
//!
//! The decoder hands one raw speed measurement per tick to a
//! [`MotionEstimator`] and takes back filtered speed and acceleration.
//! [`SpeedKalmanFilter`] is the default estimator: a two-state
//! (speed, acceleration) Kalman filter with a precomputed steady-state gain.

/// Fuses a noisy speed measurement into smoothed speed and acceleration
pub trait MotionEstimator {
    /// Feed one raw speed sample (m/s), returning `(speed, acceleration)`
    fn update(&mut self, raw_speed: f64) -> (f64, f64);
}

/// Control loop period in seconds
pub const DT_CTRL: f64 = 0.01;

/// Steady-state Kalman gain for the speed/acceleration model at 100 Hz
const DEFAULT_GAIN: [f64; 2] = [0.12287673, 0.29666309];

/// A jump larger than this (m/s) between measurement and estimate resets the filter
const RESET_THRESHOLD: f64 = 2.0;

/// Constant-gain Kalman filter over `[speed, acceleration]`
///
/// Model: `x' = A x`, `A = [[1, dt], [0, 1]]`, measurement `z = speed`.
#[derive(Debug, Clone)]
pub struct SpeedKalmanFilter {
    dt: f64,
    gain: [f64; 2],
    // [speed, acceleration]
    x: [f64; 2],
}

impl SpeedKalmanFilter {
    pub fn new() -> Self {
        Self::with_gain(DT_CTRL, DEFAULT_GAIN)
    }

    /// Create a filter for a different loop period / gain pair
    pub fn with_gain(dt: f64, gain: [f64; 2]) -> Self {
        Self {
            dt,
            gain,
            x: [0.0, 0.0],
        }
    }

    /// Force the state, e.g. after a restart at non-zero speed
    pub fn reset_to(&mut self, speed: f64) {
        self.x = [speed, 0.0];
    }

    pub fn state(&self) -> (f64, f64) {
        (self.x[0], self.x[1])
    }
}

impl Default for SpeedKalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionEstimator for SpeedKalmanFilter {
    fn update(&mut self, raw_speed: f64) -> (f64, f64) {
        // Avoid a huge acceleration spike when the first samples arrive at speed
        if (raw_speed - self.x[0]).abs() > RESET_THRESHOLD {
            self.reset_to(raw_speed);
        }

        // predict
        let speed = self.x[0] + self.dt * self.x[1];
        let accel = self.x[1];

        // correct
        let innovation = raw_speed - speed;
        self.x = [
            speed + self.gain[0] * innovation,
            accel + self.gain[1] * innovation,
        ];

        // A NaN sample would poison the state forever
        if !self.x[0].is_finite() || !self.x[1].is_finite() {
            log::debug!("Speed filter diverged on sample {}, resetting", raw_speed);
            self.x = [0.0, 0.0];
        }

        self.state()
    }
}
