//! C1: per-axis scalar Kalman smoothing (§4.1).
//!
//! Grounded on the `KalmanFilter` in the teacher's tracking module, but simplified
//! to the spec's scalar per-axis filter (`A=1`, `C=1`, no control input) instead of
//! the teacher's 6-state constant-velocity model — this smoother only ever sees a
//! single scalar measurement stream per axis.

use nalgebra::Vector2;

/// A single scalar Kalman filter: state-transition `A=1`, observation `C=1`.
#[derive(Debug, Clone, Copy)]
struct KalmanAxis {
    x: f64,
    p: f64,
    q: f64,
    r: f64,
    initialized: bool,
}

impl KalmanAxis {
    fn new(q: f64, r: f64) -> Self {
        Self {
            x: 0.0,
            p: r,
            q,
            r,
            initialized: false,
        }
    }

    fn filter(&mut self, z: f64) -> f64 {
        if !z.is_finite() {
            return self.x;
        }
        if !self.initialized {
            self.x = z;
            self.p = self.r;
            self.initialized = true;
            return self.x;
        }
        if !self.x.is_finite() || !self.p.is_finite() {
            self.x = z;
            self.p = self.r;
            return self.x;
        }

        let p_prior = self.p + self.q;
        let k = p_prior / (p_prior + self.r);
        self.x += k * (z - self.x);
        self.p = (1.0 - k) * p_prior;
        self.x
    }

    fn predict(&self, steps: u32) -> f64 {
        // A=1, no control input: the predicted state is the current filtered
        // state regardless of step count.
        let _ = steps;
        self.x
    }
}

/// Denoises a single normalized `(x, y)` stream and offers short-horizon
/// lookahead. One instance lives per tracked hand.
#[derive(Debug, Clone, Copy)]
pub struct LandmarkSmoother {
    axis_x: KalmanAxis,
    axis_y: KalmanAxis,
}

impl LandmarkSmoother {
    pub fn new(process_noise: f64, measurement_noise: f64) -> Self {
        Self {
            axis_x: KalmanAxis::new(process_noise, measurement_noise),
            axis_y: KalmanAxis::new(process_noise, measurement_noise),
        }
    }

    /// Hot-swap `Q`/`R` without resetting the filtered state, matching the
    /// "swap the whole config record" rule for shared tunables.
    pub fn reconfigure(&mut self, process_noise: f64, measurement_noise: f64) {
        self.axis_x.q = process_noise;
        self.axis_x.r = measurement_noise;
        self.axis_y.q = process_noise;
        self.axis_y.r = measurement_noise;
    }

    /// Feed one observation, returning the smoothed estimate. Non-finite
    /// measurements are rejected without mutating state.
    pub fn filter(&mut self, x: f64, y: f64) -> (f64, f64) {
        (self.axis_x.filter(x), self.axis_y.filter(y))
    }

    /// Project the current filtered state `steps` frames forward without
    /// updating (`A=1`, so this is a no-op on the value, present for API
    /// parity with a higher-order model).
    pub fn predict(&self, steps: u32) -> (f64, f64) {
        (self.axis_x.predict(steps), self.axis_y.predict(steps))
    }

    pub fn estimate(&self) -> Vector2<f64> {
        Vector2::new(self.axis_x.x, self.axis_y.x)
    }
}
