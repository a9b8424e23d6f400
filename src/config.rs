//! Hot-reconfigurable tunables shared by the smoother, FSM, and fabric.
//!
//! A single [`PipelineConfig`] record is swapped as a whole (never mutated field by
//! field) so that a frame in flight always sees a consistent set of thresholds.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The full tunable surface of the pipeline, serializable for hot-reload or
/// startup load from a TOML document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub conf_high: f64,
    pub conf_low: f64,
    pub dwell_limit_ready_ms: f64,
    pub dwell_limit_commit_ms: f64,
    pub coast_timeout_ms: f64,
    pub kalman_q: f64,
    pub kalman_r: f64,
    pub teleport_threshold_normalized: f64,
    pub overscan_scale: f64,
    /// Grace period added on top of `coast_timeout_ms` before the router prunes an
    /// absent hand. Must be >= 500 ms per the lifecycle invariant.
    pub prune_grace_ms: f64,
    /// Whether the fabric emits `pointermove` for a hand that is not pinching.
    pub hover_events_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            conf_high: 0.64,
            conf_low: 0.50,
            dwell_limit_ready_ms: 100.0,
            dwell_limit_commit_ms: 100.0,
            coast_timeout_ms: 500.0,
            kalman_q: 1e-3,
            kalman_r: 1e-2,
            teleport_threshold_normalized: 0.1,
            overscan_scale: 1.0,
            prune_grace_ms: 500.0,
            hover_events_enabled: false,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document in one step. Used at process startup,
    /// where there is no previously-valid config to fall back on.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every tunable. Used both by `from_toml_str` and by the
    /// hot-reload `apply_config` path, which retains the previous config and
    /// emits a warning on failure instead of propagating the error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.conf_low < self.conf_high) {
            return Err(ConfigError::HysteresisBandInverted {
                conf_low: self.conf_low,
                conf_high: self.conf_high,
            });
        }
        for (field, value) in [
            ("conf_high", self.conf_high),
            ("conf_low", self.conf_low),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }
        for (field, value) in [
            ("dwell_limit_ready_ms", self.dwell_limit_ready_ms),
            ("dwell_limit_commit_ms", self.dwell_limit_commit_ms),
            ("coast_timeout_ms", self.coast_timeout_ms),
            ("kalman_q", self.kalman_q),
            ("kalman_r", self.kalman_r),
            ("teleport_threshold_normalized", self.teleport_threshold_normalized),
            ("prune_grace_ms", self.prune_grace_ms),
        ] {
            if value < 0.0 {
                return Err(ConfigError::NegativeDuration { field, value });
            }
        }
        if self.prune_grace_ms < 500.0 {
            return Err(ConfigError::NegativeDuration {
                field: "prune_grace_ms (must be >= 500)",
                value: self.prune_grace_ms,
            });
        }
        if self.overscan_scale < 1.0 {
            return Err(ConfigError::InvalidOverscanScale(self.overscan_scale));
        }
        Ok(())
    }
}
