//! Typed errors for the config-load boundary.
//!
//! Everything on the per-frame hot path (`HandRouter::on_frame`, `PointerFabric::emit`,
//! `Pipeline::on_frame`, ...) is infallible by contract: the core never throws across
//! its public boundary. `ConfigError` is the one place a caller gets a `Result` back,
//! because loading or validating a configuration record genuinely can fail and there
//! is no "previous frame" to fall back on during startup.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("conf_low ({conf_low}) must be less than conf_high ({conf_high})")]
    HysteresisBandInverted { conf_low: f64, conf_high: f64 },

    #[error("{field} must be >= 0, got {value}")]
    NegativeDuration { field: &'static str, value: f64 },

    #[error("{field} must be in [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("overscan_scale must be >= 1.0, got {0}")]
    InvalidOverscanScale(f64),
}
