//! Wire-level data model: the input side of the pipeline.

use serde::{Deserialize, Serialize};

/// Number of landmarks MediaPipe-style hand detectors report per hand.
pub const LANDMARK_COUNT: usize = 21;

/// A single 3D point in the normalized viewport frame produced upstream.
///
/// `x, y` are in `[0, 1]` after horizontal mirroring has already been applied by
/// the vision plugin. `z` is a relative depth hint the core does not interpret.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// The coarse gesture classification attached to a [`RawHand`].
///
/// Unrecognized wire values deserialize to [`Gesture::Other`] rather than failing,
/// since the FSM treats any unknown tag as "non-matching" anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    OpenPalm,
    PointerUp,
    ClosedFist,
    Other,
}

impl<'de> Deserialize<'de> for Gesture {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Gesture::from(raw.as_str()))
    }
}

impl From<&str> for Gesture {
    fn from(value: &str) -> Self {
        match value {
            "open_palm" => Gesture::OpenPalm,
            "pointer_up" => Gesture::PointerUp,
            "closed_fist" => Gesture::ClosedFist,
            _ => Gesture::Other,
        }
    }
}

/// A single hand observed in one capture instant.
///
/// `hand_id` is the upstream detector's identity signal; the router trusts it as-is
/// and never attempts landmark-based re-identification (see the open question on
/// identity continuity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHand {
    pub hand_id: u64,
    pub gesture: Gesture,
    pub confidence: f64,
    pub fingertip_x: f64,
    pub fingertip_y: f64,
    pub landmarks: Vec<Landmark>,
    pub frame_time_ms: f64,
}

impl RawHand {
    /// Confidence clamped into `[0, 1]`; out-of-range values are a "bad input"
    /// per the error taxonomy and are clamped rather than rejected.
    pub fn clamped_confidence(&self) -> f64 {
        self.confidence.clamp(0.0, 1.0)
    }
}

/// An ordered batch of hands observed at a single capture instant. May be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameEvent {
    pub capture_time_ms: f64,
    pub hands: Vec<RawHand>,
}
