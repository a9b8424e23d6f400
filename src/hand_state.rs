//! Cooked per-hand output, produced once per frame by the router (§3).

use crate::gesture_fsm::FsmState;
use crate::landmark::{Gesture, Landmark};

/// The per-hand, per-frame cooked state the router hands to the Highlander
/// mutex and the pointer fabric.
#[derive(Debug, Clone)]
pub struct HandState {
    pub hand_id: u64,
    pub x: f64,
    pub y: f64,
    pub is_pinching: bool,
    pub is_coasting: bool,
    pub gesture: Gesture,
    pub confidence: f64,
    pub raw_landmarks: Option<Vec<Landmark>>,
    pub fsm_state: FsmState,
}
