//! Typed bus channels at the core's boundary (§6).
//!
//! All channels are named and their payload shapes are fixed; publishing to an
//! unknown channel would be a programming error, but since every payload here is
//! a concrete Rust type there is no untyped channel to publish to by mistake.

use serde::{Deserialize, Serialize};

use crate::gesture_fsm::FsmState;
use crate::landmark::{Gesture, Landmark};

/// Emitted on every FSM transition (`STATE_CHANGE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChangeEvent {
    pub hand_id: u64,
    pub previous_state: FsmState,
    pub current_state: FsmState,
}

/// Emitted once per cooked `HandState` per frame (`POINTER_UPDATE`). Coordinates
/// are normalized, pre-mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointerUpdateEvent {
    pub hand_id: u64,
    pub x: f64,
    pub y: f64,
    pub is_pinching: bool,
    pub gesture: Option<Gesture>,
    pub confidence: Option<f64>,
    pub raw_landmarks: Option<Vec<Landmark>>,
}

/// Emitted when the router prunes a hand (`POINTER_COAST`); the fabric consumes
/// this to tear down the pointer and emit a closing `pointerup` if it was down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerCoastEvent {
    pub hand_id: u64,
    pub is_pinching: bool,
    pub destroy: bool,
}

/// The W3C-style pointer event kinds the fabric emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerEventType {
    #[serde(rename = "pointerdown")]
    Down,
    #[serde(rename = "pointermove")]
    Move,
    #[serde(rename = "pointerup")]
    Up,
}

/// A single emitted pointer event, in mapped screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub pointer_id: u64,
    pub event_type: PointerEventType,
    pub client_x: f64,
    pub client_y: f64,
    pub buttons: u8,
    pub pressure: f64,
}

impl PointerEvent {
    pub fn new(pointer_id: u64, event_type: PointerEventType, client_x: f64, client_y: f64) -> Self {
        let (buttons, pressure) = match event_type {
            PointerEventType::Down | PointerEventType::Move => (1, 0.5),
            PointerEventType::Up => (0, 0.0),
        };
        Self {
            pointer_id,
            event_type,
            client_x,
            client_y,
            buttons,
            pressure,
        }
    }
}

/// The `event_init` payload of the cross-origin `SYNTHETIC_POINTER_EVENT`
/// message (§6). `pointer_type` is always `"touch"` and `is_primary` is always
/// `true` since the fabric never multiplexes more than one active touch point
/// onto a single cross-origin message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEventInit {
    pub pointer_id: u64,
    pub pointer_type: &'static str,
    pub is_primary: bool,
    pub client_x: f64,
    pub client_y: f64,
    pub buttons: u8,
    pub pressure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticPointerMessage {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub event_type: PointerEventType,
    pub event_init: PointerEventInit,
}

impl SyntheticPointerMessage {
    pub fn from_pointer_event(event: &PointerEvent) -> Self {
        Self {
            message_type: "SYNTHETIC_POINTER_EVENT",
            event_type: event.event_type,
            event_init: PointerEventInit {
                pointer_id: event.pointer_id,
                pointer_type: "touch",
                is_primary: true,
                client_x: event.client_x,
                client_y: event.client_y,
                buttons: event.buttons,
                pressure: event.pressure,
            },
        }
    }
}
