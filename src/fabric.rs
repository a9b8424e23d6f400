//! C5: the pointer fabric (§4.5) — cooked hand state in, W3C-style pointer
//! events out, with stable pointer identity, the ghost-draw teleport gate,
//! and fan-out to local/foreign surfaces.

use std::collections::HashMap;

use tracing::{debug, error};

use crate::events::{PointerEvent, PointerEventType};
use crate::hand_state::HandState;
use crate::landmark::Landmark;
use crate::surface::{ScreenMapper, Surface};

/// A hand's landmarks after the fabric's overscan transform, in screen space.
/// Mirroring is never reapplied here — the upstream vision plugin already
/// mirrored `HandState.raw_landmarks` before it reached the fabric.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedLandmarks {
    pub hand_id: u64,
    pub points: Vec<(f64, f64)>,
}

/// Everything one [`PointerFabric::process`] call produces.
#[derive(Debug, Default)]
pub struct FabricFrameOutput {
    pub pointer_events: Vec<PointerEvent>,
    pub mapped_landmarks: Vec<MappedLandmarks>,
}

/// Minimal position delta, in normalized coordinates, below which a
/// `pointermove` is suppressed.
const MOVE_EPSILON: f64 = 1e-4;

/// Fabric-side bookkeeping for one emitted pointer, keyed by `hand_id`.
struct ActivePointer {
    pointer_id: u64,
    last_x: f64,
    last_y: f64,
    last_is_pinching: bool,
    last_is_coasting: bool,
    /// Set when the teleport gate has fired: the `pointerup` for the old
    /// position was emitted this frame, and the `pointerdown` at this
    /// (already-observed) new position is due on the very next frame.
    pending_teleport: Option<(f64, f64)>,
}

fn pointer_id_for(hand_id: u64) -> u64 {
    10_000 + hand_id
}

fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

/// Tunables the fabric needs beyond the shared [`crate::config::PipelineConfig`]
/// record it reads them from.
#[derive(Debug, Clone, Copy)]
pub struct FabricConfig {
    pub teleport_threshold_normalized: f64,
    pub overscan_scale: f64,
    pub hover_events_enabled: bool,
}

impl From<&crate::config::PipelineConfig> for FabricConfig {
    fn from(config: &crate::config::PipelineConfig) -> Self {
        Self {
            teleport_threshold_normalized: config.teleport_threshold_normalized,
            overscan_scale: config.overscan_scale,
            hover_events_enabled: config.hover_events_enabled,
        }
    }
}

pub struct PointerFabric {
    config: FabricConfig,
    pointers: HashMap<u64, ActivePointer>,
    surfaces: Vec<Box<dyn Surface>>,
    screen: Box<dyn ScreenMapper>,
}

impl PointerFabric {
    pub fn new(config: FabricConfig, screen: Box<dyn ScreenMapper>) -> Self {
        Self {
            config,
            pointers: HashMap::new(),
            surfaces: Vec::new(),
            screen,
        }
    }

    pub fn reconfigure(&mut self, config: FabricConfig) {
        self.config = config;
    }

    pub fn set_screen_mapper(&mut self, screen: Box<dyn ScreenMapper>) {
        self.screen = screen;
    }

    pub fn add_surface(&mut self, surface: Box<dyn Surface>) {
        self.surfaces.push(surface);
    }

    /// Overscan transform applied to a single normalized coordinate, then
    /// scaled by the target surface's pixel dimensions. Shared by pointer
    /// emission and landmark passthrough; never re-mirrors.
    pub fn map_point(&self, x: f64, y: f64) -> (f64, f64) {
        let scale = self.config.overscan_scale;
        let offset = (1.0 - 1.0 / scale) / 2.0;
        let (width, height) = self.screen.surface_size();
        (((x - offset) * scale) * width, ((y - offset) * scale) * height)
    }

    /// Consume one frame's cooked hand states (already Highlander-filtered, if
    /// that policy is engaged) and produce the pointer events to emit, fanning
    /// each one out to every registered surface, plus each hand's landmarks
    /// passed through the same overscan transform.
    pub fn process(&mut self, hands: &[HandState]) -> FabricFrameOutput {
        let mut normalized_events = Vec::new();
        for hand in hands {
            self.process_hand(hand, &mut normalized_events);
        }

        let pointer_events: Vec<PointerEvent> = normalized_events
            .into_iter()
            .map(|(pointer_id, event_type, x, y)| {
                let (mx, my) = self.map_point(x, y);
                PointerEvent::new(pointer_id, event_type, mx, my)
            })
            .collect();

        for event in &pointer_events {
            self.dispatch(event);
        }

        let mapped_landmarks = hands
            .iter()
            .filter_map(|hand| {
                let landmarks = hand.raw_landmarks.as_ref()?;
                Some(MappedLandmarks {
                    hand_id: hand.hand_id,
                    points: self.map_landmarks(landmarks),
                })
            })
            .collect();

        FabricFrameOutput {
            pointer_events,
            mapped_landmarks,
        }
    }

    /// Apply the overscan transform to a full set of already-mirrored
    /// landmarks, in order, without re-mirroring.
    fn map_landmarks(&self, landmarks: &[Landmark]) -> Vec<(f64, f64)> {
        landmarks
            .iter()
            .map(|landmark| self.map_point(landmark.x, landmark.y))
            .collect()
    }

    /// Tear down a pruned hand's pointer, emitting a closing `pointerup` if it
    /// was down. Consumes the router's `POINTER_COAST{destroy:true}` signal.
    pub fn retire(&mut self, hand_id: u64) -> Option<PointerEvent> {
        let entry = self.pointers.remove(&hand_id)?;
        if !entry.last_is_pinching {
            return None;
        }
        let (mx, my) = self.map_point(entry.last_x, entry.last_y);
        let event = PointerEvent::new(entry.pointer_id, PointerEventType::Up, mx, my);
        self.dispatch(&event);
        Some(event)
    }

    /// Release every live pointer, each with a closing `pointerup` if it was
    /// down, for supervisor shutdown.
    pub fn shutdown(&mut self) -> Vec<PointerEvent> {
        let hand_ids: Vec<u64> = self.pointers.keys().copied().collect();
        hand_ids
            .into_iter()
            .filter_map(|hand_id| self.retire(hand_id))
            .collect()
    }

    fn dispatch(&mut self, event: &PointerEvent) {
        for surface in &mut self.surfaces {
            if let Err(err) = surface.dispatch(event) {
                error!(surface = surface.name(), error = %err, "surface dispatch failed");
            }
        }
    }

    fn process_hand(
        &mut self,
        hand: &HandState,
        events: &mut Vec<(u64, PointerEventType, f64, f64)>,
    ) {
        let pointer_id = pointer_id_for(hand.hand_id);

        if let Some(entry) = self.pointers.get_mut(&hand.hand_id) {
            if let Some((tx, ty)) = entry.pending_teleport.take() {
                events.push((pointer_id, PointerEventType::Down, tx, ty));
                entry.last_x = tx;
                entry.last_y = ty;
                entry.last_is_pinching = true;
                entry.last_is_coasting = false;
                return;
            }

            let recovering_from_coast = entry.last_is_coasting
                && entry.last_is_pinching
                && hand.is_pinching
                && !hand.is_coasting;

            if recovering_from_coast {
                let jump = distance(entry.last_x, entry.last_y, hand.x, hand.y);
                if jump > self.config.teleport_threshold_normalized {
                    debug!(hand_id = hand.hand_id, jump, "teleport gate fired");
                    events.push((
                        pointer_id,
                        PointerEventType::Up,
                        entry.last_x,
                        entry.last_y,
                    ));
                    entry.pending_teleport = Some((hand.x, hand.y));
                    entry.last_is_pinching = false;
                    entry.last_is_coasting = false;
                    return;
                }
            }

            Self::emit_diff(pointer_id, entry, hand, events);
            return;
        }

        if hand.is_pinching {
            events.push((pointer_id, PointerEventType::Down, hand.x, hand.y));
            self.pointers.insert(
                hand.hand_id,
                ActivePointer {
                    pointer_id,
                    last_x: hand.x,
                    last_y: hand.y,
                    last_is_pinching: true,
                    last_is_coasting: hand.is_coasting,
                    pending_teleport: None,
                },
            );
        } else if self.config.hover_events_enabled {
            events.push((pointer_id, PointerEventType::Move, hand.x, hand.y));
            self.pointers.insert(
                hand.hand_id,
                ActivePointer {
                    pointer_id,
                    last_x: hand.x,
                    last_y: hand.y,
                    last_is_pinching: false,
                    last_is_coasting: hand.is_coasting,
                    pending_teleport: None,
                },
            );
        }
    }

    fn emit_diff(
        pointer_id: u64,
        entry: &mut ActivePointer,
        hand: &HandState,
        events: &mut Vec<(u64, PointerEventType, f64, f64)>,
    ) {
        if !entry.last_is_pinching && hand.is_pinching {
            events.push((pointer_id, PointerEventType::Down, hand.x, hand.y));
        } else if entry.last_is_pinching && !hand.is_pinching {
            events.push((pointer_id, PointerEventType::Up, hand.x, hand.y));
        } else if distance(entry.last_x, entry.last_y, hand.x, hand.y) > MOVE_EPSILON {
            events.push((pointer_id, PointerEventType::Move, hand.x, hand.y));
        }
        entry.last_x = hand.x;
        entry.last_y = hand.y;
        entry.last_is_pinching = hand.is_pinching;
        entry.last_is_coasting = hand.is_coasting;
    }
}
