//! C3: the hand router (§4.3).
//!
//! Owns one [`GestureFsm`] and one [`LandmarkSmoother`] per live `hand_id`.
//! Tracks are kept in a `BTreeMap` so the ascending-`hand_id` processing order
//! §5 requires (for Highlander arbitration and reproducibility) falls out of
//! iteration order rather than needing an explicit sort at every call site.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::PipelineConfig;
use crate::events::{PointerCoastEvent, PointerUpdateEvent, StateChangeEvent};
use crate::gesture_fsm::GestureFsm;
use crate::hand_state::HandState;
use crate::landmark::FrameEvent;
use crate::smoother::LandmarkSmoother;

struct HandTrack {
    fsm: GestureFsm,
    smoother: LandmarkSmoother,
    last_seen_ms: f64,
}

/// Everything produced by one `on_frame` call, in the emission order §5
/// fixes: per-hand FSM transitions first, then pointer-relevant state.
#[derive(Debug, Default)]
pub struct RouterOutput {
    pub state_changes: Vec<StateChangeEvent>,
    pub hand_states: Vec<HandState>,
    pub pointer_updates: Vec<PointerUpdateEvent>,
    pub coast_events: Vec<PointerCoastEvent>,
}

pub struct HandRouter {
    tracks: BTreeMap<u64, HandTrack>,
    config: PipelineConfig,
}

impl HandRouter {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            tracks: BTreeMap::new(),
            config,
        }
    }

    pub fn reconfigure(&mut self, config: PipelineConfig) {
        for track in self.tracks.values_mut() {
            track.fsm.reconfigure(&config);
            track
                .smoother
                .reconfigure(config.kalman_q, config.kalman_r);
        }
        self.config = config;
    }

    pub fn live_hand_count(&self) -> usize {
        self.tracks.len()
    }

    /// Process one capture instant: dispatch each observed hand to its
    /// `(FSM, Smoother)` pair (creating one if this is a new `hand_id`), then
    /// prune any tracked hand absent for longer than `coast_timeout_ms +
    /// prune_grace_ms`.
    pub fn on_frame(&mut self, frame: &FrameEvent) -> RouterOutput {
        let mut output = RouterOutput::default();

        let mut hands: Vec<_> = frame.hands.iter().collect();
        hands.sort_by_key(|hand| hand.hand_id);

        for hand in hands {
            let config = &self.config;
            let track = self.tracks.entry(hand.hand_id).or_insert_with(|| HandTrack {
                fsm: GestureFsm::new(config),
                smoother: LandmarkSmoother::new(config.kalman_q, config.kalman_r),
                last_seen_ms: hand.frame_time_ms,
            });

            let confidence = hand.clamped_confidence();
            if let Some(transition) = track.fsm.process_frame(hand.gesture, confidence, hand.frame_time_ms) {
                debug!(
                    hand_id = hand.hand_id,
                    previous = ?transition.previous,
                    current = ?transition.current,
                    "gesture FSM transition"
                );
                output.state_changes.push(StateChangeEvent {
                    hand_id: hand.hand_id,
                    previous_state: transition.previous,
                    current_state: transition.current,
                });
            }

            let (x, y) = track.smoother.filter(hand.fingertip_x, hand.fingertip_y);
            track.last_seen_ms = hand.frame_time_ms;

            let raw_landmarks = if hand.landmarks.is_empty() {
                None
            } else {
                Some(hand.landmarks.clone())
            };

            output.pointer_updates.push(PointerUpdateEvent {
                hand_id: hand.hand_id,
                x,
                y,
                is_pinching: track.fsm.is_pinching(),
                gesture: Some(hand.gesture),
                confidence: Some(confidence),
                raw_landmarks: raw_landmarks.clone(),
            });

            output.hand_states.push(HandState {
                hand_id: hand.hand_id,
                x,
                y,
                is_pinching: track.fsm.is_pinching(),
                is_coasting: track.fsm.is_coasting(),
                gesture: hand.gesture,
                confidence,
                raw_landmarks,
                fsm_state: track.fsm.state(),
            });
        }

        self.prune(frame.capture_time_ms, &mut output);
        output
    }

    fn prune(&mut self, now_ms: f64, output: &mut RouterOutput) {
        let observed: std::collections::HashSet<u64> =
            output.hand_states.iter().map(|h| h.hand_id).collect();
        let prune_threshold_ms = self.config.coast_timeout_ms + self.config.prune_grace_ms;

        let expired: Vec<u64> = self
            .tracks
            .iter()
            .filter(|(hand_id, track)| {
                !observed.contains(hand_id) && now_ms - track.last_seen_ms > prune_threshold_ms
            })
            .map(|(hand_id, _)| *hand_id)
            .collect();

        for hand_id in expired {
            if let Some(track) = self.tracks.remove(&hand_id) {
                debug!(hand_id, "pruning absent hand");
                output.coast_events.push(PointerCoastEvent {
                    hand_id,
                    is_pinching: track.fsm.is_pinching(),
                    destroy: true,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Gesture, RawHand};

    fn hand(hand_id: u64, gesture: Gesture, confidence: f64, t: f64) -> RawHand {
        RawHand {
            hand_id,
            gesture,
            confidence,
            fingertip_x: 0.5,
            fingertip_y: 0.5,
            landmarks: Vec::new(),
            frame_time_ms: t,
        }
    }

    #[test]
    fn hands_are_processed_in_ascending_hand_id_regardless_of_input_order() {
        let mut router = HandRouter::new(PipelineConfig::default());
        let frame = FrameEvent {
            capture_time_ms: 0.0,
            hands: vec![
                hand(5, Gesture::OpenPalm, 0.9, 0.0),
                hand(1, Gesture::OpenPalm, 0.9, 0.0),
                hand(3, Gesture::OpenPalm, 0.9, 0.0),
            ],
        };
        let output = router.on_frame(&frame);
        let ids: Vec<u64> = output.hand_states.iter().map(|h| h.hand_id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        let update_ids: Vec<u64> = output.pointer_updates.iter().map(|u| u.hand_id).collect();
        assert_eq!(update_ids, vec![1, 3, 5]);
    }

    #[test]
    fn one_pointer_update_is_emitted_per_cooked_hand_state() {
        let mut router = HandRouter::new(PipelineConfig::default());
        let frame = FrameEvent {
            capture_time_ms: 0.0,
            hands: vec![hand(0, Gesture::OpenPalm, 0.9, 0.0)],
        };
        let output = router.on_frame(&frame);
        assert_eq!(output.pointer_updates.len(), 1);
        let update = &output.pointer_updates[0];
        assert_eq!(update.hand_id, 0);
        assert_eq!(update.gesture, Some(Gesture::OpenPalm));
        assert_eq!(update.confidence, Some(0.9));
    }

    #[test]
    fn new_hand_id_creates_a_fresh_track() {
        let mut router = HandRouter::new(PipelineConfig::default());
        let frame = FrameEvent {
            capture_time_ms: 0.0,
            hands: vec![hand(0, Gesture::OpenPalm, 0.9, 0.0)],
        };
        let output = router.on_frame(&frame);
        assert_eq!(output.hand_states.len(), 1);
        assert_eq!(router.live_hand_count(), 1);
    }

    #[test]
    fn absent_hand_is_pruned_after_coast_timeout_plus_grace() {
        let mut router = HandRouter::new(PipelineConfig::default());
        let first = FrameEvent {
            capture_time_ms: 0.0,
            hands: vec![hand(0, Gesture::OpenPalm, 0.9, 0.0)],
        };
        router.on_frame(&first);
        assert_eq!(router.live_hand_count(), 1);

        let later = FrameEvent {
            capture_time_ms: 2000.0,
            hands: vec![],
        };
        let output = router.on_frame(&later);
        assert_eq!(router.live_hand_count(), 0);
        assert_eq!(output.coast_events.len(), 1);
        assert!(output.coast_events[0].destroy);
    }

    #[test]
    fn absent_hand_survives_within_grace_window() {
        let mut router = HandRouter::new(PipelineConfig::default());
        let first = FrameEvent {
            capture_time_ms: 0.0,
            hands: vec![hand(0, Gesture::OpenPalm, 0.9, 0.0)],
        };
        router.on_frame(&first);

        let later = FrameEvent {
            capture_time_ms: 200.0,
            hands: vec![],
        };
        let output = router.on_frame(&later);
        assert_eq!(router.live_hand_count(), 1);
        assert!(output.coast_events.is_empty());
    }

    #[test]
    fn reappearing_hand_id_after_prune_gets_a_fresh_fsm() {
        let mut router = HandRouter::new(PipelineConfig::default());
        router.on_frame(&FrameEvent {
            capture_time_ms: 0.0,
            hands: vec![hand(0, Gesture::OpenPalm, 0.9, 0.0)],
        });
        router.on_frame(&FrameEvent {
            capture_time_ms: 2000.0,
            hands: vec![],
        });
        assert_eq!(router.live_hand_count(), 0);

        let output = router.on_frame(&FrameEvent {
            capture_time_ms: 2100.0,
            hands: vec![hand(0, Gesture::OpenPalm, 0.9, 2100.0)],
        });
        assert_eq!(output.hand_states.len(), 1);
        assert_eq!(
            output.hand_states[0].fsm_state,
            crate::gesture_fsm::FsmState::Idle
        );
    }

    #[test]
    fn scenario_5_multi_hand_independence() {
        let mut router = HandRouter::new(PipelineConfig::default());
        let dt = 33.33;
        let mut t = 0.0;

        for _ in 0..5 {
            t += dt;
            router.on_frame(&FrameEvent {
                capture_time_ms: t,
                hands: vec![
                    hand(0, Gesture::OpenPalm, 0.9, t),
                    hand(1, Gesture::OpenPalm, 0.9, t),
                ],
            });
        }

        let mut last = RouterOutput::default();
        for _ in 0..5 {
            t += dt;
            last = router.on_frame(&FrameEvent {
                capture_time_ms: t,
                hands: vec![
                    hand(0, Gesture::PointerUp, 0.9, t),
                    hand(1, Gesture::OpenPalm, 0.9, t),
                ],
            });
        }

        let hand0 = last.hand_states.iter().find(|h| h.hand_id == 0).unwrap();
        let hand1 = last.hand_states.iter().find(|h| h.hand_id == 1).unwrap();
        assert_eq!(hand0.fsm_state, crate::gesture_fsm::FsmState::CommitPointer);
        assert_eq!(hand1.fsm_state, crate::gesture_fsm::FsmState::Ready);
    }
}
