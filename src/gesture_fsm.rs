//! C2: the per-hand gesture finite-state machine (§4.2).
//!
//! Ported from the prototype `GestureFsmRs` wasm-bindgen module (the closest prior
//! art for this exact six-state machine), generalized to the full dwell/tie-break
//! bucket algorithm the spec requires and tested against the scenarios in §8.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::landmark::Gesture;

/// One of the six named states. The three non-`*Coast` variants are *active*;
/// the three `*Coast` variants are tracking-degraded copies of their parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FsmState {
    Idle,
    IdleCoast,
    Ready,
    ReadyCoast,
    CommitPointer,
    CommitCoast,
}

impl FsmState {
    fn is_coast(self) -> bool {
        matches!(
            self,
            FsmState::IdleCoast | FsmState::ReadyCoast | FsmState::CommitCoast
        )
    }

    fn parent(self) -> FsmState {
        match self {
            FsmState::IdleCoast => FsmState::Idle,
            FsmState::ReadyCoast => FsmState::Ready,
            FsmState::CommitCoast => FsmState::CommitPointer,
            other => other,
        }
    }
}

/// Snapshot of the thresholds the FSM reads each frame. Swapped as a whole
/// from a [`PipelineConfig`] via [`GestureFsm::reconfigure`].
#[derive(Debug, Clone, Copy)]
struct Thresholds {
    conf_high: f64,
    conf_low: f64,
    dwell_limit_ready_ms: f64,
    dwell_limit_commit_ms: f64,
    coast_timeout_ms: f64,
}

impl From<&PipelineConfig> for Thresholds {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            conf_high: config.conf_high,
            conf_low: config.conf_low,
            dwell_limit_ready_ms: config.dwell_limit_ready_ms,
            dwell_limit_commit_ms: config.dwell_limit_commit_ms,
            coast_timeout_ms: config.coast_timeout_ms,
        }
    }
}

/// A state transition observed on a single `process_frame` call, emitted as the
/// crate's `STATE_CHANGE` event when `previous != current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: FsmState,
    pub current: FsmState,
}

/// The per-hand gesture state machine. One instance lives per tracked `hand_id`.
#[derive(Debug, Clone)]
pub struct GestureFsm {
    state: FsmState,
    dwell_accumulator_ms: f64,
    ready_bucket_ms: f64,
    idle_bucket_ms: f64,
    coast_elapsed_ms: f64,
    last_frame_ms: Option<f64>,
    thresholds: Thresholds,
}

fn leak(value: f64, dt_ms: f64) -> f64 {
    (value - 2.0 * dt_ms).max(0.0)
}

impl GestureFsm {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            state: FsmState::Idle,
            dwell_accumulator_ms: 0.0,
            ready_bucket_ms: 0.0,
            idle_bucket_ms: 0.0,
            coast_elapsed_ms: 0.0,
            last_frame_ms: None,
            thresholds: Thresholds::from(config),
        }
    }

    pub fn reconfigure(&mut self, config: &PipelineConfig) {
        self.thresholds = Thresholds::from(config);
    }

    pub fn state(&self) -> FsmState {
        self.state
    }

    pub fn is_pinching(&self) -> bool {
        matches!(self.state, FsmState::CommitPointer | FsmState::CommitCoast)
    }

    pub fn is_coasting(&self) -> bool {
        self.state.is_coast()
    }

    /// Advance the FSM by one frame. `confidence` is clamped into `[0, 1]`;
    /// an unrecognized `gesture` is never produced by [`Gesture`] itself
    /// (unknown wire tags already deserialize to `Gesture::Other`).
    pub fn process_frame(
        &mut self,
        gesture: Gesture,
        confidence: f64,
        now_ms: f64,
    ) -> Option<Transition> {
        let confidence = confidence.clamp(0.0, 1.0);
        let dt_ms = match self.last_frame_ms {
            Some(last) => (now_ms - last).max(0.0),
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);

        let previous = self.state;

        if self.state.is_coast() {
            self.coast_elapsed_ms += dt_ms;
            if self.coast_elapsed_ms >= self.thresholds.coast_timeout_ms {
                self.state = FsmState::Idle;
                self.dwell_accumulator_ms = 0.0;
                self.ready_bucket_ms = 0.0;
                self.idle_bucket_ms = 0.0;
                self.coast_elapsed_ms = 0.0;
                return Self::transition(previous, self.state);
            }
        } else {
            self.coast_elapsed_ms = 0.0;
        }

        match self.state {
            FsmState::Idle => self.handle_idle(gesture, confidence, dt_ms),
            FsmState::Ready => self.handle_ready(gesture, confidence, dt_ms),
            FsmState::CommitPointer => self.handle_commit(gesture, confidence, dt_ms),
            FsmState::IdleCoast | FsmState::ReadyCoast | FsmState::CommitCoast => {
                self.handle_coast(confidence)
            }
        }

        Self::transition(previous, self.state)
    }

    fn transition(previous: FsmState, current: FsmState) -> Option<Transition> {
        (previous != current).then_some(Transition { previous, current })
    }

    fn handle_coast(&mut self, confidence: f64) {
        if confidence >= self.thresholds.conf_high {
            self.state = self.state.parent();
        }
    }

    fn handle_idle(&mut self, gesture: Gesture, confidence: f64, dt_ms: f64) {
        if confidence < self.thresholds.conf_low {
            self.state = FsmState::IdleCoast;
            return;
        }

        let high = confidence >= self.thresholds.conf_high;
        match gesture {
            Gesture::ClosedFist if high => {
                self.dwell_accumulator_ms = 0.0;
                self.ready_bucket_ms = 0.0;
            }
            Gesture::OpenPalm if high => {
                self.dwell_accumulator_ms += dt_ms;
                self.ready_bucket_ms += dt_ms;
            }
            _ => {
                self.dwell_accumulator_ms = leak(self.dwell_accumulator_ms, dt_ms);
                self.ready_bucket_ms = leak(self.ready_bucket_ms, dt_ms);
            }
        }

        if self.dwell_accumulator_ms >= self.thresholds.dwell_limit_ready_ms {
            self.state = FsmState::Ready;
            self.dwell_accumulator_ms = 0.0;
            self.ready_bucket_ms = 0.0;
        }
    }

    fn handle_ready(&mut self, gesture: Gesture, confidence: f64, dt_ms: f64) {
        if confidence < self.thresholds.conf_low {
            self.state = FsmState::ReadyCoast;
            return;
        }

        let high = confidence >= self.thresholds.conf_high;
        if gesture == Gesture::ClosedFist && high {
            self.state = FsmState::Idle;
            self.dwell_accumulator_ms = 0.0;
            return;
        }

        if gesture == Gesture::PointerUp && high {
            self.dwell_accumulator_ms += dt_ms;
        } else {
            self.dwell_accumulator_ms = leak(self.dwell_accumulator_ms, dt_ms);
        }

        if self.dwell_accumulator_ms >= self.thresholds.dwell_limit_commit_ms {
            self.state = FsmState::CommitPointer;
            self.dwell_accumulator_ms = 0.0;
        }
    }

    fn handle_commit(&mut self, gesture: Gesture, confidence: f64, dt_ms: f64) {
        if confidence < self.thresholds.conf_low {
            self.state = FsmState::CommitCoast;
            return;
        }

        let high = confidence >= self.thresholds.conf_high;
        match gesture {
            Gesture::OpenPalm if high => {
                self.dwell_accumulator_ms += dt_ms;
                self.ready_bucket_ms += dt_ms;
                self.idle_bucket_ms = 0.0;
            }
            Gesture::ClosedFist if high => {
                self.dwell_accumulator_ms += dt_ms;
                self.idle_bucket_ms += dt_ms;
                self.ready_bucket_ms = 0.0;
            }
            _ => {
                self.dwell_accumulator_ms = leak(self.dwell_accumulator_ms, dt_ms);
                self.ready_bucket_ms = leak(self.ready_bucket_ms, dt_ms);
                self.idle_bucket_ms = leak(self.idle_bucket_ms, dt_ms);
            }
        }

        if self.dwell_accumulator_ms >= self.thresholds.dwell_limit_commit_ms {
            // Ties favor READY (recorded open-question resolution, §9).
            self.state = if self.ready_bucket_ms >= self.idle_bucket_ms {
                FsmState::Ready
            } else {
                FsmState::Idle
            };
            self.dwell_accumulator_ms = 0.0;
            self.ready_bucket_ms = 0.0;
            self.idle_bucket_ms = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fsm() -> GestureFsm {
        GestureFsm::new(&PipelineConfig::default())
    }

    fn run_frames(
        fsm: &mut GestureFsm,
        gesture: Gesture,
        confidence: f64,
        count: u32,
        dt_ms: f64,
        mut start_ms: f64,
    ) -> f64 {
        for _ in 0..count {
            start_ms += dt_ms;
            fsm.process_frame(gesture, confidence, start_ms);
        }
        start_ms
    }

    #[test]
    fn accumulators_never_go_negative() {
        let mut fsm = fsm();
        run_frames(&mut fsm, Gesture::Other, 0.55, 50, 33.33, 0.0);
        assert!(fsm.dwell_accumulator_ms >= 0.0);
        assert!(fsm.ready_bucket_ms >= 0.0);
        assert!(fsm.idle_bucket_ms >= 0.0);
        assert!(fsm.coast_elapsed_ms >= 0.0);
    }

    #[test]
    fn is_pinching_iff_commit_states() {
        let mut fsm = fsm();
        assert!(!fsm.is_pinching());
        fsm.state = FsmState::CommitPointer;
        assert!(fsm.is_pinching());
        fsm.state = FsmState::CommitCoast;
        assert!(fsm.is_pinching());
        fsm.state = FsmState::Ready;
        assert!(!fsm.is_pinching());
    }

    #[test]
    fn scenario_1_ready_then_commit_then_release() {
        let mut fsm = fsm();
        let dt = 33.33;
        let mut t = 0.0;

        let mut reached_ready = false;
        for _ in 0..5 {
            t += dt;
            if let Some(tr) = fsm.process_frame(Gesture::OpenPalm, 0.9, t) {
                if tr.current == FsmState::Ready {
                    reached_ready = true;
                }
            }
        }
        assert!(reached_ready);
        assert_eq!(fsm.state(), FsmState::Ready);

        let mut reached_commit = false;
        for _ in 0..5 {
            t += dt;
            if let Some(tr) = fsm.process_frame(Gesture::PointerUp, 0.9, t) {
                if tr.current == FsmState::CommitPointer {
                    reached_commit = true;
                }
            }
        }
        assert!(reached_commit);
        assert!(fsm.is_pinching());

        let mut released = false;
        for _ in 0..5 {
            t += dt;
            if let Some(tr) = fsm.process_frame(Gesture::OpenPalm, 0.9, t) {
                if tr.previous == FsmState::CommitPointer {
                    released = true;
                    assert_eq!(tr.current, FsmState::Ready);
                }
            }
        }
        assert!(released);
        assert!(!fsm.is_pinching());
    }

    #[test]
    fn scenario_2_hysteresis_band_holds_in_ready() {
        let mut fsm = fsm();
        fsm.state = FsmState::Ready;
        let t = run_frames(&mut fsm, Gesture::PointerUp, 0.55, 20, 33.33, 0.0);
        let _ = t;
        assert_eq!(fsm.dwell_accumulator_ms, 0.0);
        assert_eq!(fsm.state(), FsmState::Ready);
    }

    #[test]
    fn scenario_3_coast_timeout_hard_resets_to_idle() {
        let mut fsm = fsm();
        fsm.state = FsmState::CommitPointer;
        let dt = 33.33;
        let mut t = 0.0;
        let mut saw_coast = false;
        let mut saw_idle = false;
        for _ in 0..16 {
            t += dt;
            if let Some(tr) = fsm.process_frame(Gesture::PointerUp, 0.2, t) {
                if tr.current == FsmState::CommitCoast {
                    saw_coast = true;
                }
                if tr.current == FsmState::Idle {
                    saw_idle = true;
                }
            }
        }
        assert!(saw_coast);
        assert!(saw_idle);
        assert_eq!(fsm.state(), FsmState::Idle);
    }

    #[test]
    fn frame_rate_independence_within_tolerance() {
        // Same wall-clock gesture timing at two different frame rates should
        // cross the READY dwell threshold within 2 * max_frame_interval_ms.
        let target_wall_clock_ms = 150.0;

        let mut fsm_30hz = fsm();
        let dt_30 = 1000.0 / 30.0;
        let mut t = 0.0;
        let mut crossed_30 = None;
        while t < target_wall_clock_ms + 500.0 {
            t += dt_30;
            if let Some(tr) = fsm_30hz.process_frame(Gesture::OpenPalm, 0.9, t) {
                if tr.current == FsmState::Ready {
                    crossed_30 = Some(t);
                    break;
                }
            }
        }

        let mut fsm_120hz = fsm();
        let dt_120 = 1000.0 / 120.0;
        let mut t = 0.0;
        let mut crossed_120 = None;
        while t < target_wall_clock_ms + 500.0 {
            t += dt_120;
            if let Some(tr) = fsm_120hz.process_frame(Gesture::OpenPalm, 0.9, t) {
                if tr.current == FsmState::Ready {
                    crossed_120 = Some(t);
                    break;
                }
            }
        }

        let crossed_30 = crossed_30.expect("30hz should reach READY");
        let crossed_120 = crossed_120.expect("120hz should reach READY");
        let tolerance = 2.0 * dt_30;
        assert!((crossed_30 - crossed_120).abs() <= tolerance);
    }

    #[test]
    fn unknown_gesture_is_treated_as_non_matching() {
        let mut fsm = fsm();
        run_frames(&mut fsm, Gesture::Other, 0.9, 10, 33.33, 0.0);
        assert_eq!(fsm.state(), FsmState::Idle);
        assert_eq!(fsm.dwell_accumulator_ms, 0.0);
    }

    #[test]
    fn commit_tie_break_favors_ready() {
        let mut fsm = fsm();
        fsm.state = FsmState::CommitPointer;
        fsm.ready_bucket_ms = 50.0;
        fsm.idle_bucket_ms = 50.0;
        fsm.dwell_accumulator_ms = 99.0;
        fsm.last_frame_ms = Some(0.0);
        fsm.process_frame(Gesture::OpenPalm, 0.9, 33.33);
        assert_eq!(fsm.state(), FsmState::Ready);
    }
}
