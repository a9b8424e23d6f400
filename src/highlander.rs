//! C4: the Highlander mutex (§4.4) — an optional single-active-pointer policy
//! wrapper over the router's output. "There can be only one."

use crate::hand_state::HandState;

#[derive(Debug, Clone, Copy)]
pub struct HighlanderConfig {
    /// Refuse to lock until some hand enters `COMMIT_POINTER`.
    pub lock_on_commit_only: bool,
    /// While the locked hand is not pinching, suppress its output (the lock
    /// is retained either way).
    pub drop_hover_events: bool,
}

impl Default for HighlanderConfig {
    fn default() -> Self {
        Self {
            lock_on_commit_only: false,
            drop_hover_events: false,
        }
    }
}

/// Enforces at most one active hand across the whole router output.
pub struct HighlanderMutex {
    config: HighlanderConfig,
    locked_hand_id: Option<u64>,
}

impl HighlanderMutex {
    pub fn new(config: HighlanderConfig) -> Self {
        Self {
            config,
            locked_hand_id: None,
        }
    }

    pub fn reconfigure(&mut self, config: HighlanderConfig) {
        self.config = config;
    }

    pub fn locked_hand_id(&self) -> Option<u64> {
        self.locked_hand_id
    }

    pub fn config(&self) -> HighlanderConfig {
        self.config
    }

    /// Reduce `hands` (ascending `hand_id`, as the router already yields them)
    /// to 0 or 1 elements.
    pub fn filter(&mut self, hands: &[HandState]) -> Option<HandState> {
        if hands.is_empty() {
            self.locked_hand_id = None;
            return None;
        }

        if let Some(locked_id) = self.locked_hand_id {
            if let Some(hand) = hands.iter().find(|h| h.hand_id == locked_id) {
                return self.emit(hand.clone());
            }
            self.locked_hand_id = None;
        }

        let candidate = hands
            .iter()
            .filter(|h| !self.config.lock_on_commit_only || h.is_pinching)
            .min_by_key(|h| h.hand_id);

        match candidate {
            Some(hand) => {
                self.locked_hand_id = Some(hand.hand_id);
                self.emit(hand.clone())
            }
            None => None,
        }
    }

    fn emit(&self, hand: HandState) -> Option<HandState> {
        if self.config.drop_hover_events && !hand.is_pinching {
            return None;
        }
        Some(hand)
    }
}
