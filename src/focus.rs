use std::time::{Duration, Instant};

/// Where input focus currently sits relative to the injected overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    /// Focus is ours (or the host's); events flow normally.
    Normal,
    /// The overlay took focus away from the mirror window.
    OverlayActive,
    /// The overlay just closed; pointer motion is swallowed until the
    /// deadline so the hook's cursor-position restore is not mistaken for
    /// real mouse movement.
    SuppressingWarp { deadline: Instant },
}

/// Tracks overlay focus and the cursor-warp suppression window.
///
/// Suppression is time-based on purpose. A distance check against the last
/// known pointer position cannot work: the window receives no motion events
/// at all while the overlay holds focus, so the last known position is stale
/// and every restore warp looks arbitrarily far away.
#[derive(Debug)]
pub struct FocusTracker {
    state: FocusState,
    suppression: Duration,
}

impl FocusTracker {
    pub fn new(suppression: Duration) -> Self {
        Self {
            state: FocusState::Normal,
            suppression,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn suppression_window(&self) -> Duration {
        self.suppression
    }

    /// The only other layer that can take focus from the mirror window is
    /// the overlay, so a focus-out means the overlay just opened.
    pub fn focus_lost(&mut self) {
        self.state = FocusState::OverlayActive;
    }

    /// Focus came back. If the overlay had it, this is the overlay closing:
    /// arm the suppression window. Returns whether suppression was armed.
    pub fn focus_gained(&mut self, now: Instant) -> bool {
        match self.state {
            FocusState::OverlayActive => {
                self.state = FocusState::SuppressingWarp {
                    deadline: now + self.suppression,
                };
                true
            }
            _ => false,
        }
    }

    /// An intentional click is never a synthetic warp; end suppression
    /// immediately regardless of the deadline.
    pub fn button_pressed(&mut self) {
        self.state = FocusState::Normal;
    }

    /// Whether pointer motion at `now` should be swallowed. An elapsed
    /// deadline drops the tracker back to `Normal`.
    pub fn suppressing(&mut self, now: Instant) -> bool {
        match self.state {
            FocusState::SuppressingWarp { deadline } => {
                if now < deadline {
                    true
                } else {
                    self.state = FocusState::Normal;
                    false
                }
            }
            _ => false,
        }
    }
}
