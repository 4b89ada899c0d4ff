use crate::event::{EventKind, InputEvent};
use crate::focus::{FocusState, FocusTracker};
use crate::hotkey::Hotkey;
use std::time::{Duration, Instant};

/// What the compositor should do with one dequeued event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Re-inject the event at the host window, payload unchanged.
    Forward,
    /// Forward, then re-assert focus on the mirror window. A real click
    /// means the user is interacting through this window; the overlay may
    /// have silently released focus without us noticing.
    ForwardAndRefocus,
    /// Drop the event.
    Swallow,
    /// Drop the event and immediately request focus back.
    Refocus,
}

/// Routes raw input between the mirror window, the host window and the
/// injected overlay.
#[derive(Debug)]
pub struct InputBridge {
    hotkey: Hotkey,
    // Whether the last press of the chord's key was swallowed as the
    // reserved chord; the matching release must then be swallowed too.
    chord_down: bool,
    focus: FocusTracker,
}

impl InputBridge {
    pub fn new(hotkey: Hotkey, suppression: Duration) -> Self {
        Self {
            hotkey,
            chord_down: false,
            focus: FocusTracker::new(suppression),
        }
    }

    pub fn set_hotkey(&mut self, hotkey: Hotkey) {
        self.hotkey = hotkey;
        self.chord_down = false;
    }

    pub fn hotkey(&self) -> Hotkey {
        self.hotkey
    }

    pub fn focus_state(&self) -> FocusState {
        self.focus.state()
    }

    /// Decide what to do with `ev` observed at `now`.
    pub fn route(&mut self, ev: &InputEvent, now: Instant) -> Route {
        match ev.kind {
            EventKind::KeyDown {
                key: Some(key),
                ctrl,
                shift,
                alt,
            } if self.hotkey.matches(key, ctrl, shift, alt) => {
                self.chord_down = true;
                tracing::debug!(hotkey = %self.hotkey, "reserved hotkey kept for overlay");
                Route::Swallow
            }
            // The release half of a swallowed chord stays here too, even if
            // the modifier went up first. A release without a swallowed
            // press is an ordinary key the host must see go up.
            EventKind::KeyUp { key: Some(key), .. }
                if key == self.hotkey.key && self.chord_down =>
            {
                self.chord_down = false;
                Route::Swallow
            }
            EventKind::KeyDown { .. } | EventKind::KeyUp { .. } => Route::Forward,
            EventKind::ButtonDown { .. } => {
                self.focus.button_pressed();
                Route::ForwardAndRefocus
            }
            EventKind::ButtonUp { .. } => Route::Forward,
            EventKind::Motion { .. } => {
                if self.focus.suppressing(now) {
                    tracing::trace!("swallowing warped pointer motion");
                    Route::Swallow
                } else {
                    Route::Forward
                }
            }
            EventKind::FocusLost => {
                // The overlay is taking focus. Record it and ask for focus
                // back so we stay the window that can answer the next
                // focus request once the overlay closes.
                self.focus.focus_lost();
                Route::Refocus
            }
            EventKind::FocusGained => {
                if self.focus.focus_gained(now) {
                    tracing::debug!(
                        window_ms = self.focus.suppression_window().as_millis() as u64,
                        "overlay closed, suppressing cursor warp"
                    );
                }
                Route::Swallow
            }
            EventKind::Other => Route::Swallow,
        }
    }
}
