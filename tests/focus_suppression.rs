use overlay_mirror::bridge::{InputBridge, Route};
use overlay_mirror::event::{EventKind, InputEvent};
use overlay_mirror::focus::{FocusState, FocusTracker};
use overlay_mirror::hotkey::Hotkey;
use std::time::{Duration, Instant};

fn motion() -> InputEvent {
    InputEvent::synthetic(EventKind::Motion { x: 10, y: 10 })
}

#[test]
fn tracker_starts_normal() {
    let mut tracker = FocusTracker::new(Duration::from_millis(500));
    assert_eq!(tracker.state(), FocusState::Normal);
    assert!(!tracker.suppressing(Instant::now()));
}

#[test]
fn focus_gained_without_overlay_does_not_arm() {
    let mut tracker = FocusTracker::new(Duration::from_millis(500));
    assert!(!tracker.focus_gained(Instant::now()));
    assert_eq!(tracker.state(), FocusState::Normal);
}

#[test]
fn overlay_close_arms_suppression_until_deadline() {
    let mut tracker = FocusTracker::new(Duration::from_millis(500));
    let t0 = Instant::now();

    tracker.focus_lost();
    assert_eq!(tracker.state(), FocusState::OverlayActive);
    assert!(tracker.focus_gained(t0));

    // Every motion inside the window is swallowed, however many arrive.
    for i in 0..10 {
        assert!(tracker.suppressing(t0 + Duration::from_millis(i * 40)));
    }

    // The deadline collapses the state back to Normal.
    assert!(!tracker.suppressing(t0 + Duration::from_millis(500)));
    assert_eq!(tracker.state(), FocusState::Normal);
    assert!(!tracker.suppressing(t0 + Duration::from_millis(501)));
}

#[test]
fn button_press_ends_suppression_early() {
    let mut tracker = FocusTracker::new(Duration::from_secs(60));
    let t0 = Instant::now();
    tracker.focus_lost();
    tracker.focus_gained(t0);
    assert!(tracker.suppressing(t0 + Duration::from_millis(1)));

    tracker.button_pressed();
    assert_eq!(tracker.state(), FocusState::Normal);
    assert!(!tracker.suppressing(t0 + Duration::from_millis(2)));
}

#[test]
fn motion_routes_follow_suppression_window() {
    let mut bridge = InputBridge::new(Hotkey::default(), Duration::from_millis(500));
    let t0 = Instant::now();

    assert_eq!(bridge.route(&motion(), t0), Route::Forward);

    assert_eq!(
        bridge.route(&InputEvent::synthetic(EventKind::FocusLost), t0),
        Route::Refocus
    );
    assert_eq!(bridge.focus_state(), FocusState::OverlayActive);

    // Motion while the overlay holds focus is real input, not a warp.
    assert_eq!(bridge.route(&motion(), t0), Route::Forward);

    assert_eq!(
        bridge.route(&InputEvent::synthetic(EventKind::FocusGained), t0),
        Route::Swallow
    );
    assert_eq!(
        bridge.route(&motion(), t0 + Duration::from_millis(100)),
        Route::Swallow
    );
    assert_eq!(
        bridge.route(&motion(), t0 + Duration::from_millis(600)),
        Route::Forward
    );
}

#[test]
fn click_during_suppression_forwards_and_clears() {
    let mut bridge = InputBridge::new(Hotkey::default(), Duration::from_secs(60));
    let t0 = Instant::now();
    bridge.route(&InputEvent::synthetic(EventKind::FocusLost), t0);
    bridge.route(&InputEvent::synthetic(EventKind::FocusGained), t0);
    assert_eq!(bridge.route(&motion(), t0), Route::Swallow);

    let click = InputEvent::synthetic(EventKind::ButtonDown { button: 1, x: 5, y: 5 });
    assert_eq!(bridge.route(&click, t0), Route::ForwardAndRefocus);
    assert_eq!(bridge.route(&motion(), t0), Route::Forward);
}

#[test]
fn repeated_overlay_cycles_rearm() {
    let mut bridge = InputBridge::new(Hotkey::default(), Duration::from_millis(500));
    let mut t = Instant::now();
    for _ in 0..3 {
        bridge.route(&InputEvent::synthetic(EventKind::FocusLost), t);
        bridge.route(&InputEvent::synthetic(EventKind::FocusGained), t);
        assert_eq!(bridge.route(&motion(), t), Route::Swallow);
        t += Duration::from_secs(2);
        assert_eq!(bridge.route(&motion(), t), Route::Forward);
    }
}
