use overlay_mirror::event::{EventKind, InputEvent, WindowIdent};
use overlay_mirror::hotkey::Key;
use overlay_mirror::surface::headless::HeadlessSurface;
use overlay_mirror::{CompositorWindow, MirrorConfig};
use std::collections::VecDeque;
use std::sync::Arc;

struct Rig {
    window: CompositorWindow,
    stats: Arc<overlay_mirror::surface::headless::HeadlessStats>,
    queue: Arc<parking_lot::Mutex<VecDeque<InputEvent>>>,
}

fn rig(config: &MirrorConfig) -> Rig {
    let surface = HeadlessSurface::new(640, 480);
    let stats = surface.stats();
    let queue = surface.event_queue();
    let window = CompositorWindow::with_surface(Box::new(surface), config);
    window.set_forwarding_target(Some(WindowIdent(42)));
    window.show();
    Rig { window, stats, queue }
}

fn push(rig: &Rig, kind: EventKind) {
    rig.queue.lock().push_back(InputEvent::synthetic(kind));
}

fn pump(rig: &Rig) {
    let buf = vec![0u8; 640 * 480 * 4];
    rig.window.render(&buf, 640, 480);
}

fn key_down(key: Key, ctrl: bool, shift: bool, alt: bool) -> EventKind {
    EventKind::KeyDown { key: Some(key), ctrl, shift, alt }
}

#[test]
fn ordinary_keys_are_forwarded_to_target() {
    let r = rig(&MirrorConfig::default());
    push(&r, key_down(Key::Space, false, false, false));
    push(&r, EventKind::KeyUp { key: Some(Key::Space), ctrl: false, shift: false, alt: false });
    pump(&r);

    let forwarded = r.stats.forwarded();
    assert_eq!(forwarded.len(), 2);
    assert!(forwarded.iter().all(|(target, _)| *target == WindowIdent(42)));
}

#[test]
fn reserved_hotkey_is_never_forwarded() {
    let r = rig(&MirrorConfig::default());
    // Shift+Tab press and release, with the modifier released first.
    push(&r, key_down(Key::Tab, false, true, false));
    push(&r, EventKind::KeyUp { key: Some(Key::Tab), ctrl: false, shift: false, alt: false });
    pump(&r);

    assert!(r.stats.forwarded().is_empty());
}

#[test]
fn tab_without_modifier_still_reaches_host() {
    let r = rig(&MirrorConfig::default());
    push(&r, key_down(Key::Tab, false, false, false));
    pump(&r);

    assert_eq!(r.stats.forwarded().len(), 1);
}

#[test]
fn plain_tab_release_reaches_host() {
    // A bare Tab press is not the chord; its release must go through too,
    // or the host sees a permanently held key.
    let r = rig(&MirrorConfig::default());
    push(&r, key_down(Key::Tab, false, false, false));
    push(&r, EventKind::KeyUp { key: Some(Key::Tab), ctrl: false, shift: false, alt: false });
    pump(&r);

    let forwarded = r.stats.forwarded();
    assert_eq!(forwarded.len(), 2);
    assert_eq!(
        forwarded[1].1,
        EventKind::KeyUp { key: Some(Key::Tab), ctrl: false, shift: false, alt: false }
    );
}

#[test]
fn chord_then_plain_tab_pair_routes_each_correctly() {
    let r = rig(&MirrorConfig::default());
    // Chord press and release: both swallowed.
    push(&r, key_down(Key::Tab, false, true, false));
    push(&r, EventKind::KeyUp { key: Some(Key::Tab), ctrl: false, shift: true, alt: false });
    // Then a plain Tab pair: both forwarded.
    push(&r, key_down(Key::Tab, false, false, false));
    push(&r, EventKind::KeyUp { key: Some(Key::Tab), ctrl: false, shift: false, alt: false });
    pump(&r);

    assert_eq!(r.stats.forwarded().len(), 2);
}

#[test]
fn input_events_move_between_threads() {
    // The compositor is driven from the host's render thread while destroy
    // may come from teardown elsewhere; events must be able to cross.
    let ev = InputEvent::synthetic(EventKind::Motion { x: 3, y: 4 });
    let handle = std::thread::spawn(move || ev.kind);
    assert_eq!(
        handle.join().unwrap(),
        EventKind::Motion { x: 3, y: 4 }
    );
}

#[test]
fn configured_hotkey_replaces_default() {
    let cfg = MirrorConfig {
        overlay_hotkey: Some("Ctrl+F10".into()),
        ..MirrorConfig::default()
    };
    let r = rig(&cfg);
    push(&r, key_down(Key::F10, true, false, false));
    // The stock chord is no longer reserved.
    push(&r, key_down(Key::Tab, false, true, false));
    pump(&r);

    let forwarded = r.stats.forwarded();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(
        forwarded[0].1,
        key_down(Key::Tab, false, true, false)
    );
}

#[test]
fn click_forwards_and_refocuses() {
    let r = rig(&MirrorConfig::default());
    let before = r.stats.focus_requests();
    push(&r, EventKind::ButtonDown { button: 1, x: 10, y: 20 });
    push(&r, EventKind::ButtonUp { button: 1, x: 10, y: 20 });
    pump(&r);

    assert_eq!(r.stats.forwarded().len(), 2);
    assert_eq!(r.stats.focus_requests(), before + 1);
}

#[test]
fn focus_loss_requests_focus_back() {
    let r = rig(&MirrorConfig::default());
    let before = r.stats.focus_requests();
    push(&r, EventKind::FocusLost);
    pump(&r);

    assert!(r.stats.forwarded().is_empty());
    assert_eq!(r.stats.focus_requests(), before + 1);
}

#[test]
fn warp_motion_is_swallowed_then_real_motion_flows() {
    let cfg = MirrorConfig {
        warp_suppression_ms: 40,
        ..MirrorConfig::default()
    };
    let r = rig(&cfg);

    push(&r, EventKind::FocusLost);
    push(&r, EventKind::FocusGained);
    for _ in 0..5 {
        push(&r, EventKind::Motion { x: 1, y: 1 });
    }
    pump(&r);
    assert!(r.stats.forwarded().is_empty());

    std::thread::sleep(std::time::Duration::from_millis(60));
    push(&r, EventKind::Motion { x: 2, y: 2 });
    pump(&r);
    assert_eq!(r.stats.forwarded().len(), 1);
    assert_eq!(r.stats.forwarded()[0].1, EventKind::Motion { x: 2, y: 2 });
}

#[test]
fn without_target_nothing_is_forwarded() {
    let r = rig(&MirrorConfig::default());
    r.window.set_forwarding_target(None);
    push(&r, key_down(Key::Space, false, false, false));
    pump(&r);

    assert!(r.stats.forwarded().is_empty());
}

#[test]
fn events_are_not_drained_while_hidden() {
    let r = rig(&MirrorConfig::default());
    r.window.hide();
    push(&r, key_down(Key::Space, false, false, false));
    pump(&r);
    assert!(r.stats.forwarded().is_empty());

    // The event is still queued; mapping again delivers it.
    r.window.show();
    pump(&r);
    assert_eq!(r.stats.forwarded().len(), 1);
}
