use overlay_mirror::surface::headless::HeadlessSurface;
use overlay_mirror::{registry, CompositorWindow, MirrorConfig};
use std::sync::Arc;

fn frame() -> Vec<u8> {
    vec![0u8; 640 * 480 * 4]
}

#[test]
fn destroy_releases_in_order() {
    let surface = HeadlessSurface::new(640, 480);
    let stats = surface.stats();
    let window = CompositorWindow::with_surface(Box::new(surface), &MirrorConfig::default());
    window.show();
    window.render(&frame(), 640, 480);

    window.destroy();
    assert_eq!(stats.released(), vec!["texture", "context", "window", "connection"]);
}

#[test]
fn destroy_is_one_shot() {
    let surface = HeadlessSurface::new(640, 480);
    let stats = surface.stats();
    let window = CompositorWindow::with_surface(Box::new(surface), &MirrorConfig::default());

    window.destroy();
    window.destroy();
    assert_eq!(stats.released().len(), 4);
}

#[test]
fn operations_after_destroy_are_noops() {
    let surface = HeadlessSurface::new(640, 480);
    let stats = surface.stats();
    let window = CompositorWindow::with_surface(Box::new(surface), &MirrorConfig::default());
    window.destroy();

    window.show();
    window.render(&frame(), 640, 480);
    window.set_frame(1, 1, 10, 10);
    window.hide();

    assert!(!window.is_mapped());
    assert_eq!(stats.uploads(), 0);
    assert_eq!(stats.presents(), 0);
    assert_eq!(window.frame(), None);
    assert_eq!(window.texture_size(), None);
    assert_eq!(window.native_id(), None);
}

#[test]
fn drop_destroys_the_surface() {
    let surface = HeadlessSurface::new(640, 480);
    let stats = surface.stats();
    {
        let _window =
            CompositorWindow::with_surface(Box::new(surface), &MirrorConfig::default());
    }
    assert_eq!(stats.released().len(), 4);
}

#[test]
fn hide_is_idempotent() {
    let surface = HeadlessSurface::new(640, 480);
    let stats = surface.stats();
    let window = CompositorWindow::with_surface(Box::new(surface), &MirrorConfig::default());

    window.hide();
    window.show();
    window.hide();
    window.hide();

    window.render(&frame(), 640, 480);
    assert_eq!(stats.presents(), 0);
}

#[test]
fn registry_resolves_live_handles_only() {
    let surface = HeadlessSurface::new(64, 64);
    let stats = surface.stats();
    let window = Arc::new(CompositorWindow::with_surface(
        Box::new(surface),
        &MirrorConfig::default(),
    ));

    let handle = registry::insert(Arc::clone(&window));
    assert!(registry::get(handle).is_some());

    assert!(registry::remove(handle));
    assert!(registry::get(handle).is_none());
    assert!(!registry::remove(handle));

    // remove() destroyed the window even though we still hold an Arc.
    assert!(window.is_destroyed());
    assert_eq!(stats.released().len(), 4);
}

#[test]
fn stale_handle_is_harmless() {
    assert!(registry::get(overlay_mirror::MirrorHandle(9999)).is_none());
    assert!(!registry::remove(overlay_mirror::MirrorHandle(9999)));
}
