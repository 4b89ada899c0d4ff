//! The mirror window proper.
//!
//! One `CompositorWindow` exists per host window. The host drives it from
//! its render loop: `create`, then `render(buffer, w, h)` once per produced
//! frame, interleaved with `show`/`hide`/`set_frame`, and finally `destroy`.
//! Each render call binds the context, uploads the frame, draws, presents
//! (the call the injection hook intercepts) and drains the input queue once.

use crate::bridge::{InputBridge, Route};
use crate::config::MirrorConfig;
use crate::error::MirrorError;
use crate::event::WindowIdent;
use crate::hotkey::Hotkey;
use crate::surface::{platform_surface, Surface};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

struct Inner {
    surface: Box<dyn Surface>,
    bridge: InputBridge,
}

/// GPU-presented mirror of the host's off-screen-rendered surface.
///
/// The render mutex serialises every surface operation: the host renders
/// from one thread, but `destroy()` may race in from a teardown callback,
/// and the release ordering (texture, context, window, connection) must
/// hold even against a final in-flight frame.
pub struct CompositorWindow {
    inner: Mutex<Inner>,
    destroyed: AtomicBool,
    mapped: AtomicBool,
    target: Mutex<Option<WindowIdent>>,
}

impl CompositorWindow {
    /// Create the native window and rendering context, sized to
    /// `width x height`. Borderless, always-on-top, excluded from the
    /// taskbar. On failure every partially created resource is released
    /// before returning.
    pub fn create(
        width: u32,
        height: u32,
        title: &str,
        config: &MirrorConfig,
    ) -> Result<Self, MirrorError> {
        let mut surface = platform_surface(width, height, title)?;
        if config.app_id != 0 {
            surface.tag_app_id(config.app_id);
        }
        tracing::info!(width, height, app_id = config.app_id, "mirror window created");
        Ok(Self::from_parts(surface, config))
    }

    /// Assemble a compositor over an explicit surface backend. This is how
    /// the tests run the full pipeline against the headless surface.
    pub fn with_surface(surface: Box<dyn Surface>, config: &MirrorConfig) -> Self {
        Self::from_parts(surface, config)
    }

    fn from_parts(surface: Box<dyn Surface>, config: &MirrorConfig) -> Self {
        let bridge = InputBridge::new(
            config.reserved_hotkey(),
            Duration::from_millis(config.warp_suppression_ms),
        );
        Self {
            inner: Mutex::new(Inner { surface, bridge }),
            destroyed: AtomicBool::new(false),
            mapped: AtomicBool::new(false),
            target: Mutex::new(None),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped.load(Ordering::Acquire)
    }

    /// Register (or clear) the host window that forwarded input is
    /// re-addressed to. With no target, forwarding is a no-op.
    pub fn set_forwarding_target(&self, target: Option<WindowIdent>) {
        *self.target.lock() = target;
    }

    pub fn forwarding_target(&self) -> Option<WindowIdent> {
        *self.target.lock()
    }

    /// Replace the reserved overlay-activation chord.
    pub fn set_reserved_hotkey(&self, hotkey: Hotkey) {
        if self.is_destroyed() {
            return;
        }
        self.inner.lock().bridge.set_hotkey(hotkey);
    }

    /// Map and raise the window. Blocks until the platform reports the
    /// window visible, then requests input focus so the hook's key watcher
    /// can see the reserved chord.
    pub fn show(&self) {
        if self.is_destroyed() {
            return;
        }
        let mut inner = self.inner.lock();
        match inner.surface.show() {
            Ok(()) => {
                self.mapped.store(true, Ordering::Release);
                tracing::debug!("mirror window mapped");
            }
            Err(e) => tracing::warn!(error = %e, "failed to map mirror window"),
        }
    }

    /// Unbind the rendering context and unmap the window. Idempotent; a
    /// no-op when hidden or destroyed.
    pub fn hide(&self) {
        if self.is_destroyed() {
            return;
        }
        if !self.mapped.swap(false, Ordering::AcqRel) {
            return;
        }
        self.inner.lock().surface.hide();
        tracing::debug!("mirror window unmapped");
    }

    /// Reposition/resize. Applies immediately when mapped, otherwise the
    /// next time the window is shown.
    pub fn set_frame(&self, x: i32, y: i32, width: u32, height: u32) {
        if self.is_destroyed() {
            return;
        }
        self.inner.lock().surface.set_frame(x, y, width, height);
    }

    /// Current window geometry, or `None` once destroyed.
    pub fn frame(&self) -> Option<(i32, i32, u32, u32)> {
        if self.is_destroyed() {
            return None;
        }
        Some(self.inner.lock().surface.frame())
    }

    /// Dimensions of the frame texture, matching the most recently uploaded
    /// buffer. `None` before the first upload or after destruction.
    pub fn texture_size(&self) -> Option<(u32, u32)> {
        if self.is_destroyed() {
            return None;
        }
        self.inner.lock().surface.texture_size()
    }

    /// Native window id for host-side bookkeeping, or `None` once destroyed.
    pub fn native_id(&self) -> Option<u64> {
        if self.is_destroyed() {
            return None;
        }
        Some(self.inner.lock().surface.native_id())
    }

    /// Upload one host frame and present it.
    ///
    /// `buffer` is row-major BGRA, top-left origin, `width * height * 4`
    /// bytes. The texture is reallocated whenever the declared size changes.
    /// While the window is unmapped the upload still happens (the texture
    /// must always track the latest frame) but nothing is drawn, presented
    /// or drained. A context-bind failure skips the frame; the next call
    /// retries unconditionally.
    pub fn render(&self, buffer: &[u8], width: u32, height: u32) {
        if self.is_destroyed() {
            return;
        }
        let mut inner = self.inner.lock();
        // destroy() may have won the lock race.
        if self.is_destroyed() {
            return;
        }

        if let Err(e) = inner.surface.bind() {
            tracing::debug!(error = %e, "skipping frame");
            return;
        }

        let expected = width as usize * height as usize * 4;
        if buffer.len() < expected {
            tracing::warn!(
                expected,
                got = buffer.len(),
                width,
                height,
                "dropping undersized frame"
            );
            return;
        }
        inner.surface.upload(&buffer[..expected], width, height);

        if !self.mapped.load(Ordering::Acquire) {
            return;
        }

        inner.surface.draw_frame();
        inner.surface.present();

        // Input is drained on the render cadence on purpose: latency stays
        // tied to frame latency and no second thread races this mutex.
        let events = inner.surface.drain_events();
        if events.is_empty() {
            return;
        }
        let target = *self.target.lock();
        let now = Instant::now();
        for ev in events {
            match inner.bridge.route(&ev, now) {
                Route::Forward => {
                    if let Some(t) = target {
                        inner.surface.forward_event(t, &ev);
                    }
                }
                Route::ForwardAndRefocus => {
                    if let Some(t) = target {
                        inner.surface.forward_event(t, &ev);
                    }
                    inner.surface.request_focus();
                }
                Route::Refocus => inner.surface.request_focus(),
                Route::Swallow => {}
            }
        }
    }

    /// Tear down the window. One-shot: only the first call does work, and
    /// every later operation on this window becomes a no-op. Releases the
    /// texture, then the rendering context, then the window, then the
    /// window-system connection.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.mapped.store(false, Ordering::Release);
        self.inner.lock().surface.destroy();
        tracing::info!("mirror window destroyed");
    }
}

impl Drop for CompositorWindow {
    fn drop(&mut self) {
        self.destroy();
    }
}
