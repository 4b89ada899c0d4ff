//! Software surface double.
//!
//! Implements the full surface contract without touching a display server.
//! Used by the test suite to observe present/upload/forward behaviour, and
//! as a fallback on build agents without a windowing system.

use super::Surface;
use crate::error::MirrorError;
use crate::event::{EventKind, InputEvent, WindowIdent};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Counters and records shared with the owner of the surface, so behaviour
/// stays observable after the surface is boxed into a compositor.
#[derive(Default)]
pub struct HeadlessStats {
    pub binds: AtomicU32,
    pub uploads: AtomicU32,
    pub draws: AtomicU32,
    pub presents: AtomicU32,
    pub focus_requests: AtomicU32,
    pub texture: Mutex<Option<(u32, u32)>>,
    pub forwarded: Mutex<Vec<(WindowIdent, EventKind)>>,
    pub released: Mutex<Vec<&'static str>>,
    pub tagged_app_id: AtomicU32,
}

impl HeadlessStats {
    pub fn presents(&self) -> u32 {
        self.presents.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> u32 {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn focus_requests(&self) -> u32 {
        self.focus_requests.load(Ordering::SeqCst)
    }

    pub fn texture_size(&self) -> Option<(u32, u32)> {
        *self.texture.lock()
    }

    pub fn forwarded(&self) -> Vec<(WindowIdent, EventKind)> {
        self.forwarded.lock().clone()
    }

    /// Resource release order recorded by `destroy`.
    pub fn released(&self) -> Vec<&'static str> {
        self.released.lock().clone()
    }
}

pub struct HeadlessSurface {
    stats: Arc<HeadlessStats>,
    queue: Arc<Mutex<VecDeque<InputEvent>>>,
    fail_bind: Arc<AtomicBool>,
    frame: (i32, i32, u32, u32),
    visible: bool,
    destroyed: bool,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            stats: Arc::new(HeadlessStats::default()),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            fail_bind: Arc::new(AtomicBool::new(false)),
            frame: (0, 0, width, height),
            visible: false,
            destroyed: false,
        }
    }

    pub fn stats(&self) -> Arc<HeadlessStats> {
        Arc::clone(&self.stats)
    }

    /// Handle for injecting events that the next `drain_events` will return.
    pub fn event_queue(&self) -> Arc<Mutex<VecDeque<InputEvent>>> {
        Arc::clone(&self.queue)
    }

    /// Handle that makes subsequent `bind` calls fail, simulating a surface
    /// the driver refuses to make current.
    pub fn bind_failure_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fail_bind)
    }
}

impl Surface for HeadlessSurface {
    fn show(&mut self) -> Result<(), MirrorError> {
        self.visible = true;
        self.stats.focus_requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn set_frame(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.frame = (x, y, width, height);
    }

    fn frame(&self) -> (i32, i32, u32, u32) {
        self.frame
    }

    fn bind(&mut self) -> Result<(), MirrorError> {
        if self.fail_bind.load(Ordering::SeqCst) {
            return Err(MirrorError::ContextBind("bind failure requested".into()));
        }
        self.stats.binds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn upload(&mut self, _buffer: &[u8], width: u32, height: u32) {
        *self.stats.texture.lock() = Some((width, height));
        self.stats.uploads.fetch_add(1, Ordering::SeqCst);
    }

    fn texture_size(&self) -> Option<(u32, u32)> {
        *self.stats.texture.lock()
    }

    fn draw_frame(&mut self) {
        self.stats.draws.fetch_add(1, Ordering::SeqCst);
    }

    fn present(&mut self) {
        self.stats.presents.fetch_add(1, Ordering::SeqCst);
    }

    fn drain_events(&mut self) -> Vec<InputEvent> {
        self.queue.lock().drain(..).collect()
    }

    fn forward_event(&mut self, target: WindowIdent, ev: &InputEvent) {
        self.stats.forwarded.lock().push((target, ev.kind));
    }

    fn request_focus(&mut self) {
        self.stats.focus_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn tag_app_id(&mut self, app_id: u32) {
        self.stats.tagged_app_id.store(app_id, Ordering::SeqCst);
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.visible = false;
        let mut released = self.stats.released.lock();
        released.push("texture");
        released.push("context");
        released.push("window");
        released.push("connection");
    }

    fn native_id(&self) -> u64 {
        0
    }
}
