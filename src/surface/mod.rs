//! Graphics surface backends.
//!
//! Each platform owns its own window/context handle types and graphics-API
//! calls but implements the same call contract, so the compositor state
//! machine is shared. The present call is the one the externally injected
//! hook intercepts: it must fire once per rendered frame while the window is
//! mapped and never while it is unmapped.

use crate::error::MirrorError;
use crate::event::{InputEvent, WindowIdent};

pub mod headless;

#[cfg(all(unix, not(target_os = "macos")))]
pub mod x11;

#[cfg(target_os = "windows")]
pub mod win32;

#[cfg(target_os = "macos")]
pub mod macos;

/// A presentable, alpha-capable, double-buffered drawing surface bound to a
/// native window.
pub trait Surface: Send {
    /// Map and raise the window, blocking until the platform reports it
    /// visible, then request input focus. Presenting to a not-yet-visible
    /// surface silently no-ops on some platforms and the hook never fires.
    fn show(&mut self) -> Result<(), MirrorError>;

    /// Release the context binding, then unmap. Safe when already hidden.
    fn hide(&mut self);

    /// Reposition/resize the window and the projection used for the
    /// full-window quad. Safe to call while hidden.
    fn set_frame(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Current window geometry as `(x, y, width, height)`.
    fn frame(&self) -> (i32, i32, u32, u32);

    /// Make the rendering context current for this thread.
    fn bind(&mut self) -> Result<(), MirrorError>;

    /// Upload a full BGRA buffer, (re)allocating the texture when the
    /// declared size changes. Linear filtering, edge clamped.
    fn upload(&mut self, buffer: &[u8], width: u32, height: u32);

    /// Dimensions of the current frame texture, if one exists.
    fn texture_size(&self) -> Option<(u32, u32)>;

    /// Clear the backbuffer to transparent and draw the textured quad with
    /// straight `src-alpha, 1 - src-alpha` blending.
    fn draw_frame(&mut self);

    /// The buffer swap the injection hook intercepts.
    fn present(&mut self);

    /// Pull everything currently pending on the platform event queue.
    fn drain_events(&mut self) -> Vec<InputEvent>;

    /// Re-inject `ev` into the platform event system addressed to `target`,
    /// payload otherwise unchanged.
    fn forward_event(&mut self, target: WindowIdent, ev: &InputEvent);

    /// Ask the window system to give this window input focus.
    fn request_focus(&mut self);

    /// Stamp the window with the external application identifier the hook
    /// uses to associate it with the right app.
    fn tag_app_id(&mut self, app_id: u32);

    /// Release everything: texture, then context, then window, then the
    /// window-system connection. Must be idempotent.
    fn destroy(&mut self);

    /// Native window id, for diagnostics and host-side bookkeeping.
    fn native_id(&self) -> u64;
}

/// Build the platform surface for this target.
#[allow(unused_variables)]
pub fn platform_surface(
    width: u32,
    height: u32,
    title: &str,
) -> Result<Box<dyn Surface>, MirrorError> {
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        return Ok(Box::new(x11::X11Surface::new(width, height, title)?));
    }
    #[cfg(target_os = "windows")]
    {
        return Ok(Box::new(win32::Win32Surface::new(width, height, title)?));
    }
    #[cfg(target_os = "macos")]
    {
        return Ok(Box::new(macos::MacSurface::new(width, height, title)?));
    }
    #[cfg(not(any(
        all(unix, not(target_os = "macos")),
        target_os = "windows",
        target_os = "macos"
    )))]
    {
        Err(MirrorError::PlatformInit(
            "no surface backend for this target".into(),
        ))
    }
}
