use crate::hotkey::Key;
use raw_window_handle::RawWindowHandle;
use std::fmt;

/// Identity of a native window, used to address forwarded input.
///
/// The mirror never owns the window behind this identity; if the host never
/// registers one, forwarding is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowIdent(pub u64);

impl WindowIdent {
    /// Extract a forwarding identity from a raw window handle supplied by
    /// the host's windowing layer.
    pub fn from_raw_handle(handle: RawWindowHandle) -> Option<Self> {
        match handle {
            RawWindowHandle::Xlib(h) => Some(WindowIdent(h.window)),
            RawWindowHandle::Win32(h) => Some(WindowIdent(h.hwnd.get() as u64)),
            RawWindowHandle::AppKit(h) => Some(WindowIdent(h.ns_view.as_ptr() as u64)),
            _ => None,
        }
    }
}

/// Decoded shape of one event pulled off the platform queue.
///
/// Only the fields the forwarding bridge routes on are decoded; the verbatim
/// platform payload rides along in [`RawPayload`] so re-injection does not
/// lose information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    KeyDown {
        key: Option<Key>,
        ctrl: bool,
        shift: bool,
        alt: bool,
    },
    KeyUp {
        key: Option<Key>,
        ctrl: bool,
        shift: bool,
        alt: bool,
    },
    ButtonDown {
        button: u8,
        x: i32,
        y: i32,
    },
    ButtonUp {
        button: u8,
        x: i32,
        y: i32,
    },
    Motion {
        x: i32,
        y: i32,
    },
    FocusGained,
    FocusLost,
    Other,
}

/// The untouched platform event, kept so forwarding can re-inject the
/// original bytes with only the target window rewritten.
#[derive(Clone, Copy)]
pub enum RawPayload {
    /// No platform payload (synthetic or test events).
    None,
    #[cfg(all(unix, not(target_os = "macos")))]
    X11(x11::xlib::XEvent),
    #[cfg(target_os = "windows")]
    Win32 { msg: u32, wparam: usize, lparam: isize },
    #[cfg(target_os = "macos")]
    Mac { event: usize },
}

// The X11 payload embeds raw display pointers, so `Send` is not derived.
// Events only ever move under the compositor's render mutex, the same
// discipline that makes the X11 surface itself `Send`, and forwarding
// happens on the thread that drained them.
unsafe impl Send for RawPayload {}

impl fmt::Debug for RawPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawPayload::None => write!(f, "None"),
            #[cfg(all(unix, not(target_os = "macos")))]
            RawPayload::X11(_) => write!(f, "X11"),
            #[cfg(target_os = "windows")]
            RawPayload::Win32 { msg, .. } => write!(f, "Win32(0x{msg:x})"),
            #[cfg(target_os = "macos")]
            RawPayload::Mac { .. } => write!(f, "Mac"),
        }
    }
}

/// One input event dequeued during a present cycle. Not retained across
/// frames.
#[derive(Debug, Clone, Copy)]
pub struct InputEvent {
    pub kind: EventKind,
    pub raw: RawPayload,
}

impl InputEvent {
    pub fn synthetic(kind: EventKind) -> Self {
        Self {
            kind,
            raw: RawPayload::None,
        }
    }
}
