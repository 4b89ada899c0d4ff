//! A GPU-presented "mirror" window for hosts that render off-screen.
//!
//! Some overlay-injection hooks only attach to windows that issue native
//! present/swap calls. A host that renders its UI off-screen and composites
//! in software never makes such a call, so the hook has nothing to latch on
//! to. This crate puts a borderless, always-on-top window over the host,
//! uploads the host's frames to a GPU texture and presents them every frame,
//! giving the hook a real surface to intercept — while forwarding all input
//! (minus the reserved overlay hotkey) back to the host window so the mirror
//! stays invisible to the user.

pub mod bridge;
pub mod compositor;
pub mod config;
pub mod error;
pub mod event;
pub mod focus;
pub mod hotkey;
pub mod logging;
pub mod registry;
pub mod surface;

pub use compositor::CompositorWindow;
pub use config::MirrorConfig;
pub use error::MirrorError;
pub use event::{EventKind, InputEvent, WindowIdent};
pub use hotkey::{parse_hotkey, Hotkey, Key};
pub use registry::MirrorHandle;
